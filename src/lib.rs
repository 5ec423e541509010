pub mod auction;
pub mod bidding;
pub mod cache;
pub mod context;
pub mod database;
pub mod handlers;
pub mod ledger;
pub mod scheduler;
pub mod settings;
pub mod vk;
