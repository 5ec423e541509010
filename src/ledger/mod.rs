/// 경매 원장 (권위 있는 로트/입찰/주문/낙찰자 저장소)
/// 코어 로직은 트레이트에만 의존하고, 테스트는 인메모리 구현으로 대체한다.
// region:    --- Imports
use crate::auction::model::{Bid, BidStatus, Lot, LotStatus, Order, WinnerProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

pub mod memory;
pub mod queries;

pub use memory::MemoryLedger;

// endregion: --- Imports

// region:    --- Ledger Trait

/// 경매 원장 트레이트. 모든 변이는 상위에서 잠금으로 직렬화된다.
#[async_trait]
pub trait AuctionLedger: Send + Sync {
    async fn find_lot_by_post_key(&self, post_key: &str) -> Result<Option<Lot>, String>;
    async fn get_lot(&self, lot_id: i64) -> Result<Option<Lot>, String>;
    /// 현재가와 선두를 함께 갱신
    async fn update_lot_price(
        &self,
        lot_id: i64,
        current_price: i64,
        leader_id: i64,
    ) -> Result<(), String>;
    async fn update_lot_deadline(
        &self,
        lot_id: i64,
        deadline: DateTime<Utc>,
    ) -> Result<(), String>;
    /// 활성 로트만 상태가 바뀐다 (종결 상태 보호)
    async fn update_lot_status(&self, lot_id: i64, status: LotStatus) -> Result<(), String>;

    async fn leader_bid(&self, lot_id: i64) -> Result<Option<Bid>, String>;
    async fn append_bid(&self, bid: &Bid) -> Result<(), String>;
    async fn update_bid_status(&self, bid_id: Uuid, status: BidStatus) -> Result<(), String>;
    async fn bid_exists_for_comment(&self, comment_id: i64) -> Result<bool, String>;
    async fn latest_bid_for_user(&self, lot_id: i64, user_id: i64)
        -> Result<Option<Bid>, String>;
    async fn bid_history(&self, lot_id: i64) -> Result<Vec<Bid>, String>;

    /// 마감이 지난 활성 로트
    async fn due_lots(&self, now: DateTime<Utc>) -> Result<Vec<Lot>, String>;
    async fn active_lot_count(&self) -> Result<i64, String>;
    async fn sold_lots(&self) -> Result<Vec<Lot>, String>;

    async fn create_order(&self, order: &Order) -> Result<(), String>;
    async fn pending_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, String>;
    async fn record_win(
        &self,
        user_id: i64,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), String>;
    async fn winner_profile(&self, user_id: i64) -> Result<Option<WinnerProfile>, String>;
}

// endregion: --- Ledger Trait

// region:    --- Row Mapping

/// 저장소 행 표현. 상태 문자열은 경계에서 정규화한다.
#[derive(FromRow)]
struct LotRow {
    lot_id: i64,
    name: String,
    status: String,
    start_price: i64,
    current_price: i64,
    leader_id: Option<i64>,
    deadline: DateTime<Utc>,
    post_key: String,
    attachment_id: Option<String>,
}

impl LotRow {
    fn into_lot(self) -> Result<Lot, String> {
        let status = LotStatus::parse(&self.status)
            .ok_or_else(|| format!("알 수 없는 로트 상태: {}", self.status))?;
        Ok(Lot {
            lot_id: self.lot_id,
            name: self.name,
            status,
            start_price: self.start_price,
            current_price: self.current_price,
            leader_id: self.leader_id,
            deadline: self.deadline,
            post_key: self.post_key,
            attachment_id: self.attachment_id,
        })
    }
}

#[derive(FromRow)]
struct BidRow {
    bid_id: Uuid,
    lot_id: i64,
    post_id: i64,
    user_id: i64,
    amount: i64,
    ts: DateTime<Utc>,
    comment_id: i64,
    status: String,
}

impl BidRow {
    fn into_bid(self) -> Result<Bid, String> {
        let status = BidStatus::parse(&self.status)
            .ok_or_else(|| format!("알 수 없는 입찰 상태: {}", self.status))?;
        Ok(Bid {
            bid_id: self.bid_id,
            lot_id: self.lot_id,
            post_id: self.post_id,
            user_id: self.user_id,
            amount: self.amount,
            timestamp: self.ts,
            comment_id: self.comment_id,
            status,
        })
    }
}

#[derive(FromRow)]
struct OrderRow {
    order_id: String,
    lot_id: i64,
    lot_name: String,
    post_key: String,
    user_id: i64,
    win_price: i64,
    win_date: DateTime<Utc>,
    status: String,
}

impl OrderRow {
    fn into_order(self) -> Order {
        Order {
            order_id: self.order_id,
            lot_id: self.lot_id,
            lot_name: self.lot_name,
            post_key: self.post_key,
            user_id: self.user_id,
            win_price: self.win_price,
            win_date: self.win_date,
            status: self.status,
        }
    }
}

// endregion: --- Row Mapping

// region:    --- Postgres Ledger

/// Postgres 원장 구현체
pub struct PostgresLedger {
    pool: Arc<PgPool>,
}

impl PostgresLedger {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PostgresLedger { pool }
    }
}

#[async_trait]
impl AuctionLedger for PostgresLedger {
    async fn find_lot_by_post_key(&self, post_key: &str) -> Result<Option<Lot>, String> {
        let row = sqlx::query_as::<_, LotRow>(queries::FIND_LOT_BY_POST_KEY)
            .bind(post_key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        row.map(LotRow::into_lot).transpose()
    }

    async fn get_lot(&self, lot_id: i64) -> Result<Option<Lot>, String> {
        let row = sqlx::query_as::<_, LotRow>(queries::GET_LOT)
            .bind(lot_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        row.map(LotRow::into_lot).transpose()
    }

    async fn update_lot_price(
        &self,
        lot_id: i64,
        current_price: i64,
        leader_id: i64,
    ) -> Result<(), String> {
        sqlx::query(queries::UPDATE_LOT_PRICE)
            .bind(lot_id)
            .bind(current_price)
            .bind(leader_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn update_lot_deadline(
        &self,
        lot_id: i64,
        deadline: DateTime<Utc>,
    ) -> Result<(), String> {
        sqlx::query(queries::UPDATE_LOT_DEADLINE)
            .bind(lot_id)
            .bind(deadline)
            .execute(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn update_lot_status(&self, lot_id: i64, status: LotStatus) -> Result<(), String> {
        sqlx::query(queries::UPDATE_LOT_STATUS)
            .bind(lot_id)
            .bind(status.as_db())
            .execute(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn leader_bid(&self, lot_id: i64) -> Result<Option<Bid>, String> {
        let row = sqlx::query_as::<_, BidRow>(queries::GET_LEADER_BID)
            .bind(lot_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        row.map(BidRow::into_bid).transpose()
    }

    async fn append_bid(&self, bid: &Bid) -> Result<(), String> {
        sqlx::query(queries::APPEND_BID)
            .bind(bid.bid_id)
            .bind(bid.lot_id)
            .bind(bid.post_id)
            .bind(bid.user_id)
            .bind(bid.amount)
            .bind(bid.timestamp)
            .bind(bid.comment_id)
            .bind(bid.status.as_db())
            .execute(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn update_bid_status(&self, bid_id: Uuid, status: BidStatus) -> Result<(), String> {
        sqlx::query(queries::UPDATE_BID_STATUS)
            .bind(bid_id)
            .bind(status.as_db())
            .execute(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn bid_exists_for_comment(&self, comment_id: i64) -> Result<bool, String> {
        let count: i64 = sqlx::query_scalar(queries::BID_EXISTS_FOR_COMMENT)
            .bind(comment_id)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(count > 0)
    }

    async fn latest_bid_for_user(
        &self,
        lot_id: i64,
        user_id: i64,
    ) -> Result<Option<Bid>, String> {
        let row = sqlx::query_as::<_, BidRow>(queries::LATEST_BID_FOR_USER)
            .bind(lot_id)
            .bind(user_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        row.map(BidRow::into_bid).transpose()
    }

    async fn bid_history(&self, lot_id: i64) -> Result<Vec<Bid>, String> {
        let rows = sqlx::query_as::<_, BidRow>(queries::GET_BID_HISTORY)
            .bind(lot_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        rows.into_iter().map(BidRow::into_bid).collect()
    }

    async fn due_lots(&self, now: DateTime<Utc>) -> Result<Vec<Lot>, String> {
        let rows = sqlx::query_as::<_, LotRow>(queries::GET_DUE_LOTS)
            .bind(now)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        rows.into_iter().map(LotRow::into_lot).collect()
    }

    async fn active_lot_count(&self) -> Result<i64, String> {
        sqlx::query_scalar(queries::COUNT_ACTIVE_LOTS)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| e.to_string())
    }

    async fn sold_lots(&self) -> Result<Vec<Lot>, String> {
        let rows = sqlx::query_as::<_, LotRow>(queries::GET_SOLD_LOTS)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        rows.into_iter().map(LotRow::into_lot).collect()
    }

    async fn create_order(&self, order: &Order) -> Result<(), String> {
        sqlx::query(queries::CREATE_ORDER)
            .bind(&order.order_id)
            .bind(order.lot_id)
            .bind(&order.lot_name)
            .bind(&order.post_key)
            .bind(order.user_id)
            .bind(order.win_price)
            .bind(order.win_date)
            .bind(&order.status)
            .execute(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn pending_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, String> {
        let rows = sqlx::query_as::<_, OrderRow>(queries::PENDING_ORDERS_FOR_USER)
            .bind(user_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(rows.into_iter().map(OrderRow::into_order).collect())
    }

    async fn record_win(
        &self,
        user_id: i64,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), String> {
        sqlx::query(queries::RECORD_WIN)
            .bind(user_id)
            .bind(user_name)
            .bind(now)
            .execute(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn winner_profile(&self, user_id: i64) -> Result<Option<WinnerProfile>, String> {
        #[derive(FromRow)]
        struct ProfileRow {
            user_id: i64,
            user_name: String,
            first_win_date: DateTime<Utc>,
            last_win_date: DateTime<Utc>,
            total_lots_won: i64,
        }

        let row = sqlx::query_as::<_, ProfileRow>(queries::GET_WINNER_PROFILE)
            .bind(user_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(row.map(|r| WinnerProfile {
            user_id: r.user_id,
            user_name: r.user_name,
            first_win_date: r.first_win_date,
            last_win_date: r.last_win_date,
            total_lots_won: r.total_lots_won,
        }))
    }
}

// endregion: --- Postgres Ledger
