/// 인메모리 원장. 테스트와 로컬 구동에서 Postgres 원장을 대신한다.
// region:    --- Imports
use crate::auction::model::{Bid, BidStatus, Lot, LotStatus, Order, WinnerProfile};
use crate::ledger::AuctionLedger;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Memory Ledger

#[derive(Default)]
struct Inner {
    lots: HashMap<i64, Lot>,
    bids: Vec<Bid>,
    orders: HashMap<String, Order>,
    winners: HashMap<i64, WinnerProfile>,
}

#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 로트 심기 (로트 등록 자체는 코어 밖의 일이다)
    pub async fn insert_lot(&self, lot: Lot) {
        self.inner.write().await.lots.insert(lot.lot_id, lot);
    }
}

#[async_trait]
impl AuctionLedger for MemoryLedger {
    async fn find_lot_by_post_key(&self, post_key: &str) -> Result<Option<Lot>, String> {
        let inner = self.inner.read().await;
        Ok(inner.lots.values().find(|l| l.post_key == post_key).cloned())
    }

    async fn get_lot(&self, lot_id: i64) -> Result<Option<Lot>, String> {
        Ok(self.inner.read().await.lots.get(&lot_id).cloned())
    }

    async fn update_lot_price(
        &self,
        lot_id: i64,
        current_price: i64,
        leader_id: i64,
    ) -> Result<(), String> {
        let mut inner = self.inner.write().await;
        if let Some(lot) = inner.lots.get_mut(&lot_id) {
            lot.current_price = current_price;
            lot.leader_id = Some(leader_id);
        }
        Ok(())
    }

    async fn update_lot_deadline(
        &self,
        lot_id: i64,
        deadline: DateTime<Utc>,
    ) -> Result<(), String> {
        let mut inner = self.inner.write().await;
        if let Some(lot) = inner.lots.get_mut(&lot_id) {
            lot.deadline = deadline;
        }
        Ok(())
    }

    async fn update_lot_status(&self, lot_id: i64, status: LotStatus) -> Result<(), String> {
        let mut inner = self.inner.write().await;
        if let Some(lot) = inner.lots.get_mut(&lot_id) {
            // 종결 상태 보호
            if lot.status == LotStatus::Active {
                lot.status = status;
            }
        }
        Ok(())
    }

    async fn leader_bid(&self, lot_id: i64) -> Result<Option<Bid>, String> {
        let inner = self.inner.read().await;
        Ok(inner
            .bids
            .iter()
            .find(|b| b.lot_id == lot_id && b.status == BidStatus::Leader)
            .cloned())
    }

    async fn append_bid(&self, bid: &Bid) -> Result<(), String> {
        self.inner.write().await.bids.push(bid.clone());
        Ok(())
    }

    async fn update_bid_status(&self, bid_id: Uuid, status: BidStatus) -> Result<(), String> {
        let mut inner = self.inner.write().await;
        if let Some(bid) = inner.bids.iter_mut().find(|b| b.bid_id == bid_id) {
            bid.status = status;
        }
        Ok(())
    }

    async fn bid_exists_for_comment(&self, comment_id: i64) -> Result<bool, String> {
        let inner = self.inner.read().await;
        Ok(inner.bids.iter().any(|b| b.comment_id == comment_id))
    }

    async fn latest_bid_for_user(
        &self,
        lot_id: i64,
        user_id: i64,
    ) -> Result<Option<Bid>, String> {
        let inner = self.inner.read().await;
        Ok(inner
            .bids
            .iter()
            .filter(|b| b.lot_id == lot_id && b.user_id == user_id)
            .max_by_key(|b| b.timestamp)
            .cloned())
    }

    async fn bid_history(&self, lot_id: i64) -> Result<Vec<Bid>, String> {
        let inner = self.inner.read().await;
        Ok(inner
            .bids
            .iter()
            .filter(|b| b.lot_id == lot_id)
            .cloned()
            .collect())
    }

    async fn due_lots(&self, now: DateTime<Utc>) -> Result<Vec<Lot>, String> {
        let inner = self.inner.read().await;
        Ok(inner
            .lots
            .values()
            .filter(|l| l.status == LotStatus::Active && l.deadline < now)
            .cloned()
            .collect())
    }

    async fn active_lot_count(&self) -> Result<i64, String> {
        let inner = self.inner.read().await;
        Ok(inner
            .lots
            .values()
            .filter(|l| l.status == LotStatus::Active)
            .count() as i64)
    }

    async fn sold_lots(&self) -> Result<Vec<Lot>, String> {
        let inner = self.inner.read().await;
        Ok(inner
            .lots
            .values()
            .filter(|l| l.status == LotStatus::Sold)
            .cloned()
            .collect())
    }

    async fn create_order(&self, order: &Order) -> Result<(), String> {
        let mut inner = self.inner.write().await;
        // ON CONFLICT DO NOTHING 과 같은 동작
        inner
            .orders
            .entry(order.order_id.clone())
            .or_insert_with(|| order.clone());
        Ok(())
    }

    async fn pending_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, String> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.user_id == user_id && o.status == crate::auction::model::ORDER_STATUS_PENDING)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.win_date);
        Ok(orders)
    }

    async fn record_win(
        &self,
        user_id: i64,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), String> {
        let mut inner = self.inner.write().await;
        inner
            .winners
            .entry(user_id)
            .and_modify(|w| {
                w.last_win_date = now;
                w.total_lots_won += 1;
            })
            .or_insert_with(|| WinnerProfile {
                user_id,
                user_name: user_name.to_string(),
                first_win_date: now,
                last_win_date: now,
                total_lots_won: 1,
            });
        Ok(())
    }

    async fn winner_profile(&self, user_id: i64) -> Result<Option<WinnerProfile>, String> {
        Ok(self.inner.read().await.winners.get(&user_id).cloned())
    }
}

// endregion: --- Memory Ledger
