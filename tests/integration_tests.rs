/// 인메모리 원장과 기록용 API 를 주입한 코어 파이프라인 통합 테스트
// region:    --- Imports
use async_trait::async_trait;
use auction_bot::auction::events::WallComment;
use auction_bot::auction::model::{build_post_key, Bid, BidStatus, Lot, LotStatus};
use auction_bot::bidding::commands::handle_wall_reply;
use auction_bot::cache::{MemoryEventCache, MemoryMarkerStore};
use auction_bot::context::BotContext;
use auction_bot::ledger::{AuctionLedger, MemoryLedger};
use auction_bot::scheduler::{finalize_due_lots, send_all_summaries};
use auction_bot::settings::Settings;
use auction_bot::vk::SocialApi;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// endregion: --- Imports

// region:    --- Recording Api

/// 발송 내역을 기록만 하는 플랫폼 API 대역
#[derive(Default)]
struct RecordingApi {
    dms: Mutex<Vec<(i64, String)>>,
    replies: Mutex<Vec<(i64, i64, String)>>,
    comments: Mutex<Vec<(i64, String)>>,
    /// 이 이용자에게 가는 개인 메시지는 실패한다
    failing_dm_users: Mutex<HashSet<i64>>,
}

impl RecordingApi {
    fn dm_count(&self) -> usize {
        self.dms.lock().unwrap().len()
    }

    fn reply_count(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    fn comment_count(&self) -> usize {
        self.comments.lock().unwrap().len()
    }

    fn fail_dm_for(&self, user_id: i64) {
        self.failing_dm_users.lock().unwrap().insert(user_id);
    }

    fn heal(&self) {
        self.failing_dm_users.lock().unwrap().clear();
    }
}

#[async_trait]
impl SocialApi for RecordingApi {
    async fn send_direct_message(&self, user_id: i64, text: &str) -> Result<(), String> {
        if self.failing_dm_users.lock().unwrap().contains(&user_id) {
            return Err("메시지 발송 거부".to_string());
        }
        self.dms.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }

    async fn reply_to_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        text: &str,
    ) -> Result<(), String> {
        self.replies
            .lock()
            .unwrap()
            .push((post_id, comment_id, text.to_string()));
        Ok(())
    }

    async fn post_public_comment(&self, post_id: i64, text: &str) -> Result<(), String> {
        self.comments
            .lock()
            .unwrap()
            .push((post_id, text.to_string()));
        Ok(())
    }

    async fn has_bot_replied(&self, post_id: i64, comment_id: i64) -> Result<bool, String> {
        Ok(self
            .replies
            .lock()
            .unwrap()
            .iter()
            .any(|(p, c, _)| *p == post_id && *c == comment_id))
    }

    async fn is_subscriber(&self, _user_id: i64) -> Result<bool, String> {
        Ok(true)
    }

    async fn user_name(&self, user_id: i64) -> Result<String, String> {
        Ok(format!("이용자{}", user_id))
    }
}

// endregion: --- Recording Api

// region:    --- Fixtures

const GROUP_ID: i64 = 1;

fn make_ctx(settings: Settings) -> (Arc<BotContext>, Arc<MemoryLedger>, Arc<RecordingApi>) {
    let ledger = Arc::new(MemoryLedger::new());
    let api = Arc::new(RecordingApi::default());
    let ctx = Arc::new(BotContext::new(
        settings,
        ledger.clone(),
        api.clone(),
        Arc::new(MemoryEventCache::new()),
        Arc::new(MemoryMarkerStore::new()),
    ));
    (ctx, ledger, api)
}

fn lot(lot_id: i64, post_id: i64, start_price: i64, deadline: DateTime<Utc>) -> Lot {
    Lot {
        lot_id,
        name: format!("로트 {}", lot_id),
        status: LotStatus::Active,
        start_price,
        current_price: start_price,
        leader_id: None,
        deadline,
        post_key: build_post_key(GROUP_ID, post_id),
        attachment_id: None,
    }
}

fn comment(id: i64, from_id: i64, post_id: i64, text: &str, at: DateTime<Utc>) -> WallComment {
    WallComment {
        id,
        from_id,
        post_id,
        text: text.to_string(),
        date: at.timestamp(),
    }
}

async fn leader_bids(ledger: &MemoryLedger, lot_id: i64) -> Vec<Bid> {
    ledger
        .bid_history(lot_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|b| b.status == BidStatus::Leader)
        .collect()
}

// endregion: --- Fixtures

// region:    --- Bidding Tests

/// 시작가 100: 90 거절, 150 수락
#[tokio::test]
async fn test_first_bid_scenario() {
    let (ctx, ledger, api) = make_ctx(Settings::default());
    let deadline = Utc::now() + Duration::hours(1);
    ledger.insert_lot(lot(1, 10, 100, deadline)).await;
    let now = Utc::now();

    handle_wall_reply(&ctx, &comment(101, 500, 10, "90", now), GROUP_ID)
        .await
        .unwrap();

    let current = ledger.get_lot(1).await.unwrap().unwrap();
    assert_eq!(current.current_price, 100);
    assert!(current.leader_id.is_none());
    assert_eq!(api.reply_count(), 1);
    assert!(api.replies.lock().unwrap()[0].2.contains("접수되지 않았습니다"));

    handle_wall_reply(&ctx, &comment(102, 500, 10, "150", now), GROUP_ID)
        .await
        .unwrap();

    let current = ledger.get_lot(1).await.unwrap().unwrap();
    assert_eq!(current.current_price, 150);
    assert_eq!(current.leader_id, Some(500));
    assert_eq!(leader_bids(&ledger, 1).await.len(), 1);
}

/// 현재가 150 / 최소 인상 50: 180 거절, 200 수락 후 이전 리더 교체
#[tokio::test]
async fn test_outbid_flow() {
    let (ctx, ledger, api) = make_ctx(Settings::default());
    let deadline = Utc::now() + Duration::hours(1);
    ledger.insert_lot(lot(1, 10, 100, deadline)).await;
    let now = Utc::now();

    handle_wall_reply(&ctx, &comment(201, 500, 10, "150", now), GROUP_ID)
        .await
        .unwrap();
    handle_wall_reply(&ctx, &comment(202, 501, 10, "180", now), GROUP_ID)
        .await
        .unwrap();

    // 180 은 150 + 50 미달로 거절
    let current = ledger.get_lot(1).await.unwrap().unwrap();
    assert_eq!(current.current_price, 150);
    assert_eq!(current.leader_id, Some(500));

    handle_wall_reply(&ctx, &comment(203, 501, 10, "200", now), GROUP_ID)
        .await
        .unwrap();

    let current = ledger.get_lot(1).await.unwrap().unwrap();
    assert_eq!(current.current_price, 200);
    assert_eq!(current.leader_id, Some(501));

    // 이전 리더는 밀려나고 알림까지 발송됨
    let history = ledger.bid_history(1).await.unwrap();
    let old = history.iter().find(|b| b.comment_id == 201).unwrap();
    assert_eq!(old.status, BidStatus::Notified);
    assert_eq!(leader_bids(&ledger, 1).await.len(), 1);
    assert!(api
        .replies
        .lock()
        .unwrap()
        .iter()
        .any(|(_, c, text)| *c == 201 && text.contains("경신")));
}

/// 동시 입찰 50건에서도 리더는 정확히 하나, 가격은 최고 수락가
#[tokio::test]
async fn test_concurrent_bids_single_leader() {
    let (ctx, ledger, _api) = make_ctx(Settings::default());
    let deadline = Utc::now() + Duration::hours(1);
    ledger.insert_lot(lot(1, 10, 100, deadline)).await;
    let now = Utc::now();

    let mut handles = vec![];
    for i in 1..=50i64 {
        let ctx = Arc::clone(&ctx);
        let c = comment(300 + i, 500 + i, 10, &format!("{}", 100 + i * 50), now);
        handles.push(tokio::spawn(async move {
            handle_wall_reply(&ctx, &c, GROUP_ID).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let current = ledger.get_lot(1).await.unwrap().unwrap();
    assert_eq!(current.current_price, 100 + 50 * 50);
    assert_eq!(current.leader_id, Some(550));

    let leaders = leader_bids(&ledger, 1).await;
    assert_eq!(leaders.len(), 1);
    assert_eq!(leaders[0].amount, current.current_price);
}

/// 같은 이벤트 두 번 전달 → 원장 변이는 한 번
#[tokio::test]
async fn test_duplicate_event_suppression() {
    let (ctx, ledger, _api) = make_ctx(Settings::default());
    let deadline = Utc::now() + Duration::hours(1);
    ledger.insert_lot(lot(1, 10, 100, deadline)).await;
    let now = Utc::now();

    let c = comment(401, 500, 10, "150", now);
    handle_wall_reply(&ctx, &c, GROUP_ID).await.unwrap();
    handle_wall_reply(&ctx, &c, GROUP_ID).await.unwrap();

    assert_eq!(ledger.bid_history(1).await.unwrap().len(), 1);
}

/// 마감 5분 전 입찰 → 마감이 입찰 시각 + 10분으로 연장.
/// 마감 15분 전 입찰 → 마감 유지
#[tokio::test]
async fn test_anti_snipe_extension() {
    let (ctx, ledger, _api) = make_ctx(Settings::default());
    let now = Utc::now();

    ledger.insert_lot(lot(1, 10, 100, now + Duration::minutes(5))).await;
    ledger.insert_lot(lot(2, 20, 100, now + Duration::minutes(15))).await;

    let c1 = comment(501, 500, 10, "150", now);
    handle_wall_reply(&ctx, &c1, GROUP_ID).await.unwrap();
    let extended = ledger.get_lot(1).await.unwrap().unwrap();
    assert_eq!(extended.deadline, c1.timestamp() + Duration::minutes(10));

    let far_deadline = ledger.get_lot(2).await.unwrap().unwrap().deadline;
    handle_wall_reply(&ctx, &comment(502, 500, 20, "150", now), GROUP_ID)
        .await
        .unwrap();
    let unchanged = ledger.get_lot(2).await.unwrap().unwrap();
    assert_eq!(unchanged.deadline, far_deadline);
}

/// 비입찰 댓글과 그룹 명의 댓글은 조용히 무시
#[tokio::test]
async fn test_noise_is_ignored() {
    let (ctx, ledger, api) = make_ctx(Settings::default());
    let deadline = Utc::now() + Duration::hours(1);
    ledger.insert_lot(lot(1, 10, 100, deadline)).await;
    let now = Utc::now();

    handle_wall_reply(&ctx, &comment(601, 500, 10, "멋지네요!", now), GROUP_ID)
        .await
        .unwrap();
    handle_wall_reply(&ctx, &comment(602, -GROUP_ID, 10, "9999", now), GROUP_ID)
        .await
        .unwrap();
    // 로트가 없는 게시글
    handle_wall_reply(&ctx, &comment(603, 500, 99, "9999", now), GROUP_ID)
        .await
        .unwrap();

    assert!(ledger.bid_history(1).await.unwrap().is_empty());
    assert_eq!(api.reply_count(), 0);
}

/// 잠금을 기다리는 사이 스윕이 로트를 종결하면 입찰은 버려진다
#[tokio::test]
async fn test_bid_dropped_when_lot_finalized_while_waiting() {
    let (ctx, ledger, api) = make_ctx(Settings::default());
    let deadline = Utc::now() + Duration::hours(1);
    ledger.insert_lot(lot(1, 10, 100, deadline)).await;
    let now = Utc::now();

    // 스윕이 잠금을 쥔 동안 도착한 입찰을 재현한다
    let guard = ctx.acquire_gate().await.unwrap();
    let pending = {
        let ctx = Arc::clone(&ctx);
        let c = comment(1101, 500, 10, "150", now);
        tokio::spawn(async move { handle_wall_reply(&ctx, &c, GROUP_ID).await })
    };
    // 입찰이 사전 검사를 지나 잠금 앞에서 기다릴 때까지 양보
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // 스윕이 하는 일: 잠금 아래에서 로트 종결
    ledger.update_lot_status(1, LotStatus::Sold).await.unwrap();
    drop(guard);

    pending.await.unwrap().unwrap();

    // 종결된 로트는 어떤 입찰로도 변하지 않는다
    let closed = ledger.get_lot(1).await.unwrap().unwrap();
    assert_eq!(closed.status, LotStatus::Sold);
    assert_eq!(closed.current_price, 100);
    assert!(closed.leader_id.is_none());
    assert!(ledger.bid_history(1).await.unwrap().is_empty());
    assert_eq!(api.reply_count(), 0);
}

// endregion: --- Bidding Tests

// region:    --- Finalize Tests

/// 리더 없는 로트: 유찰 처리 + 공지 1회. 재실행해도 공지는 1회
#[tokio::test]
async fn test_finalize_unsold_idempotent() {
    let (ctx, ledger, api) = make_ctx(Settings::default());
    ledger
        .insert_lot(lot(1, 10, 100, Utc::now() - Duration::minutes(1)))
        .await;

    finalize_due_lots(&ctx).await.unwrap();

    let closed = ledger.get_lot(1).await.unwrap().unwrap();
    assert_eq!(closed.status, LotStatus::Unsold);
    assert_eq!(api.comment_count(), 1);

    finalize_due_lots(&ctx).await.unwrap();
    assert_eq!(api.comment_count(), 1);
    assert_eq!(ledger.get_lot(1).await.unwrap().unwrap().status, LotStatus::Unsold);
}

/// 리더 있는 로트: 주문 1건, 낙찰 카운터 +1, 축하 답장 1회. 재실행은 무변이
#[tokio::test]
async fn test_finalize_sold_idempotent() {
    let (ctx, ledger, api) = make_ctx(Settings {
        admin_ids: vec![900],
        ..Settings::default()
    });
    ledger
        .insert_lot(lot(1, 10, 100, Utc::now() - Duration::minutes(1)))
        .await;

    // 마감 한참 전의 입찰이라 안티 스나이핑 연장은 없다
    let bid_time = Utc::now() - Duration::minutes(20);
    handle_wall_reply(&ctx, &comment(701, 500, 10, "150", bid_time), GROUP_ID)
        .await
        .unwrap();
    assert!(ledger.get_lot(1).await.unwrap().unwrap().deadline < Utc::now());

    finalize_due_lots(&ctx).await.unwrap();

    let closed = ledger.get_lot(1).await.unwrap().unwrap();
    assert_eq!(closed.status, LotStatus::Sold);

    let orders = ledger.pending_orders_for_user(500).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_id, "1-500");
    assert_eq!(orders[0].win_price, 150);

    let profile = ledger.winner_profile(500).await.unwrap().unwrap();
    assert_eq!(profile.total_lots_won, 1);

    // 낙찰 축하 답장이 입찰 댓글에 한 번
    assert!(api
        .replies
        .lock()
        .unwrap()
        .iter()
        .any(|(_, c, text)| *c == 701 && text.contains("축하")));

    let replies_before = api.reply_count();
    let dms_before = api.dm_count();

    finalize_due_lots(&ctx).await.unwrap();

    assert_eq!(ledger.pending_orders_for_user(500).await.unwrap().len(), 1);
    assert_eq!(
        ledger.winner_profile(500).await.unwrap().unwrap().total_lots_won,
        1
    );
    assert_eq!(api.reply_count(), replies_before);
    assert_eq!(api.dm_count(), dms_before);
}

/// 활성 로트가 남아 있으면 결산은 보류
#[tokio::test]
async fn test_summary_deferred_while_lots_active() {
    let (ctx, ledger, api) = make_ctx(Settings {
        admin_ids: vec![900],
        ..Settings::default()
    });
    ledger
        .insert_lot(lot(1, 10, 100, Utc::now() - Duration::hours(1)))
        .await;
    // 아직 마감되지 않은 두 번째 로트
    ledger
        .insert_lot(lot(2, 20, 100, Utc::now() + Duration::hours(1)))
        .await;

    let now = Utc::now() - Duration::hours(2);
    handle_wall_reply(&ctx, &comment(801, 500, 10, "150", now), GROUP_ID)
        .await
        .unwrap();

    finalize_due_lots(&ctx).await.unwrap();

    // 낙찰 처리 자체는 됐지만 결산 발송은 없다
    assert_eq!(ledger.get_lot(1).await.unwrap().unwrap().status, LotStatus::Sold);
    assert_eq!(api.dm_count(), 0);
}

/// 결산은 하루 한 번: 성공 후 재호출은 추가 발송 0건
#[tokio::test]
async fn test_daily_summary_idempotent() {
    let (ctx, ledger, api) = make_ctx(Settings {
        admin_ids: vec![900, 901],
        ..Settings::default()
    });
    ledger
        .insert_lot(lot(1, 10, 100, Utc::now() - Duration::hours(1)))
        .await;

    let bid_time = Utc::now() - Duration::hours(2);
    handle_wall_reply(&ctx, &comment(901, 500, 10, "150", bid_time), GROUP_ID)
        .await
        .unwrap();

    finalize_due_lots(&ctx).await.unwrap();

    // 낙찰자 1 + 관리자 2
    assert_eq!(api.dm_count(), 3);

    send_all_summaries(&ctx).await.unwrap();
    assert_eq!(api.dm_count(), 3);
}

/// 일부 발송 실패 시 마커가 남지 않아 다음 스윕이 마저 발송한다
#[tokio::test]
async fn test_summary_partial_failure_retries() {
    let (ctx, ledger, api) = make_ctx(Settings {
        admin_ids: vec![900],
        ..Settings::default()
    });
    ledger
        .insert_lot(lot(1, 10, 100, Utc::now() - Duration::hours(1)))
        .await;

    let bid_time = Utc::now() - Duration::hours(2);
    handle_wall_reply(&ctx, &comment(1001, 500, 10, "150", bid_time), GROUP_ID)
        .await
        .unwrap();

    api.fail_dm_for(900);
    finalize_due_lots(&ctx).await.unwrap();

    // 낙찰자에게는 갔지만 관리자 발송이 실패 → 마커 없음
    assert_eq!(api.dm_count(), 1);

    api.heal();
    send_all_summaries(&ctx).await.unwrap();

    // 재시도에서 낙찰자 재발송(최소 1회 보장) + 관리자 보고 성공
    assert_eq!(api.dm_count(), 3);

    // 이제 마커가 있으므로 추가 발송 없음
    send_all_summaries(&ctx).await.unwrap();
    assert_eq!(api.dm_count(), 3);
}

// endregion: --- Finalize Tests
