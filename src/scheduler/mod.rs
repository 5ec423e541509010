/// 마감 처리 스케줄러
/// 주기적으로 마감이 지난 활성 로트를 sold/unsold 로 종결하고, 주문 생성과
/// 낙찰자/관리자 알림까지 이어간다. 스윕 전체는 몇 번을 다시 불러도 안전하다.
// region:    --- Imports
use crate::auction::messages::{self, ReportEntry};
use crate::auction::model::{
    parse_post_key, Lot, LotStatus, Order, ORDER_STATUS_PENDING,
};
use crate::context::BotContext;
use crate::vk::reply_once;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Finalize Scheduler

/// 주기 스케줄러. 외부 크론 대신 프로세스 내 interval 태스크가 스윕을 돌린다.
pub struct FinalizeScheduler {
    ctx: Arc<BotContext>,
}

impl FinalizeScheduler {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// 스케줄러 시작
    pub async fn start(&self) {
        let ctx = Arc::clone(&self.ctx);
        let period = Duration::from_secs(ctx.settings.finalize_interval_secs);
        tokio::spawn(async move {
            let mut interval = interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = finalize_due_lots(&ctx).await {
                    error!("{:<12} --> 마감 처리 중 오류: {}", "Scheduler", e);
                }
            }
        });
    }
}

// endregion: --- Finalize Scheduler

// region:    --- Finalize Sweep

/// 마감이 지난 활성 로트를 전부 종결한다.
///
/// 로트마다 잠금 아래에서 상태를 다시 읽고, 여전히 활성일 때만 변이한다.
/// 이 종결 상태 가드 덕분에 스윕 재호출은 로트별로 멱등이다.
pub async fn finalize_due_lots(ctx: &BotContext) -> Result<(), String> {
    let now = Utc::now();
    let due = ctx.ledger.due_lots(now).await?;

    if !due.is_empty() {
        info!("{:<12} --> 마감 대상 로트 {}건", "Finalize", due.len());
    }

    for stale in due {
        if let Err(e) = finalize_lot(ctx, &stale).await {
            // 한 로트의 실패가 나머지 스윕을 멈추지 않는다
            error!(
                "{:<12} --> lot {} 종결 실패: {}",
                "Finalize", stale.lot_id, e
            );
        }
    }

    send_all_summaries(ctx).await
}

/// 로트 한 건 종결
async fn finalize_lot(ctx: &BotContext, stale: &Lot) -> Result<(), String> {
    // 낙찰자 이름은 외부 조회라서 잠금 밖에서 미리 가져온다
    let prefetched_name = match stale.leader_id {
        Some(user_id) => ctx.api.user_name(user_id).await.ok(),
        None => None,
    };

    // ----- 임계 구역: 확인 후 변이 -----
    let guard = ctx.acquire_gate().await?;

    // 선택과 처리 사이에 막판 입찰이 마감을 밀었을 수 있다
    let Some(lot) = ctx.ledger.get_lot(stale.lot_id).await? else {
        warn!("{:<12} --> lot {} 이(가) 사라짐, 건너뜀", "Finalize", stale.lot_id);
        return Ok(());
    };
    if lot.status != LotStatus::Active {
        debug!("{:<12} --> lot {} 은 이미 종결됨", "Finalize", lot.lot_id);
        return Ok(());
    }
    if lot.deadline >= Utc::now() {
        debug!("{:<12} --> lot {} 마감이 연장됨, 건너뜀", "Finalize", lot.lot_id);
        return Ok(());
    }

    let Some(post_id) = parse_post_key(&lot.post_key) else {
        warn!(
            "{:<12} --> lot {} 의 게시글 키 해석 불가: {}",
            "Finalize", lot.lot_id, lot.post_key
        );
        return Ok(());
    };

    match lot.leader_id {
        // 입찰자가 없으면 유찰
        None => {
            ctx.ledger
                .update_lot_status(lot.lot_id, LotStatus::Unsold)
                .await?;
            drop(guard);

            info!("{:<12} --> lot {} 유찰", "Finalize", lot.lot_id);
            if let Err(e) = ctx
                .api
                .post_public_comment(post_id, &messages::unsold_lot_comment())
                .await
            {
                error!("{:<12} --> 유찰 공지 실패 (lot {}): {}", "Finalize", lot.lot_id, e);
            }
        }
        // 낙찰 처리: 주문 생성, 낙찰자 카운터, 상태 전환
        Some(winner_id) => {
            let winner_name = match (stale.leader_id, prefetched_name) {
                (Some(id), Some(name)) if id == winner_id => name,
                _ => format!("id{}", winner_id),
            };
            let win_date = Utc::now();

            let order = Order {
                order_id: format!("{}-{}", lot.lot_id, winner_id),
                lot_id: lot.lot_id,
                lot_name: lot.name.clone(),
                post_key: lot.post_key.clone(),
                user_id: winner_id,
                win_price: lot.current_price,
                win_date,
                status: ORDER_STATUS_PENDING.to_string(),
            };
            ctx.ledger.create_order(&order).await?;
            ctx.ledger.record_win(winner_id, &winner_name, win_date).await?;
            ctx.ledger
                .update_lot_status(lot.lot_id, LotStatus::Sold)
                .await?;
            drop(guard);

            info!(
                "{:<12} --> lot {} 낙찰: user {} / {}원",
                "Finalize", lot.lot_id, winner_id, lot.current_price
            );

            // 낙찰자의 가장 최근 입찰 댓글에 축하 답장 (답장 1회 정책)
            if let Some(latest) = ctx
                .ledger
                .latest_bid_for_user(lot.lot_id, winner_id)
                .await?
            {
                let text = messages::winner_comment(win_date, winner_id, &winner_name);
                reply_once(&*ctx.api, post_id, latest.comment_id, &text).await;
            }
        }
    }

    Ok(())
}

// endregion: --- Finalize Sweep

// region:    --- Daily Summaries

/// 하루 한 번의 결산 발송.
///
/// 모든 로트가 종결된 뒤에만 돌고, 전 구간 발송이 성공해야 마커를 남긴다.
/// 일부 실패 시 마커가 없으므로 다음 스윕이 남은 발송을 마저 해낸다.
pub async fn send_all_summaries(ctx: &BotContext) -> Result<(), String> {
    let marker_key = format!("summary_sent:{}", Utc::now().format("%Y-%m-%d"));
    if ctx.markers.is_set(&marker_key).await? {
        return Ok(());
    }

    let active = ctx.ledger.active_lot_count().await?;
    if active > 0 {
        debug!(
            "{:<12} --> 결산 보류: 활성 로트 {}건 남음",
            "Summary", active
        );
        return Ok(());
    }

    let sold = ctx.ledger.sold_lots().await?;
    if sold.is_empty() {
        return Ok(());
    }

    // 낙찰자별 묶음
    let mut winners_map: BTreeMap<i64, Vec<Lot>> = BTreeMap::new();
    for lot in sold {
        if let Some(user_id) = lot.leader_id {
            winners_map.entry(user_id).or_default().push(lot);
        }
    }

    let mut all_sent = true;
    let mut report: Vec<ReportEntry> = Vec::new();

    for (user_id, lots) in winners_map {
        let winner_name = ctx
            .api
            .user_name(user_id)
            .await
            .unwrap_or_else(|_| format!("id{}", user_id));

        if ctx.settings.send_winner_dm_enabled {
            let orders = ctx.ledger.pending_orders_for_user(user_id).await?;
            // 결제할 것이 없는 이용자는 건너뛴다
            if let Some(summary) = messages::user_order_summary(&orders) {
                match ctx.api.send_direct_message(user_id, &summary).await {
                    Ok(()) => info!("{:<12} --> 낙찰자 {} 에게 결산 발송", "Summary", user_id),
                    Err(e) => {
                        error!("{:<12} --> 낙찰자 {} 발송 실패: {}", "Summary", user_id, e);
                        all_sent = false;
                    }
                }
            }
        }

        for lot in lots {
            report.push(ReportEntry {
                lot_id: lot.lot_id,
                lot_name: lot.name,
                price: lot.current_price,
                winner_id: user_id,
                winner_name: winner_name.clone(),
            });
        }
    }

    if !report.is_empty() {
        if ctx.settings.admin_ids.is_empty() {
            info!("{:<12} --> 관리자 id 미설정, 결산 보고 생략", "Summary");
        } else {
            let text = messages::admin_report(&report);
            // 관리자 개별 실패는 격리하고 나머지 발송을 계속한다
            for admin_id in &ctx.settings.admin_ids {
                if let Err(e) = ctx.api.send_direct_message(*admin_id, &text).await {
                    error!(
                        "{:<12} --> 관리자 {} 보고 실패: {}",
                        "Summary", admin_id, e
                    );
                    all_sent = false;
                }
            }
        }
    }

    if all_sent {
        ctx.markers.set(&marker_key).await?;
        info!("{:<12} --> 일일 결산 완료", "Summary");
    } else {
        warn!(
            "{:<12} --> 일부 발송 실패, 마커를 남기지 않고 다음 스윕에서 재시도",
            "Summary"
        );
    }

    Ok(())
}

// endregion: --- Daily Summaries
