/// 입찰 후보 이벤트 처리 파이프라인
/// 중복 필터 → 입찰액 추출 → 잠금 → 신선한 재조회 → 검증 → 선두 교체 → 마감 연장 → 알림
// region:    --- Imports
use crate::auction::events::WallComment;
use crate::auction::messages;
use crate::auction::model::{build_post_key, parse_post_key, Bid, BidStatus, LotStatus};
use crate::bidding::parser::parse_bid;
use crate::bidding::validator::validate_bid;
use crate::context::BotContext;
use crate::vk::reply_once;
use chrono::Duration;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Constants

/// 웹훅 재전송 윈도우보다만 길면 되는 중복 필터 TTL
const REPLY_DEDUP_TTL: StdDuration = StdDuration::from_secs(300);

// endregion: --- Constants

// region:    --- Wall Reply Pipeline

/// wall_reply_new 이벤트 한 건 처리.
///
/// 입찰이 아닌 댓글과 중복 전달은 조용히 버린다.
/// Err 는 잠금 시간 초과나 원장 장애처럼 이벤트를 떨어뜨린 경우에만 돌려준다.
pub async fn handle_wall_reply(
    ctx: &BotContext,
    comment: &WallComment,
    group_id: i64,
) -> Result<(), String> {
    // 그룹(페이지) 명의 댓글은 무시. 봇 자신의 답장도 여기에 걸린다
    if comment.from_id < 0 {
        return Ok(());
    }

    // 중복 전달 필터
    let dedup_key = format!("reply:{}", comment.id);
    if ctx.cache.seen_or_mark(&dedup_key, REPLY_DEDUP_TTL).await {
        return Ok(());
    }

    // 이미 원장에 기록된 댓글이면 재전달이다
    if ctx.ledger.bid_exists_for_comment(comment.id).await? {
        return Ok(());
    }

    let owner_id = if group_id != 0 {
        group_id
    } else {
        ctx.settings.group_id
    };
    let post_key = build_post_key(owner_id, comment.post_id);

    // 로트가 없는 게시글의 댓글은 잡음이다
    let Some(lot) = ctx.ledger.find_lot_by_post_key(&post_key).await? else {
        return Ok(());
    };

    if lot.status != LotStatus::Active {
        info!(
            "{:<12} --> 비활성 로트 {} ({:?})의 입찰 시도 무시",
            "Bidding", lot.lot_id, lot.status
        );
        return Ok(());
    }

    // 입찰액이 없는 댓글도 잡음이다
    let Some(amount) = parse_bid(&comment.text) else {
        return Ok(());
    };

    let bid_time = comment.timestamp();
    let post_id = parse_post_key(&post_key).unwrap_or(comment.post_id);

    // ----- 임계 구역 시작 -----
    let guard = match ctx.acquire_gate().await {
        Ok(g) => g,
        Err(e) => {
            error!(
                "{:<12} --> 이벤트 폐기 (comment {}): {}",
                "Bidding", comment.id, e
            );
            return Err(e);
        }
    };

    // 잠금 획득 전 상태는 이미 낡았을 수 있다. 반드시 다시 읽는다.
    let Some(lot) = ctx.ledger.find_lot_by_post_key(&post_key).await? else {
        warn!("{:<12} --> 로트가 사라짐: {}", "Bidding", post_key);
        return Ok(());
    };

    // 잠금을 기다리는 사이 스윕이 로트를 종결했을 수 있다
    if lot.status != LotStatus::Active {
        info!(
            "{:<12} --> 잠금 대기 중 종결된 로트 {} ({:?}), 입찰 버림",
            "Bidding", lot.lot_id, lot.status
        );
        return Ok(());
    }

    // 순수 규칙 + 구독 게이트
    let mut verdict = validate_bid(amount, &lot, &ctx.settings, bid_time);
    if verdict.is_ok() && ctx.settings.subscription_check_enabled {
        match ctx.api.is_subscriber(comment.from_id).await {
            Ok(true) => {}
            Ok(false) => verdict = Err(messages::subscription_required(&lot.name)),
            Err(e) => {
                // 확인 실패 시 입찰자를 막지 않는다
                warn!("{:<12} --> 구독 확인 실패: {}", "Bidding", e);
            }
        }
    }

    if let Err(reason) = verdict {
        drop(guard);
        info!(
            "{:<12} --> 입찰 {}원 거절 (lot {}): {}",
            "Bidding", amount, lot.lot_id, reason
        );
        let text = messages::bid_rejected(amount, &reason);
        reply_once(&*ctx.api, post_id, comment.id, &text).await;
        return Ok(());
    }

    // 선두 교체: 이전 리더를 outbid 로, 새 입찰을 leader 로
    let old_leader = ctx.ledger.leader_bid(lot.lot_id).await?;
    if let Some(old) = &old_leader {
        ctx.ledger
            .update_bid_status(old.bid_id, BidStatus::Outbid)
            .await?;
    }

    let bid = Bid {
        bid_id: Uuid::new_v4(),
        lot_id: lot.lot_id,
        post_id,
        user_id: comment.from_id,
        amount,
        timestamp: bid_time,
        comment_id: comment.id,
        status: BidStatus::Leader,
    };
    ctx.ledger.append_bid(&bid).await?;
    ctx.ledger
        .update_lot_price(lot.lot_id, amount, comment.from_id)
        .await?;

    info!(
        "{:<12} --> 입찰 수락: lot {} / {}원 / user {}",
        "Bidding", lot.lot_id, amount, comment.from_id
    );

    // 안티 스나이핑: 마감 임박 입찰은 마감을 입찰 시각 + 윈도우로 민다
    if !ctx.settings.test_mode_enabled {
        let window = Duration::minutes(ctx.settings.anti_snipe_window_min);
        if lot.deadline - bid_time <= window {
            let new_deadline = bid_time + window;
            ctx.ledger
                .update_lot_deadline(lot.lot_id, new_deadline)
                .await?;
            info!(
                "{:<12} --> 안티 스나이핑: lot {} 마감을 {} 로 연장",
                "Bidding", lot.lot_id, new_deadline
            );
        }
    }

    drop(guard);
    // ----- 임계 구역 끝 -----

    // 밀려난 이전 리더에게 알림 (답장 1회 정책)
    if let Some(old) = old_leader {
        let text = messages::outbid(&lot.name, amount);
        if reply_once(&*ctx.api, post_id, old.comment_id, &text).await {
            ctx.ledger
                .update_bid_status(old.bid_id, BidStatus::Notified)
                .await?;
        }
    } else {
        debug!("{:<12} --> 첫 입찰, 알림 대상 없음", "Bidding");
    }

    Ok(())
}

// endregion: --- Wall Reply Pipeline
