/// 콜백 웹훅 처리
/// 플랫폼은 본문과 무관하게 "ok" 를 기대하므로, 처리 실패도 밖으로는 "ok" 다.
/// (오류는 로그로 남고, 재전송은 중복 필터가 흡수한다)
// region:    --- Imports
use crate::auction::events::InboundEvent;
use crate::bidding::commands::handle_wall_reply;
use crate::context::BotContext;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Webhook Handler

/// 콜백 엔드포인트
pub async fn handle_callback(
    State(ctx): State<Arc<BotContext>>,
    Json(event): Json<InboundEvent>,
) -> impl IntoResponse {
    match event {
        // 콜백 서버 등록 확인
        InboundEvent::Confirmation { group_id } => {
            info!("{:<12} --> 콜백 확인 요청 (group {})", "Webhook", group_id);
            ctx.settings.confirmation_code.clone()
        }
        // 입찰 후보 댓글
        InboundEvent::WallReplyNew { object, group_id } => {
            debug!(
                "{:<12} --> wall_reply_new: comment {} / user {}",
                "Webhook", object.id, object.from_id
            );
            if let Err(e) = handle_wall_reply(&ctx, &object, group_id).await {
                error!(
                    "{:<12} --> 댓글 {} 처리 실패: {}",
                    "Webhook", object.id, e
                );
            }
            "ok".to_string()
        }
        // 닫힌 집합 밖의 이벤트는 수신 확인만
        InboundEvent::Unknown => {
            debug!("{:<12} --> 대상 아님, 무시", "Webhook");
            "ok".to_string()
        }
    }
}

/// 헬스 체크
pub async fn handle_health() -> impl IntoResponse {
    "ok"
}

// endregion: --- Webhook Handler
