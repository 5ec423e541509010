/// 이용자에게 보여지는 모든 문구를 한곳에 모아둔다.
/// 거절 사유는 검증기가 그대로 댓글 답장에 사용한다.
// region:    --- Imports
use crate::auction::model::Order;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Reject Reasons

/// 마감된 경매
pub fn auction_finished(lot_name: &str) -> String {
    format!("'{}' 경매는 이미 종료되었습니다.", lot_name)
}

/// 상한가 초과
pub fn max_bid_exceeded(your_bid: i64, max_bid: i64) -> String {
    format!(
        "{}원은 상한가를 넘습니다. 최대 {}원까지 입찰할 수 있습니다.",
        your_bid, max_bid
    )
}

/// 시작가 미달 (첫 입찰)
pub fn below_start_price(start_price: i64) -> String {
    format!("첫 입찰은 시작가 {}원 이상이어야 합니다.", start_price)
}

/// 현재가 + 최소 인상액 미달
pub fn low_bid(your_bid: i64, lot_name: &str, current_bid: i64) -> String {
    format!(
        "{}원으로는 '{}' 입찰에 부족합니다. 현재가는 {}원입니다.",
        your_bid, lot_name, current_bid
    )
}

/// 입찰 단위 불일치
pub fn invalid_step(your_bid: i64, bid_step: i64, example_bid: i64, example_bid2: i64) -> String {
    format!(
        "{}원은 입찰 단위({}원)에 맞지 않습니다. 예: {}원, {}원.",
        your_bid, bid_step, example_bid, example_bid2
    )
}

/// 구독자 전용
pub fn subscription_required(lot_name: &str) -> String {
    format!("'{}' 입찰은 커뮤니티 구독자만 가능합니다.", lot_name)
}

/// 거절 답장 본문 (사유 앞에 공통 접두)
pub fn bid_rejected(amount: i64, reason: &str) -> String {
    format!("입찰 {}원이 접수되지 않았습니다. {}", amount, reason)
}

// endregion: --- Reject Reasons

// region:    --- Notifications

/// 선두 자리를 내준 이전 입찰자에게 보내는 알림
pub fn outbid(lot_name: &str, new_bid: i64) -> String {
    format!(
        "'{}' 입찰이 {}원으로 경신되었습니다. 다시 입찰해 보세요!",
        lot_name, new_bid
    )
}

/// 유찰 공지 (게시글 공개 댓글)
pub fn unsold_lot_comment() -> String {
    "입찰자가 없어 이번 로트는 유찰되었습니다.".to_string()
}

/// 낙찰 축하 댓글
pub fn winner_comment(date: DateTime<Utc>, user_id: i64, user_name: &str) -> String {
    format!(
        "{} 경매 종료. 축하합니다, [id{}|{}]님! 결제 안내는 개인 메시지를 확인해 주세요.",
        date.format("%d.%m.%Y"),
        user_id,
        user_name
    )
}

/// 낙찰자 개인 주문 요약. 주문이 없으면 None
pub fn user_order_summary(orders: &[Order]) -> Option<String> {
    if orders.is_empty() {
        return None;
    }
    let mut text = String::from("낙찰 내역 안내\n\n");
    let mut total = 0;
    for (i, order) in orders.iter().enumerate() {
        text.push_str(&format!(
            "{}. 로트 №{}: {} — {}원\n",
            i + 1,
            order.lot_id,
            order.lot_name,
            order.win_price
        ));
        total += order.win_price;
    }
    text.push_str(&format!("\n합계: {}원", total));
    Some(text)
}

/// 관리자 보고 한 줄에 필요한 낙찰 정보
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub lot_id: i64,
    pub lot_name: String,
    pub price: i64,
    pub winner_id: i64,
    pub winner_name: String,
}

/// 관리자용 결산 보고
pub fn admin_report(winners: &[ReportEntry]) -> String {
    let mut text = String::from("🏆 경매 결산 🏆\n\n");
    for (i, entry) in winners.iter().enumerate() {
        text.push_str(&format!("{}. 로트 №{}: {}\n", i + 1, entry.lot_id, entry.lot_name));
        text.push_str(&format!("💰 낙찰가: {}원\n", entry.price));
        text.push_str(&format!("👤 낙찰자: [id{}|{}]\n", entry.winner_id, entry.winner_name));
        text.push_str("-------------------\n");
    }
    text
}

// endregion: --- Notifications

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::ORDER_STATUS_PENDING;

    fn order(lot_id: i64, price: i64) -> Order {
        Order {
            order_id: format!("{}-42", lot_id),
            lot_id,
            lot_name: format!("로트 {}", lot_id),
            post_key: format!("-1_{}", lot_id),
            user_id: 42,
            win_price: price,
            win_date: Utc::now(),
            status: ORDER_STATUS_PENDING.to_string(),
        }
    }

    /// 주문이 없으면 요약도 없다
    #[test]
    fn test_empty_summary_is_none() {
        assert!(user_order_summary(&[]).is_none());
    }

    /// 합계 포함 여부
    #[test]
    fn test_summary_contains_total() {
        let summary = user_order_summary(&[order(1, 1500), order(2, 500)]).unwrap();
        assert!(summary.contains("합계: 2000원"));
        assert!(summary.contains("로트 №1"));
    }

    /// 관리자 보고에 낙찰자 멘션 포함
    #[test]
    fn test_admin_report_mentions_winner() {
        let report = admin_report(&[ReportEntry {
            lot_id: 3,
            lot_name: "로트 3".to_string(),
            price: 700,
            winner_id: 42,
            winner_name: "승자".to_string(),
        }]);
        assert!(report.contains("[id42|승자]"));
        assert!(report.contains("700원"));
    }
}
// endregion: --- Tests
