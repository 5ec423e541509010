/// 입찰 검증 (순수 함수)
/// 규칙은 나열 순서대로 평가하고 첫 실패의 사유가 입찰자에게 전달된다.
/// 마감/상한가 검사가 인상액/단위 검사보다 먼저 걸려야 엉뚱한 안내가 나가지 않는다.
// region:    --- Imports
use crate::auction::messages;
use crate::auction::model::Lot;
use crate::settings::Settings;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Validator

/// 입찰 수락 여부 판정. Err 안의 문자열이 거절 사유(답장 본문)다.
///
/// 규칙 순서:
/// 1. 마감 시각 경과
/// 2. 상한가 초과
/// 3. 리더 없음 → 시작가 미달
/// 4. 리더 있음 → 현재가 + 최소 인상액 미달
/// 5. (토글) 입찰 단위 불일치
pub fn validate_bid(
    amount: i64,
    lot: &Lot,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<(), String> {
    if now > lot.deadline {
        return Err(messages::auction_finished(&lot.name));
    }

    if let Some(max_bid) = settings.max_bid {
        if amount > max_bid {
            return Err(messages::max_bid_exceeded(amount, max_bid));
        }
    }

    if !lot.has_leader() {
        if amount < lot.start_price {
            return Err(messages::below_start_price(lot.start_price));
        }
    } else if amount < lot.current_price + settings.min_bid_increment {
        return Err(messages::low_bid(amount, &lot.name, lot.current_price));
    }

    if settings.bid_step_enabled {
        let step = settings.bid_step;
        if step > 0 && (amount - lot.start_price) % step != 0 {
            return Err(messages::invalid_step(
                amount,
                step,
                lot.current_price + step,
                lot.current_price + step * 2,
            ));
        }
    }

    Ok(())
}

// endregion: --- Validator

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::LotStatus;
    use chrono::Duration;

    fn lot(start_price: i64, current_price: i64, leader: Option<i64>) -> Lot {
        Lot {
            lot_id: 1,
            name: "시험 로트".to_string(),
            status: LotStatus::Active,
            start_price,
            current_price,
            leader_id: leader,
            deadline: Utc::now() + Duration::hours(1),
            post_key: "-1_10".to_string(),
            attachment_id: None,
        }
    }

    /// 시작가 100, 리더 없음: 90 거절 / 150 수락
    #[test]
    fn test_first_bid_against_start_price() {
        let lot = lot(100, 100, None);
        let settings = Settings::default();
        let now = Utc::now();

        let err = validate_bid(90, &lot, &settings, now).unwrap_err();
        assert!(err.contains("시작가 100원"));

        assert!(validate_bid(150, &lot, &settings, now).is_ok());
    }

    /// 현재가 150, 최소 인상 50: 180 거절 / 200 수락
    #[test]
    fn test_min_increment_rule() {
        let lot = lot(100, 150, Some(7));
        let settings = Settings::default();
        let now = Utc::now();

        let err = validate_bid(180, &lot, &settings, now).unwrap_err();
        assert!(err.contains("현재가는 150원"));

        assert!(validate_bid(200, &lot, &settings, now).is_ok());
    }

    /// 마감 후에는 금액과 무관하게 거절
    #[test]
    fn test_deadline_passed() {
        let mut lot = lot(100, 150, Some(7));
        lot.deadline = Utc::now() - Duration::minutes(1);
        let settings = Settings::default();

        let err = validate_bid(10_000, &lot, &settings, Utc::now()).unwrap_err();
        assert!(err.contains("종료"));
    }

    /// 상한가 검사는 인상액 검사보다 먼저
    #[test]
    fn test_max_bid_precedes_increment() {
        let lot = lot(100, 150, Some(7));
        let settings = Settings {
            max_bid: Some(500),
            ..Settings::default()
        };

        // 600 은 인상액 규칙은 통과하지만 상한가 사유로 거절되어야 한다
        let err = validate_bid(600, &lot, &settings, Utc::now()).unwrap_err();
        assert!(err.contains("상한가"));
    }

    /// 입찰 단위 규칙
    #[test]
    fn test_step_rule() {
        let lot = lot(100, 150, Some(7));
        let settings = Settings {
            bid_step_enabled: true,
            bid_step: 50,
            ..Settings::default()
        };
        let now = Utc::now();

        // (230 - 100) % 50 != 0
        let err = validate_bid(230, &lot, &settings, now).unwrap_err();
        assert!(err.contains("입찰 단위"));

        // (250 - 100) % 50 == 0
        assert!(validate_bid(250, &lot, &settings, now).is_ok());
    }
}
// endregion: --- Tests
