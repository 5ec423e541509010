/// 런타임 설정
/// 경매 규칙(최소 인상액, 입찰 단위, 상한가)과 기능 토글은 전부 환경 변수로 주입한다.
// region:    --- Imports
use std::time::Duration;

// endregion: --- Imports

// region:    --- Settings

/// 봇 전역 설정
#[derive(Debug, Clone)]
pub struct Settings {
    /// 콜백 확인(confirmation) 응답 코드
    pub confirmation_code: String,
    /// 그룹(커뮤니티) id, 양수로 보관
    pub group_id: i64,
    /// 관리자 id 목록 (일일 결산 보고 수신자)
    pub admin_ids: Vec<i64>,
    /// 입찰 상한가. 없으면 무제한
    pub max_bid: Option<i64>,
    /// 리더가 있을 때의 최소 인상액
    pub min_bid_increment: i64,
    /// 입찰 단위 규칙 사용 여부
    pub bid_step_enabled: bool,
    /// 입찰 단위
    pub bid_step: i64,
    /// 구독자 전용 입찰 여부
    pub subscription_check_enabled: bool,
    /// 낙찰자 개인 메시지 발송 여부
    pub send_winner_dm_enabled: bool,
    /// 테스트 모드 (안티 스나이핑 연장 생략)
    pub test_mode_enabled: bool,
    /// 안티 스나이핑 윈도우 (분)
    pub anti_snipe_window_min: i64,
    /// 원장 잠금 대기 한도 (초)
    pub lock_timeout_secs: u64,
    /// 마감 처리 스윕 주기 (초)
    pub finalize_interval_secs: u64,
    /// 웹 서버 바인드 주소
    pub bind_addr: String,
}

impl Settings {
    /// 환경 변수에서 설정 로드. 필수 값이 없으면 기동 단계에서 바로 실패한다.
    pub fn from_env() -> Self {
        Settings {
            confirmation_code: std::env::var("VK_CONFIRMATION_CODE").unwrap_or_default(),
            group_id: env_i64("VK_GROUP_ID", 0),
            admin_ids: parse_admin_ids(&std::env::var("ADMIN_IDS").unwrap_or_default()),
            max_bid: std::env::var("MAX_BID").ok().and_then(|v| v.parse().ok()),
            min_bid_increment: env_i64("MIN_BID_INCREMENT", 50),
            bid_step_enabled: env_flag("BID_STEP_ENABLED", false),
            bid_step: env_i64("BID_STEP", 50),
            subscription_check_enabled: env_flag("SUBSCRIPTION_CHECK_ENABLED", false),
            send_winner_dm_enabled: env_flag("SEND_WINNER_DM_ENABLED", true),
            test_mode_enabled: env_flag("TEST_MODE_ENABLED", false),
            anti_snipe_window_min: env_i64("ANTI_SNIPE_WINDOW_MIN", 10),
            lock_timeout_secs: env_i64("LOCK_TIMEOUT_SECS", 5) as u64,
            finalize_interval_secs: env_i64("FINALIZE_INTERVAL_SECS", 60) as u64,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }

    /// 원장 잠금 대기 한도
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            confirmation_code: String::new(),
            group_id: 0,
            admin_ids: Vec::new(),
            max_bid: None,
            min_bid_increment: 50,
            bid_step_enabled: false,
            bid_step: 50,
            subscription_check_enabled: false,
            send_winner_dm_enabled: true,
            test_mode_enabled: false,
            anti_snipe_window_min: 10,
            lock_timeout_secs: 5,
            finalize_interval_secs: 60,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// "1" / "true" / "on" 을 켜짐으로 취급. 변수가 없으면 기본값
fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}

/// 쉼표 구분 관리자 id 목록 파싱. 숫자가 아닌 항목은 버린다.
pub fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<i64>().ok())
        .collect()
}

// endregion: --- Settings

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    /// 관리자 id 목록 파싱
    #[test]
    fn test_parse_admin_ids() {
        assert_eq!(parse_admin_ids("1, 2,3"), vec![1, 2, 3]);
        assert_eq!(parse_admin_ids(""), Vec::<i64>::new());
        assert_eq!(parse_admin_ids("7, abc, 9"), vec![7, 9]);
    }

    /// 기본값 확인
    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert_eq!(s.min_bid_increment, 50);
        assert_eq!(s.anti_snipe_window_min, 10);
        assert_eq!(s.lock_timeout_secs, 5);
        assert!(s.max_bid.is_none());
    }
}
// endregion: --- Tests
