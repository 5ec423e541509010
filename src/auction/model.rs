// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Status Enums

/// 로트 상태. 저장소 경계에서 레거시 문자열을 정규화한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotStatus {
    Active,
    Sold,
    Unsold,
}

impl LotStatus {
    /// 저장소 문자열 -> 상태. 이전 시트에서 옮겨온 러시아어 표기도 허용한다.
    pub fn parse(raw: &str) -> Option<LotStatus> {
        match raw.trim() {
            "active" | "ACTIVE" | "Активен" => Some(LotStatus::Active),
            "sold" | "SOLD" | "Продан" => Some(LotStatus::Sold),
            "unsold" | "UNSOLD" | "Не продан" => Some(LotStatus::Unsold),
            _ => None,
        }
    }

    /// 상태 -> 저장소 표준 문자열
    pub fn as_db(&self) -> &'static str {
        match self {
            LotStatus::Active => "active",
            LotStatus::Sold => "sold",
            LotStatus::Unsold => "unsold",
        }
    }

    /// sold/unsold 는 종결 상태이며 이후 어떤 입찰도 로트를 바꾸지 못한다.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LotStatus::Active)
    }
}

/// 입찰 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidStatus {
    /// 현재 선두
    Leader,
    /// 더 높은 입찰로 밀려남
    Outbid,
    /// 밀려남 알림까지 발송 완료
    Notified,
}

impl BidStatus {
    pub fn parse(raw: &str) -> Option<BidStatus> {
        match raw.trim() {
            "leader" | "лидер" => Some(BidStatus::Leader),
            "outbid" | "перебита" => Some(BidStatus::Outbid),
            "notified" | "уведомлен" => Some(BidStatus::Notified),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            BidStatus::Leader => "leader",
            BidStatus::Outbid => "outbid",
            BidStatus::Notified => "notified",
        }
    }
}

// endregion: --- Status Enums

// region:    --- Rows

/// 로트 (게시글 하나에 묶인 경매 품목)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub lot_id: i64,
    pub name: String,
    pub status: LotStatus,
    pub start_price: i64,
    pub current_price: i64,
    pub leader_id: Option<i64>,
    pub deadline: DateTime<Utc>,
    /// 외부 게시글 참조 `-{owner}_{post}`
    pub post_key: String,
    pub attachment_id: Option<String>,
}

impl Lot {
    pub fn has_leader(&self) -> bool {
        self.leader_id.is_some()
    }
}

/// 입찰 기록. 추가만 되고 삭제되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub bid_id: Uuid,
    pub lot_id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
    pub comment_id: i64,
    pub status: BidStatus,
}

/// 낙찰 주문. 마감 처리 시에만 생성된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// `{lot_id}-{winner_id}`
    pub order_id: String,
    pub lot_id: i64,
    pub lot_name: String,
    pub post_key: String,
    pub user_id: i64,
    pub win_price: i64,
    pub win_date: DateTime<Utc>,
    pub status: String,
}

/// 낙찰자 누적 프로필. 첫 낙찰 시 생성, 이후 카운터만 갱신
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnerProfile {
    pub user_id: i64,
    pub user_name: String,
    pub first_win_date: DateTime<Utc>,
    pub last_win_date: DateTime<Utc>,
    pub total_lots_won: i64,
}

/// 주문 초기 상태
pub const ORDER_STATUS_PENDING: &str = "결제 대기";

// endregion: --- Rows

// region:    --- Post Key

/// `-{owner}_{post}` 형태의 게시글 키 조립
pub fn build_post_key(owner_id: i64, post_id: i64) -> String {
    format!("-{}_{}", owner_id.abs(), post_id)
}

/// 게시글 키에서 post id 추출. 형식이 다르면 None
pub fn parse_post_key(post_key: &str) -> Option<i64> {
    post_key.rsplit_once('_')?.1.parse().ok()
}

// endregion: --- Post Key

// endregion: --- Tests
