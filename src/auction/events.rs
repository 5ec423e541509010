// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::Deserialize;

// endregion: --- Imports

// region:    --- Inbound Events

/// 플랫폼 콜백 이벤트. 닫힌 집합으로 받고, wall_reply_new 만 코어로 들어간다.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// 콜백 서버 확인 요청
    Confirmation { group_id: i64 },
    /// 게시글 댓글 신규 작성 (입찰 후보)
    WallReplyNew { object: WallComment, group_id: i64 },
    /// 그 외 이벤트는 수신 확인만 하고 버린다
    #[serde(other)]
    Unknown,
}

/// 댓글 페이로드
#[derive(Debug, Clone, Deserialize)]
pub struct WallComment {
    pub id: i64,
    pub from_id: i64,
    pub post_id: i64,
    #[serde(default)]
    pub text: String,
    /// unix epoch (초)
    pub date: i64,
}

impl WallComment {
    /// 댓글 작성 시각
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.date, 0).unwrap_or_else(Utc::now)
    }
}

// endregion: --- Inbound Events

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    /// 태그 기반 디스패치 역직렬화
    #[test]
    fn test_deserialize_wall_reply_new() {
        let raw = r#"{
            "type": "wall_reply_new",
            "object": { "id": 77, "from_id": 501, "post_id": 12, "text": "1500", "date": 1700000000 },
            "group_id": 96798355
        }"#;
        match serde_json::from_str::<InboundEvent>(raw) {
            Ok(InboundEvent::WallReplyNew { object, group_id }) => {
                assert_eq!(object.id, 77);
                assert_eq!(object.from_id, 501);
                assert_eq!(object.text, "1500");
                assert_eq!(group_id, 96798355);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    /// 알 수 없는 이벤트는 Unknown 으로 흡수
    #[test]
    fn test_deserialize_unknown_event() {
        let raw = r#"{ "type": "message_new", "object": {}, "group_id": 1 }"#;
        assert!(matches!(
            serde_json::from_str::<InboundEvent>(raw),
            Ok(InboundEvent::Unknown)
        ));
    }

    /// text 누락 시 빈 문자열
    #[test]
    fn test_missing_text_defaults_empty() {
        let raw = r#"{
            "type": "wall_reply_new",
            "object": { "id": 1, "from_id": 2, "post_id": 3, "date": 1700000000 },
            "group_id": 4
        }"#;
        match serde_json::from_str::<InboundEvent>(raw) {
            Ok(InboundEvent::WallReplyNew { object, .. }) => assert!(object.text.is_empty()),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
// endregion: --- Tests
