/// 소셜 플랫폼 API 경계
/// 코어는 트레이트만 알고, 실제 호출은 reqwest 기반 클라이언트가 맡는다.
/// 발송 실패는 호출한 쪽에서 잡아 로그로 남기고 흐름을 끊지 않는다.
// region:    --- Imports
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::error;

// endregion: --- Imports

// region:    --- Social Api Trait

/// 외부 메시징/댓글 API 계약
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// 개인 메시지 발송 (최선 노력, 실패 시 재시도하지 않는다)
    async fn send_direct_message(&self, user_id: i64, text: &str) -> Result<(), String>;
    /// 특정 댓글에 대한 답장
    async fn reply_to_comment(&self, post_id: i64, comment_id: i64, text: &str)
        -> Result<(), String>;
    /// 게시글 공개 댓글
    async fn post_public_comment(&self, post_id: i64, text: &str) -> Result<(), String>;
    /// 봇이 이미 해당 댓글에 답장했는지 (답장 1회 정책의 근거)
    async fn has_bot_replied(&self, post_id: i64, comment_id: i64) -> Result<bool, String>;
    /// 구독(멤버십) 여부
    async fn is_subscriber(&self, user_id: i64) -> Result<bool, String>;
    /// 표시 이름 조회
    async fn user_name(&self, user_id: i64) -> Result<String, String>;
}

// endregion: --- Social Api Trait

// region:    --- VK Client

const API_BASE: &str = "https://api.vk.com/method";
const API_VERSION: &str = "5.131";

/// VK 호환 폼 API 클라이언트
pub struct VkClient {
    http: reqwest::Client,
    token: String,
    group_id: i64,
}

impl VkClient {
    pub fn new(token: String, group_id: i64) -> Self {
        VkClient {
            http: reqwest::Client::new(),
            token,
            group_id,
        }
    }

    /// `POST {API_BASE}/{method}` 호출 후 response/error 봉투 해석
    async fn call(&self, method: &str, mut params: Vec<(&'static str, String)>) -> Result<Value, String> {
        params.push(("access_token", self.token.clone()));
        params.push(("v", API_VERSION.to_string()));

        let url = format!("{}/{}", API_BASE, method);
        let body: Value = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| format!("{} 요청 실패: {}", method, e))?
            .json()
            .await
            .map_err(|e| format!("{} 응답 해석 실패: {}", method, e))?;

        if let Some(err) = body.get("error") {
            let msg = err
                .get("error_msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let code = err.get("error_code").and_then(Value::as_i64).unwrap_or(0);
            return Err(format!("{} 오류: {} (코드 {})", method, msg, code));
        }

        Ok(body.get("response").cloned().unwrap_or(Value::Null))
    }

    fn owner_id(&self) -> i64 {
        -self.group_id.abs()
    }
}

#[async_trait]
impl SocialApi for VkClient {
    async fn send_direct_message(&self, user_id: i64, text: &str) -> Result<(), String> {
        self.call(
            "messages.send",
            vec![
                ("user_id", user_id.to_string()),
                ("message", text.to_string()),
                ("random_id", Utc::now().timestamp_micros().to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn reply_to_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        text: &str,
    ) -> Result<(), String> {
        self.call(
            "wall.createComment",
            vec![
                ("owner_id", self.owner_id().to_string()),
                ("post_id", post_id.to_string()),
                ("reply_to_comment", comment_id.to_string()),
                ("message", text.to_string()),
                ("from_group", self.group_id.abs().to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn post_public_comment(&self, post_id: i64, text: &str) -> Result<(), String> {
        self.call(
            "wall.createComment",
            vec![
                ("owner_id", self.owner_id().to_string()),
                ("post_id", post_id.to_string()),
                ("message", text.to_string()),
                ("from_group", self.group_id.abs().to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn has_bot_replied(&self, post_id: i64, comment_id: i64) -> Result<bool, String> {
        // 댓글 스레드를 받아 그룹 명의의 답장이 있는지 확인
        let response = self
            .call(
                "wall.getComments",
                vec![
                    ("owner_id", self.owner_id().to_string()),
                    ("post_id", post_id.to_string()),
                    ("comment_id", comment_id.to_string()),
                    ("count", "100".to_string()),
                ],
            )
            .await?;

        let replied = response
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items.iter().any(|item| {
                    item.get("from_id").and_then(Value::as_i64) == Some(self.owner_id())
                })
            })
            .unwrap_or(false);
        Ok(replied)
    }

    async fn is_subscriber(&self, user_id: i64) -> Result<bool, String> {
        let response = self
            .call(
                "groups.isMember",
                vec![
                    ("group_id", self.group_id.abs().to_string()),
                    ("user_id", user_id.to_string()),
                ],
            )
            .await?;
        Ok(response.as_i64() == Some(1))
    }

    async fn user_name(&self, user_id: i64) -> Result<String, String> {
        let response = self
            .call("users.get", vec![("user_ids", user_id.to_string())])
            .await?;

        let name = response
            .as_array()
            .and_then(|users| users.first())
            .map(|u| {
                let first = u.get("first_name").and_then(Value::as_str).unwrap_or("");
                let last = u.get("last_name").and_then(Value::as_str).unwrap_or("");
                format!("{} {}", first, last).trim().to_string()
            })
            .filter(|n| !n.is_empty());

        Ok(name.unwrap_or_else(|| format!("id{}", user_id)))
    }
}

// endregion: --- VK Client

// region:    --- Helpers

/// 답장 1회 정책이 적용되는 답장 시도.
/// 이미 답장이 있거나 발송에 실패해도 상위 흐름을 멈추지 않는다.
pub async fn reply_once(api: &dyn SocialApi, post_id: i64, comment_id: i64, text: &str) -> bool {
    match api.has_bot_replied(post_id, comment_id).await {
        Ok(true) => false,
        Ok(false) => match api.reply_to_comment(post_id, comment_id, text).await {
            Ok(()) => true,
            Err(e) => {
                error!("{:<12} --> 댓글 답장 실패 (comment {}): {}", "SocialApi", comment_id, e);
                false
            }
        },
        Err(e) => {
            error!(
                "{:<12} --> 답장 여부 확인 실패 (comment {}): {}",
                "SocialApi", comment_id, e
            );
            false
        }
    }
}

// endregion: --- Helpers
