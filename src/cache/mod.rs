/// 중복 이벤트 필터와 일일 결산 마커
/// 둘 다 원장과는 별개의 공유 자원으로, 원장 트랜잭션과 묶이지 않는다.
// region:    --- Imports
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

// endregion: --- Imports

// region:    --- Event Cache

/// 재전송된 웹훅 이벤트를 걸러내는 단기 캐시
#[async_trait]
pub trait EventCache: Send + Sync {
    /// 본 적 있으면 true, 처음이면 표시하고 false.
    /// 확인과 기록이 한 번에 이뤄져야 동시 재전송이 둘 다 통과하지 못한다.
    async fn seen_or_mark(&self, key: &str, ttl: Duration) -> bool;
}

/// 프로세스 내 캐시. TTL 은 웹훅 재전송 윈도우만 넘기면 충분하다.
pub struct MemoryEventCache {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryEventCache {
    pub fn new() -> Self {
        MemoryEventCache {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryEventCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventCache for MemoryEventCache {
    async fn seen_or_mark(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entries = match self.entries.lock() {
            Ok(e) => e,
            // 독이 퍼진 락이어도 필터는 계속 동작해야 한다 (새 이벤트 차단 금지)
            Err(poisoned) => poisoned.into_inner(),
        };

        // 만료 항목 정리 (게으른 청소)
        entries.retain(|_, expires_at| *expires_at > now);

        if entries.contains_key(key) {
            debug!("{:<12} --> 중복 이벤트 무시: {}", "EventCache", key);
            return true;
        }
        entries.insert(key.to_string(), now + ttl);
        false
    }
}

// endregion: --- Event Cache

// region:    --- Marker Store

/// 하루 한 번만 수행되어야 하는 작업의 완료 표시
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn is_set(&self, key: &str) -> Result<bool, String>;
    async fn set(&self, key: &str) -> Result<(), String>;
}

/// Postgres 마커 저장소. 재기동 후에도 중복 발송을 막아야 하므로 영속화한다.
pub struct PostgresMarkerStore {
    pool: Arc<PgPool>,
}

impl PostgresMarkerStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PostgresMarkerStore { pool }
    }
}

#[async_trait]
impl MarkerStore for PostgresMarkerStore {
    async fn is_set(&self, key: &str) -> Result<bool, String> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT marker_key FROM markers WHERE marker_key = $1")
                .bind(key)
                .fetch_optional(&*self.pool)
                .await
                .map_err(|e| e.to_string())?;
        Ok(found.is_some())
    }

    async fn set(&self, key: &str) -> Result<(), String> {
        sqlx::query(
            "INSERT INTO markers (marker_key, created_at) VALUES ($1, NOW())
             ON CONFLICT (marker_key) DO NOTHING",
        )
        .bind(key)
        .execute(&*self.pool)
        .await
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// 테스트용 인메모리 마커 저장소
pub struct MemoryMarkerStore {
    keys: Mutex<HashSet<String>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        MemoryMarkerStore {
            keys: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for MemoryMarkerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarkerStore for MemoryMarkerStore {
    async fn is_set(&self, key: &str) -> Result<bool, String> {
        let keys = self.keys.lock().map_err(|e| e.to_string())?;
        Ok(keys.contains(key))
    }

    async fn set(&self, key: &str) -> Result<(), String> {
        let mut keys = self.keys.lock().map_err(|e| e.to_string())?;
        keys.insert(key.to_string());
        Ok(())
    }
}

// endregion: --- Marker Store

// endregion: --- Tests
