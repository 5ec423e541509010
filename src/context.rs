/// 봇 실행 문맥: 주입되는 능력(원장, API, 캐시, 마커)과 전역 잠금
// region:    --- Imports
use crate::cache::{EventCache, MarkerStore};
use crate::ledger::AuctionLedger;
use crate::settings::Settings;
use crate::vk::SocialApi;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

// endregion: --- Imports

// region:    --- Bot Context

pub struct BotContext {
    pub settings: Settings,
    pub ledger: Arc<dyn AuctionLedger>,
    pub api: Arc<dyn SocialApi>,
    pub cache: Arc<dyn EventCache>,
    pub markers: Arc<dyn MarkerStore>,
    /// 원장 변이 직렬화용 전역 잠금.
    /// 로트별 잠금은 최적화일 뿐이고, 이 규모에서는 전역 하나면 충분하다.
    gate: Mutex<()>,
}

impl BotContext {
    pub fn new(
        settings: Settings,
        ledger: Arc<dyn AuctionLedger>,
        api: Arc<dyn SocialApi>,
        cache: Arc<dyn EventCache>,
        markers: Arc<dyn MarkerStore>,
    ) -> Self {
        BotContext {
            settings,
            ledger,
            api,
            cache,
            markers,
            gate: Mutex::new(()),
        }
    }

    /// 한도 내 잠금 획득. 시간 초과면 Err 를 돌려주고 이벤트는 버려진다.
    /// 상류의 웹훅 재전송(+중복 필터)이 자연스러운 재시도가 된다.
    pub async fn acquire_gate(&self) -> Result<MutexGuard<'_, ()>, String> {
        tokio::time::timeout(self.settings.lock_timeout(), self.gate.lock())
            .await
            .map_err(|_| {
                format!(
                    "원장 잠금을 {}초 안에 얻지 못했습니다",
                    self.settings.lock_timeout_secs
                )
            })
    }
}

// endregion: --- Bot Context
