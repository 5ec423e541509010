// region:    --- Imports
use auction_bot::cache::{MemoryEventCache, PostgresMarkerStore};
use auction_bot::context::BotContext;
use auction_bot::database::DatabaseManager;
use auction_bot::handlers;
use auction_bot::ledger::PostgresLedger;
use auction_bot::scheduler::FinalizeScheduler;
use auction_bot::settings::Settings;
use auction_bot::vk::VkClient;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 설정 로드
    let settings = Settings::from_env();
    let vk_token = std::env::var("VK_TOKEN").expect("VK_TOKEN must be set");

    // DatabaseManager 생성 및 스키마 초기화
    let db_manager = Arc::new(DatabaseManager::new().await);
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 주입 능력 조립: 원장, 플랫폼 API, 중복 필터, 일일 마커
    let ledger = Arc::new(PostgresLedger::new(db_manager.get_pool()));
    let api = Arc::new(VkClient::new(vk_token, settings.group_id));
    let cache = Arc::new(MemoryEventCache::new());
    let markers = Arc::new(PostgresMarkerStore::new(db_manager.get_pool()));

    let bind_addr = settings.bind_addr.clone();
    let ctx = Arc::new(BotContext::new(settings, ledger, api, cache, markers));

    // 마감 처리 스케줄러 시작
    let scheduler = FinalizeScheduler::new(Arc::clone(&ctx));
    scheduler.start().await;
    info!("{:<12} --> 마감 처리 스케줄러 시작", "Main");

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/callback", post(handlers::handle_callback))
        .route("/health", get(handlers::handle_health))
        .layer(cors)
        .with_state(ctx);

    // 리스너 생성
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
