use sea_orm::Database;
use tracing::info;

use cloudmail_auth::config::AuthConfig;
use cloudmail_auth::router::build_router;
use cloudmail_auth::state::AppState;
use cloudmail_auth::usecase::settings::RefreshSettingsUseCase;

#[tokio::main]
async fn main() {
    cloudmail_core::tracing::init_tracing();

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let state = AppState {
        db,
        redis,
        http: reqwest::Client::new(),
        jwt_secret: config.jwt_secret,
        domain_list: config.mail_domains,
    };

    // Prime the settings snapshot; flows fail loudly without it.
    RefreshSettingsUseCase {
        repo: state.settings_repo(),
        cache: state.settings_cache(),
    }
    .execute()
    .await
    .expect("failed to prime settings snapshot");

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
