mod app;
mod auth;
mod config;
mod db;
mod error;
mod media;
mod response;
mod state;
mod storage;
mod users;
mod validation;

/// `RUST_LOG` picks the filter, `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "vidtube=debug,axum=info,tower_http=info".to_string());
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        fmt.with_target(false).json().init();
    } else {
        fmt.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = state::AppState::init().await?;
    tracing::info!(
        cookie_secure = state.config.cookie_secure,
        "state initialised"
    );
    app::serve(app::build_app(state)).await
}
