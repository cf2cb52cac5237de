use portfolio::{
    routes,
    setup::{run_server, setup_sentry, setup_tracing},
    AppState,
};
use tracing::info;

fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize Sentry for error tracking
    let _sentry_guard = setup_sentry();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { run_application().await })
}

async fn run_application() -> color_eyre::Result<()> {
    setup_tracing("portfolio")?;

    let app_state = AppState::from_env().await?;
    info!(
        version = app_state.version(),
        storage = app_state.storage.provider_name(),
        assistant = app_state.chat.is_some(),
        "Starting portfolio server"
    );

    let port = app_state.config.port;
    run_server(routes::routes(app_state), port).await
}
