use std::sync::Arc;

use imgrelay_api::setup;
use imgrelay_api::state::AppState;
use imgrelay_core::Config;
use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

fn init_tracing() {
    let console_fmt = tracing_subscriber::fmt::layer().event_format(
        Format::default()
            .compact()
            .with_target(false)
            .without_time(),
    );
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgrelay=debug,tower_http=debug".into()),
        )
        .with(console_fmt)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_tracing();

    let config = Config::from_env()?;
    let state = Arc::new(AppState::new(config.clone())?);
    let router = setup::routes::build_router(state)?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
