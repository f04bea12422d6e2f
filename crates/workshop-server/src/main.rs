use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use workshop_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("workshop_server=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(host = %config.host, port = config.port, "Starting workshop server");

    workshop_server::run_server(config).await
}
