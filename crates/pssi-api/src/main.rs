use anyhow::Result;
use pssi_ai::Credentials;
use pssi_api::ApiConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pssi_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = ApiConfig::from_env()?;
    let credentials = Credentials::from_env();

    if credentials.configured().is_empty() {
        tracing::warn!("No AI provider keys found; AI endpoints will report not configured");
    }

    pssi_api::serve(config, credentials).await
}
