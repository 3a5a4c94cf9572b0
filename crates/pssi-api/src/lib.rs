pub mod capabilities;
pub mod config;
pub mod cors;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::ApiState;

use pssi_ai::{Credentials, GatewayConfig, ProviderGateway};
use std::sync::Arc;

/// Build the gateway and state from `config`, then serve until shutdown.
pub async fn serve(config: ApiConfig, credentials: Credentials) -> anyhow::Result<()> {
    let gateway = ProviderGateway::new(
        credentials,
        GatewayConfig {
            timeout: config.provider_timeout(),
            ..GatewayConfig::default()
        },
    )?;

    let state = ApiState::new(&config, Arc::new(gateway))?;
    let app = create_router(state);

    let addr = config.bind_address();
    tracing::info!("PSSI API Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
