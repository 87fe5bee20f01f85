//! HTTP API for submitting questions to the agent.

mod routes;
pub mod types;

use std::sync::Arc;

use crate::agent::Agent;
use crate::config::Config;

pub use routes::{router, AppState};

/// Start the HTTP server and serve until the process exits.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let agent = Agent::from_config(&config)?;
    let state = Arc::new(AppState {
        agent,
        run_timeout: config.run_timeout,
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
