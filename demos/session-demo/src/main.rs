//! Session bootstrap demo.
//!
//! Builds the production environment from `FINANZA_SERVICE_URL` /
//! `FINANZA_SERVICE_KEY` (falling back to the degraded providers when
//! unset), runs a full bootstrap, fetches a rate board, and shuts down.
//!
//! ```bash
//! FINANZA_SERVICE_URL=https://project.example.co \
//! FINANZA_SERVICE_KEY=publishable-key \
//! cargo run -p session-demo
//! ```

use anyhow::Result;
use finanza_auth::listener::spawn_auth_listener;
use finanza_auth::{AuthAction, AuthReducer, AuthState, BootstrapConfig, environment};
use finanza_runtime::store::Store;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let env = environment::environment_from_env(BootstrapConfig::default());
    let identity = env.identity.clone();
    let store = Store::new(AuthState::default(), AuthReducer::new(), env);
    let listener = spawn_auth_listener(store.clone(), &identity);

    store.send(AuthAction::Bootstrap).await?;

    // The safety timeout guarantees this loop terminates.
    while store.state(|s| s.loading).await {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let phase = store.state(AuthState::phase).await;
    info!(?phase, "bootstrap settled");

    let mut rates = store
        .send(AuthAction::FetchRates {
            correlation_id: uuid::Uuid::new_v4(),
            base: "USD".to_string(),
        })
        .await?;
    rates.wait_with_timeout(Duration::from_secs(10)).await?;
    let count = store
        .state(|s| s.rates.as_ref().map_or(0, |board| board.rates.len()))
        .await;
    info!(count, "rate board loaded");

    // The bootstrap safety timeout may still be pending; give it room.
    store.shutdown(Duration::from_secs(10)).await?;
    listener.abort();
    Ok(())
}
