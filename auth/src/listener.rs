//! Auth change listener.
//!
//! The identity service pushes state changes (sign-in from another tab,
//! token rotation, sign-out). This task forwards them into the store as
//! [`AuthAction::AuthChanged`] so the reducers stay the only writer of
//! session state. The task exits when the service channel closes or the
//! store shuts down; no explicit de-registration is needed.

use crate::AuthStore;
use crate::actions::AuthAction;
use crate::providers::{IdentityProvider, ProfileStore, RateProvider};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawn the forwarding task for a store and its identity provider.
pub fn spawn_auth_listener<I, P, R>(store: AuthStore<I, P, R>, identity: &I) -> JoinHandle<()>
where
    I: IdentityProvider + Clone + 'static,
    P: ProfileStore + Clone + 'static,
    R: RateProvider + Clone + 'static,
{
    let mut changes = identity.subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if let Err(err) = store.send(AuthAction::AuthChanged { change }).await {
                        debug!(error = %err, "store rejected auth change; stopping listener");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth listener lagged behind the service");
                }
                Err(RecvError::Closed) => {
                    debug!("auth change channel closed; stopping listener");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::test_env;
    use crate::reducers::AuthReducer;
    use crate::state::AuthState;
    use finanza_runtime::store::Store;
    use std::time::Duration;

    #[tokio::test]
    async fn pushed_sign_in_reaches_the_state() {
        let env = test_env();
        env.identity
            .register_user("fixture@example.com", "password1");

        let store = Store::new(AuthState::default(), AuthReducer::new(), env.clone());
        let _listener = spawn_auth_listener(store.clone(), &env.identity);

        // Sign in directly against the provider, as another tab would.
        env.identity
            .sign_in_with_password("fixture@example.com", "password1")
            .await
            .unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        loop {
            if store.state(|s| s.user.is_some()).await {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "listener never forwarded the sign-in"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
