//! Exchange-rate reducer.
//!
//! Rates are a convenience feature: a failed fetch keeps the previous
//! board and never disturbs the session state.

use super::none;
use crate::actions::AuthAction;
use crate::environment::AuthEnvironment;
use crate::providers::{IdentityProvider, ProfileStore, RateProvider};
use crate::state::AuthState;
use finanza_core::effect::Effect;
use finanza_core::{SmallVec, smallvec};
use tracing::{debug, warn};

pub(super) fn reduce<I, P, R>(
    state: &mut AuthState,
    action: AuthAction,
    env: &AuthEnvironment<I, P, R>,
) -> SmallVec<[Effect<AuthAction>; 4]>
where
    I: IdentityProvider + Clone,
    P: ProfileStore + Clone,
    R: RateProvider + Clone + 'static,
{
    match action {
        AuthAction::FetchRates {
            correlation_id,
            base,
        } => {
            let rates = env.rates.clone();
            smallvec![Effect::Future(Box::pin(async move {
                Some(AuthAction::RatesFetched {
                    correlation_id,
                    result: rates.fetch_rates(&base).await,
                })
            }))]
        }

        AuthAction::RatesFetched { result, .. } => {
            match result {
                Ok(board) => {
                    debug!(base = %board.base, count = board.rates.len(), "rates updated");
                    state.rates = Some(board);
                }
                Err(err) => {
                    // Keep whatever board we had.
                    warn!(error = %err, "rate fetch failed");
                }
            }
            none()
        }

        _ => none(),
    }
}
