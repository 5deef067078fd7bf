//! Session reducers.
//!
//! The reducer is split along the action families:
//!
//! - [`bootstrap`] — connectivity probe, session/profile fetch, safety
//!   timeout, pushed auth changes
//! - [`account`] — user-triggered account actions
//! - [`rates`] — exchange-rate fetches
//!
//! [`AuthReducer`] dispatches between them; the store only ever sees
//! the one reducer.

mod account;
mod bootstrap;
mod rates;

use crate::actions::AuthAction;
use crate::environment::AuthEnvironment;
use crate::providers::{IdentityProvider, ProfileStore, RateProvider};
use crate::state::AuthState;
use finanza_core::effect::Effect;
use finanza_core::reducer::Reducer;
use finanza_core::{SmallVec, smallvec};
use std::marker::PhantomData;

/// Turn an already-decided event into an effect.
///
/// Used when a command fails validation before any provider call: the
/// completion event still flows through the store so observers see it.
pub(crate) fn emit(action: AuthAction) -> Effect<AuthAction> {
    Effect::Future(Box::pin(async move { Some(action) }))
}

/// The session reducer.
///
/// Stateless; all state lives in [`AuthState`] and all dependencies in
/// [`AuthEnvironment`].
pub struct AuthReducer<I, P, R> {
    _providers: PhantomData<fn() -> (I, P, R)>,
}

impl<I, P, R> AuthReducer<I, P, R> {
    /// Create the reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _providers: PhantomData,
        }
    }
}

impl<I, P, R> Default for AuthReducer<I, P, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, P, R> Clone for AuthReducer<I, P, R> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<I, P, R> Reducer for AuthReducer<I, P, R>
where
    I: IdentityProvider + Clone + 'static,
    P: ProfileStore + Clone + 'static,
    R: RateProvider + Clone + 'static,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment<I, P, R>;

    fn reduce(
        &self,
        state: &mut AuthState,
        action: AuthAction,
        env: &AuthEnvironment<I, P, R>,
    ) -> SmallVec<[Effect<AuthAction>; 4]> {
        match action {
            a @ (AuthAction::Bootstrap
            | AuthAction::ConnectivityChecked { .. }
            | AuthAction::ConnectivityRetry { .. }
            | AuthAction::ConnectivityRegained
            | AuthAction::SessionFetched { .. }
            | AuthAction::ProfileFetched { .. }
            | AuthAction::BootstrapTimedOut { .. }
            | AuthAction::AuthChanged { .. }) => bootstrap::reduce(state, a, env),

            a @ (AuthAction::SignUp { .. }
            | AuthAction::SignUpCompleted { .. }
            | AuthAction::SignIn { .. }
            | AuthAction::SignInCompleted { .. }
            | AuthAction::SignOut { .. }
            | AuthAction::SignOutCompleted { .. }
            | AuthAction::SetupProfile { .. }
            | AuthAction::ProfileSetupCompleted { .. }
            | AuthAction::UpdateProfile { .. }
            | AuthAction::ProfileUpdateCompleted { .. }
            | AuthAction::ManualReconnect { .. }
            | AuthAction::ReconnectCompleted { .. }) => account::reduce(state, a, env),

            a @ (AuthAction::FetchRates { .. } | AuthAction::RatesFetched { .. }) => {
                rates::reduce(state, a, env)
            }
        }
    }
}

/// No-effect shorthand shared by the submodules.
pub(crate) fn none() -> SmallVec<[Effect<AuthAction>; 4]> {
    smallvec![]
}
