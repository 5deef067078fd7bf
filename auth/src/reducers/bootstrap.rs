//! Bootstrap reducer.
//!
//! Drives the startup sequence: connectivity probe → session fetch →
//! profile fetch, with a fixed-delay retry on probe failure and a safety
//! timeout bounding the loading phase.
//!
//! # Attempt gating
//!
//! Every asynchronous completion carries the attempt id it was started
//! under. A completion whose id no longer matches [`AuthState::attempt`]
//! is dropped, so abandoned attempts can never write state. The safety
//! timeout clears the loading flag but does not bump the attempt id:
//! fetches already in flight still apply when they settle.

use super::none;
use crate::actions::{AuthAction, AuthChange};
use crate::environment::AuthEnvironment;
use crate::error::AuthError;
use crate::providers::{IdentityProvider, ProfileStore, RateProvider};
use crate::state::{AuthState, UserId};
use finanza_core::effect::Effect;
use finanza_core::{SmallVec, smallvec};
use tracing::{debug, error, info, warn};

pub(super) fn reduce<I, P, R>(
    state: &mut AuthState,
    action: AuthAction,
    env: &AuthEnvironment<I, P, R>,
) -> SmallVec<[Effect<AuthAction>; 4]>
where
    I: IdentityProvider + Clone + 'static,
    P: ProfileStore + Clone + 'static,
    R: RateProvider + Clone + 'static,
{
    match action {
        AuthAction::Bootstrap => start_attempt(state, env),

        AuthAction::ConnectivityChecked { attempt, result } => {
            if attempt != state.attempt {
                debug!(attempt, current = state.attempt, "stale connectivity result");
                return none();
            }
            match result {
                Ok(()) => {
                    let identity = env.identity.clone();
                    smallvec![Effect::Future(Box::pin(async move {
                        Some(AuthAction::SessionFetched {
                            attempt,
                            result: identity.get_session().await,
                        })
                    }))]
                }
                Err(AuthError::ServiceUnavailable) => {
                    // Unconfigured client: render unauthenticated, no retry.
                    info!("service not configured; skipping session bootstrap");
                    state.clear_identity();
                    state.loading = false;
                    state.connection_error = false;
                    none()
                }
                Err(err) => {
                    warn!(error = %err, attempt, "connectivity probe failed");
                    state.loading = false;
                    state.connection_error = true;
                    smallvec![Effect::Delay {
                        duration: env.bootstrap.connect_retry_delay,
                        action: Box::new(AuthAction::ConnectivityRetry { attempt }),
                    }]
                }
            }
        }

        AuthAction::ConnectivityRetry { attempt } => {
            // Only retry if nothing superseded the failed attempt.
            if attempt == state.attempt && state.connection_error {
                start_attempt(state, env)
            } else {
                none()
            }
        }

        AuthAction::ConnectivityRegained => {
            // Focus/online hints only matter while we sit in the error
            // state; anywhere else they are noise.
            if state.connection_error && !state.loading {
                info!("connectivity regained; restarting bootstrap");
                start_attempt(state, env)
            } else {
                none()
            }
        }

        AuthAction::SessionFetched { attempt, result } => {
            if attempt != state.attempt {
                debug!(attempt, current = state.attempt, "stale session result");
                return none();
            }
            match result {
                Ok(Some(session)) => {
                    let user_id = session.user.id;
                    state.user = Some(session.user.clone());
                    state.session = Some(session);
                    smallvec![fetch_profile(&env.profiles, attempt, user_id)]
                }
                Ok(None) => {
                    state.clear_identity();
                    state.loading = false;
                    state.connection_error = false;
                    none()
                }
                Err(err) => {
                    error!(error = %err, "session fetch failed");
                    state.clear_identity();
                    state.loading = false;
                    state.connection_error = true;
                    none()
                }
            }
        }

        AuthAction::ProfileFetched { attempt, result } => {
            if attempt != state.attempt {
                debug!(attempt, current = state.attempt, "stale profile result");
                return none();
            }
            state.loading = false;
            match result {
                Ok(profile) => {
                    state.profile = Some(profile);
                    state.needs_profile_setup = false;
                    state.connection_error = false;
                }
                Err(AuthError::ProfileNotFound) => {
                    state.profile = None;
                    state.needs_profile_setup = true;
                }
                Err(err) => {
                    // Treated like a missing profile so the user is not
                    // locked out, but loudly: this path hides real faults.
                    error!(error = %err, "profile query failed; prompting for setup");
                    state.profile = None;
                    state.needs_profile_setup = true;
                }
            }
            none()
        }

        AuthAction::BootstrapTimedOut { attempt } => {
            if attempt == state.attempt && state.loading {
                warn!(attempt, "bootstrap safety timeout fired");
                state.loading = false;
            }
            none()
        }

        AuthAction::AuthChanged { change } => apply_change(state, change, env),

        _ => none(),
    }
}

fn start_attempt<I, P, R>(
    state: &mut AuthState,
    env: &AuthEnvironment<I, P, R>,
) -> SmallVec<[Effect<AuthAction>; 4]>
where
    I: IdentityProvider + Clone + 'static,
    P: ProfileStore + Clone,
    R: RateProvider + Clone,
{
    state.attempt += 1;
    state.loading = true;
    state.connection_error = false;
    let attempt = state.attempt;
    info!(attempt, "starting session bootstrap");

    let identity = env.identity.clone();
    smallvec![
        Effect::Future(Box::pin(async move {
            Some(AuthAction::ConnectivityChecked {
                attempt,
                result: identity.probe().await,
            })
        })),
        Effect::Delay {
            duration: env.bootstrap.bootstrap_timeout,
            action: Box::new(AuthAction::BootstrapTimedOut { attempt }),
        },
    ]
}

fn fetch_profile<P>(profiles: &P, attempt: u64, id: UserId) -> Effect<AuthAction>
where
    P: ProfileStore + Clone + 'static,
{
    let profiles = profiles.clone();
    Effect::Future(Box::pin(async move {
        Some(AuthAction::ProfileFetched {
            attempt,
            result: profiles.fetch(id).await,
        })
    }))
}

fn apply_change<I, P, R>(
    state: &mut AuthState,
    change: AuthChange,
    env: &AuthEnvironment<I, P, R>,
) -> SmallVec<[Effect<AuthAction>; 4]>
where
    I: IdentityProvider + Clone,
    P: ProfileStore + Clone + 'static,
    R: RateProvider + Clone,
{
    match change {
        AuthChange::SignedOut => {
            info!("auth change: signed out");
            state.clear_identity();
            state.loading = false;
            none()
        }
        AuthChange::SignedIn { session } => {
            info!(user = %session.user.id, "auth change: signed in");
            // A fresh sign-in supersedes any in-flight bootstrap work.
            state.attempt += 1;
            let user_id = session.user.id;
            state.user = Some(session.user.clone());
            state.session = Some(session);
            state.connection_error = false;
            state.loading = true;
            // Same safety timeout as a bootstrap attempt: a hung profile
            // fetch must not leave the loading flag set forever.
            smallvec![
                fetch_profile(&env.profiles, state.attempt, user_id),
                Effect::Delay {
                    duration: env.bootstrap.bootstrap_timeout,
                    action: Box::new(AuthAction::BootstrapTimedOut {
                        attempt: state.attempt,
                    }),
                },
            ]
        }
        AuthChange::TokenRefreshed { session } => {
            debug!(user = %session.user.id, "auth change: token refreshed");
            state.user = Some(session.user.clone());
            state.session = Some(session);
            none()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::BootstrapConfig;
    use crate::mocks::{MockIdentityProvider, MockProfileStore, MockRateProvider, test_env};
    use crate::state::Phase;

    fn run(
        state: &mut AuthState,
        action: AuthAction,
        env: &AuthEnvironment<MockIdentityProvider, MockProfileStore, MockRateProvider>,
    ) -> SmallVec<[Effect<AuthAction>; 4]> {
        reduce(state, action, env)
    }

    async fn settle(effect: Effect<AuthAction>) -> Option<AuthAction> {
        match effect {
            Effect::Future(fut) => fut.await,
            other => panic!("expected a future effect, got {other:?}"),
        }
    }

    #[test]
    fn bootstrap_bumps_attempt_and_arms_timeout() {
        let env = test_env();
        let mut state = AuthState::default();
        let effects = run(&mut state, AuthAction::Bootstrap, &env);

        assert_eq!(state.attempt, 1);
        assert!(state.loading);
        assert_eq!(effects.len(), 2);
        assert!(matches!(
            effects[1],
            Effect::Delay { duration, .. } if duration == BootstrapConfig::default().bootstrap_timeout
        ));
    }

    #[tokio::test]
    async fn healthy_probe_leads_to_session_fetch() {
        let env = test_env();
        let mut state = AuthState::default();
        let mut effects = run(&mut state, AuthAction::Bootstrap, &env);

        let checked = settle(effects.remove(0)).await.unwrap();
        assert!(matches!(
            checked,
            AuthAction::ConnectivityChecked { attempt: 1, result: Ok(()) }
        ));

        let mut effects = run(&mut state, checked, &env);
        let fetched = settle(effects.remove(0)).await.unwrap();
        // No stored session in the mock.
        assert!(matches!(
            fetched,
            AuthAction::SessionFetched { attempt: 1, result: Ok(None) }
        ));

        run(&mut state, fetched, &env);
        assert_eq!(state.phase(), Phase::Unauthenticated);
    }

    #[test]
    fn probe_failure_sets_connection_error_and_schedules_retry() {
        let env = test_env();
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);

        let effects = run(
            &mut state,
            AuthAction::ConnectivityChecked {
                attempt: 1,
                result: Err(AuthError::Connectivity("refused".into())),
            },
            &env,
        );

        assert!(state.connection_error);
        assert!(!state.loading);
        assert!(matches!(
            effects[0],
            Effect::Delay { duration, .. } if duration == BootstrapConfig::default().connect_retry_delay
        ));
    }

    #[test]
    fn retry_starts_a_fresh_attempt_only_while_errored() {
        let env = test_env();
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);
        run(
            &mut state,
            AuthAction::ConnectivityChecked {
                attempt: 1,
                result: Err(AuthError::Connectivity("refused".into())),
            },
            &env,
        );

        let effects = run(&mut state, AuthAction::ConnectivityRetry { attempt: 1 }, &env);
        assert_eq!(state.attempt, 2);
        assert_eq!(effects.len(), 2);

        // A retry from the superseded attempt is a no-op.
        let effects = run(&mut state, AuthAction::ConnectivityRetry { attempt: 1 }, &env);
        assert!(effects.is_empty());
        assert_eq!(state.attempt, 2);
    }

    #[test]
    fn regained_connectivity_restarts_only_from_the_error_state() {
        let env = test_env();
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);

        // Healthy and loading: the hint is ignored.
        let effects = run(&mut state, AuthAction::ConnectivityRegained, &env);
        assert!(effects.is_empty());
        assert_eq!(state.attempt, 1);

        run(
            &mut state,
            AuthAction::ConnectivityChecked {
                attempt: 1,
                result: Err(AuthError::Connectivity("refused".into())),
            },
            &env,
        );
        let effects = run(&mut state, AuthAction::ConnectivityRegained, &env);
        assert_eq!(state.attempt, 2);
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn unconfigured_service_renders_unauthenticated_without_error() {
        let env = test_env();
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);

        let effects = run(
            &mut state,
            AuthAction::ConnectivityChecked {
                attempt: 1,
                result: Err(AuthError::ServiceUnavailable),
            },
            &env,
        );

        assert!(effects.is_empty());
        assert_eq!(state.phase(), Phase::Unauthenticated);
        assert!(!state.connection_error);
    }

    #[test]
    fn stale_completions_are_dropped() {
        let env = test_env();
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);
        run(&mut state, AuthAction::Bootstrap, &env);
        assert_eq!(state.attempt, 2);

        let effects = run(
            &mut state,
            AuthAction::SessionFetched {
                attempt: 1,
                result: Err(AuthError::SessionFetch("boom".into())),
            },
            &env,
        );
        assert!(effects.is_empty());
        assert!(state.loading);
        assert!(!state.connection_error);
    }

    #[tokio::test]
    async fn stored_session_flows_into_profile_fetch() {
        let (session, profile) = crate::mocks::signed_in_fixture();
        let env = test_env();
        env.profiles.insert_existing(profile.clone());
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);

        let mut effects = run(
            &mut state,
            AuthAction::SessionFetched {
                attempt: 1,
                result: Ok(Some(session.clone())),
            },
            &env,
        );
        assert_eq!(state.user.as_ref().unwrap().id, session.user.id);
        assert!(state.loading);

        let fetched = settle(effects.remove(0)).await.unwrap();
        run(&mut state, fetched, &env);
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.profile, Some(profile));
    }

    #[test]
    fn missing_profile_row_prompts_setup() {
        let (session, _) = crate::mocks::signed_in_fixture();
        let env = test_env();
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);
        run(
            &mut state,
            AuthAction::SessionFetched {
                attempt: 1,
                result: Ok(Some(session)),
            },
            &env,
        );

        run(
            &mut state,
            AuthAction::ProfileFetched {
                attempt: 1,
                result: Err(AuthError::ProfileNotFound),
            },
            &env,
        );
        assert_eq!(state.phase(), Phase::NeedsProfileSetup);
    }

    #[test]
    fn other_profile_errors_also_prompt_setup() {
        let (session, _) = crate::mocks::signed_in_fixture();
        let env = test_env();
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);
        run(
            &mut state,
            AuthAction::SessionFetched {
                attempt: 1,
                result: Ok(Some(session)),
            },
            &env,
        );

        run(
            &mut state,
            AuthAction::ProfileFetched {
                attempt: 1,
                result: Err(AuthError::ProfileQuery("permission denied".into())),
            },
            &env,
        );
        assert_eq!(state.phase(), Phase::NeedsProfileSetup);
    }

    #[test]
    fn timeout_clears_loading_but_late_completion_still_applies() {
        let (session, profile) = crate::mocks::signed_in_fixture();
        let env = test_env();
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);
        run(
            &mut state,
            AuthAction::SessionFetched {
                attempt: 1,
                result: Ok(Some(session)),
            },
            &env,
        );

        run(&mut state, AuthAction::BootstrapTimedOut { attempt: 1 }, &env);
        assert!(!state.loading);

        // The profile fetch was still in flight; its completion applies.
        run(
            &mut state,
            AuthAction::ProfileFetched {
                attempt: 1,
                result: Ok(profile.clone()),
            },
            &env,
        );
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.profile, Some(profile));
    }

    #[test]
    fn timeout_from_an_old_attempt_is_ignored() {
        let env = test_env();
        let mut state = AuthState::default();
        run(&mut state, AuthAction::Bootstrap, &env);
        run(&mut state, AuthAction::Bootstrap, &env);

        run(&mut state, AuthAction::BootstrapTimedOut { attempt: 1 }, &env);
        assert!(state.loading);
    }

    #[test]
    fn signed_out_change_clears_identity() {
        let (session, profile) = crate::mocks::signed_in_fixture();
        let env = test_env();
        let mut state = AuthState {
            user: Some(session.user.clone()),
            session: Some(session),
            profile: Some(profile),
            loading: false,
            ..AuthState::default()
        };

        run(
            &mut state,
            AuthAction::AuthChanged {
                change: AuthChange::SignedOut,
            },
            &env,
        );
        assert_eq!(state.phase(), Phase::Unauthenticated);
    }

    #[tokio::test]
    async fn signed_in_change_fetches_the_profile() {
        let (session, profile) = crate::mocks::signed_in_fixture();
        let env = test_env();
        env.profiles.insert_existing(profile.clone());
        let mut state = AuthState {
            loading: false,
            ..AuthState::default()
        };

        let mut effects = run(
            &mut state,
            AuthAction::AuthChanged {
                change: AuthChange::SignedIn { session },
            },
            &env,
        );
        assert!(state.loading);

        let fetched = settle(effects.remove(0)).await.unwrap();
        run(&mut state, fetched, &env);
        assert_eq!(state.phase(), Phase::Ready);
    }

    #[test]
    fn pushed_sign_in_is_bounded_by_the_safety_timeout() {
        let (session, _) = crate::mocks::signed_in_fixture();
        let env = test_env();
        let mut state = AuthState {
            loading: false,
            ..AuthState::default()
        };

        let effects = run(
            &mut state,
            AuthAction::AuthChanged {
                change: AuthChange::SignedIn { session },
            },
            &env,
        );
        assert!(state.loading);
        assert_eq!(effects.len(), 2);
        assert!(matches!(
            effects[1],
            Effect::Delay { duration, .. } if duration == BootstrapConfig::default().bootstrap_timeout
        ));

        // The profile fetch never settles; the timeout clears loading
        // without touching the session.
        let attempt = state.attempt;
        run(&mut state, AuthAction::BootstrapTimedOut { attempt }, &env);
        assert!(!state.loading);
        assert!(state.user.is_some());
    }

    #[test]
    fn token_refresh_updates_session_without_refetch() {
        let (session, profile) = crate::mocks::signed_in_fixture();
        let env = test_env();
        let mut state = AuthState {
            user: Some(session.user.clone()),
            session: Some(session.clone()),
            profile: Some(profile),
            loading: false,
            ..AuthState::default()
        };

        let mut refreshed = session;
        refreshed.access_token = "rotated".to_string();
        let effects = run(
            &mut state,
            AuthAction::AuthChanged {
                change: AuthChange::TokenRefreshed { session: refreshed },
            },
            &env,
        );
        assert!(effects.is_empty());
        assert_eq!(state.session.as_ref().unwrap().access_token, "rotated");
        assert_eq!(state.phase(), Phase::Ready);
    }
}
