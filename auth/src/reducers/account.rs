//! Account-action reducer.
//!
//! Handles user-triggered commands (sign-up, sign-in, sign-out, profile
//! setup and update, manual reconnect). Every command validates input
//! first; validation failures produce a completion event without any
//! provider call. All commands share the one `action_loading` flag.

use super::{emit, none};
use crate::actions::{ActionOutcome, AuthAction, ProfileUpdate};
use crate::environment::AuthEnvironment;
use crate::providers::{IdentityProvider, ProfileStore, RateProvider};
use crate::state::{AuthState, Profile};
use crate::utils::{
    validate_age, validate_alias, validate_email, validate_password, validate_profile_input,
    validate_username,
};
use finanza_core::effect::Effect;
use finanza_core::{SmallVec, smallvec};
use tracing::{info, warn};

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
        AuthAction::SignUp {
            correlation_id,
            email,
            password,
            username,
            alias,
            age,
        } => {
            if let Err(err) = validate_email(&email)
                .and_then(|()| validate_password(&password))
                .and_then(|()| validate_profile_input(&username, &alias, age))
            {
                return smallvec![emit(AuthAction::SignUpCompleted {
                    correlation_id,
                    outcome: ActionOutcome::failure(&err),
                })];
            }
            state.action_loading = true;
            let identity = env.identity.clone();
            let profiles = env.profiles.clone();
            let now = env.clock.now();
            // Two writes with no compensation: a failed profile insert
            // leaves an account the next sign-in reports as needs-setup.
            smallvec![Effect::Future(Box::pin(async move {
                let user = match identity.sign_up(&email, &password).await {
                    Ok(user) => user,
                    Err(err) => {
                        warn!(error = %err, "sign-up failed");
                        return Some(AuthAction::SignUpCompleted {
                            correlation_id,
                            outcome: ActionOutcome::failure(&err),
                        });
                    }
                };
                info!(user = %user.id, "account created");
                let profile = Profile {
                    id: user.id,
                    username,
                    alias,
                    age,
                    created_at: now,
                    updated_at: now,
                };
                let outcome = match profiles.insert(profile).await {
                    Ok(_) => ActionOutcome::ok("Account created. You can now sign in."),
                    Err(err) => {
                        warn!(error = %err, "profile insert after sign-up failed");
                        ActionOutcome::failure(&err)
                    }
                };
                Some(AuthAction::SignUpCompleted {
                    correlation_id,
                    outcome,
                })
            }))]
        }

        AuthAction::SignUpCompleted { .. } => {
            state.action_loading = false;
            none()
        }

        AuthAction::SignIn {
            correlation_id,
            email,
            password,
        } => {
            if let Err(err) = validate_email(&email).and_then(|()| validate_password(&password)) {
                return smallvec![emit(AuthAction::SignInCompleted {
                    correlation_id,
                    outcome: ActionOutcome::failure(&err),
                })];
            }
            state.action_loading = true;
            let identity = env.identity.clone();
            // State transitions ride on the pushed auth change; this
            // effect only reports the outcome.
            smallvec![Effect::Future(Box::pin(async move {
                let outcome = match identity.sign_in_with_password(&email, &password).await {
                    Ok(session) => {
                        info!(user = %session.user.id, "signed in");
                        ActionOutcome::ok("Signed in.")
                    }
                    Err(err) => {
                        warn!(error = %err, "sign-in failed");
                        ActionOutcome::failure(&err)
                    }
                };
                Some(AuthAction::SignInCompleted {
                    correlation_id,
                    outcome,
                })
            }))]
        }

        AuthAction::SignInCompleted { .. } => {
            state.action_loading = false;
            none()
        }

        AuthAction::SignOut { correlation_id } => {
            state.action_loading = true;
            let identity = env.identity.clone();
            smallvec![Effect::Future(Box::pin(async move {
                let outcome = match identity.sign_out().await {
                    Ok(()) => ActionOutcome::ok("Signed out."),
                    Err(err) => {
                        warn!(error = %err, "sign-out failed");
                        ActionOutcome::failure(&err)
                    }
                };
                Some(AuthAction::SignOutCompleted {
                    correlation_id,
                    outcome,
                })
            }))]
        }

        AuthAction::SignOutCompleted { outcome, .. } => {
            state.action_loading = false;
            if outcome.success {
                state.clear_identity();
            }
            none()
        }

        AuthAction::SetupProfile {
            correlation_id,
            username,
            alias,
            age,
        } => {
            let Some(user) = state.user.clone() else {
                return smallvec![emit(AuthAction::ProfileSetupCompleted {
                    correlation_id,
                    outcome: ActionOutcome {
                        success: false,
                        message: "You must be signed in to set up a profile.".to_string(),
                        code: None,
                    },
                    profile: None,
                })];
            };
            if let Err(err) = validate_profile_input(&username, &alias, age) {
                return smallvec![emit(AuthAction::ProfileSetupCompleted {
                    correlation_id,
                    outcome: ActionOutcome::failure(&err),
                    profile: None,
                })];
            }
            state.action_loading = true;
            let now = env.clock.now();
            let profile = Profile {
                id: user.id,
                username,
                alias,
                age,
                created_at: now,
                updated_at: now,
            };
            let profiles = env.profiles.clone();
            smallvec![Effect::Future(Box::pin(async move {
                let (outcome, profile) = match profiles.insert(profile).await {
                    Ok(created) => {
                        info!(user = %created.id, "profile created");
                        (ActionOutcome::ok("Profile created."), Some(created))
                    }
                    Err(err) => {
                        warn!(error = %err, "profile setup failed");
                        (ActionOutcome::failure(&err), None)
                    }
                };
                Some(AuthAction::ProfileSetupCompleted {
                    correlation_id,
                    outcome,
                    profile,
                })
            }))]
        }

        AuthAction::ProfileSetupCompleted {
            outcome, profile, ..
        } => {
            state.action_loading = false;
            if outcome.success {
                state.profile = profile;
                state.needs_profile_setup = false;
            }
            none()
        }

        AuthAction::UpdateProfile {
            correlation_id,
            patch,
        } => {
            let Some(user) = state.user.clone() else {
                return smallvec![emit(AuthAction::ProfileUpdateCompleted {
                    correlation_id,
                    outcome: ActionOutcome {
                        success: false,
                        message: "You must be signed in to update your profile.".to_string(),
                        code: None,
                    },
                    patch: None,
                })];
            };
            if patch.is_empty() {
                return smallvec![emit(AuthAction::ProfileUpdateCompleted {
                    correlation_id,
                    outcome: ActionOutcome::ok("Nothing to update."),
                    patch: None,
                })];
            }
            if let Err(err) = validate_patch(&patch) {
                return smallvec![emit(AuthAction::ProfileUpdateCompleted {
                    correlation_id,
                    outcome: ActionOutcome::failure(&err),
                    patch: None,
                })];
            }
            state.action_loading = true;
            let profiles = env.profiles.clone();
            let updated_at = env.clock.now();
            smallvec![Effect::Future(Box::pin(async move {
                let result = profiles.update(user.id, patch.clone(), updated_at).await;
                let (outcome, patch) = match result {
                    Ok(_) => (ActionOutcome::ok("Profile updated."), Some(patch)),
                    Err(err) => {
                        warn!(error = %err, "profile update failed");
                        (ActionOutcome::failure(&err), None)
                    }
                };
                Some(AuthAction::ProfileUpdateCompleted {
                    correlation_id,
                    outcome,
                    patch,
                })
            }))]
        }

        AuthAction::ProfileUpdateCompleted { outcome, patch, .. } => {
            state.action_loading = false;
            // Merge locally instead of re-fetching the row.
            if outcome.success {
                if let (Some(profile), Some(patch)) = (state.profile.as_mut(), patch) {
                    if let Some(username) = patch.username {
                        profile.username = username;
                    }
                    if let Some(alias) = patch.alias {
                        profile.alias = alias;
                    }
                    if let Some(age) = patch.age {
                        profile.age = age;
                    }
                    profile.updated_at = env.clock.now();
                }
            }
            none()
        }

        AuthAction::ManualReconnect { correlation_id } => {
            state.action_loading = true;
            let identity = env.identity.clone();
            smallvec![Effect::Future(Box::pin(async move {
                let outcome = match identity.refresh_session().await {
                    Ok(_) => ActionOutcome::ok("Connection restored."),
                    Err(err) => {
                        warn!(error = %err, "manual reconnect failed");
                        ActionOutcome::failure(&err)
                    }
                };
                Some(AuthAction::ReconnectCompleted {
                    correlation_id,
                    outcome,
                })
            }))]
        }

        AuthAction::ReconnectCompleted { outcome, .. } => {
            state.action_loading = false;
            if outcome.success {
                state.connection_error = false;
                smallvec![emit(AuthAction::Bootstrap)]
            } else {
                state.connection_error = true;
                none()
            }
        }

        _ => none(),
    }
}

fn validate_patch(patch: &ProfileUpdate) -> crate::error::Result<()> {
    // Validate only the fields being changed.
    if let Some(username) = patch.username.as_deref() {
        validate_username(username)?;
    }
    if let Some(alias) = patch.alias.as_deref() {
        validate_alias(alias)?;
    }
    if let Some(age) = patch.age {
        validate_age(age)?;
    }
    Ok(())
}
