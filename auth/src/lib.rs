//! # Finanza Session Layer
//!
//! Session bootstrap and account actions for the Finanza client,
//! implemented as reducers and effects on top of the Finanza
//! architecture:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! ## What it does
//!
//! - **Bootstrap**: connectivity probe → session fetch → profile fetch,
//!   with a fixed-delay retry on probe failure and a safety timeout
//!   bounding the loading phase
//! - **Account actions**: sign-up, sign-in, sign-out, profile setup and
//!   update, manual reconnect
//! - **Pushed changes**: a listener task forwards auth state changes
//!   from the identity service into the store
//! - **Exchange rates**: best-effort rate boards per base currency
//!
//! ## Example: starting the client
//!
//! ```rust,ignore
//! use finanza_auth::*;
//! use finanza_runtime::store::Store;
//!
//! let env = environment::environment_from_env(BootstrapConfig::default());
//! let identity = env.identity.clone();
//! let store = Store::new(AuthState::default(), AuthReducer::new(), env);
//! let _listener = listener::spawn_auth_listener(store.clone(), &identity);
//! store.send(AuthAction::Bootstrap).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod config;
pub mod environment;
pub mod error;
pub mod listener;
pub mod providers;
pub mod reducers;
pub mod state;
pub mod utils;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use actions::{ActionCode, ActionOutcome, AuthAction, AuthChange, ProfileUpdate};
pub use config::{BootstrapConfig, ServiceConfig};
pub use environment::{AuthEnvironment, ClientEnvironment};
pub use error::{AuthError, Result};
pub use reducers::AuthReducer;
pub use state::{AuthState, Phase, Profile, RateBoard, Session, User, UserId};

/// Store type for the session layer.
pub type AuthStore<I, P, R> = finanza_runtime::store::Store<
    AuthState,
    AuthAction,
    AuthEnvironment<I, P, R>,
    AuthReducer<I, P, R>,
>;
