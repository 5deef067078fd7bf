//! Integration tests for the session bootstrap flow.
//!
//! These run the full store: reducers, effect execution, delayed
//! retries, and the safety timeout, against the in-memory mocks with
//! shortened timing.

#![allow(clippy::unwrap_used, clippy::panic)]

use finanza_auth::{
    AuthAction, AuthError, AuthReducer, AuthState, AuthStore, BootstrapConfig, Phase,
    environment::AuthEnvironment,
    listener::spawn_auth_listener,
    mocks::{FixedClock, MockIdentityProvider, MockProfileStore, MockRateProvider,
        signed_in_fixture},
    providers::IdentityProvider,
};
use finanza_runtime::store::Store;
use std::sync::Arc;
use std::time::Duration;

type TestEnv = AuthEnvironment<MockIdentityProvider, MockProfileStore, MockRateProvider>;
type TestStore = AuthStore<MockIdentityProvider, MockProfileStore, MockRateProvider>;

/// Environment with timing compressed for tests.
fn fast_env() -> TestEnv {
    AuthEnvironment::new(
        MockIdentityProvider::new(),
        MockProfileStore::new(),
        MockRateProvider::new(),
        Arc::new(FixedClock::default()),
        BootstrapConfig::default()
            .with_connect_retry_delay(Duration::from_millis(50))
            .with_bootstrap_timeout(Duration::from_millis(200)),
    )
}

fn store_with(env: TestEnv) -> TestStore {
    Store::new(AuthState::default(), AuthReducer::new(), env)
}

/// Poll the store until the predicate holds or the deadline passes.
async fn wait_for<F>(store: &TestStore, what: &str, predicate: F)
where
    F: Fn(&AuthState) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if store.state(&predicate).await {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for: {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn bootstrap_with_no_session_settles_unauthenticated() {
    let env = fast_env();
    let store = store_with(env);

    store.send(AuthAction::Bootstrap).await.unwrap();
    wait_for(&store, "loading to clear", |s| !s.loading).await;

    let phase = store.state(AuthState::phase).await;
    assert_eq!(phase, Phase::Unauthenticated);
}

#[tokio::test]
async fn bootstrap_with_session_and_profile_settles_ready() {
    let (session, profile) = signed_in_fixture();
    let env = fast_env();
    env.identity.set_session(session.clone());
    env.profiles.insert_existing(profile.clone());
    let store = store_with(env);

    let completion = store
        .send_and_wait_for(
            AuthAction::Bootstrap,
            |a| matches!(a, AuthAction::ProfileFetched { .. }),
            Duration::from_secs(2),
        )
        .await
        .unwrap();
    assert!(matches!(
        completion,
        AuthAction::ProfileFetched { result: Ok(_), .. }
    ));

    wait_for(&store, "ready phase", |s| s.phase() == Phase::Ready).await;
    let state = store.state(Clone::clone).await;
    assert_eq!(state.user.unwrap().id, session.user.id);
    assert_eq!(state.profile, Some(profile));
}

#[tokio::test]
async fn bootstrap_with_session_but_no_profile_prompts_setup() {
    let (session, _) = signed_in_fixture();
    let env = fast_env();
    env.identity.set_session(session);
    let store = store_with(env);

    store.send(AuthAction::Bootstrap).await.unwrap();
    wait_for(&store, "needs-setup phase", |s| {
        s.phase() == Phase::NeedsProfileSetup
    })
    .await;
}

#[tokio::test]
async fn failed_probe_recovers_through_scheduled_retry() {
    let env = fast_env();
    // First probe fails, the drained queue then succeeds.
    env.identity
        .queue_probe_result(Err(AuthError::Connectivity("refused".into())));
    let store = store_with(env);

    store.send(AuthAction::Bootstrap).await.unwrap();
    wait_for(&store, "connection error", |s| s.connection_error).await;

    // The 50ms retry runs a fresh attempt which now succeeds.
    wait_for(&store, "recovery to unauthenticated", |s| {
        s.phase() == Phase::Unauthenticated
    })
    .await;
    let attempt = store.state(|s| s.attempt).await;
    assert_eq!(attempt, 2);
}

#[tokio::test]
async fn safety_timeout_bounds_the_loading_phase() {
    let env = fast_env();
    env.identity.hang_probe();
    let store = store_with(env);

    store.send(AuthAction::Bootstrap).await.unwrap();
    assert!(store.state(|s| s.loading).await);

    // The probe never settles; only the 200ms timeout clears loading.
    wait_for(&store, "timeout to clear loading", |s| !s.loading).await;
    let state = store.state(Clone::clone).await;
    assert!(!state.connection_error);
    assert!(state.user.is_none());
}

#[tokio::test]
async fn unconfigured_service_renders_without_retry_loop() {
    let env = fast_env();
    env.identity
        .queue_probe_result(Err(AuthError::ServiceUnavailable));
    let store = store_with(env);

    store.send(AuthAction::Bootstrap).await.unwrap();
    wait_for(&store, "unauthenticated phase", |s| {
        s.phase() == Phase::Unauthenticated
    })
    .await;

    // No retry is scheduled for the unconfigured case.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let state = store.state(Clone::clone).await;
    assert_eq!(state.attempt, 1);
    assert!(!state.connection_error);
}

#[tokio::test]
async fn sign_out_from_another_tab_clears_the_state() {
    let (session, profile) = signed_in_fixture();
    let env = fast_env();
    env.identity.set_session(session);
    env.profiles.insert_existing(profile);
    let store = store_with(env.clone());
    let _listener = spawn_auth_listener(store.clone(), &env.identity);

    store.send(AuthAction::Bootstrap).await.unwrap();
    wait_for(&store, "ready phase", |s| s.phase() == Phase::Ready).await;

    // Another tab signs out; the pushed change flows through the listener.
    env.identity.sign_out().await.unwrap();
    wait_for(&store, "unauthenticated after push", |s| {
        s.phase() == Phase::Unauthenticated
    })
    .await;
}

#[tokio::test]
async fn sign_in_from_another_tab_loads_the_profile() {
    let env = fast_env();
    let user = env.identity.register_user("tab@example.com", "password1");
    let (_, mut profile) = signed_in_fixture();
    profile.id = user.id;
    env.profiles.insert_existing(profile);
    let store = store_with(env.clone());
    let _listener = spawn_auth_listener(store.clone(), &env.identity);

    store.send(AuthAction::Bootstrap).await.unwrap();
    wait_for(&store, "unauthenticated phase", |s| {
        s.phase() == Phase::Unauthenticated
    })
    .await;

    env.identity
        .sign_in_with_password("tab@example.com", "password1")
        .await
        .unwrap();
    wait_for(&store, "ready after pushed sign-in", |s| {
        s.phase() == Phase::Ready
    })
    .await;
}

#[tokio::test]
async fn shutdown_rejects_further_actions() {
    let env = fast_env();
    let store = store_with(env);

    store.send(AuthAction::Bootstrap).await.unwrap();
    wait_for(&store, "loading to clear", |s| !s.loading).await;

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    let result = store.send(AuthAction::Bootstrap).await;
    assert!(result.is_err());
}
