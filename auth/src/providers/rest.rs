//! REST adapters for the hosted identity and data services.
//!
//! The identity service speaks the `/auth/v1/*` token API; profile rows
//! live behind the `/rest/v1/user_profiles` table endpoint. This module
//! is the single place where transport failures and service error bodies
//! are classified into [`AuthError`]; everything above it works with the
//! closed error set only.

use crate::actions::{AuthChange, ProfileUpdate};
use crate::config::ServiceConfig;
use crate::error::{AuthError, Result};
use crate::providers::{IdentityProvider, ProfileStore};
use crate::state::{Profile, Session, User, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// PostgREST error code for "query returned no rows".
const NO_ROWS_CODE: &str = "PGRST116";

/// Capacity of the auth-change broadcast channel.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Build the production identity provider and profile store.
///
/// Both share one HTTP client and one session slot, so profile requests
/// are authorized with the token of whatever session the identity
/// provider currently holds.
#[must_use]
pub fn providers(config: &ServiceConfig) -> (RestIdentityProvider, RestProfileStore) {
    let client = reqwest::Client::new();
    let slot = SessionSlot::default();
    let identity = RestIdentityProvider::with_parts(config, client.clone(), slot.clone());
    let profiles = RestProfileStore::with_parts(config, client, slot);
    (identity, profiles)
}

/// Shared in-memory slot holding the current session.
#[derive(Clone, Default)]
struct SessionSlot(Arc<RwLock<Option<Session>>>);

impl SessionSlot {
    fn get(&self) -> Result<Option<Session>> {
        Ok(self.0.read().map_err(|_| AuthError::Internal)?.clone())
    }

    fn set(&self, session: Option<Session>) -> Result<()> {
        *self.0.write().map_err(|_| AuthError::Internal)? = session;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Wire Types
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct WireUser {
    id: uuid::Uuid,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        Self {
            id: UserId(wire.id),
            email: wire.email,
            created_at: wire.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: WireUser,
}

impl From<WireSession> for Session {
    fn from(wire: WireSession) -> Self {
        Self {
            user: wire.user.into(),
            access_token: wire.access_token,
            refresh_token: wire.refresh_token,
            expires_at: Utc::now() + Duration::seconds(wire.expires_in),
        }
    }
}

/// Sign-up returns a full session when email confirmation is off, and a
/// bare user record otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(WireSession),
    User(WireUser),
}

#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ServiceErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn summary(&self, fallback: &str) -> String {
        self.msg
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Error Classification
// ═══════════════════════════════════════════════════════════════════════

fn classify_transport(err: &reqwest::Error) -> AuthError {
    if err.is_connect() || err.is_timeout() {
        AuthError::Connectivity(err.to_string())
    } else {
        AuthError::Http(err.to_string())
    }
}

fn classify_sign_up_error(status: reqwest::StatusCode, body: &str) -> AuthError {
    let parsed = ServiceErrorBody::parse(body);
    let already = parsed
        .error_code
        .as_deref()
        .is_some_and(|code| code == "user_already_exists")
        || parsed
            .msg
            .as_deref()
            .is_some_and(|msg| msg.to_lowercase().contains("already registered"));
    if already {
        AuthError::AlreadyRegistered
    } else {
        AuthError::Http(format!("{status}: {}", parsed.summary("sign-up failed")))
    }
}

fn classify_sign_in_error(status: reqwest::StatusCode, body: &str) -> AuthError {
    let parsed = ServiceErrorBody::parse(body);
    if status == reqwest::StatusCode::BAD_REQUEST
        || parsed
            .error_code
            .as_deref()
            .is_some_and(|code| code == "invalid_credentials")
    {
        AuthError::InvalidCredentials
    } else {
        AuthError::Http(format!("{status}: {}", parsed.summary("sign-in failed")))
    }
}

fn classify_profile_error(status: reqwest::StatusCode, body: &str) -> AuthError {
    let parsed = ServiceErrorBody::parse(body);
    if parsed.code.as_deref() == Some(NO_ROWS_CODE) {
        AuthError::ProfileNotFound
    } else {
        AuthError::ProfileQuery(format!(
            "{status}: {}",
            parsed.summary("profile query failed")
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Identity Provider
// ═══════════════════════════════════════════════════════════════════════

/// Identity provider backed by the hosted `/auth/v1` API.
#[derive(Clone)]
pub struct RestIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    slot: SessionSlot,
    changes: broadcast::Sender<AuthChange>,
}

impl RestIdentityProvider {
    /// Create a provider with its own HTTP client and session slot.
    #[must_use]
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_parts(config, reqwest::Client::new(), SessionSlot::default())
    }

    fn with_parts(config: &ServiceConfig, client: reqwest::Client, slot: SessionSlot) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            client,
            base_url: config.service_url.trim_end_matches('/').to_string(),
            api_key: config.service_key.clone(),
            slot,
            changes,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn store_session(&self, session: Session, change: fn(Session) -> AuthChange) -> Result<Session> {
        self.slot.set(Some(session.clone()))?;
        // Subscribers may not exist yet; a send error only means nobody
        // is listening.
        let _ = self.changes.send(change(session.clone()));
        Ok(session)
    }
}

impl IdentityProvider for RestIdentityProvider {
    async fn probe(&self) -> Result<()> {
        let response = self
            .client
            .get(self.auth_url("health"))
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(AuthError::Connectivity(format!(
                "health check returned {}",
                response.status()
            )))
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
        let response = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(&err))?;
        if !status.is_success() {
            return Err(classify_sign_up_error(status, &body));
        }
        match serde_json::from_str::<SignUpResponse>(&body).map_err(|_| AuthError::Internal)? {
            SignUpResponse::Session(wire) => {
                let session = self.store_session(wire.into(), |session| {
                    AuthChange::SignedIn { session }
                })?;
                Ok(session.user)
            }
            SignUpResponse::User(wire) => Ok(wire.into()),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.auth_url("token?grant_type=password"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(&err))?;
        if !status.is_success() {
            return Err(classify_sign_in_error(status, &body));
        }
        let wire: WireSession = serde_json::from_str(&body).map_err(|_| AuthError::Internal)?;
        self.store_session(wire.into(), |session| AuthChange::SignedIn { session })
    }

    async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.slot.get()? else {
            debug!("sign-out with no stored session");
            return Ok(());
        };
        self.slot.set(None)?;
        let _ = self.changes.send(AuthChange::SignedOut);
        // Token revocation failing does not undo the local sign-out.
        let revoke = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;
        if let Err(err) = revoke {
            warn!(error = %err, "token revocation failed during sign-out");
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        self.slot.get()
    }

    async fn refresh_session(&self) -> Result<Option<Session>> {
        let Some(current) = self.slot.get()? else {
            return Ok(None);
        };
        let response = self
            .client
            .post(self.auth_url("token?grant_type=refresh_token"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "refresh_token": current.refresh_token }))
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(&err))?;
        if !status.is_success() {
            let parsed = ServiceErrorBody::parse(&body);
            return Err(AuthError::SessionFetch(format!(
                "{status}: {}",
                parsed.summary("refresh rejected")
            )));
        }
        let wire: WireSession = serde_json::from_str(&body).map_err(|_| AuthError::Internal)?;
        let session = self.store_session(wire.into(), |session| {
            AuthChange::TokenRefreshed { session }
        })?;
        Ok(Some(session))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Profile Store
// ═══════════════════════════════════════════════════════════════════════

/// Profile store backed by the hosted `/rest/v1/user_profiles` table.
#[derive(Clone)]
pub struct RestProfileStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    slot: SessionSlot,
}

impl RestProfileStore {
    fn with_parts(config: &ServiceConfig, client: reqwest::Client, slot: SessionSlot) -> Self {
        Self {
            client,
            base_url: config.service_url.trim_end_matches('/').to_string(),
            api_key: config.service_key.clone(),
            slot,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/user_profiles", self.base_url)
    }

    /// Profile requests ride on the session token when one exists.
    fn bearer(&self) -> Result<String> {
        Ok(self
            .slot
            .get()?
            .map_or_else(|| self.api_key.clone(), |session| session.access_token))
    }

    async fn read_profile(response: reqwest::Response) -> Result<Profile> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(&err))?;
        if !status.is_success() {
            return Err(classify_profile_error(status, &body));
        }
        serde_json::from_str(&body).map_err(|_| AuthError::Internal)
    }
}

impl ProfileStore for RestProfileStore {
    async fn fetch(&self, id: UserId) -> Result<Profile> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())])
            .header("apikey", &self.api_key)
            .header("Accept", "application/vnd.pgrst.object+json")
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;
        Self::read_profile(response).await
    }

    async fn insert(&self, profile: Profile) -> Result<Profile> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .header("Accept", "application/vnd.pgrst.object+json")
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer()?)
            .json(&profile)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;
        Self::read_profile(response).await
    }

    async fn update(
        &self,
        id: UserId,
        patch: ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Profile> {
        let mut body = serde_json::Map::new();
        if let Some(username) = patch.username {
            body.insert("username".to_string(), username.into());
        }
        if let Some(alias) = patch.alias {
            body.insert("alias".to_string(), alias.into());
        }
        if let Some(age) = patch.age {
            body.insert("age".to_string(), age.into());
        }
        body.insert(
            "updated_at".to_string(),
            serde_json::Value::String(updated_at.to_rfc3339()),
        );
        let response = self
            .client
            .patch(self.table_url())
            .query(&[("id", format!("eq.{id}"))])
            .header("apikey", &self.api_key)
            .header("Accept", "application/vnd.pgrst.object+json")
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer()?)
            .json(&serde_json::Value::Object(body))
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;
        Self::read_profile(response).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_code_maps_to_profile_not_found() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert_eq!(
            classify_profile_error(reqwest::StatusCode::NOT_ACCEPTABLE, body),
            AuthError::ProfileNotFound
        );
    }

    #[test]
    fn other_profile_errors_keep_their_message() {
        let body = r#"{"code":"42501","message":"permission denied"}"#;
        let err = classify_profile_error(reqwest::StatusCode::FORBIDDEN, body);
        match err {
            AuthError::ProfileQuery(message) => assert!(message.contains("permission denied")),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn duplicate_email_maps_to_already_registered() {
        let by_code = r#"{"error_code":"user_already_exists","msg":"User already registered"}"#;
        assert_eq!(
            classify_sign_up_error(reqwest::StatusCode::UNPROCESSABLE_ENTITY, by_code),
            AuthError::AlreadyRegistered
        );
        let by_message = r#"{"msg":"User already registered"}"#;
        assert_eq!(
            classify_sign_up_error(reqwest::StatusCode::BAD_REQUEST, by_message),
            AuthError::AlreadyRegistered
        );
    }

    #[test]
    fn bad_credentials_map_to_invalid_credentials() {
        let body = r#"{"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        assert_eq!(
            classify_sign_in_error(reqwest::StatusCode::BAD_REQUEST, body),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn unparseable_error_bodies_fall_back_to_status() {
        let err = classify_sign_up_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "<html>");
        match err {
            AuthError::Http(message) => assert!(message.contains("500")),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
