//! services/client/src/stores/session.rs
//!
//! The session store: a state machine over `Anonymous` and
//! `Authenticated(user)`. It owns the token lifecycle (rehydration at
//! startup, persisting new pairs after login, clearing on logout) and
//! observes the transport's expiry signal so that a 401 raised by *any*
//! call forces the session back to Anonymous.

use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use tokio::sync::watch;
use tracing::{info, warn};

use askdoc_core::domain::{CurrentUser, TokenClaims};
use askdoc_core::ports::{AuthApi, PortError, PortResult, TokenVault};

//=========================================================================================
// Session State
//=========================================================================================

/// Exactly one session exists per process; it is either anonymous or
/// bound to the identity decoded from the persisted access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(CurrentUser),
}

//=========================================================================================
// The Store
//=========================================================================================

pub struct SessionStore {
    auth: Arc<dyn AuthApi>,
    vault: Arc<dyn TokenVault>,
    state: RwLock<AuthState>,
    /// Subscribed to the transport's forced-logout signal. Guarded by a
    /// mutex because checking a `watch::Receiver` needs `&mut`.
    expiry: Mutex<watch::Receiver<u64>>,
}

impl SessionStore {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        vault: Arc<dyn TokenVault>,
        expiry: watch::Receiver<u64>,
    ) -> Self {
        Self {
            auth,
            vault,
            state: RwLock::new(AuthState::Anonymous),
            expiry: Mutex::new(expiry),
        }
    }

    /// Decodes the access token payload without verifying the signature.
    /// The client only displays the identity; the backend remains the
    /// sole authority on whether the token is actually valid.
    fn decode_claims(token: &str) -> PortResult<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .map_err(|e| PortError::Unexpected(format!("could not decode token payload: {}", e)))?;

        Ok(data.claims)
    }

    /// Rehydrates the session from persisted tokens at process start.
    ///
    /// A missing pair leaves the session Anonymous; an expired or
    /// undecodable access token additionally clears the vault.
    pub fn bootstrap(&self) -> PortResult<()> {
        let Some(tokens) = self.vault.load()? else {
            *self.state.write().unwrap() = AuthState::Anonymous;
            return Ok(());
        };

        match Self::decode_claims(&tokens.access) {
            Ok(claims) if claims.exp > Utc::now().timestamp() => {
                info!(username = %claims.username, "restored session from persisted token");
                *self.state.write().unwrap() = AuthState::Authenticated(CurrentUser {
                    id: claims.user_id,
                    username: claims.username,
                });
            }
            Ok(_) => {
                info!("persisted token has expired; clearing stored credentials");
                self.vault.clear()?;
                *self.state.write().unwrap() = AuthState::Anonymous;
            }
            Err(e) => {
                warn!("persisted token is unreadable ({}); clearing stored credentials", e);
                self.vault.clear()?;
                *self.state.write().unwrap() = AuthState::Anonymous;
            }
        }
        Ok(())
    }

    /// Exchanges credentials for tokens, persists the pair, and
    /// transitions to Authenticated. Failures leave the state untouched
    /// and are surfaced to the caller; nothing is retried.
    pub async fn login(&self, username: &str, password: &str) -> PortResult<CurrentUser> {
        let tokens = self.auth.obtain_tokens(username, password).await?;
        let claims = Self::decode_claims(&tokens.access)?;
        self.vault.store(&tokens)?;

        let user = CurrentUser {
            id: claims.user_id,
            username: claims.username,
        };
        info!(username = %user.username, "logged in");
        *self.state.write().unwrap() = AuthState::Authenticated(user.clone());
        Ok(user)
    }

    /// Registers a new account and immediately logs in with the same
    /// credentials.
    pub async fn signup(&self, username: &str, password: &str) -> PortResult<CurrentUser> {
        self.auth.register(username, password).await?;
        self.login(username, password).await
    }

    /// Synchronous, unconditional, and idempotent: clears the vault and
    /// transitions to Anonymous. Cannot fail: a vault error is logged
    /// and the in-memory session still ends.
    pub fn logout(&self) {
        if let Err(e) = self.vault.clear() {
            warn!("could not clear persisted tokens on logout: {}", e);
        }
        *self.state.write().unwrap() = AuthState::Anonymous;
    }

    /// Observes the transport's forced-logout signal. Returns `true` when
    /// a 401 has ended the session since the last check, so the caller
    /// can reset dependent state (document collection, conversation).
    pub fn sync_with_transport(&self) -> bool {
        let expired = {
            let mut rx = self.expiry.lock().unwrap();
            let changed = rx.has_changed().unwrap_or(false);
            if changed {
                let _ = rx.borrow_and_update();
            }
            changed
        };
        if !expired {
            return false;
        }

        let mut state = self.state.write().unwrap();
        let was_authenticated = !matches!(*state, AuthState::Anonymous);
        *state = AuthState::Anonymous;
        if was_authenticated {
            info!("session ended by an authorization-denied response");
        }
        was_authenticated
    }

    pub fn state(&self) -> AuthState {
        self.state.read().unwrap().clone()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        match &*self.state.read().unwrap() {
            AuthState::Authenticated(user) => Some(user.clone()),
            AuthState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(&*self.state.read().unwrap(), AuthState::Authenticated(_))
    }
}

//=========================================================================================
// Tests
//=========================================================================================
