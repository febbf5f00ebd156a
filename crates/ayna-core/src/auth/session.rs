use chrono::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::credential::now_seconds;
use super::refresh::{RefreshStrategy, DEFAULT_ORDER};
use super::{Credential, CredentialState, TokenStore};
use crate::api::ApiError;
use crate::models::{LoginRequest, TokenGrant};

/// Default window before expiry in which a refresh is attempted (5 minutes)
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 300;

/// The remote half of the token lifecycle.
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    async fn login(&self, request: &LoginRequest) -> Result<TokenGrant, ApiError>;

    async fn refresh(
        &self,
        strategy: RefreshStrategy,
        refresh_token: &str,
    ) -> Result<TokenGrant, ApiError>;
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login failed: {0}")]
    Login(#[source] ApiError),

    #[error("No account configured: set AYNA_LOGIN and AYNA_PASSWORD or run `ayna-m3u login`")]
    MissingAccount,

    #[error("Token store failure: {0:#}")]
    Store(anyhow::Error),
}

impl AuthError {
    /// True when login never reached the server
    pub fn is_transport(&self) -> bool {
        matches!(self, AuthError::Login(e) if e.is_transport())
    }
}

/// Hands out a currently valid access token, refreshing or logging in
/// as needed. Owned by the caller; nothing here is global.
pub struct TokenCache<A, S> {
    api: A,
    store: S,
    login_request: LoginRequest,
    margin: Duration,
    strategies: Vec<RefreshStrategy>,
}

impl<A: Authenticator, S: TokenStore> TokenCache<A, S> {
    pub fn new(api: A, store: S, login_request: LoginRequest) -> Self {
        Self {
            api,
            store,
            login_request,
            margin: Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
            strategies: DEFAULT_ORDER.to_vec(),
        }
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<RefreshStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn margin(&self) -> Duration {
        self.margin
    }

    /// Return a credential that is good for at least `margin`, touching the
    /// network only when the stored one is missing or close to expiry.
    pub async fn get_valid_credential(&mut self) -> Result<Credential, AuthError> {
        let Some(credential) = self.load_current()? else {
            info!("No stored token, logging in");
            return self.login().await;
        };

        match credential.state(now_seconds(), self.margin) {
            CredentialState::Valid => Ok(credential),
            state => {
                debug!(%state, expires_at = %credential.expires_at, "Token needs renewal");
                self.renew(&credential).await
            }
        }
    }

    /// Refresh even if the stored credential is still valid
    pub async fn force_refresh(&mut self) -> Result<Credential, AuthError> {
        match self.load_current()? {
            Some(credential) => self.renew(&credential).await,
            None => self.login().await,
        }
    }

    /// `"Bearer <access_token>"` for the current valid credential
    pub async fn bearer_header(&mut self) -> Result<String, AuthError> {
        Ok(self.get_valid_credential().await?.bearer())
    }

    /// Stored credential and its state, without any network call
    pub fn status(&self) -> Result<(CredentialState, Option<Credential>), AuthError> {
        let current = self.load_current()?;
        let state = CredentialState::of(current.as_ref(), now_seconds(), self.margin);
        Ok((state, current))
    }

    /// Log in with the configured account and persist the result.
    /// No retry: any failure is returned as `AuthError::Login`.
    pub async fn login(&mut self) -> Result<Credential, AuthError> {
        if self.login_request.login.is_empty() || self.login_request.password.is_empty() {
            return Err(AuthError::MissingAccount);
        }
        info!(login = %self.login_request.login, "Performing login");
        let grant = self
            .api
            .login(&self.login_request)
            .await
            .map_err(AuthError::Login)?;

        let credential =
            Credential::from_grant(grant, None, now_seconds()).map_err(AuthError::Login)?;
        self.persist(&credential)?;

        info!(expires_in = credential.expires_in, "Login successful");
        Ok(credential)
    }

    /// Mint a new access token from `old_refresh_token`, trying each
    /// strategy in order. `Ok(None)` means every strategy failed and the
    /// caller should log in again; `Err` only comes from the store.
    pub async fn refresh(
        &mut self,
        old_refresh_token: &str,
    ) -> Result<Option<Credential>, AuthError> {
        let strategies = self.strategies.clone();
        for strategy in strategies {
            let grant = match self.api.refresh(strategy, old_refresh_token).await {
                Ok(grant) => grant,
                Err(e) => {
                    warn!(%strategy, error = %e, "Refresh attempt failed");
                    continue;
                }
            };

            match Credential::from_grant(grant, Some(old_refresh_token), now_seconds()) {
                Ok(credential) => {
                    self.persist(&credential)?;
                    info!(%strategy, expires_in = credential.expires_in, "Token refreshed");
                    return Ok(Some(credential));
                }
                Err(e) => warn!(%strategy, error = %e, "Refresh response unusable"),
            }
        }

        warn!("Refresh failed with every strategy");
        Ok(None)
    }

    /// Forget the stored credential
    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.store.clear().map_err(AuthError::Store)
    }

    async fn renew(&mut self, credential: &Credential) -> Result<Credential, AuthError> {
        if let Some(refreshed) = self.refresh(&credential.refresh_token).await? {
            return Ok(refreshed);
        }
        info!("Falling back to login");
        self.login().await
    }

    fn load_current(&self) -> Result<Option<Credential>, AuthError> {
        self.store.load().map_err(AuthError::Store)
    }

    fn persist(&mut self, credential: &Credential) -> Result<(), AuthError> {
        self.store.save(credential).map_err(AuthError::Store)
    }
}
