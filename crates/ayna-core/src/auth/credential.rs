use chrono::serde::ts_seconds;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::models::TokenGrant;

/// Access + refresh token pair as persisted in the token file.
///
/// Timestamps are stored as unix seconds. They are always built with whole
/// seconds so a save/load round-trip compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(with = "ts_seconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "saved_at", with = "ts_seconds")]
    pub issued_at: DateTime<Utc>,
}

/// Where a credential sits in its lifecycle relative to the refresh margin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    NoCredential,
    Valid,
    NearExpiry,
    Expired,
}

impl std::fmt::Display for CredentialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialState::NoCredential => write!(f, "No credential"),
            CredentialState::Valid => write!(f, "Valid"),
            CredentialState::NearExpiry => write!(f, "Near expiry"),
            CredentialState::Expired => write!(f, "Expired"),
        }
    }
}

impl CredentialState {
    pub fn of(credential: Option<&Credential>, now: DateTime<Utc>, margin: Duration) -> Self {
        match credential {
            None => CredentialState::NoCredential,
            Some(c) => c.state(now, margin),
        }
    }
}

/// Current time truncated to whole seconds
pub fn now_seconds() -> DateTime<Utc> {
    Utc.timestamp_opt(Utc::now().timestamp(), 0)
        .single()
        .unwrap_or_else(Utc::now)
}

impl Credential {
    /// Build a credential from a token grant issued at `now`.
    /// `previous_refresh` is carried forward when the grant did not rotate
    /// the refresh token.
    pub fn from_grant(
        grant: TokenGrant,
        previous_refresh: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let refresh_token = grant
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or_else(|| ApiError::InvalidResponse("missing refresh_token".to_string()))?;

        let expires_at = Duration::try_seconds(grant.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                ApiError::InvalidResponse(format!("expires_in out of range: {}", grant.expires_in))
            })?;

        Ok(Self {
            access_token: grant.access_token,
            refresh_token,
            expires_in: grant.expires_in,
            expires_at,
            issued_at: now,
        })
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    pub fn state(&self, now: DateTime<Utc>, margin: Duration) -> CredentialState {
        let remaining = self.remaining(now);
        if remaining > margin {
            CredentialState::Valid
        } else if remaining > Duration::zero() {
            CredentialState::NearExpiry
        } else {
            CredentialState::Expired
        }
    }

    /// Authorization header value for API calls
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}
