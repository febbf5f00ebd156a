use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Body of `POST /api/authorization/login`
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub client: String,
    pub density: f64,
    pub device_id: String,
    pub language: String,
    pub login: String,
    pub operator_id: String,
    pub os: String,
    pub password: String,
    pub platform: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("client", &self.client)
            .field("device_id", &self.device_id)
            .field("login", &self.login)
            .field("os", &self.os)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

/// `{"content": {"token": {...}}}` as returned by login and refresh
#[derive(Debug, Deserialize)]
pub struct TokenEnvelope {
    content: Option<TokenContent>,
}

#[derive(Debug, Deserialize)]
struct TokenContent {
    token: Option<TokenObject>,
}

#[derive(Debug, Deserialize)]
struct TokenObject {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Longest token lifetime accepted from the server (ten years)
pub const MAX_EXPIRES_IN_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// A token object that carried everything needed to build a credential.
/// The refresh token is optional because refresh may not rotate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

impl TokenEnvelope {
    pub fn into_grant(self) -> Result<TokenGrant, ApiError> {
        let token = self
            .content
            .and_then(|c| c.token)
            .ok_or_else(|| ApiError::InvalidResponse("missing content.token".to_string()))?;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("missing access_token".to_string()))?;

        let expires_in = token
            .expires_in
            .ok_or_else(|| ApiError::InvalidResponse("missing expires_in".to_string()))?;
        if !(0..=MAX_EXPIRES_IN_SECS).contains(&expires_in) {
            return Err(ApiError::InvalidResponse(format!(
                "expires_in out of range: {}",
                expires_in
            )));
        }

        Ok(TokenGrant {
            access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
            expires_in,
        })
    }
}

impl TokenGrant {
    pub fn parse(body: &str) -> Result<Self, ApiError> {
        let envelope: TokenEnvelope = serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("token response is not JSON: {}", e)))?;
        envelope.into_grant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_grant() {
        let body = r#"{"content":{"token":{
            "access_token":"acc","refresh_token":"ref","expires_in":3600,"token_type":"Bearer"
        }}}"#;
        let grant = TokenGrant::parse(body).expect("grant");
        assert_eq!(grant.access_token, "acc");
        assert_eq!(grant.refresh_token.as_deref(), Some("ref"));
        assert_eq!(grant.expires_in, 3600);
    }

    #[test]
    fn test_parse_grant_without_refresh_token() {
        let body = r#"{"content":{"token":{"access_token":"acc","expires_in":60}}}"#;
        let grant = TokenGrant::parse(body).expect("grant");
        assert_eq!(grant.refresh_token, None);
    }

    #[test]
    fn test_empty_refresh_token_counts_as_missing() {
        let body =
            r#"{"content":{"token":{"access_token":"acc","refresh_token":"","expires_in":60}}}"#;
        assert_eq!(TokenGrant::parse(body).expect("grant").refresh_token, None);
    }

    #[test]
    fn test_malformed_grants_are_rejected() {
        let cases = [
            "not json",
            r#"{}"#,
            r#"{"content":{}}"#,
            r#"{"content":{"token":{"expires_in":60}}}"#,
            r#"{"content":{"token":{"access_token":"","expires_in":60}}}"#,
            r#"{"content":{"token":{"access_token":"acc"}}}"#,
            r#"{"content":{"token":{"access_token":"acc","expires_in":-5}}}"#,
            r#"{"content":{"token":{"access_token":"acc","expires_in":10000000000000}}}"#,
        ];
        for body in cases {
            assert!(
                matches!(TokenGrant::parse(body), Err(ApiError::InvalidResponse(_))),
                "expected InvalidResponse for {body}"
            );
        }
    }

    #[test]
    fn test_ten_year_lifetime_is_accepted() {
        let body = format!(
            r#"{{"content":{{"token":{{"access_token":"acc","expires_in":{}}}}}}}"#,
            MAX_EXPIRES_IN_SECS
        );
        assert_eq!(TokenGrant::parse(&body).expect("grant").expires_in, MAX_EXPIRES_IN_SECS);
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let request = LoginRequest {
            client: "browser".into(),
            density: 1.0,
            device_id: "dev".into(),
            language: "en".into(),
            login: "user@example.com".into(),
            operator_id: "op".into(),
            os: "ios".into(),
            password: "hunter2".into(),
            platform: "mobile".into(),
        };
        let debug = format!("{:?}", request);
        assert!(debug.contains("user@example.com"));
        assert!(!debug.contains("hunter2"));
    }
}
