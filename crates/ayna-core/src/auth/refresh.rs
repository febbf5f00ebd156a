use reqwest::{header, RequestBuilder};

/// How the refresh token is presented to the refresh endpoint.
///
/// The endpoint's convention is not documented, so each is tried in
/// `DEFAULT_ORDER` until one succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStrategy {
    /// `{"refresh_token": "..."}` as the JSON body
    JsonBody,
    /// `Authorization: Bearer <refresh_token>` with an empty body
    BearerHeader,
}

pub const DEFAULT_ORDER: [RefreshStrategy; 2] =
    [RefreshStrategy::JsonBody, RefreshStrategy::BearerHeader];

impl std::fmt::Display for RefreshStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshStrategy::JsonBody => write!(f, "json body"),
            RefreshStrategy::BearerHeader => write!(f, "bearer header"),
        }
    }
}

impl RefreshStrategy {
    pub fn apply(self, request: RequestBuilder, refresh_token: &str) -> RequestBuilder {
        match self {
            RefreshStrategy::JsonBody => {
                request.json(&serde_json::json!({ "refresh_token": refresh_token }))
            }
            RefreshStrategy::BearerHeader => request
                .bearer_auth(refresh_token)
                .header(header::CONTENT_TYPE, "application/json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(strategy: RefreshStrategy) -> reqwest::Request {
        let client = reqwest::Client::new();
        strategy
            .apply(client.post("https://example.invalid/api/authorization/refresh"), "r-123")
            .build()
            .expect("request")
    }

    #[test]
    fn test_json_body_strategy() {
        let request = build(RefreshStrategy::JsonBody);
        let body = request
            .body()
            .and_then(|b| b.as_bytes())
            .expect("body");
        let value: serde_json::Value = serde_json::from_slice(body).expect("json");
        assert_eq!(value, serde_json::json!({"refresh_token": "r-123"}));
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_bearer_header_strategy() {
        let request = build(RefreshStrategy::BearerHeader);
        assert_eq!(
            request.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer r-123")
        );
        assert_eq!(
            request.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        assert!(request.body().is_none());
    }

    #[test]
    fn test_default_order_tries_body_first() {
        assert_eq!(DEFAULT_ORDER[0], RefreshStrategy::JsonBody);
        assert_eq!(DEFAULT_ORDER[1], RefreshStrategy::BearerHeader);
    }
}
