//! API client for the Ayna OTT web API.
//!
//! Covers the authorization endpoints (login, refresh), the category
//! listing and per-channel stream resolution, plus a HEAD check used to
//! weed out dead stream links.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::{Authenticator, RefreshStrategy};
use crate::config::{Config, DeviceProfile};
use crate::models::{LoginRequest, StreamsResponse, TokenGrant};
use crate::playlist::StreamSource;

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &str = "/api/authorization/login";
const REFRESH_PATH: &str = "/api/authorization/refresh";
const CATEGORIES_PATH: &str = "/api/player/categories";
const STREAMS_PATH: &str = "/api/player/streams";

/// The web player only answers browser-looking clients
const USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 18_5 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.5 Mobile/15E148 Safari/604.1";

/// Maximum number of retries for rate-limited (429) catalog/stream requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Category listing paging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPage {
    pub page: u32,
    pub per_page: u32,
    pub content_page: u32,
    pub content_per_page: u32,
}

impl Default for CategoryPage {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            content_page: 1,
            content_per_page: 20,
        }
    }
}

/// API client for Ayna OTT.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    headers: header::HeaderMap,
    operator_id: String,
    device_id: String,
    language: String,
    catalog_profile: DeviceProfile,
    stream_profile: DeviceProfile,
    link_check_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers: Self::browser_headers(&config.base_url, config.user_id.as_deref())?,
            operator_id: config.operator_id.clone(),
            device_id: config.device_id.clone(),
            language: config.language.clone(),
            catalog_profile: config.catalog_profile.clone(),
            stream_profile: config.stream_profile.clone(),
            link_check_timeout: Duration::from_secs(config.link_check_timeout_secs),
        })
    }

    fn browser_headers(base_url: &str, user_id: Option<&str>) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_str(&format!("{}/channels", base_url.trim_end_matches('/')))
                .context("Invalid base URL for referer header")?,
        );
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        if let Some(user_id) = user_id {
            headers.insert(
                "x-user-id",
                header::HeaderValue::from_str(user_id).context("Invalid user id")?,
            );
        }
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn profile_query(&self, profile: &DeviceProfile) -> Vec<(&'static str, String)> {
        vec![
            ("language", self.language.clone()),
            ("operator_id", self.operator_id.clone()),
            ("device_id", self.device_id.clone()),
            ("density", profile.density.to_string()),
            ("client", profile.client.clone()),
            ("platform", profile.platform.clone()),
            ("os", profile.os.clone()),
        ]
    }

    // ===== Request builders =====

    fn login_request(&self, request: &LoginRequest) -> RequestBuilder {
        self.client
            .post(self.url(LOGIN_PATH))
            .headers(self.headers.clone())
            .json(request)
    }

    fn refresh_request(&self, strategy: RefreshStrategy, refresh_token: &str) -> RequestBuilder {
        let request = self.client.post(self.url(REFRESH_PATH)).headers(self.headers.clone());
        strategy.apply(request, refresh_token)
    }

    fn categories_request(&self, bearer: &str, page: CategoryPage) -> RequestBuilder {
        let mut query = self.profile_query(&self.catalog_profile);
        query.extend([
            ("page", page.page.to_string()),
            ("per_page", page.per_page.to_string()),
            ("display_on_main_screen", "1".to_string()),
            ("content_page", page.content_page.to_string()),
            ("content_per_page", page.content_per_page.to_string()),
        ]);
        self.client
            .get(self.url(CATEGORIES_PATH))
            .headers(self.headers.clone())
            .header(header::AUTHORIZATION, bearer)
            .query(&query)
    }

    fn stream_request(&self, bearer: &str, media_id: &str) -> RequestBuilder {
        let mut query = self.profile_query(&self.stream_profile);
        query.push(("media_id", media_id.to_string()));
        self.client
            .get(self.url(STREAMS_PATH))
            .headers(self.headers.clone())
            .header(header::AUTHORIZATION, bearer)
            .query(&query)
    }

    // ===== Response handling =====

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Login and refresh succeed only on 200, not on any 2xx
    async fn read_grant(response: Response) -> Result<TokenGrant, ApiError> {
        let status = response.status();
        let body = if status == StatusCode::OK {
            response.text().await?
        } else {
            response.text().await.unwrap_or_default()
        };
        Self::grant_from(status, &body)
    }

    fn grant_from(status: StatusCode, body: &str) -> Result<TokenGrant, ApiError> {
        if status != StatusCode::OK {
            return Err(ApiError::from_status(status, body));
        }
        TokenGrant::parse(body)
    }

    /// Send a GET, backing off and retrying while rate limited
    async fn send_with_backoff(
        &self,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build().send().await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Self::check_response(response).await;
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::RateLimited);
            }
            warn!(
                url = %response.url(),
                retry = retries,
                backoff_ms = backoff_ms,
                "Rate limited, backing off"
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2; // Exponential backoff
        }
    }

    // ===== Data Fetching Methods =====

    /// Fetch the category listing as raw JSON
    pub async fn fetch_categories(
        &self,
        bearer: &str,
        page: CategoryPage,
    ) -> Result<serde_json::Value, ApiError> {
        let response = self
            .send_with_backoff(|| self.categories_request(bearer, page))
            .await?;
        let text = response.text().await?;
        debug!(bytes = text.len(), "Categories response received");
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("categories response is not JSON: {}", e))
        })
    }

    /// Resolve the playable URL for a channel.
    ///
    /// `Ok(None)` means the server answered with a well-formed body that
    /// carries no stream; transport, status and parse failures are errors.
    pub async fn fetch_stream_url(
        &self,
        bearer: &str,
        media_id: &str,
    ) -> Result<Option<String>, ApiError> {
        let response = self
            .send_with_backoff(|| self.stream_request(bearer, media_id))
            .await?;
        let text = response.text().await?;
        let parsed: StreamsResponse = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("streams response is not JSON: {}", e))
        })?;
        Ok(parsed.first_url().map(str::to_string))
    }

    /// True when a HEAD on the stream URL answers 200 within the link-check timeout
    pub async fn check_link(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(self.link_check_timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!(url = url, error = %e, "Link check failed");
                false
            }
        }
    }
}

impl Authenticator for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<TokenGrant, ApiError> {
        let response = self.login_request(request).send().await?;
        Self::read_grant(response).await
    }

    async fn refresh(
        &self,
        strategy: RefreshStrategy,
        refresh_token: &str,
    ) -> Result<TokenGrant, ApiError> {
        let response = self.refresh_request(strategy, refresh_token).send().await?;
        Self::read_grant(response).await
    }
}

impl StreamSource for ApiClient {
    async fn stream_url(&self, bearer: &str, media_id: &str) -> Result<Option<String>, ApiError> {
        self.fetch_stream_url(bearer, media_id).await
    }

    async fn is_alive(&self, url: &str) -> bool {
        self.check_link(url).await
    }
}
