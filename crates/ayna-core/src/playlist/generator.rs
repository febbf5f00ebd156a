use tracing::{debug, info, warn};

use super::Playlist;
use crate::api::ApiError;
use crate::auth::{AuthError, Authenticator, TokenCache, TokenStore};
use crate::models::Channel;

/// Where stream URLs come from, and whether they still play
#[allow(async_fn_in_trait)]
pub trait StreamSource {
    /// `Ok(None)` when the lookup succeeded but produced no stream
    async fn stream_url(&self, bearer: &str, media_id: &str) -> Result<Option<String>, ApiError>;

    async fn is_alive(&self, url: &str) -> bool;
}

/// Per-run counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub total: usize,
    pub resolved: usize,
    /// Lookup succeeded but returned no stream
    pub missing: usize,
    /// Lookup failed (transport, status or parse)
    pub failed: usize,
    /// Resolved but failed the link check
    pub dead: usize,
}

/// Output of a link-checked run
#[derive(Debug, Clone)]
pub struct CheckedPlaylists {
    pub valid: Playlist,
    pub bad: Playlist,
    pub report: GenerationReport,
}

enum Resolution {
    Url(String),
    Missing,
    Failed,
}

/// Resolves channels one at a time into playlists. Each lookup asks the
/// token cache for a bearer header, so long runs refresh as they go.
pub struct PlaylistGenerator<'a, A, S, R> {
    tokens: &'a mut TokenCache<A, S>,
    source: &'a R,
}

impl<'a, A: Authenticator, S: TokenStore, R: StreamSource> PlaylistGenerator<'a, A, S, R> {
    pub fn new(tokens: &'a mut TokenCache<A, S>, source: &'a R) -> Self {
        Self { tokens, source }
    }

    async fn resolve(&mut self, channel: &Channel) -> Result<Resolution, AuthError> {
        let bearer = self.tokens.bearer_header().await?;
        debug!(channel = %channel.title, id = %channel.id, "Resolving stream");
        match self.source.stream_url(&bearer, &channel.id).await {
            Ok(Some(url)) => Ok(Resolution::Url(url)),
            Ok(None) => {
                warn!(channel = %channel.title, "No stream URL");
                Ok(Resolution::Missing)
            }
            Err(e) => {
                warn!(channel = %channel.title, error = %e, "Stream lookup failed");
                Ok(Resolution::Failed)
            }
        }
    }

    /// One playlist of every channel that resolved, all under `group`.
    /// Unresolved channels are skipped.
    pub async fn generate(
        &mut self,
        channels: &[Channel],
        group: &str,
    ) -> Result<(Playlist, GenerationReport), AuthError> {
        let mut playlist = Playlist::new();
        let mut report = GenerationReport {
            total: channels.len(),
            ..GenerationReport::default()
        };

        for channel in channels {
            match self.resolve(channel).await? {
                Resolution::Url(url) => {
                    playlist.push_channel(channel, group, &url);
                    report.resolved += 1;
                }
                Resolution::Missing => report.missing += 1,
                Resolution::Failed => report.failed += 1,
            }
        }

        info!(resolved = report.resolved, total = report.total, "Playlist generated");
        Ok((playlist, report))
    }

    /// Resolve and link-check every channel. Live links go to `valid`
    /// grouped by channel category; unresolved and dead ones go to `bad`.
    pub async fn generate_checked(
        &mut self,
        channels: &[Channel],
    ) -> Result<CheckedPlaylists, AuthError> {
        let mut valid = Playlist::new();
        let mut bad = Playlist::new();
        let mut report = GenerationReport {
            total: channels.len(),
            ..GenerationReport::default()
        };

        for channel in channels {
            let url = match self.resolve(channel).await? {
                Resolution::Url(url) => url,
                Resolution::Missing => {
                    report.missing += 1;
                    bad.push_missing(channel);
                    continue;
                }
                Resolution::Failed => {
                    report.failed += 1;
                    bad.push_missing(channel);
                    continue;
                }
            };
            report.resolved += 1;

            if !self.source.is_alive(&url).await {
                warn!(channel = %channel.title, "Dead link");
                report.dead += 1;
                bad.push_dead(channel, &url);
                continue;
            }

            let group = channel.category.as_deref().unwrap_or("");
            valid.push_channel(channel, group, &url);
        }

        info!(
            valid = valid.len(),
            bad = bad.len(),
            total = report.total,
            "Checked playlists generated"
        );
        Ok(CheckedPlaylists { valid, bad, report })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use chrono::Duration;

    use super::*;
    use crate::auth::credential::now_seconds;
    use crate::auth::{Credential, MemoryTokenStore, RefreshStrategy};
    use crate::models::{LoginRequest, TokenGrant};

    struct RejectingAuth;

    impl Authenticator for RejectingAuth {
        async fn login(&self, _request: &LoginRequest) -> Result<TokenGrant, ApiError> {
            Err(ApiError::Unauthorized)
        }

        async fn refresh(
            &self,
            _strategy: RefreshStrategy,
            _refresh_token: &str,
        ) -> Result<TokenGrant, ApiError> {
            Err(ApiError::Unauthorized)
        }
    }

    enum Lookup {
        Url(&'static str),
        Empty,
        Error,
    }

    #[derive(Default)]
    struct MockSource {
        lookups: HashMap<&'static str, Lookup>,
        alive: HashSet<&'static str>,
        bearers: RefCell<Vec<String>>,
    }

    impl StreamSource for MockSource {
        async fn stream_url(
            &self,
            bearer: &str,
            media_id: &str,
        ) -> Result<Option<String>, ApiError> {
            self.bearers.borrow_mut().push(bearer.to_string());
            match self.lookups.get(media_id) {
                Some(Lookup::Url(url)) => Ok(Some(url.to_string())),
                Some(Lookup::Empty) | None => Ok(None),
                Some(Lookup::Error) => Err(ApiError::ServerError("boom".into())),
            }
        }

        async fn is_alive(&self, url: &str) -> bool {
            self.alive.contains(url)
        }
    }

    fn login_request() -> LoginRequest {
        LoginRequest {
            client: "browser".into(),
            density: 3.0,
            device_id: "device".into(),
            language: "en".into(),
            login: "viewer@example.com".into(),
            operator_id: "operator".into(),
            os: "ios".into(),
            password: "secret".into(),
            platform: "mobile".into(),
        }
    }

    fn tokens(expires_in_from_now: i64) -> TokenCache<RejectingAuth, MemoryTokenStore> {
        let now = now_seconds();
        let credential = Credential {
            access_token: "acc".into(),
            refresh_token: "ref".into(),
            expires_in: 3600,
            expires_at: now + Duration::seconds(expires_in_from_now),
            issued_at: now,
        };
        TokenCache::new(RejectingAuth, MemoryTokenStore::with(credential), login_request())
    }

    fn channel(id: &str, category: Option<&str>) -> Channel {
        Channel {
            id: id.to_string(),
            title: format!("Channel {}", id),
            logo: format!("https://img.example/{}.png", id),
            category: category.map(str::to_string),
        }
    }

    fn source() -> MockSource {
        let mut source = MockSource::default();
        source.lookups.insert("a", Lookup::Url("https://cdn.example/a.m3u8"));
        source.lookups.insert("b", Lookup::Empty);
        source.lookups.insert("c", Lookup::Error);
        source.lookups.insert("d", Lookup::Url("https://cdn.example/d.m3u8"));
        source.alive.insert("https://cdn.example/a.m3u8");
        source
    }

    #[tokio::test]
    async fn test_generate_skips_unresolved_channels() {
        let mut tokens = tokens(3000);
        let source = source();
        let channels = vec![
            channel("a", None),
            channel("b", None),
            channel("c", None),
            channel("d", None),
        ];

        let (playlist, report) = PlaylistGenerator::new(&mut tokens, &source)
            .generate(&channels, "Live")
            .await
            .expect("generate");

        assert_eq!(playlist.len(), 2);
        assert!(playlist
            .as_str()
            .contains("group-title=\"Live\",Channel a\nhttps://cdn.example/a.m3u8\n"));
        assert!(!playlist.as_str().contains("Channel b"));
        assert_eq!(
            report,
            GenerationReport {
                total: 4,
                resolved: 2,
                missing: 1,
                failed: 1,
                dead: 0,
            }
        );
        assert!(source.bearers.borrow().iter().all(|b| b == "Bearer acc"));
    }

    #[tokio::test]
    async fn test_generate_checked_splits_valid_and_bad() {
        let mut tokens = tokens(3000);
        let source = source();
        let channels = vec![
            channel("a", Some("News")),
            channel("b", None),
            channel("c", None),
            channel("d", Some("Sports")),
        ];

        let out = PlaylistGenerator::new(&mut tokens, &source)
            .generate_checked(&channels)
            .await
            .expect("generate");

        assert_eq!(out.valid.len(), 1);
        assert!(out.valid.as_str().contains("tvg-id=\"a\""));
        assert!(out.valid.as_str().contains("group-title=\"News\""));

        assert_eq!(out.bad.len(), 3);
        assert!(out.bad.as_str().contains("#EXTINF:-1,Channel b (NO URL)\n#\n"));
        assert!(out.bad.as_str().contains("#EXTINF:-1,Channel c (NO URL)\n#\n"));
        assert!(out.bad.as_str().contains(
            "#EXTINF:-1 tvg-logo=\"https://img.example/d.png\",Channel d\n\
             https://cdn.example/d.m3u8\n"
        ));
        assert_eq!(out.report.dead, 1);
    }

    #[tokio::test]
    async fn test_uncategorised_valid_channel_has_empty_group() {
        let mut tokens = tokens(3000);
        let source = source();
        let out = PlaylistGenerator::new(&mut tokens, &source)
            .generate_checked(&[channel("a", None)])
            .await
            .expect("generate");
        assert!(out.valid.as_str().contains("group-title=\"\",Channel a"));
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_run() {
        let mut tokens = tokens(-10);
        let source = source();
        let result = PlaylistGenerator::new(&mut tokens, &source)
            .generate(&[channel("a", None)], "Live")
            .await;
        assert!(matches!(result, Err(AuthError::Login(ApiError::Unauthorized))));
        assert!(source.bearers.borrow().is_empty());
    }
}
