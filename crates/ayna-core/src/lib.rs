//! ayna-core - session token cache, API client and M3U playlist building
//! for the Ayna OTT web API.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod models;
pub mod playlist;

pub use api::{ApiClient, ApiError, CategoryPage};
pub use auth::{
    AuthError, Authenticator, Credential, CredentialState, FileTokenStore, MemoryTokenStore,
    PasswordVault, RefreshStrategy, TokenCache, TokenStore,
};
pub use config::Config;
pub use models::Channel;
pub use playlist::{CheckedPlaylists, GenerationReport, Playlist, PlaylistGenerator, StreamSource};
