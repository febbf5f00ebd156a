//! Authentication: the session token cache and its collaborators.
//!
//! This module provides:
//! - `Credential`: access + refresh token pair with absolute expiry
//! - `TokenStore`: persistence for the current credential (file or memory)
//! - `RefreshStrategy`: the ways a refresh token can be presented
//! - `TokenCache`: hands out a valid access token, refreshing or logging in
//! - `PasswordVault`: account password in the OS keychain via keyring
//!
//! Tokens are refreshed once they come within the refresh margin
//! (5 minutes by default) of expiry.

pub mod credential;
pub mod keychain;
pub mod refresh;
pub mod session;
pub mod store;

pub use credential::{Credential, CredentialState};
pub use keychain::PasswordVault;
pub use refresh::{RefreshStrategy, DEFAULT_ORDER};
pub use session::{AuthError, Authenticator, TokenCache, DEFAULT_REFRESH_MARGIN_SECS};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_FILE};
