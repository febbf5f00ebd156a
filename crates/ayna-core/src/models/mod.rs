//! Wire models for the Ayna OTT web API.
//!
//! - `TokenEnvelope`, `TokenGrant`: login and refresh responses
//! - `CategoriesResponse`, `Channel`: catalog listings
//! - `StreamsResponse`: per-channel stream resolution

pub mod channel;
pub mod stream;
pub mod token;

pub use channel::{CategoriesResponse, Category, Channel};
pub use stream::StreamsResponse;
pub use token::{LoginRequest, TokenEnvelope, TokenGrant, MAX_EXPIRES_IN_SECS};
