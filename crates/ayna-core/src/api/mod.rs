//! REST API client module for the Ayna OTT web API.
//!
//! This module provides the `ApiClient` for logging in, refreshing tokens,
//! listing categories and resolving per-channel stream URLs.
//!
//! Authenticated calls carry `Authorization: Bearer <access_token>`
//! obtained from the session token cache.

pub mod client;
pub mod error;

pub use client::{ApiClient, CategoryPage};
pub use error::ApiError;
