//! # Spotify Provider
//!
//! Client for the Spotify Web API endpoints behind the listening reports.
//!
//! ## Overview
//!
//! This module provides:
//! - The [`SpotifyApi`] trait consumed by the service layer
//! - [`SpotifyConnector`], its implementation over the host `HttpClient`
//! - Serde models for tracks, artists, audio features and play history
//! - Offset pagination for top items and cursor pagination for recent plays
//!
//! Bearer tokens come from `core_auth::TokenManager`. A request rejected with
//! `401` is retried exactly once after a forced token refresh; every other
//! failure is returned to the caller untouched.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{SpotifyApi, SpotifyConnector};
pub use error::{Result, SpotifyError};
pub use types::{
    Album, Artist, ArtistRef, AudioFeatures, Followers, Image, PlayHistoryItem, TimeRange, Track,
    UserProfile,
};
