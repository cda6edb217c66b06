//! # Host Bridge Traits
//!
//! Abstractions the listening-history core needs from its host.
//!
//! ## Overview
//!
//! The upstream client never talks to a concrete HTTP stack. It receives an
//! [`HttpClient`](http::HttpClient) implementation (the desktop one lives in
//! `bridge-desktop`, tests use `mockall` doubles) and a [`Clock`](time::Clock)
//! so that token expiry and "previous month" defaults can be tested without
//! touching the wall clock.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Executes one HTTP request, no implicit retries
//! - [`Clock`](time::Clock) - Injectable UTC time source
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Transport failures
//! (timeouts, refused connections) are reported as
//! [`BridgeError::Connectivity`](error::BridgeError::Connectivity) so callers can
//! tell them apart from HTTP responses carrying an error status.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single instance can be shared
//! behind an `Arc` across async tasks.

pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use time::{Clock, FixedClock, SystemClock};
