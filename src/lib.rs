//! Workspace facade crate.
//!
//! Exposes the `desktop-shims` feature and re-exports the service layer so a
//! host can depend on one crate instead of wiring each member.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
