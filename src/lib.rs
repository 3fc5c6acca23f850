//! refdata - reference-data loading and filter-selection client
//!
//! Fetches reference collections (periods, liquidation types, distribution
//! groups) from the reporting backend, caches them with retry and backoff,
//! manages runtime filter registrations and selections, and resolves the
//! current billing period.

pub mod api;
pub mod dates;
pub mod diag;
pub mod domain;
pub mod error;
pub mod loader;
pub mod period;
pub mod registry;

pub use error::{RefdataError, Result};
