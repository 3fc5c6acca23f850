//! HTTP access to the reporting backend
//!
//! `ApiClient` is the leaf component: it performs the POST calls, parses
//! JSON and validates the row-collection shape. Each call returns its own
//! isolated result; there is no shared loading/error state to race on.
//! `ReferenceSource` is the capability seam loaders are built against.

mod client;
mod source;

pub use client::{ApiClient, ApiConfig, ConnectionStatus};
pub use source::{QuerySource, ReferenceSource};
