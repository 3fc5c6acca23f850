//! The capability seam between loaders and the backend
//!
//! Loaders never look accessors up by name; they are handed a typed
//! `ReferenceSource` at registration time, so a misconfigured accessor is a
//! compile error or a registration-time `Config` error, never a runtime
//! string miss.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::domain::Row;
use crate::error::Result;

/// One backend accessor producing a reference collection
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Fetch the full collection from the backend
    async fn fetch(&self) -> Result<Vec<Row>>;
}

/// A `ReferenceSource` bound to a fixed query on an `ApiClient`
pub struct QuerySource {
    client: Arc<ApiClient>,
    query: String,
}

impl QuerySource {
    pub fn new(client: Arc<ApiClient>, query: impl Into<String>) -> Self {
        Self {
            client,
            query: query.into(),
        }
    }

    /// Shared source for active periods
    pub fn active_periods(client: Arc<ApiClient>) -> Arc<QuerySource> {
        Arc::new(Self::new(
            client,
            "SELECT PERIODO FROM usuario.periodo WHERE activo = 1",
        ))
    }

    /// Shared source for liquidation types
    pub fn liquidation_types(client: Arc<ApiClient>) -> Arc<QuerySource> {
        Arc::new(Self::new(
            client,
            "SELECT * FROM usuario.tabtipoliquidacion ORDER BY 1",
        ))
    }

    /// Shared source for distribution groups
    pub fn distribution_groups(client: Arc<ApiClient>) -> Arc<QuerySource> {
        Arc::new(Self::new(
            client,
            "SELECT * FROM usuario.gruposreparticion ORDER BY 1",
        ))
    }

    /// The SQL this source runs
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[async_trait]
impl ReferenceSource for QuerySource {
    async fn fetch(&self) -> Result<Vec<Row>> {
        self.client.execute(&self.query).await
    }
}

impl std::fmt::Debug for QuerySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySource")
            .field("query", &self.query)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Arc<ApiClient> {
        Arc::new(ApiClient::with_defaults().unwrap())
    }

    #[test]
    fn test_named_sources_carry_their_queries() {
        assert_eq!(
            QuerySource::active_periods(client()).query(),
            "SELECT PERIODO FROM usuario.periodo WHERE activo = 1"
        );
        assert_eq!(
            QuerySource::liquidation_types(client()).query(),
            "SELECT * FROM usuario.tabtipoliquidacion ORDER BY 1"
        );
        assert_eq!(
            QuerySource::distribution_groups(client()).query(),
            "SELECT * FROM usuario.gruposreparticion ORDER BY 1"
        );
    }
}
