//! Filter-selection integration tests
//!
//! Exercises the registry, loaders and period resolver together against
//! in-memory sources.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use refdata::api::ReferenceSource;
use refdata::domain::Row;
use refdata::error::{RefdataError, Result};
use refdata::period::PeriodResolver;
use refdata::registry::{FilterRegistry, FilterSpec, RegisterOutcome};

fn rows(v: Value) -> Vec<Row> {
    v.as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_object().unwrap().clone())
        .collect()
}

/// In-memory source with a call counter
struct CountingSource {
    rows: Vec<Row>,
    calls: AtomicU32,
}

impl CountingSource {
    fn new(data: Value) -> Arc<Self> {
        Arc::new(Self {
            rows: rows(data),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl ReferenceSource for CountingSource {
    async fn fetch(&self) -> Result<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.clone())
    }
}

fn departments() -> Value {
    json!([
        {"id": 7, "nombre": "Tesorería"},
        {"id": 8, "nombre": "Contaduría"},
        {"id": 9, "nombre": "Personal"}
    ])
}

fn liquidation_types() -> Value {
    json!([
        {"id": 1, "nombre": "Mensual"},
        {"id": 2, "nombre": "Aguinaldo"}
    ])
}

/// End-to-end registry scenario: register, load, select, resolve
#[tokio::test]
async fn test_registry_selection_flow() {
    let mut registry = FilterRegistry::new();

    let outcome = registry
        .register(
            FilterSpec::new("dept").label("Departamento"),
            CountingSource::new(departments()),
        )
        .unwrap();
    assert_eq!(outcome, RegisterOutcome::Registered);

    registry
        .register(FilterSpec::new("tipo"), CountingSource::new(liquidation_types()))
        .unwrap();

    // before any selection
    assert!(registry.resolve_selection("dept").is_none());

    registry.load("dept", false).await.unwrap();
    registry.load("tipo", false).await.unwrap();

    assert!(registry.set_selection("dept", json!(7)));
    let dept = registry.resolve_selection("dept").unwrap();
    assert_eq!(dept["nombre"], json!("Tesorería"));

    // selections are per filter
    assert!(registry.resolve_selection("tipo").is_none());

    let stats = registry.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.selected, 1);

    registry.clear_selections();
    assert!(registry.resolve_selection("dept").is_none());
}

/// Caching holds per loader even when driven through the registry
#[tokio::test]
async fn test_registry_load_uses_loader_cache() {
    let source = CountingSource::new(departments());
    let mut registry = FilterRegistry::new();
    registry.register(FilterSpec::new("dept"), source.clone()).unwrap();

    registry.load("dept", false).await.unwrap();
    registry.load("dept", false).await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    registry.load("dept", true).await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

/// Deregistering one filter leaves the others untouched
#[tokio::test]
async fn test_deregister_is_isolated() {
    let mut registry = FilterRegistry::new();
    registry
        .register(FilterSpec::new("dept"), CountingSource::new(departments()))
        .unwrap();
    registry
        .register(FilterSpec::new("tipo"), CountingSource::new(liquidation_types()))
        .unwrap();
    registry.load("tipo", false).await.unwrap();
    registry.set_selection("tipo", json!(2));

    assert!(registry.deregister("dept"));

    let tipo = registry.resolve_selection("tipo").unwrap();
    assert_eq!(tipo["nombre"], json!("Aguinaldo"));
    assert_eq!(registry.stats().total, 1);
}

/// Period resolution next to regular filters
#[tokio::test]
async fn test_period_resolution_with_filters() {
    let periods: Vec<Value> = (1..=12)
        .map(|m| json!({"PERIODO": format!("2025-{:02}-01T00:00:00Z", m), "IDPERIODO": m}))
        .collect();
    let mut resolver = PeriodResolver::new(CountingSource::new(Value::Array(periods))).unwrap();

    resolver.loader_mut().load(false).await.unwrap();
    resolver.auto_select(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());

    assert_eq!(resolver.selected().unwrap()["IDPERIODO"], json!(3));

    let range = resolver.current_range().unwrap();
    assert_eq!(range.start_display, "01/03/2025");
    assert_eq!(range.end_display, "31/03/2025");
    assert_eq!(range.start_oracle, "TO_DATE('01/03/2025', 'DD/MM/YYYY')");
}

/// A failing source surfaces a Load error through the registry
#[tokio::test(start_paused = true)]
async fn test_registry_surfaces_load_errors() {
    struct FailingSource;

    #[async_trait]
    impl ReferenceSource for FailingSource {
        async fn fetch(&self) -> Result<Vec<Row>> {
            Err(RefdataError::Http {
                status: 500,
                status_text: "Internal Server Error".to_string(),
                body: "boom".to_string(),
            })
        }
    }

    let mut registry = FilterRegistry::new();
    registry
        .register(FilterSpec::new("dept"), Arc::new(FailingSource))
        .unwrap();

    let err = registry.load("dept", false).await.unwrap_err();
    assert!(matches!(err, RefdataError::Load(_)));

    let loader = registry.loader("dept").unwrap();
    assert!(loader.error().is_some());
    assert!(!loader.initialized());
}
