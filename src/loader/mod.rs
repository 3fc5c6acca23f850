//! Cached, retrying reference-collection loader
//!
//! A `ReferenceLoader` owns one named collection fetched from a single
//! `ReferenceSource`: it caches the rows for a freshness window, retries
//! transient failures with exponential backoff, and carries the search /
//! lookup / selection helpers filter controls need.
//!
//! `load` takes `&mut self`, so two loads on the same loader cannot
//! interleave; distinct loaders are fully independent.

mod search;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::api::ReferenceSource;
use crate::domain::{field, loose_eq, scalar_string, Row, SelectionEvent};
use crate::error::{RefdataError, Result};

pub use search::natural_cmp;

/// Per-loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Field holding the row's identity (default "id")
    pub value_key: String,

    /// Field holding the row's display label (default "nombre")
    pub label_key: String,

    /// How long a fetched collection stays fresh
    pub cache_time: Duration,

    /// Total fetch attempts per `load` call
    pub retry_attempts: u32,

    /// Base delay between attempts; doubles after each failure
    pub retry_delay: Duration,

    /// Fields searched by default
    pub search_fields: Vec<String>,

    /// Whether search matches are case sensitive
    pub case_sensitive: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            value_key: "id".to_string(),
            label_key: "nombre".to_string(),
            cache_time: Duration::from_secs(5 * 60),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
            search_fields: vec!["nombre".to_string(), "descripcion".to_string()],
            case_sensitive: false,
        }
    }
}

impl LoaderConfig {
    fn validate(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(RefdataError::Config("loader name is required".to_string()));
        }
        if self.value_key.is_empty() {
            return Err(RefdataError::Config("value_key is required".to_string()));
        }
        if self.label_key.is_empty() {
            return Err(RefdataError::Config("label_key is required".to_string()));
        }
        if self.retry_attempts == 0 {
            return Err(RefdataError::Config(
                "retry_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Snapshot of a loader's state for display
#[derive(Debug, Clone)]
pub struct LoaderStats {
    pub total: usize,
    pub cache_valid: bool,
    pub last_fetch_age: Option<Duration>,
    pub retries: u32,
    pub initialized: bool,
}

/// Loads and caches one named reference collection
pub struct ReferenceLoader {
    name: String,
    source: Arc<dyn ReferenceSource>,
    config: LoaderConfig,

    items: Vec<Row>,
    selected: Option<Row>,
    loading: bool,
    error: Option<String>,
    last_fetch: Option<Instant>,
    initialized: bool,
    retry_count: u32,

    events: broadcast::Sender<SelectionEvent>,
}

impl ReferenceLoader {
    /// Create a loader bound to a source; fails fast on bad configuration
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn ReferenceSource>,
        config: LoaderConfig,
    ) -> Result<Self> {
        let name = name.into();
        config.validate(&name)?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            name,
            source,
            config,
            items: Vec::new(),
            selected: None,
            loading: false,
            error: None,
            last_fetch: None,
            initialized: false,
            retry_count: 0,
            events,
        })
    }

    //=== State accessors ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Rows in response order
    pub fn items(&self) -> &[Row] {
        &self.items
    }

    pub fn selected(&self) -> Option<&Row> {
        self.selected.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Loaded at least once and came back empty
    pub fn is_empty(&self) -> bool {
        !self.has_items() && !self.loading && self.initialized
    }

    /// Whether the cached collection has gone stale
    pub fn needs_refresh(&self) -> bool {
        match self.last_fetch {
            Some(at) => at.elapsed() >= self.config.cache_time,
            None => true,
        }
    }

    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            total: self.items.len(),
            cache_valid: !self.needs_refresh(),
            last_fetch_age: self.last_fetch.map(|at| at.elapsed()),
            retries: self.retry_count,
            initialized: self.initialized,
        }
    }

    /// Subscribe to selection change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.events.subscribe()
    }

    //=== Loading ===

    /// Load the collection, serving from cache when fresh.
    ///
    /// Transient failures are retried up to `retry_attempts` times with
    /// exponential backoff (`retry_delay * 2^(attempt-1)` between attempts).
    /// Shape and config errors fail immediately. On exhaustion the terminal
    /// error is stored and returned as `Load`.
    pub async fn load(&mut self, force: bool) -> Result<&[Row]> {
        if !force && !self.needs_refresh() && self.has_items() {
            log::debug!("cache hit for {}", self.name);
            return Ok(&self.items);
        }

        self.retry_count = 0;
        let source = Arc::clone(&self.source);

        loop {
            self.loading = true;
            self.error = None;

            log::debug!(
                "loading {} (attempt {}/{})",
                self.name,
                self.retry_count + 1,
                self.config.retry_attempts
            );

            match source.fetch().await {
                Ok(rows) => {
                    self.items = rows;
                    self.last_fetch = Some(Instant::now());
                    self.initialized = true;
                    self.loading = false;
                    log::info!("loaded {} rows for {}", self.items.len(), self.name);
                    return Ok(&self.items);
                }
                Err(err) if !err.is_retryable() => {
                    log::error!("{} failed without retry: {}", self.name, err);
                    self.error = Some(err.to_string());
                    self.loading = false;
                    return Err(err);
                }
                Err(err) => {
                    self.retry_count += 1;
                    log::warn!(
                        "error loading {} (attempt {}): {}",
                        self.name,
                        self.retry_count,
                        err
                    );

                    if self.retry_count >= self.config.retry_attempts {
                        let message = err.to_string();
                        self.error = Some(message.clone());
                        self.loading = false;
                        log::error!("giving up on {}: {}", self.name, message);
                        return Err(RefdataError::Load(message));
                    }

                    let delay = self.config.retry_delay * 2u32.pow(self.retry_count - 1);
                    log::debug!("waiting {:?} before retrying {}", delay, self.name);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Force a reload, bypassing the cache
    pub async fn refresh(&mut self) -> Result<&[Row]> {
        self.load(true).await
    }

    //=== Search and lookup ===

    /// Substring search over `fields` (default: configured search fields).
    ///
    /// An empty or whitespace-only term returns the full collection.
    pub fn search(&self, term: &str, fields: Option<&[String]>) -> Vec<&Row> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return self.items.iter().collect();
        }

        let needle = if self.config.case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        };
        let fields = fields.unwrap_or(&self.config.search_fields);

        self.items
            .iter()
            .filter(|row| search::row_matches(row, &needle, fields, self.config.case_sensitive))
            .collect()
    }

    /// First row whose value-key field loosely equals `id`
    pub fn find_by_id(&self, id: &serde_json::Value) -> Option<&Row> {
        self.find_by_field(&self.config.value_key, id)
    }

    /// First row whose `field` loosely equals `value`
    pub fn find_by_field(&self, field_name: &str, value: &serde_json::Value) -> Option<&Row> {
        if value.is_null() {
            return None;
        }
        self.items
            .iter()
            .find(|row| field(row, field_name).is_some_and(|v| loose_eq(v, value)))
    }

    /// All rows whose value-key field is in `ids`, in collection order
    pub fn find_many(&self, ids: &[serde_json::Value]) -> Vec<&Row> {
        self.items
            .iter()
            .filter(|row| {
                field(row, &self.config.value_key)
                    .is_some_and(|v| ids.iter().any(|id| loose_eq(v, id)))
            })
            .collect()
    }

    /// Whether a row with the given id exists
    pub fn contains(&self, id: &serde_json::Value) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Values of `field` across the collection, in order
    pub fn values(&self, field_name: &str) -> Vec<serde_json::Value> {
        self.items
            .iter()
            .map(|row| row.get(field_name).cloned().unwrap_or(serde_json::Value::Null))
            .collect()
    }

    /// Group rows by the value of `field`, preserving collection order
    /// within each group
    pub fn group_by(&self, field_name: &str) -> BTreeMap<String, Vec<&Row>> {
        let mut groups: BTreeMap<String, Vec<&Row>> = BTreeMap::new();
        for row in &self.items {
            let key = row
                .get(field_name)
                .and_then(scalar_string)
                .unwrap_or_else(|| "null".to_string());
            groups.entry(key).or_default().push(row);
        }
        groups
    }

    /// Derived display view sorted by label key; never reorders the stored
    /// collection
    pub fn sorted(&self) -> Vec<&Row> {
        let mut view: Vec<&Row> = self.items.iter().collect();
        view.sort_by(|a, b| {
            let la = a.get(&self.config.label_key).and_then(scalar_string);
            let lb = b.get(&self.config.label_key).and_then(scalar_string);
            natural_cmp(la.as_deref().unwrap_or(""), lb.as_deref().unwrap_or(""))
        });
        view
    }

    //=== Selection ===

    /// Set (or with None, clear) the selected row and notify subscribers
    pub fn select(&mut self, item: Option<Row>) {
        if let Some(row) = &item {
            log::debug!(
                "{} selected: {:?}",
                self.name,
                row.get(&self.config.label_key)
            );
        }
        self.selected = item.clone();
        let _ = self.events.send(SelectionEvent {
            loader: self.name.clone(),
            item,
        });
    }

    /// Resolve `id` and select the match.
    ///
    /// A miss is soft: it logs a warning and returns None without touching
    /// the current selection.
    pub fn select_by_id(&mut self, id: &serde_json::Value) -> Option<Row> {
        match self.find_by_id(id).cloned() {
            Some(row) => {
                self.select(Some(row.clone()));
                Some(row)
            }
            None => {
                log::warn!("no {} row with id {}", self.name, id);
                None
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.select(None);
    }

    /// Return the loader to its pre-first-load state
    pub fn reset(&mut self) {
        self.items.clear();
        self.selected = None;
        self.error = None;
        self.last_fetch = None;
        self.initialized = false;
        self.loading = false;
        self.retry_count = 0;
    }
}

impl std::fmt::Debug for ReferenceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceLoader")
            .field("name", &self.name)
            .field("items", &self.items.len())
            .field("initialized", &self.initialized)
            .field("error", &self.error)
            .finish()
    }
}
