//! Runtime directory of filter controls
//!
//! A `FilterRegistry` owns one `ReferenceLoader` per registered filter plus
//! the map of raw selected values. Filters can be registered, removed and
//! toggled while the application runs.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::api::ReferenceSource;
use crate::domain::Row;
use crate::error::{RefdataError, Result};
use crate::loader::{LoaderConfig, ReferenceLoader};

/// Declarative description of one filter control
#[derive(Debug, Clone)]
pub struct FilterSpec {
    /// Unique key within the registry
    pub id: String,

    /// Display label
    pub label: String,

    /// Placeholder shown before a selection is made
    pub placeholder: String,

    /// Field holding the row identity
    pub value_key: String,

    /// Field holding the display label
    pub label_key: String,

    /// Whether the control is currently shown
    pub enabled: bool,
}

impl FilterSpec {
    /// Spec with defaults derived from the id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            placeholder: format!("Seleccione {}", id),
            value_key: "id".to_string(),
            label_key: "nombre".to_string(),
            enabled: true,
            id,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self.placeholder = format!("Seleccione {}", self.label);
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn value_key(mut self, key: impl Into<String>) -> Self {
        self.value_key = key.into();
        self
    }

    pub fn label_key(mut self, key: impl Into<String>) -> Self {
        self.label_key = key.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// What happened on registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The id was new
    Registered,
    /// An existing registration (and its loader and selection) was replaced
    Replaced,
}

/// Aggregate counters over the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub selected: usize,
}

/// Dynamic collection of named filter loaders and their selections
#[derive(Debug, Default)]
pub struct FilterRegistry {
    specs: HashMap<String, FilterSpec>,
    loaders: HashMap<String, ReferenceLoader>,
    selections: HashMap<String, Value>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter backed by `source`.
    ///
    /// The selection entry starts empty. Registering an existing id replaces
    /// the previous filter wholesale; the outcome says which happened.
    pub fn register(
        &mut self,
        spec: FilterSpec,
        source: Arc<dyn ReferenceSource>,
    ) -> Result<RegisterOutcome> {
        if spec.id.trim().is_empty() {
            return Err(RefdataError::Config(
                "filter registration requires an id".to_string(),
            ));
        }

        let config = LoaderConfig {
            value_key: spec.value_key.clone(),
            label_key: spec.label_key.clone(),
            ..Default::default()
        };
        let loader = ReferenceLoader::new(spec.id.clone(), source, config)?;

        let id = spec.id.clone();
        let replaced = self.specs.insert(id.clone(), spec).is_some();
        self.loaders.insert(id.clone(), loader);
        self.selections.insert(id.clone(), Value::Null);

        if replaced {
            log::warn!("filter {} replaced an existing registration", id);
            Ok(RegisterOutcome::Replaced)
        } else {
            log::debug!("filter {} registered", id);
            Ok(RegisterOutcome::Registered)
        }
    }

    /// Remove a filter and its loader and selection.
    ///
    /// Returns false when the id was never registered.
    pub fn deregister(&mut self, id: &str) -> bool {
        if self.specs.remove(id).is_none() {
            log::warn!("filter {} not found", id);
            return false;
        }
        self.loaders.remove(id);
        self.selections.remove(id);
        log::debug!("filter {} deregistered", id);
        true
    }

    /// Set or flip the enabled flag; returns the resulting state, or None
    /// (with a warning) for an unknown id
    pub fn toggle(&mut self, id: &str, enabled: Option<bool>) -> Option<bool> {
        let Some(spec) = self.specs.get_mut(id) else {
            log::warn!("filter {} not found", id);
            return None;
        };
        spec.enabled = enabled.unwrap_or(!spec.enabled);
        Some(spec.enabled)
    }

    pub fn get(&self, id: &str) -> Option<&FilterSpec> {
        self.specs.get(id)
    }

    pub fn loader(&self, id: &str) -> Option<&ReferenceLoader> {
        self.loaders.get(id)
    }

    pub fn loader_mut(&mut self, id: &str) -> Option<&mut ReferenceLoader> {
        self.loaders.get_mut(id)
    }

    /// Load one filter's collection
    pub async fn load(&mut self, id: &str, force: bool) -> Result<&[Row]> {
        match self.loaders.get_mut(id) {
            Some(loader) => loader.load(force).await,
            None => Err(RefdataError::Config(format!("filter {} not found", id))),
        }
    }

    /// Store the raw selected value for `id`; false when unknown
    pub fn set_selection(&mut self, id: &str, value: Value) -> bool {
        match self.selections.get_mut(id) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Raw selected value (null when empty or unknown)
    pub fn selection(&self, id: &str) -> &Value {
        self.selections.get(id).unwrap_or(&Value::Null)
    }

    /// Resolve the current selection to its row via the loader's id lookup
    pub fn resolve_selection(&self, id: &str) -> Option<&Row> {
        let value = self.selections.get(id)?;
        if value.is_null() {
            return None;
        }
        self.loaders.get(id)?.find_by_id(value)
    }

    /// Reset every selection to empty; registrations and loaders untouched
    pub fn clear_selections(&mut self) {
        for value in self.selections.values_mut() {
            *value = Value::Null;
        }
        log::debug!("selections cleared");
    }

    /// Enabled registrations only
    pub fn active(&self) -> Vec<&FilterSpec> {
        self.specs.values().filter(|spec| spec.enabled).collect()
    }

    /// Every registration
    pub fn all(&self) -> Vec<&FilterSpec> {
        self.specs.values().collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let total = self.specs.len();
        let active = self.active().len();
        let selected = self.selections.values().filter(|v| !v.is_null()).count();
        RegistryStats {
            total,
            active,
            inactive: total - active,
            selected,
        }
    }
}
