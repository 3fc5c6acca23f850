//! Period resolution
//!
//! Periods are billing cycles identified by month and year. On load the
//! resolver auto-selects the record matching today's month/year, falling
//! back to the first record when none matches (a policy, not an error), and
//! derives first-day / last-day strings for display and for the backend.

use chrono::{Datelike, Local, NaiveDate};

use crate::api::ReferenceSource;
use crate::dates::{self, DateStyle};
use crate::domain::{field, Row};
use crate::error::Result;
use crate::loader::{LoaderConfig, ReferenceLoader};

use std::sync::Arc;

/// Row fields that may carry the period date
const DATE_FIELDS: [&str; 2] = ["fecha", "PERIODO"];

/// First/last day of the selected period in every format consumers need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRange {
    pub month: u32,
    pub year: i32,
    /// `01/MM/YYYY`
    pub start_display: String,
    /// `DD/MM/YYYY` of the last day
    pub end_display: String,
    pub start_iso: String,
    pub end_iso: String,
    /// Oracle `TO_DATE` literals
    pub start_oracle: String,
    pub end_oracle: String,
}

/// Loads period records and tracks the selected month/year
#[derive(Debug)]
pub struct PeriodResolver {
    loader: ReferenceLoader,
    month: Option<u32>,
    year: Option<i32>,
}

impl PeriodResolver {
    /// Resolver over the given period source
    pub fn new(source: Arc<dyn ReferenceSource>) -> Result<Self> {
        let loader = ReferenceLoader::new("periodos", source, LoaderConfig::default())?;
        Ok(Self {
            loader,
            month: None,
            year: None,
        })
    }

    //=== State ===

    pub fn loader(&self) -> &ReferenceLoader {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut ReferenceLoader {
        &mut self.loader
    }

    pub fn periods(&self) -> &[Row] {
        self.loader.items()
    }

    pub fn has_periods(&self) -> bool {
        self.loader.has_items()
    }

    pub fn selected(&self) -> Option<&Row> {
        self.loader.selected()
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    //=== Loading and selection ===

    /// Load periods and auto-select the current one
    pub async fn load(&mut self, force: bool) -> Result<()> {
        self.loader.load(force).await?;
        self.auto_select(Local::now().date_naive());
        Ok(())
    }

    /// Select the record whose date falls in `today`'s month and year; when
    /// none matches, the first record wins
    pub fn auto_select(&mut self, today: NaiveDate) {
        let Some(current) = self
            .find_period(today.month(), today.year())
            .or_else(|| self.loader.items().first())
            .cloned()
        else {
            return;
        };

        match period_date(&current) {
            Some(date) => {
                self.month = Some(date.month());
                self.year = Some(date.year());
            }
            None => {
                // record without a usable date: keep today's month/year
                self.month = Some(today.month());
                self.year = Some(today.year());
            }
        }
        log::debug!(
            "period auto-selected: {:?} ({}/{})",
            current.get("PERIODO"),
            self.month.unwrap_or_default(),
            self.year.unwrap_or_default()
        );
        self.loader.select(Some(current));
    }

    /// Pin the selection to an explicit month/year; clears the selected
    /// record when no period matches
    pub fn set_month_year(&mut self, month: u32, year: i32) {
        self.month = Some(month);
        self.year = Some(year);
        let found = self.find_period(month, year).cloned();
        if found.is_none() {
            log::warn!("no period record for {}/{}", month, year);
        }
        self.loader.select(found);
    }

    /// Select the record explicitly, deriving month/year from its date
    pub fn set_period(&mut self, period: Row) {
        if let Some(date) = period_date(&period) {
            self.month = Some(date.month());
            self.year = Some(date.year());
        }
        self.loader.select(Some(period));
    }

    /// Jump to today's month/year
    pub fn set_today(&mut self) {
        let today = Local::now().date_naive();
        self.set_month_year(today.month(), today.year());
    }

    pub fn clear_selection(&mut self) {
        self.month = None;
        self.year = None;
        self.loader.clear_selection();
    }

    //=== Lookups and formatting ===

    /// All records falling in the given month/year
    pub fn periods_for(&self, month: u32, year: i32) -> Vec<&Row> {
        self.loader
            .items()
            .iter()
            .filter(|row| {
                period_date(row)
                    .is_some_and(|d| d.month() == month && d.year() == year)
            })
            .collect()
    }

    /// First/last-day strings for the selected month/year
    pub fn current_range(&self) -> Option<PeriodRange> {
        let month = self.month?;
        let year = self.year?;
        let (start_iso, end_iso) = dates::iso_month_bounds(month, year)?;
        let last = dates::last_day_of_month(month, year)?;
        Some(PeriodRange {
            month,
            year,
            start_display: dates::format_first_day(month, year)?,
            end_display: dates::format_date(month, year, last, DateStyle::DdMmYyyy)?,
            start_iso,
            end_iso,
            start_oracle: dates::format_date(month, year, 1, DateStyle::Oracle)?,
            end_oracle: dates::format_date(month, year, last, DateStyle::Oracle)?,
        })
    }

    fn find_period(&self, month: u32, year: i32) -> Option<&Row> {
        self.loader
            .items()
            .iter()
            .find(|row| {
                period_date(row)
                    .is_some_and(|d| d.month() == month && d.year() == year)
            })
    }
}

/// Date carried by a period record, from whichever field holds it
pub fn period_date(row: &Row) -> Option<NaiveDate> {
    DATE_FIELDS
        .iter()
        .find_map(|key| field(row, key))
        .and_then(|value| match value {
            serde_json::Value::String(s) => dates::parse_flexible(s),
            _ => None,
        })
}

/// Display label for a period record: code plus optional description
pub fn format_period(row: &Row) -> String {
    let code = ["codigo", "CODIGO", "PERIODO"]
        .iter()
        .find_map(|key| field(row, key))
        .and_then(crate::domain::scalar_string)
        .unwrap_or_default();
    let description = ["descripcion", "DESCRIPCION", "nombre"]
        .iter()
        .find_map(|key| field(row, key))
        .and_then(crate::domain::scalar_string);

    match description {
        Some(desc) => format!("{} - {}", code, desc),
        None => code,
    }
}
