//! Period date formatting utilities
//!
//! Pure string formatting, no I/O. Periods are month/year pairs; the
//! backend wants Oracle `TO_DATE` literals and `YYYYMM` codes, the UI wants
//! `DD/MM/YYYY`, and exports want ISO-8601. Invalid input is reported with
//! None and an error log, never a panic.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use serde_json::json;

use crate::domain::Row;

/// Accepted year range for period dates
const YEAR_MIN: i32 = 1900;
const YEAR_MAX: i32 = 2100;

/// Output styles for period dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `DD/MM/YYYY`
    DdMmYyyy,
    /// Oracle literal: `TO_DATE('DD/MM/YYYY', 'DD/MM/YYYY')`
    Oracle,
    /// `YYYY-MM-DD`
    Iso,
    /// Period code `YYYYMM`
    Period,
}

/// Start and end of a month in one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRange {
    pub start: String,
    pub end: String,
    /// Oracle-only alternative end using `LAST_DAY(...)`
    pub end_last_day: Option<String>,
}

/// Short and long month names (Spanish, matching the backend data)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthName {
    pub short: &'static str,
    pub long: &'static str,
}

const MONTH_NAMES: [MonthName; 12] = [
    MonthName { short: "Ene", long: "Enero" },
    MonthName { short: "Feb", long: "Febrero" },
    MonthName { short: "Mar", long: "Marzo" },
    MonthName { short: "Abr", long: "Abril" },
    MonthName { short: "May", long: "Mayo" },
    MonthName { short: "Jun", long: "Junio" },
    MonthName { short: "Jul", long: "Julio" },
    MonthName { short: "Ago", long: "Agosto" },
    MonthName { short: "Sep", long: "Septiembre" },
    MonthName { short: "Oct", long: "Octubre" },
    MonthName { short: "Nov", long: "Noviembre" },
    MonthName { short: "Dic", long: "Diciembre" },
];

fn check_period(month: u32, year: i32) -> bool {
    if !(1..=12).contains(&month) {
        log::error!("month must be between 1 and 12, got {}", month);
        return false;
    }
    if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
        log::error!("year must be between {} and {}, got {}", YEAR_MIN, YEAR_MAX, year);
        return false;
    }
    true
}

/// First day of a month as `01/MM/YYYY`
pub fn format_first_day(month: u32, year: i32) -> Option<String> {
    format_date(month, year, 1, DateStyle::DdMmYyyy)
}

/// Format a day of a month in the given style
pub fn format_date(month: u32, year: i32, day: u32, style: DateStyle) -> Option<String> {
    if !check_period(month, year) {
        return None;
    }
    if day < 1 || day > last_day_of_month(month, year)? {
        log::error!("day {} out of range for {}/{}", day, month, year);
        return None;
    }

    Some(match style {
        DateStyle::DdMmYyyy => format!("{:02}/{:02}/{}", day, month, year),
        DateStyle::Oracle => format!("TO_DATE('{:02}/{:02}/{}', 'DD/MM/YYYY')", day, month, year),
        DateStyle::Iso => format!("{}-{:02}-{:02}", year, month, day),
        DateStyle::Period => format!("{}{:02}", year, month),
    })
}

/// Number of days in a month
pub fn last_day_of_month(month: u32, year: i32) -> Option<u32> {
    if !check_period(month, year) {
        return None;
    }
    let first_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    Some(first_next.pred_opt()?.day())
}

/// Start and end of a month in `style`
pub fn month_range(month: u32, year: i32, style: DateStyle) -> Option<MonthRange> {
    let last = last_day_of_month(month, year)?;
    let start = format_date(month, year, 1, style)?;
    let end = format_date(month, year, last, style)?;
    let end_last_day = match style {
        DateStyle::Oracle => Some(format!(
            "LAST_DAY(TO_DATE('01/{:02}/{}', 'DD/MM/YYYY'))",
            month, year
        )),
        _ => None,
    };
    Some(MonthRange { start, end, end_last_day })
}

/// ISO-8601 bounds of a month: midnight of day one through the last
/// millisecond of the last day
pub fn iso_month_bounds(month: u32, year: i32) -> Option<(String, String)> {
    let last = last_day_of_month(month, year)?;
    Some((
        format!("{}-{:02}-01T00:00:00.000Z", year, month),
        format!("{}-{:02}-{:02}T23:59:59.999Z", year, month, last),
    ))
}

/// Spanish month names, 1-indexed
pub fn month_name(month: u32) -> Option<MonthName> {
    if !(1..=12).contains(&month) {
        log::error!("month must be between 1 and 12, got {}", month);
        return None;
    }
    Some(MONTH_NAMES[(month - 1) as usize])
}

/// Parse the date formats the backend actually emits: RFC 3339, bare
/// `YYYY-MM-DD`, or display `DD/MM/YYYY`
pub fn parse_flexible(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(d);
    }
    NaiveDate::parse_from_str(input, "%d/%m/%Y").ok()
}

/// ISO timestamp or date → `DD/MM/YYYY`; None when unparseable
pub fn iso_to_display(iso: &str) -> Option<String> {
    let date = parse_flexible(iso)?;
    Some(format!(
        "{:02}/{:02}/{}",
        date.day(),
        date.month(),
        date.year()
    ))
}

/// `DD/MM/YYYY` (+ optional `HH:MM:SS`) → full ISO-8601 timestamp
pub fn display_to_iso(display: &str, time: Option<&str>) -> Option<String> {
    let date = NaiveDate::parse_from_str(display.trim(), "%d/%m/%Y").ok()?;
    let time = time.unwrap_or("00:00:00");
    Some(format!(
        "{}-{:02}-{:02}T{}.000Z",
        date.year(),
        date.month(),
        date.day(),
        time
    ))
}

/// Whole days from `a` to `b` (either accepted format); None when a date is
/// invalid
pub fn days_between(a: &str, b: &str) -> Option<i64> {
    Some((parse_flexible(b)? - parse_flexible(a)?).num_days())
}

pub fn is_valid_date(input: &str) -> bool {
    parse_flexible(input).is_some()
}

/// Today as `DD/MM/YYYY`
pub fn today_display() -> String {
    let today = Local::now().date_naive();
    format!(
        "{:02}/{:02}/{}",
        today.day(),
        today.month(),
        today.year()
    )
}

/// Month rows for a month selector (ids 1-12)
pub fn months() -> Vec<Row> {
    (1..=12)
        .map(|m| {
            let mut row = Row::new();
            row.insert("id".to_string(), json!(m));
            row.insert("nombre".to_string(), json!(MONTH_NAMES[(m - 1) as usize].long));
            row
        })
        .collect()
}

/// Year rows for a year selector, inclusive
pub fn years(min: i32, max: i32) -> Vec<Row> {
    (min..=max)
        .map(|y| {
            let mut row = Row::new();
            row.insert("id".to_string(), json!(y));
            row.insert("nombre".to_string(), json!(y.to_string()));
            row
        })
        .collect()
}

/// Validity report for a month/year pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodValidity {
    pub month_valid: bool,
    pub year_valid: bool,
    pub complete: bool,
    pub future: bool,
}

/// Validate a period against today
pub fn validate_period(month: u32, year: i32) -> PeriodValidity {
    let today = Local::now().date_naive();
    validate_period_at(month, year, today)
}

/// Validate a period against an explicit "today"
pub fn validate_period_at(month: u32, year: i32, today: NaiveDate) -> PeriodValidity {
    let month_valid = (1..=12).contains(&month);
    let year_valid = (YEAR_MIN..=YEAR_MAX).contains(&year);
    PeriodValidity {
        month_valid,
        year_valid,
        complete: month_valid && year_valid,
        future: year > today.year() || (year == today.year() && month > today.month()),
    }
}
