// src/process/datetime.rs

use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::table::{Cell, Table};
use super::{
    PipelineConfig, DATE_COLUMN, END_COLUMN, END_DT_COLUMN, START_COLUMN, START_DT_COLUMN,
};

/// Ambiguous numeric shapes, tried in the configured day order.
const DAYFIRST_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y"];
const MONTHFIRST_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y", "%m/%d/%y"];
/// Unambiguous shapes, always accepted.
const ISO_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a calendar date from free text. Under `dayfirst`, "03/04/2024" is
/// April 3rd, not March 4th. ISO shapes parse either way.
pub fn parse_date(text: &str, dayfirst: bool) -> Option<NaiveDate> {
    let text = text.trim();
    let preferred = if dayfirst {
        DAYFIRST_FORMATS
    } else {
        MONTHFIRST_FORMATS
    };
    preferred
        .iter()
        .chain(ISO_FORMATS.iter())
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Combine a parsed date with a time-of-day string ("HH:MM" or "HH:MM:SS").
fn combine(date: NaiveDate, time: &str) -> Option<NaiveDateTime> {
    let joined = format!("{} {}", date.format("%Y-%m-%d"), time.trim());
    NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Derive `start_dt`/`end_dt` for every row and correct overnight ranges.
///
/// The `date` column is normalized in place to `Cell::Date` (created
/// all-`Missing` when the table never had one). Any component that fails to
/// parse degrades that row's timestamp to `Missing`; nothing here fails the
/// analysis. Wherever both timestamps resolve, `end_dt >= start_dt`: an end
/// before its start is read as crossing midnight and pushed one day forward
/// (an end pushed past the calendar range degrades to `Missing`). The
/// correction needs both sides, a lone `end_dt` is never shifted.
pub fn build_start_end_dt(table: &mut Table, cfg: &PipelineConfig) {
    let date_idx = table.ensure_column(DATE_COLUMN);
    let start_idx = table.ensure_column(START_COLUMN);
    let end_idx = table.ensure_column(END_COLUMN);
    let start_dt_idx = table.ensure_column(START_DT_COLUMN);
    let end_dt_idx = table.ensure_column(END_DT_COLUMN);

    for row in &mut table.rows {
        let date = match &row[date_idx] {
            Cell::Date(d) => Some(*d),
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => parse_date(s, cfg.dayfirst),
            Cell::Missing => None,
        };
        row[date_idx] = match date {
            Some(d) => Cell::Date(d),
            None => Cell::Missing,
        };

        let start_dt = date.and_then(|d| row[start_idx].as_text().and_then(|t| combine(d, t)));
        let end_dt = date.and_then(|d| row[end_idx].as_text().and_then(|t| combine(d, t)));

        let end_dt = match (start_dt, end_dt) {
            (Some(s), Some(e)) if e < s => e.checked_add_signed(Duration::days(1)),
            (_, e) => e,
        };

        row[start_dt_idx] = start_dt.map(Cell::DateTime).unwrap_or(Cell::Missing);
        row[end_dt_idx] = end_dt.map(Cell::DateTime).unwrap_or(Cell::Missing);
    }
}
