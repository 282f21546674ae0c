// src/process/mod.rs

pub mod datetime;
pub mod extract;
pub mod normalize;
pub mod table;

use regex::Regex;

use self::extract::TIME_RANGE_PATTERN;

/// Canonical column names the pipeline guarantees downstream.
pub const DATE_COLUMN: &str = "date";
pub const HORAIRE_COLUMN: &str = "horaire";
pub const START_COLUMN: &str = "start";
pub const END_COLUMN: &str = "end";
pub const START_DT_COLUMN: &str = "start_dt";
pub const END_DT_COLUMN: &str = "end_dt";

/// Header variants folded into `date`.
const DATE_SYNONYMS: &[&str] = &["jour", "date", "day"];
/// Header variants folded into `horaire`.
const HORAIRE_SYNONYMS: &[&str] = &["horaire", "creneau", "créneau", "heures"];

/// Immutable knobs of the transform pipeline: the compiled time-range
/// pattern, the header-synonym table and the date convention.
///
/// Built once at startup and shared by reference across requests; nothing
/// in the pipeline mutates it.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Compiled form of [`extract::TIME_RANGE_PATTERN`].
    pub time_range: Regex,
    /// `(canonical, variants)` pairs. Variants are matched case-insensitively
    /// against trimmed headers.
    pub header_synonyms: Vec<(&'static str, &'static [&'static str])>,
    /// Read ambiguous numeric dates as day-month-year when true.
    pub dayfirst: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            time_range: Regex::new(TIME_RANGE_PATTERN).expect("Invalid time-range pattern"),
            header_synonyms: vec![
                (DATE_COLUMN, DATE_SYNONYMS),
                (HORAIRE_COLUMN, HORAIRE_SYNONYMS),
            ],
            dayfirst: true,
        }
    }
}
