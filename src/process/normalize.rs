// src/process/normalize.rs

use tracing::debug;

use super::extract::extract_time_range;
use super::table::{Cell, Table};
use super::{PipelineConfig, END_COLUMN, HORAIRE_COLUMN, START_COLUMN};

/// Fold header variants into their canonical names.
///
/// Matching is case-insensitive on the trimmed header. When several columns
/// map to the same canonical name, the first in column order is renamed and
/// the later ones keep their original headers; no column is dropped.
/// Re-applying is a no-op since canonical names map to themselves.
pub fn rename_headers(table: &mut Table, cfg: &PipelineConfig) {
    for (canonical, variants) in &cfg.header_synonyms {
        let mut taken = false;
        for name in table.columns.iter_mut() {
            let key = name.trim().to_lowercase();
            if !variants.contains(&key.as_str()) {
                continue;
            }
            if taken {
                continue;
            }
            taken = true;
            if name.as_str() != *canonical {
                debug!(from = %name, to = %canonical, "renamed header");
                *name = (*canonical).to_string();
            }
        }
    }
}

/// Guarantee `start`/`end` columns on every row.
///
/// Tables that already carry both columns pass through untouched. Otherwise
/// the combined `horaire` field is run through the extractor; rows the
/// pattern cannot match get `Missing` in both columns, counted later as
/// findings. Without a `horaire` column the two columns are still created,
/// all `Missing`.
pub fn ensure_start_end(table: &mut Table, cfg: &PipelineConfig) {
    if table.column_index(START_COLUMN).is_some() && table.column_index(END_COLUMN).is_some() {
        return;
    }

    let horaire = table.column_index(HORAIRE_COLUMN);
    let start_idx = table.ensure_column(START_COLUMN);
    let end_idx = table.ensure_column(END_COLUMN);

    let Some(horaire_idx) = horaire else {
        return;
    };

    for row in &mut table.rows {
        let extracted = row[horaire_idx]
            .as_text()
            .and_then(|text| extract_time_range(&cfg.time_range, text))
            .map(|(s, e)| (s.to_string(), e.to_string()));
        let (start, end) = match extracted {
            Some((s, e)) => (Cell::Text(s), Cell::Text(e)),
            None => (Cell::Missing, Cell::Missing),
        };
        row[start_idx] = start;
        row[end_idx] = end;
    }
}
