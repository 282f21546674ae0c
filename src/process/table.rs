// src/process/table.rs

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::error::AnalysisError;

static TABLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Invalid CSS selector for tables"));
static ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Invalid CSS selector for rows"));
static CELL_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("Invalid CSS selector for cells"));

/// One field value as it moves through the pipeline.
///
/// `Missing` is the explicit no-value marker: cells the source never had,
/// dates that failed to parse, ranges the extractor could not match. It
/// renders as `null` in JSON output.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// JSON rendering: dates as `YYYY-MM-DD`, timestamps as ISO-8601
    /// without offset, `Missing` as `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Cell::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Cell::Missing => Value::Null,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A schedule table: ordered column names plus rows of cells.
///
/// Invariant: every row holds exactly `columns.len()` cells. Rows keep the
/// document order of the source `<tr>` elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Position of `name`, first match wins when headers repeat.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of `name`, appending an all-`Missing` column when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Cell::Missing);
        }
        self.columns.len() - 1
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First `limit` rows rendered as ordered column-to-value maps.
    /// When headers repeat, the first column under a name supplies the value.
    pub fn records(&self, limit: usize) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                let mut record = serde_json::Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    if !record.contains_key(name) {
                        record.insert(name.clone(), cell.to_json());
                    }
                }
                record
            })
            .collect()
    }
}

/// Parse `html` and return its first `<table>` as a [`Table`].
///
/// Later tables in the document are ignored; pages that split a schedule
/// across several tables are out of scope. A table nested inside a cell
/// contributes neither rows nor cells, only its flattened text stays in the
/// owning cell. The header is the first row made entirely of `<th>` cells,
/// provided no data row came before it. Repeated header text gets a numeric
/// suffix ("date", "date.1") so no column shadows another. Tables without a
/// header get positional column names ("0", "1", ...). Ragged rows are
/// padded with `Missing`; rows wider than the header extend the column set.
pub fn parse_first_table(html: &str) -> Result<Table, AnalysisError> {
    let document = Html::parse_document(html);
    let table_el = document
        .select(&TABLE_SEL)
        .next()
        .ok_or(AnalysisError::NoTableFound)?;

    let mut table = Table::default();
    let mut saw_header = false;

    for tr in table_el.select(&ROW_SEL) {
        if !nearest_ancestor_is(&tr, "table", &table_el) {
            continue;
        }
        let cells: Vec<ElementRef> = tr
            .select(&CELL_SEL)
            .filter(|c| nearest_ancestor_is(c, "tr", &tr))
            .collect();
        if cells.is_empty() {
            continue;
        }

        if !saw_header
            && table.rows.is_empty()
            && cells.iter().all(|c| c.value().name() == "th")
        {
            for cell in &cells {
                let name = unique_name(&table.columns, cell_text(cell));
                table.columns.push(name);
            }
            saw_header = true;
            continue;
        }

        let mut row: Vec<Cell> = cells
            .iter()
            .map(|c| {
                let text = cell_text(c);
                if text.is_empty() {
                    Cell::Missing
                } else {
                    Cell::Text(text)
                }
            })
            .collect();

        while table.columns.len() < row.len() {
            let name = unique_name(&table.columns, table.columns.len().to_string());
            table.columns.push(name);
            for earlier in &mut table.rows {
                earlier.push(Cell::Missing);
            }
        }
        row.resize(table.columns.len(), Cell::Missing);
        table.rows.push(row);
    }

    debug!(
        columns = table.columns.len(),
        rows = table.rows.len(),
        "extracted first table"
    );
    Ok(table)
}

/// Text of a cell with all runs of whitespace collapsed to single spaces.
fn cell_text(el: &ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when the nearest `name` ancestor of `el` is `scope`. Rows and cells
/// of a nested table have a nearer one and fall outside the scope.
fn nearest_ancestor_is(el: &ElementRef, name: &str, scope: &ElementRef) -> bool {
    for node in el.ancestors() {
        if let Some(ancestor) = node.value().as_element() {
            if ancestor.name() == name {
                return node.id() == scope.id();
            }
        }
    }
    false
}

/// Column name with a numeric suffix when it repeats: "date", "date.1", ...
fn unique_name(existing: &[String], candidate: String) -> String {
    if !existing.contains(&candidate) {
        return candidate;
    }
    let mut n = 1;
    loop {
        let suffixed = format!("{}.{}", candidate, n);
        if !existing.contains(&suffixed) {
            return suffixed;
        }
        n += 1;
    }
}
