// src/analyze.rs

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::AnalysisError;
use crate::fetch;
use crate::process::table::{self, Table};
use crate::process::{datetime, normalize, PipelineConfig, START_DT_COLUMN};

/// Rows included in the result preview.
pub const PREVIEW_ROWS: usize = 10;

/// Data-quality note attached to a successful analysis. Findings never fail
/// the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    /// Data rows in the table, before the preview cut.
    pub rows: usize,
}

/// Successful analysis payload: the echoed source, row counts, findings
/// and a preview of the first rows in post-normalization shape.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub status: &'static str,
    pub source: String,
    pub meta: Meta,
    pub findings: Vec<Finding>,
    pub preview: Vec<serde_json::Map<String, Value>>,
}

/// Fetch `url` and analyze the planning table it contains.
#[instrument(level = "info", skip(client, cfg))]
pub async fn analyze_planning(
    client: &Client,
    cfg: &PipelineConfig,
    url: &str,
) -> Result<AnalysisReport, AnalysisError> {
    let html = fetch::fetch_page_text(client, url).await?;
    analyze_html(cfg, url, &html)
}

/// Run the transform pipeline over already-fetched HTML.
///
/// Pure and synchronous: loader, column normalizer, timestamp builder, then
/// findings over the result. Per-row parse problems have already degraded
/// to `Missing` by the time findings are counted; only a structurally
/// unusable document (no `<table>`, zero data rows) is an error.
pub fn analyze_html(
    cfg: &PipelineConfig,
    url: &str,
    html: &str,
) -> Result<AnalysisReport, AnalysisError> {
    let mut table = table::parse_first_table(html)?;
    normalize::rename_headers(&mut table, cfg);
    normalize::ensure_start_end(&mut table, cfg);
    datetime::build_start_end_dt(&mut table, cfg);

    let total_rows = table.row_count();
    if total_rows == 0 {
        return Err(AnalysisError::EmptyTable);
    }

    let unresolved_start = unresolved_start_count(&table);
    let mut findings = Vec::new();
    if unresolved_start > 0 {
        findings.push(Finding {
            kind: FindingKind::Warning,
            message: format!("{} rows with no usable start time.", unresolved_start),
        });
    }

    info!(rows = total_rows, unresolved_start, "planning analyzed");

    Ok(AnalysisReport {
        status: "ok",
        source: url.to_string(),
        meta: Meta { rows: total_rows },
        findings,
        preview: table.records(PREVIEW_ROWS),
    })
}

/// Rows whose `start_dt` never resolved.
fn unresolved_start_count(table: &Table) -> usize {
    match table.column_index(START_DT_COLUMN) {
        Some(idx) => table.rows.iter().filter(|r| r[idx].is_missing()).count(),
        None => table.row_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,planscraper=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn cfg() -> PipelineConfig {
        PipelineConfig::default()
    }

    const PLANNING_PAGE: &str = r#"
        <html><body>
          <h1>Planning de la semaine</h1>
          <table>
            <tr><th>Jour</th><th>Créneau</th><th>Agent</th></tr>
            <tr><td>01/04/2024</td><td>08:00-16:30</td><td>Alice</td></tr>
            <tr><td>02/04/2024</td><td>22:00 à 06:00</td><td>Bob</td></tr>
            <tr><td>03/04/2024</td><td>repos</td><td>Chloé</td></tr>
          </table>
        </body></html>"#;

    #[test]
    fn analyzes_a_planning_page_end_to_end() {
        init_test_logging();
        let report = analyze_html(&cfg(), "https://example.tld/planning", PLANNING_PAGE).unwrap();

        assert_eq!(report.status, "ok");
        assert_eq!(report.source, "https://example.tld/planning");
        assert_eq!(report.meta.rows, 3);

        // "repos" has no extractable range
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, FindingKind::Warning);
        assert!(report.findings[0].message.contains('1'));

        let first = &report.preview[0];
        assert_eq!(first["date"], "2024-04-01");
        assert_eq!(first["start"], "08:00");
        assert_eq!(first["end"], "16:30");
        assert_eq!(first["start_dt"], "2024-04-01T08:00:00");
        assert_eq!(first["end_dt"], "2024-04-01T16:30:00");
        assert_eq!(first["Agent"], "Alice");

        // overnight shift rolled into the next day
        let second = &report.preview[1];
        assert_eq!(second["start_dt"], "2024-04-02T22:00:00");
        assert_eq!(second["end_dt"], "2024-04-03T06:00:00");

        // unresolved row keeps its columns, values null
        let third = &report.preview[2];
        assert!(third["start_dt"].is_null());
        assert!(third["end_dt"].is_null());
        assert_eq!(third["Agent"], "Chloé");
    }

    #[test]
    fn counts_every_unresolved_start_row() {
        let html = r#"<table>
            <tr><th>date</th><th>horaire</th></tr>
            <tr><td>01/04/2024</td><td>08:00-16:30</td></tr>
            <tr><td>02/04/2024</td><td>repos</td></tr>
            <tr><td>03/04/2024</td><td>09:00-17:00</td></tr>
            <tr><td>04/04/2024</td><td>congé</td></tr>
            <tr><td>05/04/2024</td><td>10:00-18:00</td></tr>
        </table>"#;
        let report = analyze_html(&cfg(), "u", html).unwrap();
        assert_eq!(report.meta.rows, 5);
        assert_eq!(report.findings.len(), 1);
        assert!(report.findings[0].message.contains('2'));
    }

    #[test]
    fn clean_tables_produce_no_findings() {
        let html = r#"<table>
            <tr><th>jour</th><th>heures</th></tr>
            <tr><td>01/04/2024</td><td>08:00-16:30</td></tr>
        </table>"#;
        let report = analyze_html(&cfg(), "u", html).unwrap();
        assert!(report.findings.is_empty());
    }

    #[test]
    fn rows_without_a_date_count_as_unresolved() {
        let html = r#"<table>
            <tr><th>horaire</th></tr>
            <tr><td>08:00-16:30</td></tr>
        </table>"#;
        let report = analyze_html(&cfg(), "u", html).unwrap();
        // times extracted but no date to anchor them
        assert_eq!(report.findings.len(), 1);
        assert!(report.preview[0]["start_dt"].is_null());
        assert_eq!(report.preview[0]["start"], "08:00");
    }

    #[test]
    fn empty_table_is_an_error() {
        let html = "<table><tr><th>date</th><th>horaire</th></tr></table>";
        assert_eq!(
            analyze_html(&cfg(), "u", html).unwrap_err(),
            AnalysisError::EmptyTable
        );
    }

    #[test]
    fn missing_table_is_an_error() {
        assert_eq!(
            analyze_html(&cfg(), "u", "<p>pas de planning</p>").unwrap_err(),
            AnalysisError::NoTableFound
        );
    }

    #[test]
    fn preview_is_capped_but_meta_counts_all_rows() {
        let mut html = String::from("<table><tr><th>date</th><th>horaire</th></tr>");
        for day in 1..=12 {
            html.push_str(&format!(
                "<tr><td>{:02}/04/2024</td><td>08:00-16:30</td></tr>",
                day
            ));
        }
        html.push_str("</table>");

        let report = analyze_html(&cfg(), "u", &html).unwrap();
        assert_eq!(report.meta.rows, 12);
        assert_eq!(report.preview.len(), PREVIEW_ROWS);
    }

    #[test]
    fn resolved_rows_never_end_before_they_start() {
        let html = r#"<table>
            <tr><th>date</th><th>horaire</th></tr>
            <tr><td>01/04/2024</td><td>08:00-16:30</td></tr>
            <tr><td>01/04/2024</td><td>22:00 à 06:00</td></tr>
            <tr><td>02/04/2024</td><td>23:30-00:15</td></tr>
        </table>"#;
        let report = analyze_html(&cfg(), "u", html).unwrap();
        for record in &report.preview {
            let (start, end) = (&record["start_dt"], &record["end_dt"]);
            if let (Some(s), Some(e)) = (start.as_str(), end.as_str()) {
                let s = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap();
                let e = NaiveDateTime::parse_from_str(e, "%Y-%m-%dT%H:%M:%S").unwrap();
                assert!(e >= s);
            }
        }
    }

    #[test]
    fn report_serializes_in_the_published_shape() {
        let report = analyze_html(&cfg(), "https://example.tld/p", PLANNING_PAGE).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["status"], "ok");
        assert_eq!(value["source"], "https://example.tld/p");
        assert_eq!(value["meta"]["rows"], 3);
        assert_eq!(value["findings"][0]["type"], "warning");
        assert!(value["findings"][0]["message"].is_string());
        assert!(value["preview"].is_array());
        assert_eq!(value["preview"][0]["date"], "2024-04-01");
    }
}
