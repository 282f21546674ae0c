// src/error.rs

use std::fmt;

/// Classified failure of a planning analysis.
///
/// Each variant separates what the end user may see (`user_message`) from
/// what belongs in the logs (`technical_detail`). Per-row parse problems are
/// never errors; they degrade to missing values and surface as findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The fetch never produced a response: timeout, DNS failure, refused
    /// connection, broken transfer.
    Network { detail: String },
    /// The source site answered with a server-class status (5xx).
    UpstreamUnavailable { status: u16 },
    /// The source site answered with any other non-success status.
    UpstreamClientError { status: u16 },
    /// The fetched document contains no `<table>` element.
    NoTableFound,
    /// A table was found but it holds zero data rows.
    EmptyTable,
}

impl AnalysisError {
    /// Short message safe to show to an end user.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Network { .. } => {
                "Could not retrieve the planning page (network error or timeout).".to_string()
            }
            AnalysisError::UpstreamUnavailable { .. } => {
                "The planning source is currently unavailable (server error). Try again later."
                    .to_string()
            }
            AnalysisError::UpstreamClientError { status } => format!(
                "The planning page request was rejected by the source (status {}).",
                status
            ),
            AnalysisError::NoTableFound => "No planning table found in the page.".to_string(),
            AnalysisError::EmptyTable => "The planning table is empty.".to_string(),
        }
    }

    /// Detail for the logs; never shown to users.
    pub fn technical_detail(&self) -> Option<String> {
        match self {
            AnalysisError::Network { detail } => Some(detail.clone()),
            AnalysisError::UpstreamUnavailable { status }
            | AnalysisError::UpstreamClientError { status } => Some(format!("status={}", status)),
            AnalysisError::NoTableFound | AnalysisError::EmptyTable => None,
        }
    }

    /// Upstream HTTP status, when the failure carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AnalysisError::UpstreamUnavailable { status }
            | AnalysisError::UpstreamClientError { status } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())?;
        if let Some(detail) = self.technical_detail() {
            write!(f, " [{}]", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for AnalysisError {}
