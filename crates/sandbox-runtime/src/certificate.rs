//! Completion certificate requests and the formatter boundary.

use crate::gate::GateDecision;
use chrono::Local;
use sandbox_core::CompletionStats;
use thiserror::Error;
use tracing::{info, warn};

/// Longest accepted player name, in characters.
pub const MAX_NAME_CHARS: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertificateError {
    #[error("player name must not be empty")]
    EmptyName,
    #[error("player name is {len} characters; at most {max} allowed")]
    NameTooLong { len: usize, max: usize },
    #[error("certificate access denied ({percentage}% complete)")]
    AccessDenied { percentage: u32 },
    #[error("certificate generation failed, please try again: {0}")]
    Formatter(String),
}

impl CertificateError {
    /// Formatter failures leave all state intact and may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CertificateError::Formatter(_))
    }
}

/// Input handed to a formatter. The name is always trimmed and non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateRequest {
    pub player_name: String,
    pub completion_date: String,
    pub stats: CompletionStats,
}

impl CertificateRequest {
    pub fn new(
        name: &str,
        completion_date: impl Into<String>,
        stats: CompletionStats,
    ) -> Result<Self, CertificateError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CertificateError::EmptyName);
        }
        let len = trimmed.chars().count();
        if len > MAX_NAME_CHARS {
            return Err(CertificateError::NameTooLong {
                len,
                max: MAX_NAME_CHARS,
            });
        }
        Ok(Self {
            player_name: trimmed.to_string(),
            completion_date: completion_date.into(),
            stats,
        })
    }

    /// `ethics-sandbox-certificate-{slug}.{ext}`
    ///
    /// Example:
    /// "Ada  Lovelace" -> ethics-sandbox-certificate-ada-lovelace.pdf
    pub fn file_name(&self, ext: &str) -> String {
        let slug = self
            .player_name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        format!("ethics-sandbox-certificate-{slug}.{ext}")
    }
}

/// Today's local date as shown on certificates.
pub fn completion_date_today() -> String {
    Local::now().format("%B %-d, %Y").to_string()
}

/// Renders a certificate document. Implementations may fail; failures are
/// surfaced as retryable errors.
pub trait CertificateFormatter {
    fn extension(&self) -> &str;
    fn render(&self, request: &CertificateRequest) -> anyhow::Result<Vec<u8>>;
}

/// A rendered certificate ready to be written out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Issue a certificate if the gate granted access.
pub fn issue_certificate(
    gate: &GateDecision,
    formatter: &dyn CertificateFormatter,
    request: &CertificateRequest,
) -> Result<Certificate, CertificateError> {
    if let GateDecision::Denied { stats, .. } = gate {
        return Err(CertificateError::AccessDenied {
            percentage: stats.percentage,
        });
    }
    let bytes = formatter.render(request).map_err(|e| {
        warn!(error = %e, "certificate formatter failed");
        CertificateError::Formatter(e.to_string())
    })?;
    let file_name = request.file_name(formatter.extension());
    info!(file = %file_name, bytes = bytes.len(), "certificate issued");
    Ok(Certificate { file_name, bytes })
}

/// Plain UTF-8 text certificate.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextFormatter;

impl CertificateFormatter for PlainTextFormatter {
    fn extension(&self) -> &str {
        "txt"
    }

    fn render(&self, request: &CertificateRequest) -> anyhow::Result<Vec<u8>> {
        let levels = request
            .stats
            .completed_levels
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let text = format!(
            "CERTIFICATE OF COMPLETION\n\n\
             This certifies that\n\n    {}\n\n\
             has completed the Ethics Sandbox.\n\n\
             Levels completed: {} of {} ({}%)\n\
             Completed: [{}]\n\
             Date: {}\n",
            request.player_name,
            request.stats.completed_levels.len(),
            request.stats.total_levels,
            request.stats.percentage,
            levels,
            request.completion_date,
        );
        Ok(text.into_bytes())
    }
}
