//! Error types for OR list checking.

use crate::models::ObsId;

/// Result type for fallible checker operations.
pub type CheckResult<T> = Result<T, CheckError>;

/// Fatal problem with the list itself; aborts the whole run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    #[error("Record at line {line} is missing required field {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("Record at line {line} has malformed {field}: {reason}")]
    MalformedField {
        line: usize,
        field: &'static str,
        reason: String,
    },

    #[error("Obsid {obsid} is declared twice (lines {first_line} and {second_line})")]
    DuplicateObsid {
        obsid: ObsId,
        first_line: usize,
        second_line: usize,
    },

    #[error("Unterminated comment block for {key} opened at line {line}")]
    UnterminatedComment { key: String, line: usize },

    #[error("Preceding-reference cycle: {}", format_cycle(.0))]
    ChainCycle(Vec<ObsId>),
}

impl StructuralError {
    /// Observations named by this error.
    pub fn obsids(&self) -> Vec<ObsId> {
        match self {
            StructuralError::DuplicateObsid { obsid, .. } => vec![*obsid],
            StructuralError::ChainCycle(ids) => ids.clone(),
            _ => Vec::new(),
        }
    }
}

fn format_cycle(ids: &[ObsId]) -> String {
    let mut parts: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    if let Some(first) = ids.first() {
        parts.push(first.to_string());
    }
    parts.join(" -> ")
}

/// Error type for checker operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unable to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<String> for CheckError {
    fn from(s: String) -> Self {
        CheckError::Configuration(s)
    }
}
