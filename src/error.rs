use thiserror::Error;

use crate::scoring::FactorKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("Invalid profile: {}", .errors.join("; "))]
    InvalidProfile { errors: Vec<String> },

    #[error("Unknown category for {kind}: '{value}'")]
    UnknownCategory { kind: FactorKind, value: String },

    #[error("Invalid factor table: {}", .errors.join("; "))]
    InvalidTable { errors: Vec<String> },
}

impl ScoringError {
    pub fn unknown(kind: FactorKind, value: impl ToString) -> Self {
        ScoringError::UnknownCategory {
            kind,
            value: value.to_string(),
        }
    }

    pub fn invalid_profile(error: impl Into<String>) -> Self {
        ScoringError::InvalidProfile {
            errors: vec![error.into()],
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
