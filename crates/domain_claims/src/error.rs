//! Claims domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Patient mismatch: diagnosis is for '{diagnosis_patient}' but receipt is for '{receipt_patient}'")]
    PatientMismatch {
        diagnosis_patient: String,
        receipt_patient: String,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Invalid claim facts: {0}")]
    InvalidFacts(String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Port(#[source] PortError),
}

impl ClaimError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        ClaimError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_facts(message: impl Into<String>) -> Self {
        ClaimError::InvalidFacts(message.into())
    }

    /// Returns true if retrying the operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ClaimError::Port(e) if e.is_transient())
    }
}

impl From<PortError> for ClaimError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => ClaimError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Conflict { message } => ClaimError::Conflict(message),
            other => ClaimError::Port(other),
        }
    }
}
