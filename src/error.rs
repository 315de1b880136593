use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorCode {
    InvalidMetadataName,
    InvalidArgument,
    MalformedId,
    UnknownColumn,
    Unsupported,
    ContractViolation,
    InvalidIndexMutation,
    InvalidConfig,
    Store,
}

impl BackendErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendErrorCode::InvalidMetadataName => "invalid_metadata_name",
            BackendErrorCode::InvalidArgument => "invalid_argument",
            BackendErrorCode::MalformedId => "malformed_id",
            BackendErrorCode::UnknownColumn => "unknown_column",
            BackendErrorCode::Unsupported => "unsupported",
            BackendErrorCode::ContractViolation => "contract_violation",
            BackendErrorCode::InvalidIndexMutation => "invalid_index_mutation",
            BackendErrorCode::InvalidConfig => "invalid_config",
            BackendErrorCode::Store => "store",
        }
    }
}

/// Failure reported by the native session (network, schema mismatch,
/// timeout). The adapter never retries these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid metadata name '{0}'")]
    InvalidMetadataName(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported id format: '{id}' (should contain {expected:?})")]
    MalformedId { id: String, expected: Vec<String> },
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },
    /// The backend cannot express the request. Callers may branch on this.
    #[error("not supported: {0}")]
    Unsupported(String),
    /// The API was used wrongly. Not expected to be recovered from.
    #[error("contract violation: {0}")]
    ContractViolation(String),
    #[error("invalid index mutation on '{table}': {reason}")]
    InvalidIndexMutation { table: String, reason: String },
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
    #[error("store failure while executing [{context}]: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl BackendError {
    pub fn code(&self) -> BackendErrorCode {
        match self {
            BackendError::InvalidMetadataName(_) => BackendErrorCode::InvalidMetadataName,
            BackendError::InvalidArgument(_) => BackendErrorCode::InvalidArgument,
            BackendError::MalformedId { .. } => BackendErrorCode::MalformedId,
            BackendError::UnknownColumn { .. } => BackendErrorCode::UnknownColumn,
            BackendError::Unsupported(_) => BackendErrorCode::Unsupported,
            BackendError::ContractViolation(_) => BackendErrorCode::ContractViolation,
            BackendError::InvalidIndexMutation { .. } => BackendErrorCode::InvalidIndexMutation,
            BackendError::InvalidConfig { .. } => BackendErrorCode::InvalidConfig,
            BackendError::Store { .. } => BackendErrorCode::Store,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, BackendError::ContractViolation(_))
    }

    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        BackendError::Store {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn invalid_index_mutation(table: &str, reason: impl Into<String>) -> Self {
        BackendError::InvalidIndexMutation {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendError, BackendErrorCode, StoreError};
    use std::error::Error as _;

    #[test]
    fn error_code_strings_are_stable() {
        assert_eq!(BackendErrorCode::MalformedId.as_str(), "malformed_id");
        assert_eq!(
            BackendErrorCode::InvalidIndexMutation.as_str(),
            "invalid_index_mutation"
        );
        assert_eq!(
            BackendErrorCode::ContractViolation.as_str(),
            "contract_violation"
        );
    }

    #[test]
    fn store_error_keeps_context_and_source() {
        let err = BackendError::store("SELECT * FROM edges;", StoreError::new("timeout"));
        assert_eq!(err.code_str(), "store");
        assert_eq!(
            err.to_string(),
            "store failure while executing [SELECT * FROM edges;]: timeout"
        );
        assert_eq!(err.source().map(|s| s.to_string()), Some("timeout".into()));
    }

    #[test]
    fn contract_violation_is_distinguishable_from_unsupported() {
        assert!(BackendError::ContractViolation("neq".into()).is_contract_violation());
        assert!(!BackendError::Unsupported("or".into()).is_contract_violation());
    }
}
