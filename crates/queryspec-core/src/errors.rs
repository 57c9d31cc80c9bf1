use crate::schema::ScalarType;
use thiserror::Error;

/// A malformed search request, detected while compiling filters or ordering.
///
/// These never reach the store and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("filter field '{field}' is not supported")]
    UnsupportedFilterField { field: String },
    #[error("sort field '{field}' is not supported")]
    UnsupportedSortField { field: String },
    #[error("value is required for operator '{operator}' on '{field}'")]
    MissingFilterValue { field: String, operator: String },
    #[error("valueFrom and valueTo are required for operator 'between' on '{field}'")]
    MissingRangeValue { field: String },
    #[error("value '{value}' for '{field}' is not a valid {expected}")]
    InvalidFilterValue {
        field: String,
        value: String,
        expected: ScalarType,
    },
    #[error("filter operator '{operator}' is not supported")]
    UnsupportedOperator { operator: String },
    #[error("operator '{operator}' is not supported for {ty} field '{field}'")]
    UnsupportedOperatorForType {
        field: String,
        operator: String,
        ty: ScalarType,
    },
}

/// Failures owned by the storage collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("entity not found")]
    NotFound,
    #[error("operation cancelled")]
    Cancelled,
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// A create/update command that cannot be stored as given.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

/// Either side of a search: compilation or execution.
///
/// Both variants are transparent so store failures surface exactly as the store raised them.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Store(StoreError::Cancelled))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_pass_through_unchanged() {
        let err: Error = StoreError::Cancelled.into();
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "operation cancelled");

        let err: Error = StoreError::NotFound.into();
        assert!(matches!(err, Error::Store(StoreError::NotFound)));
    }

    #[test]
    fn test_spec_error_display() {
        let err = SpecError::InvalidFilterValue {
            field: "temperatureC".into(),
            value: "warm".into(),
            expected: ScalarType::Int,
        };
        assert_eq!(
            err.to_string(),
            "value 'warm' for 'temperatureC' is not a valid integer"
        );
    }
}
