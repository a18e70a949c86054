use thiserror::Error;

use crate::domain::order::OrderStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown strategy type `{0}`")]
    UnknownStrategy(String),
    #[error("invalid order transition from {from:?} to {to:?}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError};

    #[test]
    fn domain_error_wraps_into_application_error() {
        let error = ApplicationError::from(DomainError::UnknownStrategy("mystery".to_owned()));
        assert_eq!(error.to_string(), "unknown strategy type `mystery`");
    }

    #[test]
    fn persistence_error_carries_collaborator_message() {
        let error = ApplicationError::Persistence("database lock timeout".to_owned());
        assert_eq!(error.to_string(), "persistence failure: database lock timeout");
    }
}
