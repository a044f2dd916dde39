use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),
    #[error("Payment processor error: {0}")]
    Payment(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
