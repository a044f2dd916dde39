use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;

/// Lifecycle of a hosted checkout session on our side.
///
/// `Pending` is recorded when the session is created, `Confirmed` when the
/// processor reports completion (orders materialised), `Abandoned` when the
/// session expires unpaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    Confirmed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "PENDING",
            SessionStatus::Confirmed => "CONFIRMED",
            SessionStatus::Abandoned => "ABANDONED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SessionStatus::Pending),
            "CONFIRMED" => Ok(SessionStatus::Confirmed),
            "ABANDONED" => Ok(SessionStatus::Abandoned),
            other => Err(DomainError::Internal(format!(
                "unknown checkout session status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeOutcome {
    Materialized { orders: usize, cart_cleared: bool },
    /// The session was already confirmed; nothing was written.
    Duplicate,
}
