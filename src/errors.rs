use thiserror::Error;

/// Unexpected failures surfaced by the core, such as I/O or a broken
/// reference inside a stored document.
#[derive(Debug, Error)]
pub enum ApuError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid reference: {0}")]
    InvalidRef(String),
}

/// Precondition failures of destructive operations. Nothing is mutated when
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Explicit caller consent for destructive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Pending,
}

impl Confirmation {
    pub fn is_confirmed(self) -> bool {
        matches!(self, Confirmation::Confirmed)
    }

    /// Fails with [`GuardError::ConfirmationRequired`] unless confirmed.
    pub fn require(self, action: &str) -> Result<(), GuardError> {
        if self.is_confirmed() {
            Ok(())
        } else {
            Err(GuardError::ConfirmationRequired(action.to_string()))
        }
    }
}

impl From<bool> for Confirmation {
    fn from(value: bool) -> Self {
        if value {
            Confirmation::Confirmed
        } else {
            Confirmation::Pending
        }
    }
}
