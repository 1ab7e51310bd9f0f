// ⚠️ Error taxonomy for the ledger engine
// Client-input errors are separated from storage failures so callers can
// decide whether to re-prompt or retry the whole operation.

use thiserror::Error;

/// Field-level rejection raised by the validator before any mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must be a positive finite number")]
    InvalidAmount,
    #[error("category must not be empty")]
    InvalidCategory,
    #[error("kind must be 'expense' or 'income'")]
    InvalidKind,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidAmount => "invalid_amount",
            ValidationError::InvalidCategory => "invalid_category",
            ValidationError::InvalidKind => "invalid_kind",
        }
    }
}

/// Every failure the engine reports to its caller.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid month key `{0}`, expected YYYY-MM")]
    InvalidMonthKey(String),

    #[error("no entry with id {0}")]
    NotFound(i64),

    #[error("sum of amounts exceeds the supported decimal range")]
    AmountOverflow,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LedgerError {
    /// Stable machine-readable code used at the request boundary.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(v) => v.code(),
            LedgerError::InvalidMonthKey(_) => "invalid_month_key",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::AmountOverflow => "amount_overflow",
            LedgerError::Storage(_) | LedgerError::Io(_) | LedgerError::CorruptRecord { .. } => {
                "storage_error"
            }
            LedgerError::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Whether the caller supplied bad input (as opposed to a storage fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_) | LedgerError::InvalidMonthKey(_) | LedgerError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
