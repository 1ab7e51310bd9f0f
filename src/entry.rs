// 🧾 Entry - the single persisted ledger record
//
// Identity (id) and time axis (created_at) are assigned by the store;
// everything else is supplied by the caller and never changes afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// ============================================================================
// KIND
// ============================================================================

/// Direction of money flow for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Expense,
    Income,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Expense => "expense",
            Kind::Income => "income",
        }
    }

    /// Human label used by the CLI reports
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Expense => "Expense",
            Kind::Income => "Income",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(Kind::Expense),
            "income" => Ok(Kind::Income),
            _ => Err(ValidationError::InvalidKind),
        }
    }
}

// ============================================================================
// ENTRY
// ============================================================================

/// One ledger record as stored and as exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,

    pub kind: Kind,

    /// Exact decimal; rendered as a JSON number
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,

    pub category: String,

    /// `None` when the caller gave no note; `Some("")` is kept as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields of an entry, before the store assigns identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub kind: Kind,
    pub amount: Decimal,
    pub category: String,
    pub note: Option<String>,
}

impl NewEntry {
    pub fn new(kind: Kind, amount: Decimal, category: impl Into<String>) -> Self {
        NewEntry {
            kind,
            amount,
            category: category.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
