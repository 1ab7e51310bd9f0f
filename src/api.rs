// 🔌 Request boundary - tagged request/response schema for front-ends
//
// Untyped payloads (JSON from a webview, CLI strings) are parsed into a
// `RawRequest`, checked into a typed `Request`, and only then dispatched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::Ledger;
use crate::entry::{Entry, Kind, NewEntry};
use crate::error::{LedgerError, Result};
use crate::month::MonthKey;
use crate::report::{self, CategoryTotal, MonthSummary, DEFAULT_DISPLAY_SCALE};
use crate::validation::{parse_amount_f64, parse_amount_str, parse_kind};

// ============================================================================
// REQUESTS
// ============================================================================

/// Amount as it may arrive over the wire: a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    pub fn parse(&self) -> Result<Decimal> {
        let amount = match self {
            RawAmount::Number(n) => parse_amount_f64(*n)?,
            RawAmount::Text(s) => parse_amount_str(s)?,
        };
        Ok(amount)
    }
}

/// Request exactly as received; field contents are not yet checked.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RawRequest {
    Add {
        kind: String,
        amount: RawAmount,
        category: String,
        /// Missing and `null` both mean "no note"
        #[serde(default)]
        note: Option<String>,
    },
    List,
    Get {
        id: i64,
    },
    Delete {
        id: i64,
    },
    GetMonthSummary {
        ym: String,
    },
    GetCategoryTotals {
        ym: String,
        kind: String,
    },
}

/// A request whose fields have passed type and format checks.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Add(NewEntry),
    List,
    Get(i64),
    Delete(i64),
    MonthSummary(MonthKey),
    CategoryTotals(MonthKey, Kind),
}

impl TryFrom<RawRequest> for Request {
    type Error = LedgerError;

    fn try_from(raw: RawRequest) -> Result<Request> {
        let request = match raw {
            RawRequest::Add {
                kind,
                amount,
                category,
                note,
            } => Request::Add(NewEntry {
                kind: parse_kind(&kind)?,
                amount: amount.parse()?,
                category,
                note,
            }),
            RawRequest::List => Request::List,
            RawRequest::Get { id } => Request::Get(id),
            RawRequest::Delete { id } => Request::Delete(id),
            RawRequest::GetMonthSummary { ym } => Request::MonthSummary(ym.parse()?),
            RawRequest::GetCategoryTotals { ym, kind } => {
                Request::CategoryTotals(ym.parse()?, parse_kind(&kind)?)
            }
        };
        Ok(request)
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Entry(Entry),
    Entries(Vec<Entry>),
    Deleted(bool),
    Summary(MonthSummary),
    Totals(Vec<CategoryTotal>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// API Response wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ApiResponse {
    pub fn ok(data: ResponseData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.into(),
            }),
        }
    }
}

impl From<&LedgerError> for ApiResponse {
    fn from(e: &LedgerError) -> Self {
        ApiResponse::err(e.code(), e.to_string())
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// The ledger plus presentation settings, answering typed requests.
pub struct Engine {
    ledger: Ledger,
    display_scale: u32,
}

impl Engine {
    pub fn new(ledger: Ledger) -> Self {
        Engine {
            ledger,
            display_scale: DEFAULT_DISPLAY_SCALE,
        }
    }

    pub fn with_display_scale(mut self, scale: u32) -> Self {
        self.display_scale = scale;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn display_scale(&self) -> u32 {
        self.display_scale
    }

    pub fn dispatch(&self, request: Request) -> Result<ResponseData> {
        let data = match request {
            Request::Add(new) => ResponseData::Entry(self.ledger.add_entry(new)?),
            Request::List => ResponseData::Entries(self.ledger.list()?),
            Request::Get(id) => {
                ResponseData::Entry(self.ledger.get(id)?.ok_or(LedgerError::NotFound(id))?)
            }
            Request::Delete(id) => ResponseData::Deleted(self.ledger.delete(id)?),
            Request::MonthSummary(month) => {
                let summary = report::month_summary(&self.ledger, &month)?;
                ResponseData::Summary(summary.rounded(self.display_scale))
            }
            Request::CategoryTotals(month, kind) => {
                let totals = report::category_totals(&self.ledger, &month, kind)?;
                ResponseData::Totals(
                    totals
                        .iter()
                        .map(|t| t.rounded(self.display_scale))
                        .collect(),
                )
            }
        };
        Ok(data)
    }

    /// Check and dispatch an already decoded request.
    pub fn handle(&self, raw: RawRequest) -> ApiResponse {
        match Request::try_from(raw).and_then(|request| self.dispatch(request)) {
            Ok(data) => ApiResponse::ok(data),
            Err(e) => {
                if !e.is_client_error() {
                    tracing::error!(error = %e, "request failed");
                }
                ApiResponse::from(&e)
            }
        }
    }

    /// Decode, check and dispatch one JSON request.
    pub fn handle_json(&self, body: &str) -> ApiResponse {
        match serde_json::from_str::<RawRequest>(body) {
            Ok(raw) => self.handle(raw),
            Err(e) => {
                warn!(error = %e, "malformed request");
                ApiResponse::err("bad_request", e.to_string())
            }
        }
    }
}
