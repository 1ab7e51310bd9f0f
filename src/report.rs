// 📊 Reports - month summaries and per-category totals
//
// Amounts are accumulated exactly as `Decimal` with checked addition.
// Rounding (half-even) happens only when a result is prepared for display.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::db::Ledger;
use crate::entry::{Entry, Kind};
use crate::error::{LedgerError, Result};
use crate::month::{month_range, MonthKey};

/// Minor-unit digits used when no configuration says otherwise.
pub const DEFAULT_DISPLAY_SCALE: u32 = 2;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Income, expense and balance for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub month: MonthKey,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub income: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub expense: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub balance: Decimal,
}

impl MonthSummary {
    pub fn empty(month: MonthKey) -> Self {
        MonthSummary {
            month,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Copy with income and expense rounded half-even to `scale` digits.
    ///
    /// The balance is recomputed from the rounded parts so the displayed
    /// figures always satisfy `income - expense == balance`.
    pub fn rounded(&self, scale: u32) -> Self {
        let income = round_for_display(self.income, scale);
        let expense = round_for_display(self.expense, scale);
        MonthSummary {
            month: self.month,
            income,
            expense,
            balance: income - expense,
        }
    }
}

/// Sum of one category's amounts for a month and kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
}

impl CategoryTotal {
    pub fn rounded(&self, scale: u32) -> Self {
        CategoryTotal {
            category: self.category.clone(),
            total: round_for_display(self.total, scale),
        }
    }
}

// ============================================================================
// PURE AGGREGATION
// ============================================================================

fn in_month<'a>(entries: &'a [Entry], month: &MonthKey) -> impl Iterator<Item = &'a Entry> {
    let (start, end) = month_range(month);
    entries
        .iter()
        .filter(move |e| start <= e.created_at && e.created_at < end)
}

fn add_checked(acc: Decimal, amount: Decimal) -> Result<Decimal> {
    acc.checked_add(amount).ok_or(LedgerError::AmountOverflow)
}

/// Summarize the entries of `month`; entries outside it are ignored.
pub fn summarize_entries(month: &MonthKey, entries: &[Entry]) -> Result<MonthSummary> {
    let mut summary = MonthSummary::empty(*month);

    for entry in in_month(entries, month) {
        match entry.kind {
            Kind::Income => summary.income = add_checked(summary.income, entry.amount)?,
            Kind::Expense => summary.expense = add_checked(summary.expense, entry.amount)?,
        }
    }

    summary.balance = summary
        .income
        .checked_sub(summary.expense)
        .ok_or(LedgerError::AmountOverflow)?;

    Ok(summary)
}

/// Group entries of `month` and `kind` by exact category label.
///
/// Output order: total descending, ties broken by category ascending.
/// Categories without entries never appear.
pub fn group_by_category(month: &MonthKey, kind: Kind, entries: &[Entry]) -> Result<Vec<CategoryTotal>> {
    let mut groups: BTreeMap<&str, Decimal> = BTreeMap::new();

    for entry in in_month(entries, month).filter(|e| e.kind == kind) {
        let total = groups.entry(entry.category.as_str()).or_insert(Decimal::ZERO);
        *total = add_checked(*total, entry.amount)?;
    }

    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect();

    // BTreeMap already yields names ascending; a stable sort keeps that for ties
    totals.sort_by(|a, b| b.total.cmp(&a.total));

    Ok(totals)
}

// ============================================================================
// LEDGER QUERIES
// ============================================================================

pub fn month_summary(ledger: &Ledger, month: &MonthKey) -> Result<MonthSummary> {
    let (start, end) = month_range(month);
    let entries = ledger.list_between(start, end)?;

    let summary = summarize_entries(month, &entries)?;
    debug!(
        month = %month,
        entries = entries.len(),
        income = %summary.income,
        expense = %summary.expense,
        "computed month summary"
    );
    Ok(summary)
}

pub fn category_totals(ledger: &Ledger, month: &MonthKey, kind: Kind) -> Result<Vec<CategoryTotal>> {
    let (start, end) = month_range(month);
    let entries = ledger.list_between(start, end)?;

    let totals = group_by_category(month, kind, &entries)?;
    debug!(month = %month, kind = %kind, categories = totals.len(), "computed category totals");
    Ok(totals)
}

// ============================================================================
// DISPLAY
// ============================================================================

/// Round half-even to `scale` fractional digits.
pub fn round_for_display(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
}

/// Render with exactly `scale` fractional digits, e.g. `15.00`.
pub fn format_amount(amount: Decimal, scale: u32) -> String {
    let mut rounded = round_for_display(amount, scale);
    rounded.rescale(scale);
    rounded.to_string()
}
