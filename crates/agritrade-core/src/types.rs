use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Physical quantities in kilograms.
pub type Quantity = Decimal;

/// The four ledger record kinds this engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Sale,
    Purchase,
    Expense,
    FinishedGoods,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Sale => "sale",
            RecordKind::Purchase => "purchase",
            RecordKind::Expense => "expense",
            RecordKind::FinishedGoods => "finished_goods",
        };
        f.write_str(name)
    }
}

/// Payment state of a Sale or Purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn is_paid(self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

/// A finished-goods sale to a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub date: NaiveDate,
    pub customer: String,
    /// Kilograms sold
    pub quantity: Quantity,
    pub unit_price: Money,
    pub payment_status: PaymentStatus,
}

impl Sale {
    pub fn line_amount(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// A raw-material purchase from a supplier. The weighed gross quantity is
/// discounted by the measured moisture share before costing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub date: NaiveDate,
    pub supplier: String,
    /// Kilograms as weighed at intake
    pub gross_quantity: Quantity,
    /// Moisture share in percent (0-100). None means no deduction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture_pct: Option<Decimal>,
    pub unit_price: Money,
    pub payment_status: PaymentStatus,
}

impl Purchase {
    /// Dry weight after the moisture deduction. Zero when moisture >= 100.
    pub fn net_quantity(&self) -> Quantity {
        match self.moisture_pct {
            None => self.gross_quantity,
            Some(m) if m >= dec!(100) => Decimal::ZERO,
            Some(m) => self.gross_quantity * (dec!(100) - m) / dec!(100),
        }
    }

    pub fn line_cost(&self) -> Money {
        self.unit_price * self.net_quantity()
    }
}

/// An operating expense. The attached receipt is the only
/// payment-confirmation proxy expenses have.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub date: NaiveDate,
    pub amount: Money,
    /// Free-text category as entered upstream
    pub category: String,
    pub has_receipt: bool,
}

impl Expense {
    pub fn cost_class(&self) -> CostClass {
        CostClass::classify(&self.category)
    }
}

/// Processed stock entering inventory, costed independently of the raw
/// material it was made from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedGoodsEntry {
    pub date: NaiveDate,
    pub quantity: Quantity,
    pub unit_cost: Money,
}

/// Closed cost classification derived from the free-text expense
/// category. `Other` is excluded from both cost buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostClass {
    Fixed,
    Variable,
    Other,
}

impl CostClass {
    /// Case-insensitive substring match against the category text. A
    /// category naming both markers counts as fixed.
    pub fn classify(category: &str) -> CostClass {
        let lowered = category.to_lowercase();
        if lowered.contains("fixed") {
            CostClass::Fixed
        } else if lowered.contains("variable") {
            CostClass::Variable
        } else {
            CostClass::Other
        }
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation. Carries no wall-clock fields so that
/// identical inputs serialize identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
