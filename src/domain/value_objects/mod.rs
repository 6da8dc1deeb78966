//! Value Objects for the warehouse

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 50 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone)] pub enum SkuError { Empty, TooLong }
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "SKU empty"), Self::TooLong => write!(f, "SKU too long") }
    }
}

impl From<SkuError> for crate::WarehouseError {
    fn from(err: SkuError) -> Self { crate::WarehouseError::Validation(err.to_string()) }
}

/// Raised when a stored text column holds a value outside a known set.
#[derive(Debug, Clone)] pub struct UnknownVariant { pub kind: &'static str, pub value: String }
impl std::error::Error for UnknownVariant {}
impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown {} '{}'", self.kind, self.value) }
}

impl From<UnknownVariant> for crate::WarehouseError {
    fn from(err: UnknownVariant) -> Self { crate::WarehouseError::Storage(err.to_string()) }
}

/// Direction of an order relative to the warehouse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType { #[default] Incoming, Outgoing }

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Incoming => "incoming", Self::Outgoing => "outgoing" }
    }
}

impl FromStr for OrderType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(Self::Incoming),
            "outgoing" => Ok(Self::Outgoing),
            other => Err(UnknownVariant { kind: "order type", value: other.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Completed, Cancelled }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant { kind: "order status", value: other.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus { #[default] Active, OnLeave, Dismissed }

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Active => "active", Self::OnLeave => "on_leave", Self::Dismissed => "dismissed" }
    }
}

impl FromStr for EmployeeStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "on_leave" => Ok(Self::OnLeave),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(UnknownVariant { kind: "employee status", value: other.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus { #[default] Pending, Paid, Cancelled }

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Paid => "paid", Self::Cancelled => "cancelled" }
    }
}

impl FromStr for InvoiceStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant { kind: "invoice status", value: other.to_string() }),
        }
    }
}

/// Sign of a stock movement. Derived from the delta, never chosen by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType { Incoming, Outgoing }

impl MovementType {
    /// `None` for a zero delta: nothing moved, nothing to record.
    pub fn from_delta(delta: i32) -> Option<Self> {
        match delta {
            0 => None,
            d if d > 0 => Some(Self::Incoming),
            _ => Some(Self::Outgoing),
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self { Self::Incoming => "incoming", Self::Outgoing => "outgoing" }
    }
}

impl FromStr for MovementType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(Self::Incoming),
            "outgoing" => Ok(Self::Outgoing),
            other => Err(UnknownVariant { kind: "movement type", value: other.to_string() }),
        }
    }
}

/// What caused a stock movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType { Adjustment, Order }

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Adjustment => "adjustment", Self::Order => "order" }
    }
}

impl FromStr for ReferenceType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adjustment" => Ok(Self::Adjustment),
            "order" => Ok(Self::Order),
            other => Err(UnknownVariant { kind: "reference type", value: other.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus { Ok, Low, Out }

impl StockStatus {
    pub fn classify(quantity: i32, min_quantity: i32) -> Self {
        if quantity <= 0 { Self::Out }
        else if quantity <= min_quantity { Self::Low }
        else { Self::Ok }
    }
}

/// Lookback window for reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period { Week, #[default] Month, Quarter, Year }

impl Period {
    /// Unknown or missing values fall back to a month.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("week") => Self::Week,
            Some("quarter") => Self::Quarter,
            Some("year") => Self::Year,
            _ => Self::Month,
        }
    }

    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            Self::Week => return now - Duration::days(7),
            Self::Month => 1,
            Self::Quarter => 3,
            Self::Year => 12,
        };
        now.checked_sub_months(Months::new(months)).unwrap_or(now)
    }

    pub fn bucket(&self) -> Bucket {
        match self { Self::Week | Self::Month => Bucket::Day, Self::Quarter | Self::Year => Bucket::Month }
    }
}

/// Granularity of a date-grouped report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket { Day, Month }

impl Bucket {
    /// chrono format string for the bucket label.
    pub fn chrono_format(&self) -> &'static str {
        match self { Self::Day => "%Y-%m-%d", Self::Month => "%Y-%m" }
    }
    /// Postgres `to_char` pattern producing the same label.
    pub fn pg_pattern(&self) -> &'static str {
        match self { Self::Day => "YYYY-MM-DD", Self::Month => "YYYY-MM" }
    }
    pub fn label(&self, at: DateTime<Utc>) -> String { at.format(self.chrono_format()).to_string() }
}
