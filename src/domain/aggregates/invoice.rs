//! Supplier invoices.
//!
//! `total_amount` is always `amount + tax_amount`. Callers may omit it; when
//! they send it, it has to agree.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::value_objects::InvoiceStatus;

/// Invoice as read back, joined with the supplier name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub supplier_id: Option<i64>,
    pub supplier_name: Option<String>,
    pub invoice_date: NaiveDate,
    pub amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "total_is_consistent"))]
pub struct InvoiceInput {
    #[validate(length(min = 1, max = 50, message = "invoice_number must be 1-50 characters"))]
    pub invoice_number: String,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    pub invoice_date: NaiveDate,
    #[validate(custom = "crate::domain::money")]
    pub amount: Decimal,
    #[serde(default)]
    #[validate(custom = "crate::domain::money")]
    pub tax_amount: Decimal,
    #[serde(default)]
    #[validate(custom = "crate::domain::money")]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub status: InvoiceStatus,
}

impl InvoiceInput {
    pub fn total(&self) -> Decimal { self.amount + self.tax_amount }
}

fn total_is_consistent(input: &InvoiceInput) -> Result<(), ValidationError> {
    let total = input.total();
    if input.total_amount.map_or(false, |given| given != total) {
        return Err(ValidationError::new("total_amount_mismatch"));
    }
    crate::domain::money(&total)
}
