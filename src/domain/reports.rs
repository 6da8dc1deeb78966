//! Read-only projections for the warehouse and report views.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{OrderStatus, OrderType};

/// Inclusive calendar-day range; either end may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    #[serde(default, alias = "start_date")]
    pub start: Option<NaiveDate>,
    #[serde(default, alias = "end_date")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self { Self { start, end } }

    /// Lower bound, inclusive.
    pub fn from_ts(&self) -> Option<DateTime<Utc>> {
        self.start.map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Upper bound, exclusive: midnight after the end day.
    pub fn until_ts(&self) -> Option<DateTime<Utc>> {
        self.end.and_then(|d| d.checked_add_days(Days::new(1))).map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from_ts().map_or(true, |from| at >= from) && self.until_ts().map_or(true, |until| at < until)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MovementFilter {
    pub range: DateRange,
    pub product_id: Option<i64>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct OrderReportFilter {
    pub range: DateRange,
    pub status: Option<OrderStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct WarehouseStats {
    pub total_products: i64,
    pub low_stock: i64,
    pub incoming_orders: i64,
    pub outgoing_orders: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub total_orders: i64,
    pub total_value: Decimal,
    pub average_order_value: Decimal,
    pub low_stock_items: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct VolumePoint {
    pub date: String,
    pub value: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct CategoryShare {
    pub name: String,
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct BalanceRow {
    pub id: i64,
    pub product_name: String,
    pub category_name: Option<String>,
    pub quantity: i32,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderReportRow {
    pub id: i64,
    pub order_number: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub supplier_name: Option<String>,
    pub expected_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct SupplierReportRow {
    pub id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub total_orders: i64,
    pub total_amount: Decimal,
}

/// Average that stays at zero for an empty set, rounded to cents.
pub fn average(total: Decimal, count: i64) -> Decimal {
    if count == 0 { Decimal::ZERO } else { (total / Decimal::from(count)).round_dp(2) }
}
