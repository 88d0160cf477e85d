//! Wire types of the order desk HTTP API.
//!
//! Money travels as integer minor units (`*_minor`), tax rates as basis
//! points (`1800` = 18.00 %). Timestamps are RFC3339.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod common {
    use super::*;

    /// Error body returned by every failing endpoint.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub error: String,
        /// Stable machine readable code, e.g. `INSUFFICIENT_STOCK`.
        pub kind: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Page<T> {
        pub items: Vec<T>,
        /// 1-based.
        pub page: u64,
        pub limit: u64,
        pub total: u64,
    }
}

pub mod order {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum OrderStatus {
        Draft,
        Confirmed,
        Processing,
        Shipped,
        Delivered,
        Cancelled,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentStatus {
        Pending,
        Partial,
        Paid,
        Refunded,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PriceSource {
        Catalog,
        Manual,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderLineNew {
        pub product_id: i64,
        /// Must be > 0.
        pub quantity: i64,
        /// Manual price. Omit to use the catalog price.
        pub unit_price_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderNew {
        pub customer_id: i64,
        pub items: Vec<OrderLineNew>,
        pub notes: Option<String>,
        /// Defaults to now. Its year selects the order number sequence.
        pub order_date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderQuoteRequest {
        pub items: Vec<OrderLineNew>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatusUpdate {
        pub status: OrderStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentStatusUpdate {
        pub payment_status: PaymentStatus,
    }

    /// Query string of `GET /orders`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OrderListQuery {
        pub status: Option<OrderStatus>,
        pub payment_status: Option<PaymentStatus>,
        /// Inclusive lower bound on the order date.
        pub from: Option<DateTime<Utc>>,
        /// Exclusive upper bound on the order date.
        pub to: Option<DateTime<Utc>>,
        pub customer_id: Option<i64>,
        pub search: Option<String>,
        pub page: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderItemView {
        pub id: i64,
        pub product_id: i64,
        pub quantity: i64,
        pub unit_price_minor: i64,
        pub tax_rate_bp: i32,
        pub line_total_minor: i64,
        pub line_tax_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderView {
        pub id: i64,
        pub order_number: String,
        pub customer_id: i64,
        pub status: OrderStatus,
        pub payment_status: PaymentStatus,
        pub subtotal_minor: i64,
        pub tax_total_minor: i64,
        pub grand_total_minor: i64,
        pub notes: Option<String>,
        pub order_date: DateTime<Utc>,
        pub created_by: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub items: Vec<OrderItemView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderSummaryView {
        pub id: i64,
        pub order_number: String,
        pub customer_id: i64,
        pub customer_name: Option<String>,
        pub status: OrderStatus,
        pub payment_status: PaymentStatus,
        pub grand_total_minor: i64,
        pub order_date: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PricedLineView {
        pub product_id: i64,
        pub quantity: i64,
        pub unit_price_minor: i64,
        pub tax_rate_bp: i32,
        pub line_total_minor: i64,
        pub line_tax_minor: i64,
        pub price_source: PriceSource,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderQuoteView {
        pub items: Vec<PricedLineView>,
        pub subtotal_minor: i64,
        pub tax_total_minor: i64,
        pub grand_total_minor: i64,
    }
}

pub mod product {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductNew {
        pub sku: String,
        pub name: String,
        pub category: Option<String>,
        pub unit_price_minor: i64,
        pub unit_cost_minor: Option<i64>,
        pub tax_rate_bp: Option<i32>,
        pub stock_quantity: Option<i64>,
        pub reorder_level: Option<i64>,
    }

    /// Partial update. Absent fields are left alone; an empty `category`
    /// clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProductUpdate {
        pub name: Option<String>,
        pub category: Option<String>,
        pub unit_price_minor: Option<i64>,
        pub unit_cost_minor: Option<i64>,
        pub tax_rate_bp: Option<i32>,
        pub reorder_level: Option<i64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProductListQuery {
        pub search: Option<String>,
        pub category: Option<String>,
        pub low_stock: Option<bool>,
        pub include_inactive: Option<bool>,
        pub page: Option<u64>,
        pub limit: Option<u64>,
    }

    /// Signed stock correction.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockAdjust {
        pub delta: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockLevel {
        pub product_id: i64,
        pub stock_quantity: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductView {
        pub id: i64,
        pub sku: String,
        pub name: String,
        pub category: Option<String>,
        pub unit_price_minor: i64,
        pub unit_cost_minor: i64,
        pub tax_rate_bp: i32,
        pub stock_quantity: i64,
        pub reorder_level: i64,
        /// `stock_quantity <= reorder_level`, computed at read time.
        pub low_stock: bool,
        pub active: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod customer {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CustomerType {
        Corporate,
        Individual,
        Government,
        Other,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CustomerSegment {
        Vip,
        Premium,
        Standard,
        Basic,
        Potential,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomerNew {
        pub name: String,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub address: Option<String>,
        pub customer_type: Option<CustomerType>,
        pub segment: Option<CustomerSegment>,
        pub credit_limit_minor: Option<i64>,
    }

    /// Partial update. An empty contact field clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CustomerUpdate {
        pub name: Option<String>,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub address: Option<String>,
        pub customer_type: Option<CustomerType>,
        pub segment: Option<CustomerSegment>,
        pub credit_limit_minor: Option<i64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CustomerListQuery {
        pub search: Option<String>,
        pub include_inactive: Option<bool>,
        pub page: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomerView {
        pub id: i64,
        pub name: String,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub address: Option<String>,
        pub customer_type: CustomerType,
        pub segment: CustomerSegment,
        pub credit_limit_minor: i64,
        pub active: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod membership {
    use super::*;

    /// Role of a user in an organization.
    ///
    /// - `owner`, `admin`: manage members, catalog and orders.
    /// - `manager`: manages catalog and orders.
    /// - `member`: customers and orders only.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MembershipRole {
        Owner,
        Admin,
        Manager,
        Member,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub user_id: i64,
        pub role: MembershipRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoleUpdate {
        pub role: MembershipRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: i64,
        pub role: MembershipRole,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}

pub mod stats {
    use super::*;
    use crate::order::OrderStatus;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StatsQuery {
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        /// Only for top products. Defaults to 10.
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatusCountView {
        pub status: OrderStatus,
        pub count: i64,
    }

    /// Totals over non-cancelled orders.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SalesStatistics {
        pub order_count: i64,
        pub cancelled_count: i64,
        pub revenue_minor: i64,
        pub subtotal_minor: i64,
        pub tax_total_minor: i64,
        pub average_order_value_minor: i64,
        pub by_status: Vec<StatusCountView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopProductView {
        pub product_id: i64,
        pub sku: String,
        pub name: String,
        pub quantity: i64,
        pub revenue_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopProductsResponse {
        pub products: Vec<TopProductView>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_new_accepts_optional_fields() {
        let raw = r#"{"customer_id": 4, "items": [{"product_id": 9, "quantity": 2}]}"#;
        let order: order::OrderNew = serde_json::from_str(raw).unwrap();
        assert_eq!(order.customer_id, 4);
        assert_eq!(order.items[0].unit_price_minor, None);
        assert!(order.order_date.is_none());
    }

    #[test]
    fn statuses_are_snake_case() {
        let update: order::PaymentStatusUpdate =
            serde_json::from_str(r#"{"payment_status": "refunded"}"#).unwrap();
        assert_eq!(update.payment_status, order::PaymentStatus::Refunded);
        assert_eq!(
            serde_json::to_string(&customer::CustomerSegment::Vip).unwrap(),
            r#""vip""#
        );
    }
}
