//! Sales orders.
//!
//! An `Order` owns its `OrderItem`s; items are written together with the order
//! row and never on their own. Totals are persisted and always equal the sum
//! of the stored items (see [`crate::pricing::OrderTotals::from_items`]).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, OrderItem, OrderStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub organization_id: i64,
    pub customer_id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Money,
    pub tax_total: Money,
    pub grand_total: Money,
    pub notes: Option<String>,
    pub order_date: DateTime<Utc>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// Row of an order listing (no items).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub grand_total: Money,
    pub order_date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub organization_id: i64,
    pub customer_id: i64,
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub subtotal_minor: i64,
    pub tax_total_minor: i64,
    pub grand_total_minor: i64,
    pub notes: Option<String>,
    pub order_date: DateTimeUtc,
    pub created_by: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Organizations,
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Customers,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Order> for ActiveModel {
    fn from(order: &Order) -> Self {
        Self {
            id: ActiveValue::NotSet,
            organization_id: ActiveValue::Set(order.organization_id),
            customer_id: ActiveValue::Set(order.customer_id),
            order_number: ActiveValue::Set(order.order_number.clone()),
            status: ActiveValue::Set(order.status.as_str().to_string()),
            payment_status: ActiveValue::Set(order.payment_status.as_str().to_string()),
            subtotal_minor: ActiveValue::Set(order.subtotal.minor()),
            tax_total_minor: ActiveValue::Set(order.tax_total.minor()),
            grand_total_minor: ActiveValue::Set(order.grand_total.minor()),
            notes: ActiveValue::Set(order.notes.clone()),
            order_date: ActiveValue::Set(order.order_date),
            created_by: ActiveValue::Set(order.created_by),
            created_at: ActiveValue::Set(order.created_at),
            updated_at: ActiveValue::Set(order.updated_at),
        }
    }
}

impl TryFrom<Model> for Order {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            organization_id: model.organization_id,
            customer_id: model.customer_id,
            order_number: model.order_number,
            status: OrderStatus::try_from(model.status.as_str())?,
            payment_status: PaymentStatus::try_from(model.payment_status.as_str())?,
            subtotal: Money::new(model.subtotal_minor),
            tax_total: Money::new(model.tax_total_minor),
            grand_total: Money::new(model.grand_total_minor),
            notes: model.notes,
            order_date: model.order_date,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
            items: Vec::new(),
        })
    }
}
