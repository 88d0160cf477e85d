//! Order line items.
//!
//! `unit_price`, `tax_rate` and `line_tax` are snapshots taken when the order
//! is created; later catalog changes never touch them.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, TaxRate};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    pub line_total: Money,
    pub line_tax: Money,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub tax_rate_bp: i32,
    pub line_total_minor: i64,
    pub line_tax_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Orders,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Products,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&OrderItem> for ActiveModel {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: ActiveValue::NotSet,
            order_id: ActiveValue::Set(item.order_id),
            product_id: ActiveValue::Set(item.product_id),
            quantity: ActiveValue::Set(item.quantity),
            unit_price_minor: ActiveValue::Set(item.unit_price.minor()),
            tax_rate_bp: ActiveValue::Set(item.tax_rate.basis_points()),
            line_total_minor: ActiveValue::Set(item.line_total.minor()),
            line_tax_minor: ActiveValue::Set(item.line_tax.minor()),
        }
    }
}

impl TryFrom<Model> for OrderItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: Money::new(model.unit_price_minor),
            tax_rate: TaxRate::from_basis_points(model.tax_rate_bp)?,
            line_total: Money::new(model.line_total_minor),
            line_tax: Money::new(model.line_tax_minor),
        })
    }
}
