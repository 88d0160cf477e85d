//! Catalog products.
//!
//! `stock_quantity` is the hot shared counter of the inventory ledger; it is
//! only ever changed through conditional updates (see `ops::inventory`).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, TaxRate};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub organization_id: i64,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_price: Money,
    pub unit_cost: Money,
    pub tax_rate: TaxRate,
    pub stock_quantity: i64,
    pub reorder_level: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Derived on read, never stored.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.reorder_level
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub organization_id: i64,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_price_minor: i64,
    pub unit_cost_minor: i64,
    pub tax_rate_bp: i32,
    pub stock_quantity: i64,
    pub reorder_level: i64,
    pub active: bool,
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
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Product {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            organization_id: model.organization_id,
            sku: model.sku,
            name: model.name,
            category: model.category,
            unit_price: Money::new(model.unit_price_minor),
            unit_cost: Money::new(model.unit_cost_minor),
            tax_rate: TaxRate::from_basis_points(model.tax_rate_bp)?,
            stock_quantity: model.stock_quantity,
            reorder_level: model.reorder_level,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock_quantity: i64, reorder_level: i64) -> Product {
        Product {
            id: 1,
            organization_id: 1,
            sku: "SKU-1".to_string(),
            name: "Widget".to_string(),
            category: None,
            unit_price: Money::new(100),
            unit_cost: Money::new(50),
            tax_rate: TaxRate::ZERO,
            stock_quantity,
            reorder_level,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_includes_threshold() {
        assert!(product(5, 5).is_low_stock());
        assert!(product(0, 0).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
    }
}
