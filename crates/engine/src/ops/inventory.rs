//! Inventory ledger.
//!
//! Stock is only ever changed through a single conditional `UPDATE`, so the
//! check and the decrement are one atomic statement and concurrent
//! reservations of the same product serialize in the database. The ledger
//! never opens a transaction itself: callers pass the transaction of the
//! order mutation the stock change belongs to.

use chrono::Utc;
use sea_orm::{ConnectionTrait, Statement, prelude::*};

use crate::{EngineError, ResultEngine, pricing::validate_quantity, products};

use super::{Engine, OrgContext, with_tx};

pub(crate) struct InventoryLedger<'a, C> {
    db: &'a C,
    organization_id: i64,
}

impl<'a, C: ConnectionTrait> InventoryLedger<'a, C> {
    pub(crate) fn new(db: &'a C, ctx: &OrgContext) -> Self {
        Self {
            db,
            organization_id: ctx.organization_id(),
        }
    }

    async fn execute(&self, sql: &str, values: Vec<Value>) -> ResultEngine<u64> {
        let stmt = Statement::from_sql_and_values(self.db.get_database_backend(), sql, values);
        let result = self.db.execute(stmt).await?;
        Ok(result.rows_affected())
    }

    async fn find_active(&self, product_id: i64) -> ResultEngine<Option<products::Model>> {
        products::Entity::find_by_id(product_id)
            .filter(products::Column::OrganizationId.eq(self.organization_id))
            .filter(products::Column::Active.eq(true))
            .one(self.db)
            .await
            .map_err(Into::into)
    }

    /// Atomically takes `quantity` units out of stock.
    pub(crate) async fn reserve(&self, product_id: i64, quantity: i64) -> ResultEngine<()> {
        validate_quantity(quantity)?;
        let applied = self
            .execute(
                "UPDATE products \
                 SET stock_quantity = stock_quantity - ?, updated_at = ? \
                 WHERE id = ? AND organization_id = ? AND active = 1 AND stock_quantity >= ?",
                vec![
                    quantity.into(),
                    Utc::now().into(),
                    product_id.into(),
                    self.organization_id.into(),
                    quantity.into(),
                ],
            )
            .await?;
        if applied == 1 {
            tracing::debug!(product_id, quantity, "stock reserved");
            return Ok(());
        }

        // Nothing matched: tell a missing product from a short one.
        match self.find_active(product_id).await? {
            None => Err(EngineError::ProductNotFound(product_id.to_string())),
            Some(product) => Err(EngineError::InsufficientStock(format!(
                "{}: requested {quantity}, available {}",
                product.sku, product.stock_quantity
            ))),
        }
    }

    /// Puts `quantity` units back. Callers only release what they reserved.
    ///
    /// Deactivated products still get their stock back.
    pub(crate) async fn release(&self, product_id: i64, quantity: i64) -> ResultEngine<()> {
        validate_quantity(quantity)?;
        let applied = self
            .execute(
                "UPDATE products \
                 SET stock_quantity = stock_quantity + ?, updated_at = ? \
                 WHERE id = ? AND organization_id = ?",
                vec![
                    quantity.into(),
                    Utc::now().into(),
                    product_id.into(),
                    self.organization_id.into(),
                ],
            )
            .await?;
        if applied == 0 {
            return Err(EngineError::ProductNotFound(product_id.to_string()));
        }
        tracing::debug!(product_id, quantity, "stock released");
        Ok(())
    }

    /// Applies a signed correction, refusing to go below zero. Returns the
    /// new stock level.
    pub(crate) async fn adjust(&self, product_id: i64, delta: i64) -> ResultEngine<i64> {
        if delta < 0 {
            self.reserve(product_id, delta.checked_neg().unwrap_or(i64::MAX))
                .await?;
        } else if delta > 0 {
            let applied = self
                .execute(
                    "UPDATE products \
                     SET stock_quantity = stock_quantity + ?, updated_at = ? \
                     WHERE id = ? AND organization_id = ? AND active = 1",
                    vec![
                        delta.into(),
                        Utc::now().into(),
                        product_id.into(),
                        self.organization_id.into(),
                    ],
                )
                .await?;
            if applied == 0 {
                return Err(EngineError::ProductNotFound(product_id.to_string()));
            }
        }

        let product = self
            .find_active(product_id)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(product_id.to_string()))?;
        Ok(product.stock_quantity)
    }
}

impl Engine {
    /// Manual stock correction (goods received, shrinkage, recount).
    ///
    /// Requires a catalog-managing role.
    pub async fn adjust_stock(
        &self,
        ctx: &OrgContext,
        product_id: i64,
        delta: i64,
    ) -> ResultEngine<i64> {
        let stock = self
            .run_guarded("adjust_stock", move || async move {
                with_tx!(self, |db_tx| {
                    let ctx = self.require_catalog_manager(&db_tx, ctx).await?;
                    InventoryLedger::new(&db_tx, &ctx)
                        .adjust(product_id, delta)
                        .await
                })
            })
            .await?;
        tracing::info!(
            organization_id = ctx.organization_id(),
            product_id,
            delta,
            stock,
            "stock adjusted"
        );
        Ok(stock)
    }
}
