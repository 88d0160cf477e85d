use sea_orm::{ConnectionTrait, Statement};

use crate::{EngineError, OrderStatus, ResultEngine, lifecycle::check_deletable};

use super::super::{Engine, OrgContext, inventory::InventoryLedger, with_tx};

impl Engine {
    /// Hard-deletes a `draft` order and gives its reserved stock back.
    ///
    /// Any other status is `OrderNotDeletable`: such orders are cancelled.
    pub async fn delete_order(&self, ctx: &OrgContext, order_id: i64) -> ResultEngine<()> {
        let organization_id = self
            .run_guarded("delete_order", move || async move {
                with_tx!(self, |db_tx| {
                    let ctx = self.require_context(&db_tx, ctx).await?;
                    let model = self.find_order(&db_tx, &ctx, order_id).await?;
                    check_deletable(OrderStatus::try_from(model.status.as_str())?)?;

                    let items = self.order_items(&db_tx, &ctx, order_id).await?;
                    self.delete_order_items(&db_tx, &ctx, order_id).await?;

                    let stmt = Statement::from_sql_and_values(
                        db_tx.get_database_backend(),
                        "DELETE FROM orders WHERE id = ? AND organization_id = ? AND status = ?",
                        vec![
                            order_id.into(),
                            ctx.organization_id().into(),
                            OrderStatus::Draft.as_str().into(),
                        ],
                    );
                    if db_tx.execute(stmt).await?.rows_affected() != 1 {
                        return Err(EngineError::ConcurrencyConflict(format!(
                            "order {order_id} changed concurrently"
                        )));
                    }

                    let ledger = InventoryLedger::new(&db_tx, &ctx);
                    for item in &items {
                        ledger.release(item.product_id, item.quantity).await?;
                    }
                    Ok(ctx.organization_id())
                })
            })
            .await?;

        tracing::info!(organization_id, order_id, "draft order deleted");
        Ok(())
    }
}
