use chrono::Utc;
use sea_orm::{ConnectionTrait, Statement};

use crate::{
    EngineError, Order, OrderStatus, PaymentStatus, ResultEngine,
    lifecycle::{StatusTransition, check_payment_transition, plan_status_transition},
};

use super::super::{Engine, OrgContext, inventory::InventoryLedger, with_tx};

/// Column of `orders` guarded by a compare-and-swap update.
#[derive(Clone, Copy)]
enum GuardedColumn {
    Status,
    PaymentStatus,
}

impl GuardedColumn {
    fn sql(self) -> &'static str {
        match self {
            Self::Status => {
                "UPDATE orders SET status = ?, updated_at = ? \
                 WHERE id = ? AND organization_id = ? AND status = ?"
            }
            Self::PaymentStatus => {
                "UPDATE orders SET payment_status = ?, updated_at = ? \
                 WHERE id = ? AND organization_id = ? AND payment_status = ?"
            }
        }
    }
}

/// Moves `column` from `from` to `to`, failing if another writer got there first.
async fn swap_column<C: ConnectionTrait>(
    db: &C,
    ctx: &OrgContext,
    order_id: i64,
    column: GuardedColumn,
    from: &str,
    to: &str,
) -> ResultEngine<()> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        column.sql(),
        vec![
            to.into(),
            Utc::now().into(),
            order_id.into(),
            ctx.organization_id().into(),
            from.into(),
        ],
    );
    let result = db.execute(stmt).await?;
    if result.rows_affected() != 1 {
        return Err(EngineError::ConcurrencyConflict(format!(
            "order {order_id} changed concurrently"
        )));
    }
    Ok(())
}

impl Engine {
    /// Applies a status transition.
    ///
    /// Entering `cancelled` releases the stock of every item in the same
    /// transaction. Cancelling a cancelled order changes nothing.
    pub async fn update_order_status(
        &self,
        ctx: &OrgContext,
        order_id: i64,
        target: OrderStatus,
    ) -> ResultEngine<Order> {
        let (order, transition) = self
            .run_guarded("update_order_status", move || async move {
                with_tx!(self, |db_tx| {
                    let ctx = self.require_context(&db_tx, ctx).await?;
                    let model = self.find_order(&db_tx, &ctx, order_id).await?;
                    let current = OrderStatus::try_from(model.status.as_str())?;
                    let transition = plan_status_transition(current, target)?;

                    if transition != StatusTransition::NoOp {
                        swap_column(
                            &db_tx,
                            &ctx,
                            order_id,
                            GuardedColumn::Status,
                            current.as_str(),
                            target.as_str(),
                        )
                        .await?;
                    }

                    let items = self.order_items(&db_tx, &ctx, order_id).await?;
                    if transition == StatusTransition::Cancel {
                        let ledger = InventoryLedger::new(&db_tx, &ctx);
                        for item in &items {
                            ledger.release(item.product_id, item.quantity).await?;
                        }
                    }

                    let model = self.find_order(&db_tx, &ctx, order_id).await?;
                    let mut order = Order::try_from(model)?;
                    order.items = items;
                    Ok((order, transition))
                })
            })
            .await?;

        match transition {
            StatusTransition::NoOp => tracing::debug!(
                organization_id = order.organization_id,
                order_id,
                "order already cancelled"
            ),
            _ => tracing::info!(
                organization_id = order.organization_id,
                order_id,
                status = order.status.as_str(),
                "order status updated"
            ),
        }
        Ok(order)
    }

    /// Applies a payment-status transition. Never touches the order status.
    pub async fn update_payment_status(
        &self,
        ctx: &OrgContext,
        order_id: i64,
        target: PaymentStatus,
    ) -> ResultEngine<Order> {
        let order = self
            .run_guarded("update_payment_status", move || async move {
                with_tx!(self, |db_tx| {
                    let ctx = self.require_context(&db_tx, ctx).await?;
                    let model = self.find_order(&db_tx, &ctx, order_id).await?;
                    let current = PaymentStatus::try_from(model.payment_status.as_str())?;
                    check_payment_transition(current, target)?;

                    swap_column(
                        &db_tx,
                        &ctx,
                        order_id,
                        GuardedColumn::PaymentStatus,
                        current.as_str(),
                        target.as_str(),
                    )
                    .await?;

                    let model = self.find_order(&db_tx, &ctx, order_id).await?;
                    let mut order = Order::try_from(model)?;
                    order.items = self.order_items(&db_tx, &ctx, order_id).await?;
                    Ok(order)
                })
            })
            .await?;

        tracing::info!(
            organization_id = order.organization_id,
            order_id,
            payment_status = order.payment_status.as_str(),
            "payment status updated"
        );
        Ok(order)
    }
}
