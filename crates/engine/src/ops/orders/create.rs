use chrono::{Datelike, Utc};
use sea_orm::{ActiveModelTrait, SqlErr};

use crate::{
    CreateOrderCmd, EngineError, Order, OrderItem, OrderStatus, PaymentStatus, ResultEngine,
    order_items, orders, pricing::OrderTotals, util::normalize_optional_text,
};

use super::super::{Engine, OrgContext, inventory::InventoryLedger, numbering, with_tx};

impl Engine {
    /// Creates a `draft` order.
    ///
    /// Number allocation, the stock reservation of every line and the
    /// inserts commit together. Any failing line rolls back the reservations
    /// of the lines before it.
    pub async fn create_order(&self, ctx: &OrgContext, cmd: CreateOrderCmd) -> ResultEngine<Order> {
        let cmd = &cmd;
        let order = self
            .run_guarded("create_order", move || async move {
                with_tx!(self, |db_tx| {
                    let ctx = self.require_context(&db_tx, ctx).await?;
                    self.require_active_customer(&db_tx, &ctx, cmd.customer_id)
                        .await?;

                    let lines = self.price_lines(&db_tx, &ctx, &cmd.lines).await?;
                    let totals = OrderTotals::from_lines(&lines)?;

                    let ledger = InventoryLedger::new(&db_tx, &ctx);
                    for line in &lines {
                        ledger.reserve(line.product_id, line.quantity).await?;
                    }

                    let now = Utc::now();
                    let order_date = cmd.order_date.unwrap_or(now);
                    let order_number = numbering::next_order_number(
                        &db_tx,
                        ctx.organization_id(),
                        order_date.year(),
                    )
                    .await?;

                    let mut order = Order {
                        id: 0,
                        organization_id: ctx.organization_id(),
                        customer_id: cmd.customer_id,
                        order_number,
                        status: OrderStatus::Draft,
                        payment_status: PaymentStatus::Pending,
                        subtotal: totals.subtotal,
                        tax_total: totals.tax_total,
                        grand_total: totals.grand_total,
                        notes: normalize_optional_text(cmd.notes.as_deref()),
                        order_date,
                        created_by: ctx.user_id(),
                        created_at: now,
                        updated_at: now,
                        items: Vec::with_capacity(lines.len()),
                    };

                    let model = orders::ActiveModel::from(&order)
                        .insert(&db_tx)
                        .await
                        .map_err(|err| match err.sql_err() {
                            Some(SqlErr::UniqueConstraintViolation(_)) => {
                                EngineError::ConcurrencyConflict(format!(
                                    "order number {} already taken",
                                    order.order_number
                                ))
                            }
                            _ => EngineError::from(err),
                        })?;
                    order.id = model.id;

                    for line in lines {
                        let mut item = OrderItem {
                            id: 0,
                            order_id: order.id,
                            product_id: line.product_id,
                            quantity: line.quantity,
                            unit_price: line.unit_price,
                            tax_rate: line.tax_rate,
                            line_total: line.line_total,
                            line_tax: line.line_tax,
                        };
                        let model = order_items::ActiveModel::from(&item).insert(&db_tx).await?;
                        item.id = model.id;
                        order.items.push(item);
                    }

                    Ok(order)
                })
            })
            .await?;

        tracing::info!(
            organization_id = order.organization_id,
            order_id = order.id,
            order_number = %order.order_number,
            grand_total = %order.grand_total,
            items = order.items.len(),
            "order created"
        );
        Ok(order)
    }
}
