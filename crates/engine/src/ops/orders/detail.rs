use crate::{Order, ResultEngine};

use super::super::{Engine, OrgContext, with_tx};

impl Engine {
    /// Full order with its line items.
    pub async fn get_order(&self, ctx: &OrgContext, order_id: i64) -> ResultEngine<Order> {
        self.run_guarded("get_order", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                let model = self.find_order(&db_tx, &ctx, order_id).await?;
                let mut order = Order::try_from(model)?;
                order.items = self.order_items(&db_tx, &ctx, order.id).await?;
                Ok(order)
            })
        })
        .await
    }
}
