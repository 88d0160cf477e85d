//! Order service: the only code that mutates orders.
//!
//! Every mutation runs as one attempt of [`Engine::run_guarded`] wrapping a
//! single transaction. Row changes use compare-and-swap on the previous
//! status, so two racing writers cannot both apply a transition.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, Statement, prelude::*};

use crate::{EngineError, OrderItem, ResultEngine, order_items, orders};

use super::{Engine, OrgContext};

mod create;
mod delete;
mod detail;
mod list;
mod status;

pub use list::OrderListFilter;

/// Half-open `[from, to)` interval on the order date. Open ends are unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    #[must_use]
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(EngineError::InvalidInput(
                "date range start is after its end".to_string(),
            ));
        }
        Ok(())
    }
}

impl Engine {
    pub(super) async fn find_order<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
        order_id: i64,
    ) -> ResultEngine<orders::Model> {
        orders::Entity::find_by_id(order_id)
            .filter(orders::Column::OrganizationId.eq(ctx.organization_id()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::OrderNotFound(order_id.to_string()))
    }

    /// Items of `order_id`, joined through `orders` on the context's tenant.
    pub(super) async fn order_items<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
        order_id: i64,
    ) -> ResultEngine<Vec<OrderItem>> {
        order_items::Entity::find()
            .inner_join(orders::Entity)
            .filter(order_items::Column::OrderId.eq(order_id))
            .filter(orders::Column::OrganizationId.eq(ctx.organization_id()))
            .order_by_asc(order_items::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(OrderItem::try_from)
            .collect()
    }

    /// Deletes the items of `order_id` if the order belongs to the context's tenant.
    pub(super) async fn delete_order_items<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
        order_id: i64,
    ) -> ResultEngine<u64> {
        let stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            "DELETE FROM order_items WHERE order_id IN \
             (SELECT id FROM orders WHERE id = ? AND organization_id = ?)",
            vec![order_id.into(), ctx.organization_id().into()],
        );
        Ok(db.execute(stmt).await?.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;

    use migration::MigratorTrait;

    use crate::{CreateOrderCmd, Money, NewCustomerCmd, NewProductCmd, OrderLine};

    use super::*;

    #[tokio::test]
    async fn item_access_is_scoped_to_the_tenant() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();

        let org_a = engine.create_organization("A", 1).await.unwrap();
        let org_b = engine.create_organization("B", 2).await.unwrap();
        let ctx_a = engine.authorize_id(1, org_a.id).await.unwrap();
        let ctx_b = engine.authorize_id(2, org_b.id).await.unwrap();

        let product = engine
            .create_product(
                &ctx_a,
                NewProductCmd::new("W", "Widget", Money::new(100)).stock_quantity(5),
            )
            .await
            .unwrap();
        let buyer = engine
            .create_customer(&ctx_a, NewCustomerCmd::new("Buyer"))
            .await
            .unwrap();
        let order = engine
            .create_order(
                &ctx_a,
                CreateOrderCmd::new(buyer.id).line(OrderLine::new(product.id, 2)),
            )
            .await
            .unwrap();

        let db = &engine.database;
        let foreign = engine.order_items(db, &ctx_b, order.id).await.unwrap();
        assert!(foreign.is_empty());
        let deleted = engine.delete_order_items(db, &ctx_b, order.id).await.unwrap();
        assert_eq!(deleted, 0);

        let own = engine.order_items(db, &ctx_a, order.id).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].quantity, 2);
        let deleted = engine.delete_order_items(db, &ctx_a, order.id).await.unwrap();
        assert_eq!(deleted, 1);
    }
}
