use sea_orm::{Condition, PaginatorTrait, QueryFilter, QueryOrder, prelude::*};

use crate::{
    Money, OrderStatus, OrderSummary, PaymentStatus, ResultEngine, customers, orders,
    util::normalize_optional_text,
};

use super::super::{Engine, OrgContext, Page, Pagination, with_tx};
use super::DateRange;

/// Filters for [`Engine::list_orders`]. Every field is optional.
#[derive(Clone, Debug, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub date: DateRange,
    pub customer_id: Option<i64>,
    /// Substring of the order number or of the customer name.
    pub search: Option<String>,
}

fn summary(order: orders::Model, customer: Option<customers::Model>) -> ResultEngine<OrderSummary> {
    Ok(OrderSummary {
        id: order.id,
        order_number: order.order_number,
        customer_id: order.customer_id,
        customer_name: customer.map(|c| c.name),
        status: OrderStatus::try_from(order.status.as_str())?,
        payment_status: PaymentStatus::try_from(order.payment_status.as_str())?,
        grand_total: Money::new(order.grand_total_minor),
        order_date: order.order_date,
    })
}

impl Engine {
    /// Newest orders first.
    pub async fn list_orders(
        &self,
        ctx: &OrgContext,
        filter: &OrderListFilter,
        pagination: Pagination,
    ) -> ResultEngine<Page<OrderSummary>> {
        let (page, limit) = self.resolve_pagination(pagination)?;
        filter.date.validate()?;

        self.run_guarded("list_orders", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                let organization_id = ctx.organization_id();

                let mut query = orders::Entity::find()
                    .find_also_related(customers::Entity)
                    .filter(orders::Column::OrganizationId.eq(organization_id))
                    .filter(
                        Condition::any()
                            .add(customers::Column::OrganizationId.eq(organization_id))
                            .add(customers::Column::Id.is_null()),
                    );

                if let Some(status) = filter.status {
                    query = query.filter(orders::Column::Status.eq(status.as_str()));
                }
                if let Some(payment_status) = filter.payment_status {
                    query = query.filter(orders::Column::PaymentStatus.eq(payment_status.as_str()));
                }
                if let Some(from) = filter.date.from {
                    query = query.filter(orders::Column::OrderDate.gte(from));
                }
                if let Some(to) = filter.date.to {
                    query = query.filter(orders::Column::OrderDate.lt(to));
                }
                if let Some(customer_id) = filter.customer_id {
                    query = query.filter(orders::Column::CustomerId.eq(customer_id));
                }
                if let Some(term) = normalize_optional_text(filter.search.as_deref()) {
                    query = query.filter(
                        Condition::any()
                            .add(orders::Column::OrderNumber.contains(&term))
                            .add(customers::Column::Name.contains(&term)),
                    );
                }

                let paginator = query
                    .order_by_desc(orders::Column::OrderDate)
                    .order_by_desc(orders::Column::Id)
                    .paginate(&db_tx, limit);
                let total = paginator.num_items().await?;
                let items = paginator
                    .fetch_page(page - 1)
                    .await?
                    .into_iter()
                    .map(|(order, customer)| summary(order, customer))
                    .collect::<ResultEngine<Vec<_>>>()?;

                tracing::debug!(organization_id, page, limit, total, "orders listed");
                Ok(Page {
                    items,
                    page,
                    limit,
                    total,
                })
            })
        })
        .await
    }
}
