//! Read models over orders and order items. Cancelled orders never count
//! toward revenue or product rankings.

use sea_orm::{ConnectionTrait, Statement, Value};
use serde::Serialize;

use crate::{EngineError, Money, OrderStatus, ResultEngine};

use super::{Engine, OrgContext, orders::DateRange, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SalesStatistics {
    /// Non-cancelled orders.
    pub order_count: i64,
    pub cancelled_count: i64,
    /// Sum of grand totals.
    pub revenue: Money,
    pub subtotal: Money,
    pub tax_total: Money,
    /// `revenue / order_count`, rounded half up. Zero without orders.
    pub average_order_value: Money,
    pub by_status: Vec<StatusCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    /// Sum of line totals, before tax.
    pub revenue: Money,
}

/// Appends `order_date` bounds for the `orders` alias `o`.
fn date_clause(range: &DateRange, values: &mut Vec<Value>) -> String {
    let mut clause = String::new();
    if let Some(from) = range.from {
        clause.push_str(" AND o.order_date >= ?");
        values.push(from.into());
    }
    if let Some(to) = range.to {
        clause.push_str(" AND o.order_date < ?");
        values.push(to.into());
    }
    clause
}

fn average(total: Money, count: i64) -> Money {
    if count <= 0 {
        return Money::ZERO;
    }
    let total = i128::from(total.minor());
    let count = i128::from(count);
    let rounded = (2 * total + count).div_euclid(2 * count);
    Money::new(i64::try_from(rounded).unwrap_or(i64::MAX))
}

impl Engine {
    pub async fn sales_statistics(
        &self,
        ctx: &OrgContext,
        range: DateRange,
    ) -> ResultEngine<SalesStatistics> {
        range.validate()?;

        self.run_guarded("sales_statistics", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;

                let mut values: Vec<Value> = vec![ctx.organization_id().into()];
                let date_cond = date_clause(&range, &mut values);
                let stmt = Statement::from_sql_and_values(
                    db_tx.get_database_backend(),
                    format!(
                        "SELECT o.status AS status, COUNT(*) AS orders, \
                         COALESCE(SUM(o.subtotal_minor), 0) AS subtotal, \
                         COALESCE(SUM(o.tax_total_minor), 0) AS tax, \
                         COALESCE(SUM(o.grand_total_minor), 0) AS total \
                         FROM orders o \
                         WHERE o.organization_id = ?{date_cond} \
                         GROUP BY o.status"
                    ),
                    values,
                );

                let mut stats = SalesStatistics::default();
                for row in db_tx.query_all(stmt).await? {
                    let status: String = row.try_get("", "status")?;
                    let status = OrderStatus::try_from(status.as_str())?;
                    let count: i64 = row.try_get("", "orders")?;
                    stats.by_status.push(StatusCount { status, count });

                    if status == OrderStatus::Cancelled {
                        stats.cancelled_count += count;
                        continue;
                    }
                    let overflow = || EngineError::InvalidInput("sales totals overflow".to_string());
                    stats.order_count += count;
                    stats.subtotal = stats
                        .subtotal
                        .checked_add(Money::new(row.try_get("", "subtotal")?))
                        .ok_or_else(overflow)?;
                    stats.tax_total = stats
                        .tax_total
                        .checked_add(Money::new(row.try_get("", "tax")?))
                        .ok_or_else(overflow)?;
                    stats.revenue = stats
                        .revenue
                        .checked_add(Money::new(row.try_get("", "total")?))
                        .ok_or_else(overflow)?;
                }
                stats
                    .by_status
                    .sort_by_key(|entry| OrderStatus::ALL.iter().position(|s| *s == entry.status));
                stats.average_order_value = average(stats.revenue, stats.order_count);
                Ok(stats)
            })
        })
        .await
    }

    /// Best sellers by quantity, ties broken by revenue.
    pub async fn top_products(
        &self,
        ctx: &OrgContext,
        range: DateRange,
        limit: u64,
    ) -> ResultEngine<Vec<TopProduct>> {
        range.validate()?;
        if limit == 0 {
            return Err(EngineError::InvalidInput("limit must be > 0".to_string()));
        }
        let limit = limit.min(self.config.max_page_limit);

        self.run_guarded("top_products", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;

                let mut values: Vec<Value> = vec![
                    ctx.organization_id().into(),
                    OrderStatus::Cancelled.as_str().into(),
                ];
                let date_cond = date_clause(&range, &mut values);
                values.push(limit.into());
                let stmt = Statement::from_sql_and_values(
                    db_tx.get_database_backend(),
                    format!(
                        "SELECT p.id AS product_id, p.sku AS sku, p.name AS name, \
                         SUM(oi.quantity) AS quantity, SUM(oi.line_total_minor) AS revenue \
                         FROM order_items oi \
                         JOIN orders o ON o.id = oi.order_id \
                         JOIN products p ON p.id = oi.product_id AND p.organization_id = o.organization_id \
                         WHERE o.organization_id = ? AND o.status <> ?{date_cond} \
                         GROUP BY p.id, p.sku, p.name \
                         ORDER BY quantity DESC, revenue DESC, p.id ASC \
                         LIMIT ?"
                    ),
                    values,
                );

                db_tx
                    .query_all(stmt)
                    .await?
                    .into_iter()
                    .map(|row| -> ResultEngine<TopProduct> {
                        Ok(TopProduct {
                            product_id: row.try_get("", "product_id")?,
                            sku: row.try_get("", "sku")?,
                            name: row.try_get("", "name")?,
                            quantity: row.try_get("", "quantity")?,
                            revenue: Money::new(row.try_get("", "revenue")?),
                        })
                    })
                    .collect::<ResultEngine<Vec<_>>>()
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_rounds_half_up() {
        assert_eq!(average(Money::new(1000), 3), Money::new(333));
        assert_eq!(average(Money::new(1001), 2), Money::new(501));
        assert_eq!(average(Money::new(500), 0), Money::ZERO);
    }
}
