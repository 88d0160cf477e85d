use std::collections::{BTreeSet, HashMap};

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{
    EngineError, Money, OrderLine, ResultEngine, TaxRate,
    pricing::{CatalogPrice, OrderQuote, OrderTotals, PricedLine, price_line, validate_quantity},
    products,
};

use super::{Engine, OrgContext, with_tx};

impl Engine {
    /// Prices `lines` against the organization's active catalog.
    ///
    /// A product id that is unknown, inactive or owned by another
    /// organization is `ProductNotFound`, with or without a manual price.
    pub(super) async fn price_lines<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
        lines: &[OrderLine],
    ) -> ResultEngine<Vec<PricedLine>> {
        if lines.is_empty() {
            return Err(EngineError::InvalidInput(
                "an order needs at least one line".to_string(),
            ));
        }
        for line in lines {
            validate_quantity(line.quantity)?;
        }

        let ids: BTreeSet<i64> = lines.iter().map(|line| line.product_id).collect();
        let catalog: HashMap<i64, CatalogPrice> = products::Entity::find()
            .filter(products::Column::Id.is_in(ids))
            .filter(products::Column::OrganizationId.eq(ctx.organization_id()))
            .filter(products::Column::Active.eq(true))
            .all(db)
            .await?
            .into_iter()
            .map(|model| -> ResultEngine<(i64, CatalogPrice)> {
                let price = CatalogPrice {
                    product_id: model.id,
                    unit_price: Money::new(model.unit_price_minor),
                    tax_rate: TaxRate::from_basis_points(model.tax_rate_bp)?,
                };
                Ok((model.id, price))
            })
            .collect::<ResultEngine<_>>()?;

        lines
            .iter()
            .map(|line| {
                let price = catalog
                    .get(&line.product_id)
                    .ok_or_else(|| EngineError::ProductNotFound(line.product_id.to_string()))?;
                price_line(price, line.quantity, line.unit_price)
            })
            .collect()
    }

    /// Prices an order without reserving stock or writing anything.
    pub async fn quote_order(&self, ctx: &OrgContext, lines: &[OrderLine]) -> ResultEngine<OrderQuote> {
        self.run_guarded("quote_order", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                let lines = self.price_lines(&db_tx, &ctx, lines).await?;
                let totals = OrderTotals::from_lines(&lines)?;
                Ok(OrderQuote { lines, totals })
            })
        })
        .await
    }
}
