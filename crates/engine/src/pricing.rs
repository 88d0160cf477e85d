//! Pricing engine.
//!
//! Pure computation: given catalog data and requested quantities it produces
//! priced lines and order totals. Loading the catalog rows (scoped to one
//! organization) happens in `ops::pricing`.
//!
//! Rules:
//! - `line_total = quantity * unit_price`
//! - `line_tax = round_half_up(line_total * tax_rate)`, rounded per line
//! - `tax_total = sum(line_tax)`, `grand_total = subtotal + tax_total`

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, OrderItem, ResultEngine, TaxRate};

/// Where a line's unit price came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Current catalog price ("auto pricing").
    Catalog,
    /// Explicit override supplied by the caller, used verbatim.
    Manual,
}

/// The catalog facts pricing needs for one product.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogPrice {
    pub product_id: i64,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    pub line_total: Money,
    pub line_tax: Money,
    pub price_source: PriceSource,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax_total: Money,
    pub grand_total: Money,
}

impl OrderTotals {
    fn from_parts(parts: impl Iterator<Item = (Money, Money)>) -> ResultEngine<Self> {
        let overflow = || EngineError::InvalidQuantity("order total overflows".to_string());
        let mut subtotal = Money::ZERO;
        let mut tax_total = Money::ZERO;
        for (line_total, line_tax) in parts {
            subtotal = subtotal.checked_add(line_total).ok_or_else(overflow)?;
            tax_total = tax_total.checked_add(line_tax).ok_or_else(overflow)?;
        }
        let grand_total = subtotal.checked_add(tax_total).ok_or_else(overflow)?;
        Ok(Self {
            subtotal,
            tax_total,
            grand_total,
        })
    }

    pub fn from_lines(lines: &[PricedLine]) -> ResultEngine<Self> {
        Self::from_parts(lines.iter().map(|l| (l.line_total, l.line_tax)))
    }

    /// Recomputes totals from persisted items alone.
    pub fn from_items(items: &[OrderItem]) -> ResultEngine<Self> {
        Self::from_parts(items.iter().map(|i| (i.line_total, i.line_tax)))
    }
}

/// Side-effect free preview of an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub lines: Vec<PricedLine>,
    pub totals: OrderTotals,
}

pub fn validate_quantity(quantity: i64) -> ResultEngine<()> {
    if quantity <= 0 {
        return Err(EngineError::InvalidQuantity(format!(
            "quantity must be > 0, got {quantity}"
        )));
    }
    Ok(())
}

/// Prices one line against the catalog, honoring a manual override.
pub fn price_line(
    catalog: &CatalogPrice,
    quantity: i64,
    unit_price_override: Option<Money>,
) -> ResultEngine<PricedLine> {
    validate_quantity(quantity)?;

    let (unit_price, price_source) = match unit_price_override {
        Some(price) => {
            if price.is_negative() {
                return Err(EngineError::InvalidPrice(format!(
                    "unit price must be >= 0, got {price}"
                )));
            }
            (price, PriceSource::Manual)
        }
        None => (catalog.unit_price, PriceSource::Catalog),
    };

    let line_total = unit_price.checked_mul_quantity(quantity).ok_or_else(|| {
        EngineError::InvalidQuantity(format!("line total overflows for quantity {quantity}"))
    })?;
    let line_tax = catalog.tax_rate.tax_on(line_total);

    Ok(PricedLine {
        product_id: catalog.product_id,
        quantity,
        unit_price,
        tax_rate: catalog.tax_rate,
        line_total,
        line_tax,
        price_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(price: i64, tax_bp: i32) -> CatalogPrice {
        CatalogPrice {
            product_id: 7,
            unit_price: Money::new(price),
            tax_rate: TaxRate::from_basis_points(tax_bp).unwrap(),
        }
    }

    #[test]
    fn auto_pricing_uses_catalog() {
        let line = price_line(&catalog(1999, 2000), 3, None).unwrap();
        assert_eq!(line.unit_price, Money::new(1999));
        assert_eq!(line.line_total, Money::new(5997));
        // 20 % of 59.97 = 11.994 -> 11.99
        assert_eq!(line.line_tax, Money::new(1199));
        assert_eq!(line.price_source, PriceSource::Catalog);
    }

    #[test]
    fn manual_pricing_is_verbatim() {
        let line = price_line(&catalog(1999, 1000), 2, Some(Money::new(1500))).unwrap();
        assert_eq!(line.unit_price, Money::new(1500));
        assert_eq!(line.line_total, Money::new(3000));
        assert_eq!(line.line_tax, Money::new(300));
        assert_eq!(line.price_source, PriceSource::Manual);
    }

    #[test]
    fn rejects_non_positive_quantity() {
        for qty in [0, -1] {
            let err = price_line(&catalog(100, 0), qty, None).unwrap_err();
            assert_eq!(err.kind(), "INVALID_QUANTITY");
        }
    }

    #[test]
    fn rejects_negative_override() {
        let err = price_line(&catalog(100, 0), 1, Some(Money::new(-1))).unwrap_err();
        assert_eq!(err.kind(), "INVALID_PRICE");
    }

    #[test]
    fn tax_is_rounded_per_line_not_on_aggregate() {
        // Each line: 0.25 * 18 % = 0.045 -> 0.05. Aggregate rounding would
        // give 0.50 * 18 % = 0.09.
        let a = price_line(&catalog(25, 1800), 1, None).unwrap();
        let b = price_line(&catalog(25, 1800), 1, None).unwrap();
        let totals = OrderTotals::from_lines(&[a, b]).unwrap();
        assert_eq!(totals.subtotal, Money::new(50));
        assert_eq!(totals.tax_total, Money::new(10));
        assert_eq!(totals.grand_total, Money::new(60));
    }

    #[test]
    fn overflow_is_reported() {
        let err = price_line(&catalog(i64::MAX, 0), 2, None).unwrap_err();
        assert_eq!(err.kind(), "INVALID_QUANTITY");
    }
}
