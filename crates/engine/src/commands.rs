//! Command structs for engine operations.
//!
//! These types group parameters for write operations (order creation, catalog
//! and customer writes), keeping call sites readable and avoiding long
//! argument lists.

use chrono::{DateTime, Utc};

use crate::{CustomerSegment, CustomerType, Money, TaxRate};

/// One requested order line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i64,
    /// Manual price; `None` means the catalog price at creation time.
    pub unit_price: Option<Money>,
}

impl OrderLine {
    #[must_use]
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
            unit_price: None,
        }
    }

    #[must_use]
    pub fn unit_price(mut self, price: Money) -> Self {
        self.unit_price = Some(price);
        self
    }
}

/// Create an order for a customer.
#[derive(Clone, Debug)]
pub struct CreateOrderCmd {
    pub customer_id: i64,
    pub lines: Vec<OrderLine>,
    pub notes: Option<String>,
    /// Defaults to "now"; also selects the numbering year.
    pub order_date: Option<DateTime<Utc>>,
}

impl CreateOrderCmd {
    #[must_use]
    pub fn new(customer_id: i64) -> Self {
        Self {
            customer_id,
            lines: Vec::new(),
            notes: None,
            order_date: None,
        }
    }

    #[must_use]
    pub fn line(mut self, line: OrderLine) -> Self {
        self.lines.push(line);
        self
    }

    #[must_use]
    pub fn lines(mut self, lines: impl IntoIterator<Item = OrderLine>) -> Self {
        self.lines.extend(lines);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn order_date(mut self, order_date: DateTime<Utc>) -> Self {
        self.order_date = Some(order_date);
        self
    }
}

/// Create a catalog product.
#[derive(Clone, Debug)]
pub struct NewProductCmd {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_price: Money,
    pub unit_cost: Money,
    pub tax_rate: TaxRate,
    pub stock_quantity: i64,
    pub reorder_level: i64,
}

impl NewProductCmd {
    #[must_use]
    pub fn new(sku: impl Into<String>, name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            category: None,
            unit_price,
            unit_cost: Money::ZERO,
            tax_rate: TaxRate::ZERO,
            stock_quantity: 0,
            reorder_level: 0,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn unit_cost(mut self, unit_cost: Money) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    #[must_use]
    pub fn tax_rate(mut self, tax_rate: TaxRate) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    #[must_use]
    pub fn stock_quantity(mut self, stock_quantity: i64) -> Self {
        self.stock_quantity = stock_quantity;
        self
    }

    #[must_use]
    pub fn reorder_level(mut self, reorder_level: i64) -> Self {
        self.reorder_level = reorder_level;
        self
    }
}

/// Partial product update. Stock is not editable here, use
/// `Engine::adjust_stock`.
#[derive(Clone, Debug, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<String>>,
    pub unit_price: Option<Money>,
    pub unit_cost: Option<Money>,
    pub tax_rate: Option<TaxRate>,
    pub reorder_level: Option<i64>,
}

/// Create a customer.
#[derive(Clone, Debug)]
pub struct NewCustomerCmd {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub customer_type: CustomerType,
    pub segment: CustomerSegment,
    pub credit_limit: Money,
}

impl NewCustomerCmd {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
            address: None,
            customer_type: CustomerType::default(),
            segment: CustomerSegment::default(),
            credit_limit: Money::ZERO,
        }
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn customer_type(mut self, customer_type: CustomerType) -> Self {
        self.customer_type = customer_type;
        self
    }

    #[must_use]
    pub fn segment(mut self, segment: CustomerSegment) -> Self {
        self.segment = segment;
        self
    }

    #[must_use]
    pub fn credit_limit(mut self, credit_limit: Money) -> Self {
        self.credit_limit = credit_limit;
        self
    }
}

/// Partial customer update. `Some(None)` clears an optional contact field.
#[derive(Clone, Debug, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub customer_type: Option<CustomerType>,
    pub segment: Option<CustomerSegment>,
    pub credit_limit: Option<Money>,
}
