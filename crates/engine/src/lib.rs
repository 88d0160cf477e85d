//! Order lifecycle and inventory-consistency engine.
//!
//! Tenants (organizations) own customers, a product catalog and sales orders.
//! Every operation takes an [`OrgContext`] issued by [`Engine::authorize`];
//! stock and order numbers are changed with atomic conditional updates inside
//! the transaction of the order mutation that needs them.

pub use commands::{
    CreateOrderCmd, CustomerUpdate, NewCustomerCmd, NewProductCmd, OrderLine, ProductUpdate,
};
pub use customers::{Customer, CustomerSegment, CustomerType};
pub use error::EngineError;
pub use lifecycle::{
    OrderStatus, PaymentStatus, StatusTransition, check_deletable, check_payment_transition,
    plan_status_transition,
};
pub use memberships::{Membership, MembershipRole};
pub use money::{Money, TaxRate};
pub use ops::{
    CustomerListFilter, DateRange, Engine, EngineBuilder, EngineConfig, OrderListFilter,
    OrgContext, Page, Pagination, ProductListFilter, RetryPolicy, SalesStatistics, StatusCount,
    TopProduct, format_order_number,
};
pub use order_items::OrderItem;
pub use orders::{Order, OrderSummary};
pub use organizations::Organization;
pub use pricing::{
    CatalogPrice, OrderQuote, OrderTotals, PriceSource, PricedLine, price_line, validate_quantity,
};
pub use products::Product;

mod commands;
mod customers;
mod error;
mod lifecycle;
mod memberships;
mod money;
mod ops;
mod order_counters;
mod order_items;
mod orders;
mod organizations;
mod pricing;
mod products;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
