//! Mapping between engine values and wire DTOs.

use api_types::{common, customer, membership, order, product};
use engine::{
    Customer, CustomerSegment, CustomerType, Membership, MembershipRole, Money, OrderItem,
    OrderLine, OrderStatus, Page, PaymentStatus, Product, TaxRate,
};

use crate::ServerError;

pub(crate) fn page<T, V>(page: Page<T>, f: impl Fn(T) -> V) -> common::Page<V> {
    common::Page {
        items: page.items.into_iter().map(f).collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
    }
}

pub(crate) fn order_status(status: OrderStatus) -> order::OrderStatus {
    match status {
        OrderStatus::Draft => order::OrderStatus::Draft,
        OrderStatus::Confirmed => order::OrderStatus::Confirmed,
        OrderStatus::Processing => order::OrderStatus::Processing,
        OrderStatus::Shipped => order::OrderStatus::Shipped,
        OrderStatus::Delivered => order::OrderStatus::Delivered,
        OrderStatus::Cancelled => order::OrderStatus::Cancelled,
    }
}

pub(crate) fn engine_order_status(status: order::OrderStatus) -> OrderStatus {
    match status {
        order::OrderStatus::Draft => OrderStatus::Draft,
        order::OrderStatus::Confirmed => OrderStatus::Confirmed,
        order::OrderStatus::Processing => OrderStatus::Processing,
        order::OrderStatus::Shipped => OrderStatus::Shipped,
        order::OrderStatus::Delivered => OrderStatus::Delivered,
        order::OrderStatus::Cancelled => OrderStatus::Cancelled,
    }
}

pub(crate) fn payment_status(status: PaymentStatus) -> order::PaymentStatus {
    match status {
        PaymentStatus::Pending => order::PaymentStatus::Pending,
        PaymentStatus::Partial => order::PaymentStatus::Partial,
        PaymentStatus::Paid => order::PaymentStatus::Paid,
        PaymentStatus::Refunded => order::PaymentStatus::Refunded,
    }
}

pub(crate) fn engine_payment_status(status: order::PaymentStatus) -> PaymentStatus {
    match status {
        order::PaymentStatus::Pending => PaymentStatus::Pending,
        order::PaymentStatus::Partial => PaymentStatus::Partial,
        order::PaymentStatus::Paid => PaymentStatus::Paid,
        order::PaymentStatus::Refunded => PaymentStatus::Refunded,
    }
}

pub(crate) fn order_lines(lines: Vec<order::OrderLineNew>) -> Vec<OrderLine> {
    lines
        .into_iter()
        .map(|line| OrderLine {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price_minor.map(Money::new),
        })
        .collect()
}

pub(crate) fn order_item(item: OrderItem) -> order::OrderItemView {
    order::OrderItemView {
        id: item.id,
        product_id: item.product_id,
        quantity: item.quantity,
        unit_price_minor: item.unit_price.minor(),
        tax_rate_bp: item.tax_rate.basis_points(),
        line_total_minor: item.line_total.minor(),
        line_tax_minor: item.line_tax.minor(),
    }
}

pub(crate) fn tax_rate(bp: i32) -> Result<TaxRate, ServerError> {
    Ok(TaxRate::from_basis_points(bp)?)
}

pub(crate) fn product(product: Product) -> product::ProductView {
    product::ProductView {
        low_stock: product.is_low_stock(),
        id: product.id,
        sku: product.sku,
        name: product.name,
        category: product.category,
        unit_price_minor: product.unit_price.minor(),
        unit_cost_minor: product.unit_cost.minor(),
        tax_rate_bp: product.tax_rate.basis_points(),
        stock_quantity: product.stock_quantity,
        reorder_level: product.reorder_level,
        active: product.active,
        created_at: product.created_at,
        updated_at: product.updated_at,
    }
}

pub(crate) fn customer_type(value: CustomerType) -> customer::CustomerType {
    match value {
        CustomerType::Corporate => customer::CustomerType::Corporate,
        CustomerType::Individual => customer::CustomerType::Individual,
        CustomerType::Government => customer::CustomerType::Government,
        CustomerType::Other => customer::CustomerType::Other,
    }
}

pub(crate) fn engine_customer_type(value: customer::CustomerType) -> CustomerType {
    match value {
        customer::CustomerType::Corporate => CustomerType::Corporate,
        customer::CustomerType::Individual => CustomerType::Individual,
        customer::CustomerType::Government => CustomerType::Government,
        customer::CustomerType::Other => CustomerType::Other,
    }
}

pub(crate) fn segment(value: CustomerSegment) -> customer::CustomerSegment {
    match value {
        CustomerSegment::Vip => customer::CustomerSegment::Vip,
        CustomerSegment::Premium => customer::CustomerSegment::Premium,
        CustomerSegment::Standard => customer::CustomerSegment::Standard,
        CustomerSegment::Basic => customer::CustomerSegment::Basic,
        CustomerSegment::Potential => customer::CustomerSegment::Potential,
    }
}

pub(crate) fn engine_segment(value: customer::CustomerSegment) -> CustomerSegment {
    match value {
        customer::CustomerSegment::Vip => CustomerSegment::Vip,
        customer::CustomerSegment::Premium => CustomerSegment::Premium,
        customer::CustomerSegment::Standard => CustomerSegment::Standard,
        customer::CustomerSegment::Basic => CustomerSegment::Basic,
        customer::CustomerSegment::Potential => CustomerSegment::Potential,
    }
}

pub(crate) fn customer(customer: Customer) -> customer::CustomerView {
    customer::CustomerView {
        id: customer.id,
        name: customer.name,
        email: customer.email,
        phone: customer.phone,
        address: customer.address,
        customer_type: customer_type(customer.customer_type),
        segment: segment(customer.segment),
        credit_limit_minor: customer.credit_limit.minor(),
        active: customer.active,
        created_at: customer.created_at,
        updated_at: customer.updated_at,
    }
}

pub(crate) fn role(role: MembershipRole) -> membership::MembershipRole {
    match role {
        MembershipRole::Owner => membership::MembershipRole::Owner,
        MembershipRole::Admin => membership::MembershipRole::Admin,
        MembershipRole::Manager => membership::MembershipRole::Manager,
        MembershipRole::Member => membership::MembershipRole::Member,
    }
}

pub(crate) fn engine_role(role: membership::MembershipRole) -> MembershipRole {
    match role {
        membership::MembershipRole::Owner => MembershipRole::Owner,
        membership::MembershipRole::Admin => MembershipRole::Admin,
        membership::MembershipRole::Manager => MembershipRole::Manager,
        membership::MembershipRole::Member => MembershipRole::Member,
    }
}

pub(crate) fn member(membership: Membership) -> membership::MemberView {
    membership::MemberView {
        user_id: membership.user_id,
        role: role(membership.role),
        created_at: membership.created_at,
    }
}
