//! Order endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CreateOrderCmd, DateRange, Order, OrderListFilter, OrderSummary, OrgContext, Pagination};

use api_types::{
    common::Page,
    order::{
        OrderListQuery, OrderNew, OrderQuoteRequest, OrderQuoteView, OrderSummaryView, OrderView,
        PaymentStatusUpdate, PriceSource, PricedLineView, StatusUpdate,
    },
};

use crate::{ServerError, server::ServerState, views};

fn order_view(order: Order) -> OrderView {
    OrderView {
        id: order.id,
        order_number: order.order_number,
        customer_id: order.customer_id,
        status: views::order_status(order.status),
        payment_status: views::payment_status(order.payment_status),
        subtotal_minor: order.subtotal.minor(),
        tax_total_minor: order.tax_total.minor(),
        grand_total_minor: order.grand_total.minor(),
        notes: order.notes,
        order_date: order.order_date,
        created_by: order.created_by,
        created_at: order.created_at,
        updated_at: order.updated_at,
        items: order.items.into_iter().map(views::order_item).collect(),
    }
}

fn summary_view(summary: OrderSummary) -> OrderSummaryView {
    OrderSummaryView {
        id: summary.id,
        order_number: summary.order_number,
        customer_id: summary.customer_id,
        customer_name: summary.customer_name,
        status: views::order_status(summary.status),
        payment_status: views::payment_status(summary.payment_status),
        grand_total_minor: summary.grand_total.minor(),
        order_date: summary.order_date,
    }
}

pub async fn list(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Page<OrderSummaryView>>, ServerError> {
    let filter = OrderListFilter {
        status: query.status.map(views::engine_order_status),
        payment_status: query.payment_status.map(views::engine_payment_status),
        date: DateRange::new(query.from, query.to),
        customer_id: query.customer_id,
        search: query.search,
    };
    let page = state
        .engine
        .list_orders(
            &ctx,
            &filter,
            Pagination {
                page: query.page,
                limit: query.limit,
            },
        )
        .await?;

    Ok(Json(views::page(page, summary_view)))
}

pub async fn create(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Json(payload): Json<OrderNew>,
) -> Result<(StatusCode, Json<OrderView>), ServerError> {
    let mut cmd =
        CreateOrderCmd::new(payload.customer_id).lines(views::order_lines(payload.items));
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }
    if let Some(order_date) = payload.order_date {
        cmd = cmd.order_date(order_date);
    }

    let order = state.engine.create_order(&ctx, cmd).await?;
    Ok((StatusCode::CREATED, Json(order_view(order))))
}

pub async fn quote(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Json(payload): Json<OrderQuoteRequest>,
) -> Result<Json<OrderQuoteView>, ServerError> {
    let lines = views::order_lines(payload.items);
    let quote = state.engine.quote_order(&ctx, &lines).await?;

    let items = quote
        .lines
        .into_iter()
        .map(|line| PricedLineView {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_minor: line.unit_price.minor(),
            tax_rate_bp: line.tax_rate.basis_points(),
            line_total_minor: line.line_total.minor(),
            line_tax_minor: line.line_tax.minor(),
            price_source: match line.price_source {
                engine::PriceSource::Catalog => PriceSource::Catalog,
                engine::PriceSource::Manual => PriceSource::Manual,
            },
        })
        .collect();

    Ok(Json(OrderQuoteView {
        items,
        subtotal_minor: quote.totals.subtotal.minor(),
        tax_total_minor: quote.totals.tax_total.minor(),
        grand_total_minor: quote.totals.grand_total.minor(),
    }))
}

pub async fn get(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderView>, ServerError> {
    let order = state.engine.get_order(&ctx, order_id).await?;
    Ok(Json(order_view(order)))
}

pub async fn update_status(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<OrderView>, ServerError> {
    let order = state
        .engine
        .update_order_status(&ctx, order_id, views::engine_order_status(payload.status))
        .await?;
    Ok(Json(order_view(order)))
}

pub async fn update_payment_status(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> Result<Json<OrderView>, ServerError> {
    let order = state
        .engine
        .update_payment_status(
            &ctx,
            order_id,
            views::engine_payment_status(payload.payment_status),
        )
        .await?;
    Ok(Json(order_view(order)))
}

pub async fn delete(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_order(&ctx, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
