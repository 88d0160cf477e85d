use axum::{
    Extension, Json,
    extract::{Query, State},
};
use engine::{DateRange, OrgContext};

use api_types::stats::{
    SalesStatistics, StatsQuery, StatusCountView, TopProductView, TopProductsResponse,
};

use crate::{ServerError, server::ServerState, views};

const DEFAULT_TOP_PRODUCTS: u64 = 10;

pub async fn sales(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<SalesStatistics>, ServerError> {
    let stats = state
        .engine
        .sales_statistics(&ctx, DateRange::new(query.from, query.to))
        .await?;

    Ok(Json(SalesStatistics {
        order_count: stats.order_count,
        cancelled_count: stats.cancelled_count,
        revenue_minor: stats.revenue.minor(),
        subtotal_minor: stats.subtotal.minor(),
        tax_total_minor: stats.tax_total.minor(),
        average_order_value_minor: stats.average_order_value.minor(),
        by_status: stats
            .by_status
            .into_iter()
            .map(|entry| StatusCountView {
                status: views::order_status(entry.status),
                count: entry.count,
            })
            .collect(),
    }))
}

pub async fn top_products(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<TopProductsResponse>, ServerError> {
    let products = state
        .engine
        .top_products(
            &ctx,
            DateRange::new(query.from, query.to),
            query.limit.unwrap_or(DEFAULT_TOP_PRODUCTS),
        )
        .await?
        .into_iter()
        .map(|product| TopProductView {
            product_id: product.product_id,
            sku: product.sku,
            name: product.name,
            quantity: product.quantity,
            revenue_minor: product.revenue.minor(),
        })
        .collect();

    Ok(Json(TopProductsResponse { products }))
}
