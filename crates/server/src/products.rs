//! Catalog endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Money, NewProductCmd, OrgContext, Pagination, ProductListFilter, ProductUpdate};

use api_types::{
    common::Page,
    product::{ProductListQuery, ProductNew, ProductUpdate as ProductPatch, ProductView, StockAdjust, StockLevel},
};

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Page<ProductView>>, ServerError> {
    let filter = ProductListFilter {
        search: query.search,
        category: query.category,
        low_stock_only: query.low_stock.unwrap_or(false),
        include_inactive: query.include_inactive.unwrap_or(false),
    };
    let page = state
        .engine
        .list_products(
            &ctx,
            &filter,
            Pagination {
                page: query.page,
                limit: query.limit,
            },
        )
        .await?;

    Ok(Json(views::page(page, views::product)))
}

pub async fn low_stock(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ProductView>>, ServerError> {
    let products = state.engine.low_stock_products(&ctx).await?;
    Ok(Json(products.into_iter().map(views::product).collect()))
}

pub async fn create(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Json(payload): Json<ProductNew>,
) -> Result<(StatusCode, Json<ProductView>), ServerError> {
    let mut cmd = NewProductCmd::new(payload.sku, payload.name, Money::new(payload.unit_price_minor));
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    if let Some(cost) = payload.unit_cost_minor {
        cmd = cmd.unit_cost(Money::new(cost));
    }
    if let Some(bp) = payload.tax_rate_bp {
        cmd = cmd.tax_rate(views::tax_rate(bp)?);
    }
    if let Some(stock) = payload.stock_quantity {
        cmd = cmd.stock_quantity(stock);
    }
    if let Some(level) = payload.reorder_level {
        cmd = cmd.reorder_level(level);
    }

    let product = state.engine.create_product(&ctx, cmd).await?;
    Ok((StatusCode::CREATED, Json(views::product(product))))
}

pub async fn get(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(product_id): Path<i64>,
) -> Result<Json<ProductView>, ServerError> {
    let product = state.engine.get_product(&ctx, product_id).await?;
    Ok(Json(views::product(product)))
}

pub async fn update(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<ProductPatch>,
) -> Result<Json<ProductView>, ServerError> {
    let update = ProductUpdate {
        name: payload.name,
        category: payload.category.map(Some),
        unit_price: payload.unit_price_minor.map(Money::new),
        unit_cost: payload.unit_cost_minor.map(Money::new),
        tax_rate: payload.tax_rate_bp.map(views::tax_rate).transpose()?,
        reorder_level: payload.reorder_level,
    };
    let product = state.engine.update_product(&ctx, product_id, update).await?;
    Ok(Json(views::product(product)))
}

pub async fn deactivate(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(product_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.deactivate_product(&ctx, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn adjust_stock(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<StockAdjust>,
) -> Result<Json<StockLevel>, ServerError> {
    let stock_quantity = state
        .engine
        .adjust_stock(&ctx, product_id, payload.delta)
        .await?;
    Ok(Json(StockLevel {
        product_id,
        stock_quantity,
    }))
}
