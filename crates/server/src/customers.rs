use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CustomerListFilter, CustomerUpdate, Money, NewCustomerCmd, OrgContext, Pagination};

use api_types::{
    common::Page,
    customer::{CustomerListQuery, CustomerNew, CustomerUpdate as CustomerPatch, CustomerView},
};

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<Page<CustomerView>>, ServerError> {
    let filter = CustomerListFilter {
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
    };
    let page = state
        .engine
        .list_customers(
            &ctx,
            &filter,
            Pagination {
                page: query.page,
                limit: query.limit,
            },
        )
        .await?;

    Ok(Json(views::page(page, views::customer)))
}

pub async fn create(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Json(payload): Json<CustomerNew>,
) -> Result<(StatusCode, Json<CustomerView>), ServerError> {
    let mut cmd = NewCustomerCmd::new(payload.name);
    cmd.email = payload.email;
    cmd.phone = payload.phone;
    cmd.address = payload.address;
    if let Some(customer_type) = payload.customer_type {
        cmd = cmd.customer_type(views::engine_customer_type(customer_type));
    }
    if let Some(segment) = payload.segment {
        cmd = cmd.segment(views::engine_segment(segment));
    }
    if let Some(limit) = payload.credit_limit_minor {
        cmd = cmd.credit_limit(Money::new(limit));
    }

    let customer = state.engine.create_customer(&ctx, cmd).await?;
    Ok((StatusCode::CREATED, Json(views::customer(customer))))
}

pub async fn get(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<CustomerView>, ServerError> {
    let customer = state.engine.get_customer(&ctx, customer_id).await?;
    Ok(Json(views::customer(customer)))
}

pub async fn update(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(customer_id): Path<i64>,
    Json(payload): Json<CustomerPatch>,
) -> Result<Json<CustomerView>, ServerError> {
    // Blank contact fields are normalized to `None` by the engine.
    let update = CustomerUpdate {
        name: payload.name,
        email: payload.email.map(Some),
        phone: payload.phone.map(Some),
        address: payload.address.map(Some),
        customer_type: payload.customer_type.map(views::engine_customer_type),
        segment: payload.segment.map(views::engine_segment),
        credit_limit: payload.credit_limit_minor.map(Money::new),
    };
    let customer = state
        .engine
        .update_customer(&ctx, customer_id, update)
        .await?;
    Ok(Json(views::customer(customer)))
}

pub async fn deactivate(
    Extension(ctx): Extension<OrgContext>,
    State(state): State<ServerState>,
    Path(customer_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.deactivate_customer(&ctx, customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
