use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use api_types::common::ErrorBody;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod customers;
mod members;
mod orders;
mod products;
mod server;
mod statistics;
mod views;

pub mod types {
    pub mod common {
        pub use api_types::common::{ErrorBody, Page};
    }

    pub mod order {
        pub use api_types::order::{
            OrderItemView, OrderListQuery, OrderNew, OrderQuoteRequest, OrderQuoteView,
            OrderStatus, OrderSummaryView, OrderView, PaymentStatus, PaymentStatusUpdate,
            StatusUpdate,
        };
    }

    pub mod product {
        pub use api_types::product::{
            ProductListQuery, ProductNew, ProductUpdate, ProductView, StockAdjust, StockLevel,
        };
    }

    pub mod customer {
        pub use api_types::customer::{CustomerListQuery, CustomerNew, CustomerUpdate, CustomerView};
    }

    pub mod membership {
        pub use api_types::membership::{MemberNew, MemberView, MembersResponse, RoleUpdate};
    }

    pub mod stats {
        pub use api_types::stats::{SalesStatistics, StatsQuery, TopProductsResponse};
    }
}

pub enum ServerError {
    Engine(EngineError),
    /// Missing or malformed `x-user-id`.
    Unauthorized,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::OrgContextMissing
        | EngineError::InvalidOrgId(_)
        | EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EngineError::OrgAccessDenied(_) => StatusCode::FORBIDDEN,
        EngineError::ProductNotFound(_)
        | EngineError::CustomerNotFound(_)
        | EngineError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::OrderNotDeletable(_) => StatusCode::CONFLICT,
        EngineError::InvalidQuantity(_)
        | EngineError::InvalidPrice(_)
        | EngineError::InsufficientStock(_)
        | EngineError::InvalidStatusTransition(_)
        | EngineError::InvalidPaymentTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::ConcurrencyConflict(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Persistence(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::ConcurrencyConflict(detail) => {
            tracing::warn!("conflict survived retries: {detail}");
            "concurrent update, retry the request".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, error) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                err.kind(),
                message_for_engine_error(err),
            ),
            ServerError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "authentication required".to_string(),
            ),
        };

        let body = ErrorBody {
            error,
            kind: kind.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: EngineError) -> StatusCode {
        ServerError::from(err).into_response().status()
    }

    #[test]
    fn tenant_errors() {
        assert_eq!(
            status_of(EngineError::OrgContextMissing),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(EngineError::InvalidOrgId("abc".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(EngineError::OrgAccessDenied("x".to_string())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            status_of(EngineError::OrderNotFound("1".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(EngineError::ProductNotFound("1".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(
            status_of(EngineError::ExistingKey("SKU-1".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::OrderNotDeletable("confirmed".to_string())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn domain_validation_maps_to_422() {
        assert_eq!(
            status_of(EngineError::InsufficientStock("SKU-1".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(EngineError::InvalidStatusTransition("x".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn transient_errors() {
        assert_eq!(
            status_of(EngineError::ConcurrencyConflict("x".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(EngineError::Timeout("create_order".to_string())),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn persistence_maps_to_500() {
        let err = EngineError::Persistence(sea_orm::DbErr::Custom("boom".to_string()));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::Unauthorized.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
