use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
    typed_header::TypedHeaderRejection,
};

use std::sync::Arc;

use crate::{ServerError, customers, members, orders, products, statistics};
use engine::Engine;

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");
static ORGANIZATION_ID_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-organization-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// `TypedHeader` for the authenticated principal.
///
/// The upstream auth layer sets "x-user-id" after verifying the caller.
#[derive(Debug)]
struct UserIdHeader(i64);

impl Header for UserIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = value.trim().parse::<i64>() else {
            return Err(AxumError::invalid());
        };
        if value <= 0 {
            return Err(AxumError::invalid());
        }

        Ok(UserIdHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(axum::http::HeaderValue::from(self.0)));
    }
}

/// Resolves the tenant context of the request.
///
/// The organization header is passed raw: telling "missing" from "malformed"
/// is the engine's job.
async fn auth(
    user_header: Result<TypedHeader<UserIdHeader>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Ok(TypedHeader(UserIdHeader(user_id))) = user_header else {
        return Err(ServerError::Unauthorized);
    };

    let claimed_org = match request.headers().get(&ORGANIZATION_ID_HEADER) {
        Some(value) => Some(value.to_str().map_err(|_| {
            ServerError::Engine(engine::EngineError::InvalidOrgId(
                "non-ascii header value".to_string(),
            ))
        })?),
        None => None,
    };

    let ctx = state.engine.authorize(user_id, claimed_org).await?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/quote", post(orders::quote))
        .route("/orders/{id}", get(orders::get).delete(orders::delete))
        .route("/orders/{id}/status", patch(orders::update_status))
        .route(
            "/orders/{id}/payment-status",
            patch(orders::update_payment_status),
        )
        .route("/products", get(products::list).post(products::create))
        .route("/products/low-stock", get(products::low_stock))
        .route(
            "/products/{id}",
            get(products::get)
                .patch(products::update)
                .delete(products::deactivate),
        )
        .route("/products/{id}/stock", post(products::adjust_stock))
        .route("/customers", get(customers::list).post(customers::create))
        .route(
            "/customers/{id}",
            get(customers::get)
                .patch(customers::update)
                .delete(customers::deactivate),
        )
        .route("/members", get(members::list).post(members::add))
        .route(
            "/members/{user_id}",
            patch(members::change_role).delete(members::remove),
        )
        .route("/stats/sales", get(statistics::sales))
        .route("/stats/top-products", get(statistics::top_products))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
