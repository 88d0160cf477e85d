use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, Money, NewProductCmd};
use migration::MigratorTrait;
use server::{ServerState, router};

struct TestApp {
    router: Router,
    engine: Arc<Engine>,
    org_id: i64,
}

async fn app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());
    let org = engine.create_organization("Acme", 1).await.unwrap();

    TestApp {
        router: router(ServerState {
            engine: engine.clone(),
        }),
        engine,
        org_id: org.id,
    }
}

fn request(method: &str, uri: &str, user: Option<&str>, org: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    if let Some(org) = org {
        builder = builder.header("x-organization-id", org);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn missing_principal_is_unauthorized() {
    let app = app().await;
    let org = app.org_id.to_string();

    let (status, body) = send(&app, request("GET", "/orders", None, Some(&org), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "UNAUTHORIZED");

    let (status, _) = send(&app, request("GET", "/orders", Some("abc"), Some(&org), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tenant_header_errors() {
    let app = app().await;

    let (status, body) = send(&app, request("GET", "/orders", Some("1"), None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ORG_CONTEXT_MISSING");

    let (status, body) = send(&app, request("GET", "/orders", Some("1"), Some("acme"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_ORG_ID");

    let org = app.org_id.to_string();
    let (status, body) = send(&app, request("GET", "/orders", Some("2"), Some(&org), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "ORG_ACCESS_DENIED");
}

#[tokio::test]
async fn order_lifecycle_over_http() {
    let app = app().await;
    let org = app.org_id.to_string();
    let ctx = app.engine.authorize_id(1, app.org_id).await.unwrap();
    let widget = app
        .engine
        .create_product(
            &ctx,
            NewProductCmd::new("W-1", "Widget", Money::new(1000)).stock_quantity(5),
        )
        .await
        .unwrap();

    let (status, customer) = send(
        &app,
        request("POST", "/customers", Some("1"), Some(&org), Some(json!({"name": "Buyer"}))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let new_order = json!({
        "customer_id": customer["id"],
        "items": [{"product_id": widget.id, "quantity": 2}],
        "order_date": "2025-03-01T10:00:00Z"
    });
    let (status, order) = send(
        &app,
        request("POST", "/orders", Some("1"), Some(&org), Some(new_order)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["order_number"], "ORD2025000001");
    assert_eq!(order["status"], "draft");
    assert_eq!(order["grand_total_minor"], 2000);

    let order_uri = format!("/orders/{}", order["id"]);
    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("{order_uri}/status"),
            Some("1"),
            Some(&org),
            Some(json!({"status": "delivered"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "INVALID_STATUS_TRANSITION");

    let (status, product) = send(
        &app,
        request("GET", &format!("/products/{}", widget.id), Some("1"), Some(&org), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["stock_quantity"], 3);

    let (status, _) = send(&app, request("DELETE", &order_uri, Some("1"), Some(&org), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, request("GET", &order_uri, Some("1"), Some(&org), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "ORDER_NOT_FOUND");
    assert_eq!(
        app.engine.get_product(&ctx, widget.id).await.unwrap().stock_quantity,
        5
    );
}

#[tokio::test]
async fn insufficient_stock_is_reported() {
    let app = app().await;
    let org = app.org_id.to_string();
    let ctx = app.engine.authorize_id(1, app.org_id).await.unwrap();
    let widget = app
        .engine
        .create_product(
            &ctx,
            NewProductCmd::new("W-1", "Widget", Money::new(1000)).stock_quantity(1),
        )
        .await
        .unwrap();

    let (_, customer) = send(
        &app,
        request("POST", "/customers", Some("1"), Some(&org), Some(json!({"name": "Buyer"}))),
    )
    .await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/orders",
            Some("1"),
            Some(&org),
            Some(json!({
                "customer_id": customer["id"],
                "items": [{"product_id": widget.id, "quantity": 2}]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "INSUFFICIENT_STOCK");

    let (status, page) = send(&app, request("GET", "/orders", Some("1"), Some(&org), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn members_endpoint() {
    let app = app().await;
    let org = app.org_id.to_string();

    let (status, member) = send(
        &app,
        request(
            "POST",
            "/members",
            Some("1"),
            Some(&org),
            Some(json!({"user_id": 2, "role": "manager"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["role"], "manager");

    let (status, body) = send(&app, request("GET", "/members", Some("2"), Some(&org), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, request("DELETE", "/members/1", Some("1"), Some(&org), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_INPUT");
}

#[tokio::test]
async fn list_paging_defaults_and_bounds() {
    let app = app().await;
    let org = app.org_id.to_string();

    let (status, body) = send(&app, request("GET", "/products", Some("1"), Some(&org), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 50);

    let (status, body) = send(
        &app,
        request("GET", "/customers?page=2&limit=5", Some("1"), Some(&org), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 5);

    let uri = format!("/orders?page={}", u64::MAX);
    let (status, body) = send(&app, request("GET", &uri, Some("1"), Some(&org), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_INPUT");
}
