mod common;

use std::time::Duration;

use common::{engine_with_db, engine_with_file_db, org_with_owner, product, stock_of};
use engine::{
    CustomerListFilter, DateRange, Engine, EngineConfig, MembershipRole, Money, NewProductCmd,
    Pagination, ProductListFilter, ProductUpdate,
};

#[tokio::test]
async fn adjust_stock_never_goes_negative() {
    let (engine, _db) = engine_with_db().await;
    let ctx = org_with_owner(&engine, "Acme", 1).await;
    let widget = product(&engine, &ctx, "W", 100, 0, 5).await;

    assert_eq!(engine.adjust_stock(&ctx, widget.id, 10).await.unwrap(), 15);
    assert_eq!(engine.adjust_stock(&ctx, widget.id, -15).await.unwrap(), 0);
    let err = engine.adjust_stock(&ctx, widget.id, -1).await.unwrap_err();
    assert_eq!(err.kind(), "INSUFFICIENT_STOCK");
    assert_eq!(engine.adjust_stock(&ctx, widget.id, 0).await.unwrap(), 0);
    assert_eq!(stock_of(&engine, &ctx, widget.id).await, 0);
}

#[tokio::test]
async fn adjust_stock_is_tenant_and_role_scoped() {
    let (engine, _db) = engine_with_db().await;
    let ctx_a = org_with_owner(&engine, "A", 1).await;
    let ctx_b = org_with_owner(&engine, "B", 2).await;
    let widget = product(&engine, &ctx_a, "W", 100, 0, 5).await;

    let err = engine.adjust_stock(&ctx_b, widget.id, 3).await.unwrap_err();
    assert_eq!(err.kind(), "PRODUCT_NOT_FOUND");

    engine
        .add_member(&ctx_a, 3, MembershipRole::Member)
        .await
        .unwrap();
    let member = engine.authorize_id(3, ctx_a.organization_id()).await.unwrap();
    let err = engine.adjust_stock(&member, widget.id, 3).await.unwrap_err();
    assert_eq!(err.kind(), "ORG_ACCESS_DENIED");

    assert_eq!(stock_of(&engine, &ctx_a, widget.id).await, 5);
}

#[tokio::test]
async fn low_stock_is_derived_on_read() {
    let (engine, _db) = engine_with_db().await;
    let ctx = org_with_owner(&engine, "Acme", 1).await;
    let low = engine
        .create_product(
            &ctx,
            NewProductCmd::new("LOW", "Low", Money::new(100))
                .stock_quantity(3)
                .reorder_level(5),
        )
        .await
        .unwrap();
    let edge = engine
        .create_product(
            &ctx,
            NewProductCmd::new("EDGE", "Edge", Money::new(100))
                .stock_quantity(5)
                .reorder_level(5),
        )
        .await
        .unwrap();
    let fine = engine
        .create_product(
            &ctx,
            NewProductCmd::new("FINE", "Fine", Money::new(100))
                .stock_quantity(50)
                .reorder_level(5),
        )
        .await
        .unwrap();
    assert!(low.is_low_stock());
    assert!(!fine.is_low_stock());

    let ids: Vec<i64> = engine
        .low_stock_products(&ctx)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![low.id, edge.id]);

    engine.adjust_stock(&ctx, fine.id, -46).await.unwrap();
    let filter = ProductListFilter {
        low_stock_only: true,
        ..ProductListFilter::default()
    };
    let page = engine
        .list_products(&ctx, &filter, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);

    engine.deactivate_product(&ctx, low.id).await.unwrap();
    let ids: Vec<i64> = engine
        .low_stock_products(&ctx)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![fine.id, edge.id]);
}

#[tokio::test]
async fn concurrent_adjustments_serialize() {
    let (engine, path) = engine_with_file_db().await;
    let ctx = org_with_owner(&engine, "Acme", 1).await;
    let widget = product(&engine, &ctx, "W", 100, 0, 4).await;

    let take = || engine.adjust_stock(&ctx, widget.id, -3);
    let (a, b) = tokio::join!(take(), take());
    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(stock_of(&engine, &ctx, widget.id).await, 1);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn concurrent_catalog_writes_all_land() {
    let (engine, path) = engine_with_file_db().await;
    let ctx = org_with_owner(&engine, "Acme", 1).await;
    let widget = product(&engine, &ctx, "W", 100, 0, 50).await;

    let rename = |name: &'static str| {
        engine.update_product(
            &ctx,
            widget.id,
            ProductUpdate {
                name: Some(name.to_string()),
                ..ProductUpdate::default()
            },
        )
    };
    let receive = || engine.adjust_stock(&ctx, widget.id, 5);
    let (a, b, c, d, e) = tokio::join!(rename("A"), rename("B"), receive(), receive(), rename("C"));
    assert!(a.is_ok() && b.is_ok() && e.is_ok());
    assert!(c.is_ok() && d.is_ok());

    let stored = engine.get_product(&ctx, widget.id).await.unwrap();
    assert_eq!(stored.stock_quantity, 60);
    assert!(["A", "B", "C"].contains(&stored.name.as_str()));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn catalog_and_reports_run_under_the_operation_timeout() {
    let (engine, db) = engine_with_db().await;
    let ctx = org_with_owner(&engine, "Acme", 1).await;
    let widget = product(&engine, &ctx, "W", 100, 0, 4).await;

    let hurried = Engine::builder()
        .database(db)
        .config(EngineConfig {
            operation_timeout: Duration::ZERO,
            ..EngineConfig::default()
        })
        .build()
        .await
        .unwrap();

    let update = ProductUpdate {
        reorder_level: Some(3),
        ..ProductUpdate::default()
    };
    let errors = [
        hurried
            .update_product(&ctx, widget.id, update)
            .await
            .unwrap_err(),
        hurried
            .list_products(&ctx, &ProductListFilter::default(), Pagination::default())
            .await
            .unwrap_err(),
        hurried
            .list_customers(&ctx, &CustomerListFilter::default(), Pagination::default())
            .await
            .unwrap_err(),
        hurried
            .sales_statistics(&ctx, DateRange::default())
            .await
            .unwrap_err(),
    ];
    for err in errors {
        assert_eq!(err.kind(), "TIMEOUT");
    }
}
