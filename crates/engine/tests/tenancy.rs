mod common;

use common::{customer, engine_with_db, org_with_owner, product};
use engine::{
    CreateOrderCmd, CustomerListFilter, EngineError, MembershipRole, Money, NewProductCmd,
    OrderLine, OrderListFilter, Pagination, ProductListFilter,
};

#[tokio::test]
async fn guard_rejects_missing_and_malformed_ids() {
    let (engine, _db) = engine_with_db().await;
    org_with_owner(&engine, "Acme", 1).await;

    assert_eq!(
        engine.authorize(1, None).await.unwrap_err(),
        EngineError::OrgContextMissing
    );
    for raw in ["abc", "0", "-1", "1e3"] {
        assert_eq!(
            engine.authorize(1, Some(raw)).await.unwrap_err().kind(),
            "INVALID_ORG_ID"
        );
    }
    let ctx = engine.authorize(1, Some("1")).await.unwrap();
    assert_eq!(ctx.organization_id(), 1);
    assert_eq!(ctx.role(), MembershipRole::Owner);
}

#[tokio::test]
async fn guard_denies_non_members_and_inactive_tenants() {
    let (engine, _db) = engine_with_db().await;
    let ctx = org_with_owner(&engine, "Acme", 1).await;
    let org = ctx.organization_id().to_string();

    let err = engine.authorize(2, Some(&org)).await.unwrap_err();
    assert_eq!(err.kind(), "ORG_ACCESS_DENIED");
    let err = engine.authorize(1, Some("999")).await.unwrap_err();
    assert_eq!(err.kind(), "ORG_ACCESS_DENIED");

    engine
        .set_organization_active(ctx.organization_id(), false)
        .await
        .unwrap();
    let err = engine.authorize(1, Some(&org)).await.unwrap_err();
    assert_eq!(err.kind(), "ORG_ACCESS_DENIED");
    // A context issued earlier is re-checked by every operation.
    let err = engine.get_organization(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), "ORG_ACCESS_DENIED");

    engine
        .set_organization_active(ctx.organization_id(), true)
        .await
        .unwrap();
    assert!(engine.get_organization(&ctx).await.is_ok());
}

#[tokio::test]
async fn removed_member_loses_access() {
    let (engine, _db) = engine_with_db().await;
    let owner = org_with_owner(&engine, "Acme", 1).await;
    engine
        .add_member(&owner, 2, MembershipRole::Member)
        .await
        .unwrap();
    let member = engine.authorize_id(2, owner.organization_id()).await.unwrap();
    assert!(engine.list_members(&member).await.is_ok());

    engine.deactivate_member(&owner, 2).await.unwrap();
    let err = engine.list_members(&member).await.unwrap_err();
    assert_eq!(err.kind(), "ORG_ACCESS_DENIED");

    let again = engine
        .add_member(&owner, 2, MembershipRole::Manager)
        .await
        .unwrap();
    assert!(again.active);
    assert_eq!(again.role, MembershipRole::Manager);
}

#[tokio::test]
async fn roles_gate_members_and_catalog() {
    let (engine, _db) = engine_with_db().await;
    let owner = org_with_owner(&engine, "Acme", 1).await;
    let org_id = owner.organization_id();
    engine
        .add_member(&owner, 2, MembershipRole::Member)
        .await
        .unwrap();
    engine
        .add_member(&owner, 3, MembershipRole::Manager)
        .await
        .unwrap();
    let member = engine.authorize_id(2, org_id).await.unwrap();
    let manager = engine.authorize_id(3, org_id).await.unwrap();

    let err = engine
        .create_product(&member, NewProductCmd::new("X", "X", Money::new(1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ORG_ACCESS_DENIED");
    assert!(
        engine
            .create_product(&manager, NewProductCmd::new("X", "X", Money::new(1)))
            .await
            .is_ok()
    );

    let err = engine
        .add_member(&manager, 4, MembershipRole::Member)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ORG_ACCESS_DENIED");

    // Plain members still run the order desk.
    let buyer = customer(&engine, &member, "Buyer").await;
    let err = engine
        .add_member(&owner, 2, MembershipRole::Admin)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ALREADY_EXISTS");
    assert_eq!(buyer.organization_id, org_id);
}

#[tokio::test]
async fn last_owner_is_protected() {
    let (engine, _db) = engine_with_db().await;
    let owner = org_with_owner(&engine, "Acme", 1).await;

    let err = engine.deactivate_member(&owner, 1).await.unwrap_err();
    assert_eq!(err.kind(), "INVALID_INPUT");
    let err = engine
        .change_member_role(&owner, 1, MembershipRole::Admin)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "INVALID_INPUT");

    engine
        .add_member(&owner, 2, MembershipRole::Owner)
        .await
        .unwrap();
    engine
        .change_member_role(&owner, 1, MembershipRole::Admin)
        .await
        .unwrap();

    let members = engine.list_members(&owner).await.unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].user_id, 2);
    assert_eq!(members[0].role, MembershipRole::Owner);
}

#[tokio::test]
async fn tenants_never_see_each_other() {
    let (engine, _db) = engine_with_db().await;
    let ctx_a = org_with_owner(&engine, "A", 1).await;
    let ctx_b = org_with_owner(&engine, "B", 2).await;

    let product_a = product(&engine, &ctx_a, "SKU-1", 100, 0, 10).await;
    // Same SKU is fine in another tenant.
    product(&engine, &ctx_b, "SKU-1", 100, 0, 10).await;
    let customer_a = customer(&engine, &ctx_a, "Shared Name").await;
    customer(&engine, &ctx_b, "Shared Name").await;
    let order_a = engine
        .create_order(
            &ctx_a,
            CreateOrderCmd::new(customer_a.id).line(OrderLine::new(product_a.id, 1)),
        )
        .await
        .unwrap();

    assert_eq!(
        engine.get_order(&ctx_b, order_a.id).await.unwrap_err().kind(),
        "ORDER_NOT_FOUND"
    );
    assert_eq!(
        engine.get_product(&ctx_b, product_a.id).await.unwrap_err().kind(),
        "PRODUCT_NOT_FOUND"
    );
    assert_eq!(
        engine
            .get_customer(&ctx_b, customer_a.id)
            .await
            .unwrap_err()
            .kind(),
        "CUSTOMER_NOT_FOUND"
    );
    for err in [
        engine
            .update_order_status(&ctx_b, order_a.id, engine::OrderStatus::Cancelled)
            .await
            .unwrap_err(),
        engine.delete_order(&ctx_b, order_a.id).await.unwrap_err(),
    ] {
        assert_eq!(err.kind(), "ORDER_NOT_FOUND");
    }

    let orders_b = engine
        .list_orders(&ctx_b, &OrderListFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(orders_b.total, 0);
    let products_b = engine
        .list_products(&ctx_b, &ProductListFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert!(products_b.items.iter().all(|p| p.organization_id == ctx_b.organization_id()));
    let customers_b = engine
        .list_customers(&ctx_b, &CustomerListFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(customers_b.total, 1);
    assert!(customers_b.items.iter().all(|c| c.organization_id == ctx_b.organization_id()));

    let top_b = engine
        .top_products(&ctx_b, Default::default(), 10)
        .await
        .unwrap();
    assert!(top_b.is_empty());
}

#[tokio::test]
async fn duplicate_sku_in_same_tenant() {
    let (engine, _db) = engine_with_db().await;
    let ctx = org_with_owner(&engine, "Acme", 1).await;
    product(&engine, &ctx, "SKU-1", 100, 0, 10).await;
    let err = engine
        .create_product(&ctx, NewProductCmd::new(" SKU-1 ", "Again", Money::new(1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ALREADY_EXISTS");
}
