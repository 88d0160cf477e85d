#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Customer, Engine, EngineConfig, Money, NewCustomerCmd, NewProductCmd, OrgContext, Product,
    RetryPolicy, TaxRate,
};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

static FILE_DB_SEQ: AtomicU32 = AtomicU32::new(0);

/// File backed database, so concurrent transactions really contend.
pub async fn engine_with_file_db() -> (Engine, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!(
        "engine_{}_{}_{}.db",
        std::process::id(),
        Utc::now().timestamp_micros(),
        FILE_DB_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let config = EngineConfig {
        retry: RetryPolicy {
            max_retries: 10,
            ..RetryPolicy::default()
        },
        ..EngineConfig::default()
    };
    let engine = Engine::builder()
        .database(db)
        .config(config)
        .build()
        .await
        .unwrap();
    (engine, path)
}

/// New organization owned by `owner`, plus the owner's context.
pub async fn org_with_owner(engine: &Engine, name: &str, owner: i64) -> OrgContext {
    let org = engine.create_organization(name, owner).await.unwrap();
    engine.authorize_id(owner, org.id).await.unwrap()
}

pub async fn product(
    engine: &Engine,
    ctx: &OrgContext,
    sku: &str,
    price_minor: i64,
    tax_bp: i32,
    stock: i64,
) -> Product {
    engine
        .create_product(
            ctx,
            NewProductCmd::new(sku, format!("Product {sku}"), Money::new(price_minor))
                .tax_rate(TaxRate::from_basis_points(tax_bp).unwrap())
                .stock_quantity(stock),
        )
        .await
        .unwrap()
}

pub async fn customer(engine: &Engine, ctx: &OrgContext, name: &str) -> Customer {
    engine
        .create_customer(ctx, NewCustomerCmd::new(name))
        .await
        .unwrap()
}

pub async fn stock_of(engine: &Engine, ctx: &OrgContext, product_id: i64) -> i64 {
    engine
        .get_product(ctx, product_id)
        .await
        .unwrap()
        .stock_quantity
}
