use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, SqlErr,
    prelude::*,
    sea_query::{Expr, SimpleExpr},
};

use crate::{
    EngineError, NewProductCmd, Product, ProductUpdate, ResultEngine, products,
    util::{
        normalize_optional_text, normalize_required_text, require_non_negative_money,
        require_non_negative_quantity,
    },
};

use super::{Engine, OrgContext, Page, Pagination, with_tx};

/// Filters for [`Engine::list_products`].
#[derive(Clone, Debug, Default)]
pub struct ProductListFilter {
    /// Case-insensitive match on SKU or name.
    pub search: Option<String>,
    pub category: Option<String>,
    pub low_stock_only: bool,
    pub include_inactive: bool,
}

fn low_stock_condition() -> SimpleExpr {
    Expr::col(products::Column::StockQuantity).lte(Expr::col(products::Column::ReorderLevel))
}

impl Engine {
    async fn find_product<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
        product_id: i64,
    ) -> ResultEngine<products::Model> {
        products::Entity::find_by_id(product_id)
            .filter(products::Column::OrganizationId.eq(ctx.organization_id()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::ProductNotFound(product_id.to_string()))
    }

    pub async fn create_product(&self, ctx: &OrgContext, cmd: NewProductCmd) -> ResultEngine<Product> {
        let sku = normalize_required_text(&cmd.sku, "sku")?;
        let name = normalize_required_text(&cmd.name, "product name")?;
        require_non_negative_money(cmd.unit_price, "unit price")?;
        require_non_negative_money(cmd.unit_cost, "unit cost")?;
        require_non_negative_quantity(cmd.stock_quantity, "stock quantity")?;
        require_non_negative_quantity(cmd.reorder_level, "reorder level")?;

        let (sku, name, cmd) = (&sku, &name, &cmd);
        let product = self
            .run_guarded("create_product", move || async move {
                with_tx!(self, |db_tx| {
                    let ctx = self.require_catalog_manager(&db_tx, ctx).await?;

                    let duplicate = products::Entity::find()
                        .filter(products::Column::OrganizationId.eq(ctx.organization_id()))
                        .filter(products::Column::Sku.eq(sku.as_str()))
                        .one(&db_tx)
                        .await?;
                    if duplicate.is_some() {
                        return Err(EngineError::ExistingKey(sku.clone()));
                    }

                    let now = Utc::now();
                    let active = products::ActiveModel {
                        id: ActiveValue::NotSet,
                        organization_id: ActiveValue::Set(ctx.organization_id()),
                        sku: ActiveValue::Set(sku.clone()),
                        name: ActiveValue::Set(name.clone()),
                        category: ActiveValue::Set(normalize_optional_text(
                            cmd.category.as_deref(),
                        )),
                        unit_price_minor: ActiveValue::Set(cmd.unit_price.minor()),
                        unit_cost_minor: ActiveValue::Set(cmd.unit_cost.minor()),
                        tax_rate_bp: ActiveValue::Set(cmd.tax_rate.basis_points()),
                        stock_quantity: ActiveValue::Set(cmd.stock_quantity),
                        reorder_level: ActiveValue::Set(cmd.reorder_level),
                        active: ActiveValue::Set(true),
                        created_at: ActiveValue::Set(now),
                        updated_at: ActiveValue::Set(now),
                    };
                    let model = active.insert(&db_tx).await.map_err(|err| {
                        match err.sql_err() {
                            Some(SqlErr::UniqueConstraintViolation(_)) => {
                                EngineError::ExistingKey(sku.clone())
                            }
                            _ => EngineError::from(err),
                        }
                    })?;
                    Product::try_from(model)
                })
            })
            .await?;

        tracing::info!(
            organization_id = ctx.organization_id(),
            product_id = product.id,
            sku = %product.sku,
            "product created"
        );
        Ok(product)
    }

    /// Partial update. Historical order items keep their price snapshot.
    pub async fn update_product(
        &self,
        ctx: &OrgContext,
        product_id: i64,
        update: ProductUpdate,
    ) -> ResultEngine<Product> {
        let update = &update;
        self.run_guarded("update_product", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_catalog_manager(&db_tx, ctx).await?;
                let model = self.find_product(&db_tx, &ctx, product_id).await?;

                let mut active: products::ActiveModel = model.into();
                if let Some(name) = update.name.as_deref() {
                    active.name = ActiveValue::Set(normalize_required_text(name, "product name")?);
                }
                if let Some(category) = update.category.as_ref() {
                    active.category = ActiveValue::Set(normalize_optional_text(category.as_deref()));
                }
                if let Some(price) = update.unit_price {
                    require_non_negative_money(price, "unit price")?;
                    active.unit_price_minor = ActiveValue::Set(price.minor());
                }
                if let Some(cost) = update.unit_cost {
                    require_non_negative_money(cost, "unit cost")?;
                    active.unit_cost_minor = ActiveValue::Set(cost.minor());
                }
                if let Some(rate) = update.tax_rate {
                    active.tax_rate_bp = ActiveValue::Set(rate.basis_points());
                }
                if let Some(level) = update.reorder_level {
                    require_non_negative_quantity(level, "reorder level")?;
                    active.reorder_level = ActiveValue::Set(level);
                }
                active.updated_at = ActiveValue::Set(Utc::now());

                let model = active.update(&db_tx).await?;
                Product::try_from(model)
            })
        })
        .await
    }

    /// Soft delete. The row stays so order items keep resolving.
    pub async fn deactivate_product(&self, ctx: &OrgContext, product_id: i64) -> ResultEngine<()> {
        self.run_guarded("deactivate_product", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_catalog_manager(&db_tx, ctx).await?;
                let model = self.find_product(&db_tx, &ctx, product_id).await?;
                let mut active: products::ActiveModel = model.into();
                active.active = ActiveValue::Set(false);
                active.updated_at = ActiveValue::Set(Utc::now());
                active.update(&db_tx).await?;
                tracing::info!(
                    organization_id = ctx.organization_id(),
                    product_id,
                    "product deactivated"
                );
                Ok(())
            })
        })
        .await
    }

    pub async fn get_product(&self, ctx: &OrgContext, product_id: i64) -> ResultEngine<Product> {
        self.run_guarded("get_product", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                let model = self.find_product(&db_tx, &ctx, product_id).await?;
                Product::try_from(model)
            })
        })
        .await
    }

    pub async fn list_products(
        &self,
        ctx: &OrgContext,
        filter: &ProductListFilter,
        pagination: Pagination,
    ) -> ResultEngine<Page<Product>> {
        let (page, limit) = self.resolve_pagination(pagination)?;

        self.run_guarded("list_products", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                let mut query = products::Entity::find()
                    .filter(products::Column::OrganizationId.eq(ctx.organization_id()));
                if !filter.include_inactive {
                    query = query.filter(products::Column::Active.eq(true));
                }
                if let Some(category) = normalize_optional_text(filter.category.as_deref()) {
                    query = query.filter(products::Column::Category.eq(category));
                }
                if let Some(term) = normalize_optional_text(filter.search.as_deref()) {
                    query = query.filter(
                        Condition::any()
                            .add(products::Column::Sku.contains(&term))
                            .add(products::Column::Name.contains(&term)),
                    );
                }
                if filter.low_stock_only {
                    query = query.filter(low_stock_condition());
                }

                let paginator = query
                    .order_by_asc(products::Column::Name)
                    .order_by_asc(products::Column::Id)
                    .paginate(&db_tx, limit);
                let total = paginator.num_items().await?;
                let items = paginator
                    .fetch_page(page - 1)
                    .await?
                    .into_iter()
                    .map(Product::try_from)
                    .collect::<ResultEngine<Vec<_>>>()?;

                Ok(Page {
                    items,
                    page,
                    limit,
                    total,
                })
            })
        })
        .await
    }

    /// Active products at or below their reorder level, lowest stock first.
    pub async fn low_stock_products(&self, ctx: &OrgContext) -> ResultEngine<Vec<Product>> {
        self.run_guarded("low_stock_products", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                products::Entity::find()
                    .filter(products::Column::OrganizationId.eq(ctx.organization_id()))
                    .filter(products::Column::Active.eq(true))
                    .filter(low_stock_condition())
                    .order_by_asc(products::Column::StockQuantity)
                    .order_by_asc(products::Column::Id)
                    .all(&db_tx)
                    .await?
                    .into_iter()
                    .map(Product::try_from)
                    .collect::<ResultEngine<Vec<_>>>()
            })
        })
        .await
    }
}
