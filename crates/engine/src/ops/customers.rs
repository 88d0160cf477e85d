use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, prelude::*,
};

use crate::{
    Customer, CustomerUpdate, EngineError, NewCustomerCmd, ResultEngine, customers,
    util::{normalize_optional_text, normalize_required_text, require_non_negative_money},
};

use super::{Engine, OrgContext, Page, Pagination, with_tx};

/// Filters for [`Engine::list_customers`].
#[derive(Clone, Debug, Default)]
pub struct CustomerListFilter {
    /// Case-insensitive match on name, email or phone.
    pub search: Option<String>,
    pub include_inactive: bool,
}

impl Engine {
    async fn find_customer<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
        customer_id: i64,
    ) -> ResultEngine<customers::Model> {
        customers::Entity::find_by_id(customer_id)
            .filter(customers::Column::OrganizationId.eq(ctx.organization_id()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::CustomerNotFound(customer_id.to_string()))
    }

    /// Orders can only be placed for active customers of the same organization.
    pub(super) async fn require_active_customer<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
        customer_id: i64,
    ) -> ResultEngine<customers::Model> {
        let model = self.find_customer(db, ctx, customer_id).await?;
        if !model.active {
            return Err(EngineError::CustomerNotFound(format!(
                "{customer_id} is inactive"
            )));
        }
        Ok(model)
    }

    pub async fn create_customer(&self, ctx: &OrgContext, cmd: NewCustomerCmd) -> ResultEngine<Customer> {
        let name = normalize_required_text(&cmd.name, "customer name")?;
        require_non_negative_money(cmd.credit_limit, "credit limit")?;

        let (name, cmd) = (&name, &cmd);
        let customer = self
            .run_guarded("create_customer", move || async move {
                with_tx!(self, |db_tx| {
                    let ctx = self.require_context(&db_tx, ctx).await?;
                    let now = Utc::now();
                    let active = customers::ActiveModel {
                        id: ActiveValue::NotSet,
                        organization_id: ActiveValue::Set(ctx.organization_id()),
                        name: ActiveValue::Set(name.clone()),
                        email: ActiveValue::Set(normalize_optional_text(cmd.email.as_deref())),
                        phone: ActiveValue::Set(normalize_optional_text(cmd.phone.as_deref())),
                        address: ActiveValue::Set(normalize_optional_text(
                            cmd.address.as_deref(),
                        )),
                        customer_type: ActiveValue::Set(
                            cmd.customer_type.as_str().to_string(),
                        ),
                        segment: ActiveValue::Set(cmd.segment.as_str().to_string()),
                        credit_limit_minor: ActiveValue::Set(cmd.credit_limit.minor()),
                        active: ActiveValue::Set(true),
                        created_at: ActiveValue::Set(now),
                        updated_at: ActiveValue::Set(now),
                    };
                    let model = active.insert(&db_tx).await?;
                    Customer::try_from(model)
                })
            })
            .await?;

        tracing::info!(
            organization_id = ctx.organization_id(),
            customer_id = customer.id,
            "customer created"
        );
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        ctx: &OrgContext,
        customer_id: i64,
        update: CustomerUpdate,
    ) -> ResultEngine<Customer> {
        let update = &update;
        self.run_guarded("update_customer", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                let model = self.find_customer(&db_tx, &ctx, customer_id).await?;

                let mut active: customers::ActiveModel = model.into();
                if let Some(name) = update.name.as_deref() {
                    active.name = ActiveValue::Set(normalize_required_text(name, "customer name")?);
                }
                if let Some(email) = update.email.as_ref() {
                    active.email = ActiveValue::Set(normalize_optional_text(email.as_deref()));
                }
                if let Some(phone) = update.phone.as_ref() {
                    active.phone = ActiveValue::Set(normalize_optional_text(phone.as_deref()));
                }
                if let Some(address) = update.address.as_ref() {
                    active.address = ActiveValue::Set(normalize_optional_text(address.as_deref()));
                }
                if let Some(customer_type) = update.customer_type {
                    active.customer_type = ActiveValue::Set(customer_type.as_str().to_string());
                }
                if let Some(segment) = update.segment {
                    active.segment = ActiveValue::Set(segment.as_str().to_string());
                }
                if let Some(credit_limit) = update.credit_limit {
                    require_non_negative_money(credit_limit, "credit limit")?;
                    active.credit_limit_minor = ActiveValue::Set(credit_limit.minor());
                }
                active.updated_at = ActiveValue::Set(Utc::now());

                let model = active.update(&db_tx).await?;
                Customer::try_from(model)
            })
        })
        .await
    }

    /// Soft delete: existing orders keep pointing at the row.
    pub async fn deactivate_customer(&self, ctx: &OrgContext, customer_id: i64) -> ResultEngine<()> {
        self.run_guarded("deactivate_customer", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                let model = self.find_customer(&db_tx, &ctx, customer_id).await?;
                let mut active: customers::ActiveModel = model.into();
                active.active = ActiveValue::Set(false);
                active.updated_at = ActiveValue::Set(Utc::now());
                active.update(&db_tx).await?;
                tracing::info!(
                    organization_id = ctx.organization_id(),
                    customer_id,
                    "customer deactivated"
                );
                Ok(())
            })
        })
        .await
    }

    pub async fn get_customer(&self, ctx: &OrgContext, customer_id: i64) -> ResultEngine<Customer> {
        self.run_guarded("get_customer", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                let model = self.find_customer(&db_tx, &ctx, customer_id).await?;
                Customer::try_from(model)
            })
        })
        .await
    }

    pub async fn list_customers(
        &self,
        ctx: &OrgContext,
        filter: &CustomerListFilter,
        pagination: Pagination,
    ) -> ResultEngine<Page<Customer>> {
        let (page, limit) = self.resolve_pagination(pagination)?;

        self.run_guarded("list_customers", move || async move {
            with_tx!(self, |db_tx| {
                let ctx = self.require_context(&db_tx, ctx).await?;
                let mut query = customers::Entity::find()
                    .filter(customers::Column::OrganizationId.eq(ctx.organization_id()));
                if !filter.include_inactive {
                    query = query.filter(customers::Column::Active.eq(true));
                }
                if let Some(term) = normalize_optional_text(filter.search.as_deref()) {
                    query = query.filter(
                        Condition::any()
                            .add(customers::Column::Name.contains(&term))
                            .add(customers::Column::Email.contains(&term))
                            .add(customers::Column::Phone.contains(&term)),
                    );
                }

                let paginator = query
                    .order_by_asc(customers::Column::Name)
                    .order_by_asc(customers::Column::Id)
                    .paginate(&db_tx, limit);
                let total = paginator.num_items().await?;
                let items = paginator
                    .fetch_page(page - 1)
                    .await?
                    .into_iter()
                    .map(Customer::try_from)
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
}
