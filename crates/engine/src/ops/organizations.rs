use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, prelude::*,
};

use crate::{
    EngineError, Membership, MembershipRole, Organization, ResultEngine, memberships,
    organizations, util::normalize_required_text,
};

use super::{Engine, OrgContext, with_tx};

impl Engine {
    async fn count_active_owners<C: ConnectionTrait>(
        &self,
        db: &C,
        organization_id: i64,
    ) -> ResultEngine<u64> {
        memberships::Entity::find()
            .filter(memberships::Column::OrganizationId.eq(organization_id))
            .filter(memberships::Column::Role.eq(MembershipRole::Owner.as_str()))
            .filter(memberships::Column::Active.eq(true))
            .count(db)
            .await
            .map_err(Into::into)
    }

    async fn find_membership<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
        user_id: i64,
    ) -> ResultEngine<memberships::Model> {
        memberships::Entity::find_by_id((ctx.organization_id(), user_id))
            .filter(memberships::Column::Active.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::InvalidInput(format!("user {user_id} is not a member")))
    }

    /// Fails when `membership` is the last active owner.
    async fn require_other_owner<C: ConnectionTrait>(
        &self,
        db: &C,
        membership: &memberships::Model,
    ) -> ResultEngine<()> {
        if membership.role != MembershipRole::Owner.as_str() {
            return Ok(());
        }
        if self.count_active_owners(db, membership.organization_id).await? <= 1 {
            return Err(EngineError::InvalidInput(
                "an organization needs at least one active owner".to_string(),
            ));
        }
        Ok(())
    }

    /// Creates an organization with `owner_user_id` as its first owner.
    ///
    /// Bootstrap path: no context exists yet, the caller is trusted.
    pub async fn create_organization(
        &self,
        name: &str,
        owner_user_id: i64,
    ) -> ResultEngine<Organization> {
        let name = normalize_required_text(name, "organization name")?;

        let organization = with_tx!(self, |db_tx| {
            let now = Utc::now();
            let model = organizations::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                active: ActiveValue::Set(true),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            memberships::ActiveModel {
                organization_id: ActiveValue::Set(model.id),
                user_id: ActiveValue::Set(owner_user_id),
                role: ActiveValue::Set(MembershipRole::Owner.as_str().to_string()),
                active: ActiveValue::Set(true),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Ok::<_, EngineError>(Organization::from(model))
        })?;

        tracing::info!(
            organization_id = organization.id,
            owner_user_id,
            "organization created"
        );
        Ok(organization)
    }

    /// Operator switch. An inactive organization denies every context.
    pub async fn set_organization_active(
        &self,
        organization_id: i64,
        active: bool,
    ) -> ResultEngine<Organization> {
        let organization = with_tx!(self, |db_tx| {
            let model = organizations::Entity::find_by_id(organization_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::InvalidOrgId(format!("organization {organization_id} not found"))
                })?;
            let mut model: organizations::ActiveModel = model.into();
            model.active = ActiveValue::Set(active);
            let model = model.update(&db_tx).await?;
            Ok::<_, EngineError>(Organization::from(model))
        })?;

        tracing::info!(organization_id, active, "organization activity changed");
        Ok(organization)
    }

    pub async fn get_organization(&self, ctx: &OrgContext) -> ResultEngine<Organization> {
        with_tx!(self, |db_tx| {
            let ctx = self.require_context(&db_tx, ctx).await?;
            organizations::Entity::find_by_id(ctx.organization_id())
                .one(&db_tx)
                .await?
                .map(Organization::from)
                .ok_or_else(|| EngineError::InvalidOrgId(ctx.organization_id().to_string()))
        })
    }

    /// Adds `user_id` with `role`, reactivating a removed membership.
    pub async fn add_member(
        &self,
        ctx: &OrgContext,
        user_id: i64,
        role: MembershipRole,
    ) -> ResultEngine<Membership> {
        let membership = with_tx!(self, |db_tx| {
            let ctx = self.require_member_manager(&db_tx, ctx).await?;
            if role == MembershipRole::Owner && ctx.role() != MembershipRole::Owner {
                return Err(EngineError::OrgAccessDenied(
                    "only owners can grant ownership".to_string(),
                ));
            }

            let existing =
                memberships::Entity::find_by_id((ctx.organization_id(), user_id))
                    .one(&db_tx)
                    .await?;
            let model = match existing {
                Some(model) if model.active => {
                    return Err(EngineError::ExistingKey(format!(
                        "user {user_id} in organization {}",
                        ctx.organization_id()
                    )));
                }
                Some(model) => {
                    let mut model: memberships::ActiveModel = model.into();
                    model.role = ActiveValue::Set(role.as_str().to_string());
                    model.active = ActiveValue::Set(true);
                    model.update(&db_tx).await?
                }
                None => {
                    memberships::ActiveModel {
                        organization_id: ActiveValue::Set(ctx.organization_id()),
                        user_id: ActiveValue::Set(user_id),
                        role: ActiveValue::Set(role.as_str().to_string()),
                        active: ActiveValue::Set(true),
                        created_at: ActiveValue::Set(Utc::now()),
                    }
                    .insert(&db_tx)
                    .await?
                }
            };
            Membership::try_from(model)
        })?;

        tracing::info!(
            organization_id = membership.organization_id,
            user_id,
            role = role.as_str(),
            "member added"
        );
        Ok(membership)
    }

    pub async fn change_member_role(
        &self,
        ctx: &OrgContext,
        user_id: i64,
        role: MembershipRole,
    ) -> ResultEngine<Membership> {
        with_tx!(self, |db_tx| {
            let ctx = self.require_member_manager(&db_tx, ctx).await?;
            let model = self.find_membership(&db_tx, &ctx, user_id).await?;

            let touches_owner =
                role == MembershipRole::Owner || model.role == MembershipRole::Owner.as_str();
            if touches_owner && ctx.role() != MembershipRole::Owner {
                return Err(EngineError::OrgAccessDenied(
                    "only owners can change ownership".to_string(),
                ));
            }
            if role != MembershipRole::Owner {
                self.require_other_owner(&db_tx, &model).await?;
            }

            let mut model: memberships::ActiveModel = model.into();
            model.role = ActiveValue::Set(role.as_str().to_string());
            let model = model.update(&db_tx).await?;
            tracing::info!(
                organization_id = ctx.organization_id(),
                user_id,
                role = role.as_str(),
                "member role changed"
            );
            Membership::try_from(model)
        })
    }

    /// Soft removal. The last active owner cannot leave.
    pub async fn deactivate_member(&self, ctx: &OrgContext, user_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let ctx = self.require_member_manager(&db_tx, ctx).await?;
            let model = self.find_membership(&db_tx, &ctx, user_id).await?;
            if model.role == MembershipRole::Owner.as_str() && ctx.role() != MembershipRole::Owner {
                return Err(EngineError::OrgAccessDenied(
                    "only owners can remove owners".to_string(),
                ));
            }
            self.require_other_owner(&db_tx, &model).await?;

            let mut model: memberships::ActiveModel = model.into();
            model.active = ActiveValue::Set(false);
            model.update(&db_tx).await?;
            tracing::info!(
                organization_id = ctx.organization_id(),
                user_id,
                "member deactivated"
            );
            Ok(())
        })
    }

    /// Active members, owners first.
    pub async fn list_members(&self, ctx: &OrgContext) -> ResultEngine<Vec<Membership>> {
        with_tx!(self, |db_tx| {
            let ctx = self.require_context(&db_tx, ctx).await?;
            let mut members = memberships::Entity::find()
                .filter(memberships::Column::OrganizationId.eq(ctx.organization_id()))
                .filter(memberships::Column::Active.eq(true))
                .order_by_asc(memberships::Column::UserId)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Membership::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            members.sort_by_key(|m| m.role);
            Ok(members)
        })
    }
}
