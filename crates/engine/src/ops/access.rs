//! Org access guard.
//!
//! [`Engine::authorize`] turns `(user id, claimed organization id)` into an
//! [`OrgContext`]. Every tenant-scoped operation takes the context and
//! re-validates it inside its own transaction, so a membership revoked
//! between two calls is honored by the second one. The context authorizes
//! the tenant only: queries still filter every row by `organization_id`.

use sea_orm::{ConnectionTrait, prelude::*};

use crate::{EngineError, MembershipRole, ResultEngine, memberships, organizations};

use super::Engine;

/// Validated tenant scope of a request.
///
/// Only the guard can build one, so holding an `OrgContext` proves the
/// membership was active when it was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrgContext {
    organization_id: i64,
    user_id: i64,
    role: MembershipRole,
}

impl OrgContext {
    pub fn organization_id(&self) -> i64 {
        self.organization_id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn role(&self) -> MembershipRole {
        self.role
    }
}

/// Parses a claimed organization id. It must be a positive base-10 integer.
pub(crate) fn parse_org_id(raw: Option<&str>) -> ResultEngine<i64> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Err(EngineError::OrgContextMissing),
        Some(raw) => raw,
    };
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidOrgId(raw.to_string()));
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(EngineError::InvalidOrgId(raw.to_string())),
    }
}

fn denied(organization_id: i64, user_id: i64) -> EngineError {
    EngineError::OrgAccessDenied(format!(
        "user {user_id} has no access to organization {organization_id}"
    ))
}

impl Engine {
    /// Resolves the tenant context for a request.
    ///
    /// `claimed_org` is the raw organization id as received from the caller.
    pub async fn authorize(&self, user_id: i64, claimed_org: Option<&str>) -> ResultEngine<OrgContext> {
        let organization_id = parse_org_id(claimed_org)?;
        self.authorize_id(user_id, organization_id).await
    }

    /// Same as [`Engine::authorize`] with an already parsed id.
    pub async fn authorize_id(&self, user_id: i64, organization_id: i64) -> ResultEngine<OrgContext> {
        if organization_id <= 0 {
            return Err(EngineError::InvalidOrgId(organization_id.to_string()));
        }
        let ctx = self
            .resolve_context(&self.database, user_id, organization_id)
            .await
            .inspect_err(|err| {
                if matches!(err, EngineError::OrgAccessDenied(_)) {
                    tracing::warn!(user_id, organization_id, "organization access denied");
                }
            })?;
        tracing::debug!(user_id, organization_id, role = ctx.role.as_str(), "authorized");
        Ok(ctx)
    }

    async fn resolve_context<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        organization_id: i64,
    ) -> ResultEngine<OrgContext> {
        let organization = organizations::Entity::find_by_id(organization_id)
            .one(db)
            .await?;
        if !organization.is_some_and(|org| org.active) {
            return Err(denied(organization_id, user_id));
        }

        let membership = memberships::Entity::find_by_id((organization_id, user_id))
            .filter(memberships::Column::Active.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| denied(organization_id, user_id))?;
        let role = MembershipRole::try_from(membership.role.as_str())
            .map_err(|_| denied(organization_id, user_id))?;

        Ok(OrgContext {
            organization_id,
            user_id,
            role,
        })
    }

    /// Re-validates `ctx` on `db`, returning the current role.
    pub(super) async fn require_context<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
    ) -> ResultEngine<OrgContext> {
        self.resolve_context(db, ctx.user_id, ctx.organization_id)
            .await
    }

    pub(super) async fn require_member_manager<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
    ) -> ResultEngine<OrgContext> {
        let current = self.require_context(db, ctx).await?;
        if !current.role.can_manage_members() {
            return Err(EngineError::OrgAccessDenied(format!(
                "role {} cannot manage members",
                current.role.as_str()
            )));
        }
        Ok(current)
    }

    pub(super) async fn require_catalog_manager<C: ConnectionTrait>(
        &self,
        db: &C,
        ctx: &OrgContext,
    ) -> ResultEngine<OrgContext> {
        let current = self.require_context(db, ctx).await?;
        if !current.role.can_manage_catalog() {
            return Err(EngineError::OrgAccessDenied(format!(
                "role {} cannot manage the catalog",
                current.role.as_str()
            )));
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_org_id() {
        assert_eq!(parse_org_id(None), Err(EngineError::OrgContextMissing));
        assert_eq!(parse_org_id(Some("  ")), Err(EngineError::OrgContextMissing));
    }

    #[test]
    fn malformed_org_id() {
        for raw in ["0", "-4", "+4", "abc", "1.5", "99999999999999999999"] {
            assert_eq!(
                parse_org_id(Some(raw)).unwrap_err().kind(),
                "INVALID_ORG_ID",
                "{raw}"
            );
        }
    }

    #[test]
    fn well_formed_org_id() {
        assert_eq!(parse_org_id(Some("42")), Ok(42));
        assert_eq!(parse_org_id(Some(" 7 ")), Ok(7));
    }
}
