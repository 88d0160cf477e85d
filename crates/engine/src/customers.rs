//! Customers of an organization.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    Corporate,
    #[default]
    Individual,
    Government,
    Other,
}

impl CustomerType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Corporate => "corporate",
            Self::Individual => "individual",
            Self::Government => "government",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for CustomerType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "corporate" => Ok(Self::Corporate),
            "individual" => Ok(Self::Individual),
            "government" => Ok(Self::Government),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidInput(format!(
                "invalid customer type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    Vip,
    Premium,
    #[default]
    Standard,
    Basic,
    Potential,
}

impl CustomerSegment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vip => "vip",
            Self::Premium => "premium",
            Self::Standard => "standard",
            Self::Basic => "basic",
            Self::Potential => "potential",
        }
    }
}

impl TryFrom<&str> for CustomerSegment {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "vip" => Ok(Self::Vip),
            "premium" => Ok(Self::Premium),
            "standard" => Ok(Self::Standard),
            "basic" => Ok(Self::Basic),
            "potential" => Ok(Self::Potential),
            other => Err(EngineError::InvalidInput(format!(
                "invalid customer segment: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub customer_type: CustomerType,
    pub segment: CustomerSegment,
    pub credit_limit: Money,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub customer_type: String,
    pub segment: String,
    pub credit_limit_minor: i64,
    pub active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Organizations,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Customer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            organization_id: model.organization_id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            customer_type: CustomerType::try_from(model.customer_type.as_str())?,
            segment: CustomerSegment::try_from(model.segment.as_str())?,
            credit_limit: Money::new(model.credit_limit_minor),
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
