//! The module contains the errors the engine can throw.
//!
//! Every variant maps to a stable error kind (see [`EngineError::kind`]) so
//! callers can react to the category without parsing messages:
//!
//! - tenant boundary: [`OrgContextMissing`], [`InvalidOrgId`], [`OrgAccessDenied`]
//! - domain validation: [`ProductNotFound`], [`InvalidQuantity`], [`InsufficientStock`]
//! - state machine: [`InvalidStatusTransition`], [`InvalidPaymentTransition`],
//!   [`OrderNotDeletable`]
//! - transient: [`ConcurrencyConflict`] (the only retryable kind)
//! - storage: [`Persistence`]
//!
//!  [`OrgContextMissing`]: EngineError::OrgContextMissing
//!  [`InvalidOrgId`]: EngineError::InvalidOrgId
//!  [`OrgAccessDenied`]: EngineError::OrgAccessDenied
//!  [`ProductNotFound`]: EngineError::ProductNotFound
//!  [`InvalidQuantity`]: EngineError::InvalidQuantity
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`InvalidStatusTransition`]: EngineError::InvalidStatusTransition
//!  [`InvalidPaymentTransition`]: EngineError::InvalidPaymentTransition
//!  [`OrderNotDeletable`]: EngineError::OrderNotDeletable
//!  [`ConcurrencyConflict`]: EngineError::ConcurrencyConflict
//!  [`Persistence`]: EngineError::Persistence
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("organization context is required")]
    OrgContextMissing,
    #[error("Invalid organization id: {0}")]
    InvalidOrgId(String),
    #[error("Organization access denied: {0}")]
    OrgAccessDenied(String),
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),
    #[error("Order not found: {0}")]
    OrderNotFound(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
    #[error("Invalid status transition: {0}")]
    InvalidStatusTransition(String),
    #[error("Invalid payment transition: {0}")]
    InvalidPaymentTransition(String),
    #[error("Order not deletable: {0}")]
    OrderNotDeletable(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),
    #[error("Operation timed out: {0}")]
    Timeout(String),
    #[error("persistence error")]
    Persistence(#[source] DbErr),
}

impl EngineError {
    /// Stable, machine readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrgContextMissing => "ORG_CONTEXT_MISSING",
            Self::InvalidOrgId(_) => "INVALID_ORG_ID",
            Self::OrgAccessDenied(_) => "ORG_ACCESS_DENIED",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::InvalidPrice(_) => "INVALID_PRICE",
            Self::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            Self::InvalidStatusTransition(_) => "INVALID_STATUS_TRANSITION",
            Self::InvalidPaymentTransition(_) => "INVALID_PAYMENT_TRANSITION",
            Self::OrderNotDeletable(_) => "ORDER_NOT_DELETABLE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ExistingKey(_) => "ALREADY_EXISTS",
            Self::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            Self::Timeout(_) => "TIMEOUT",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Only conflicts detected by the atomic stock/counter updates are
    /// transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

/// SQLite reports write contention as `SQLITE_BUSY`/`SQLITE_LOCKED`.
fn is_lock_contention(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("database is locked")
        || msg.contains("database table is locked")
        || msg.contains("SQLITE_BUSY")
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if is_lock_contention(&err) {
            return Self::ConcurrencyConflict(err.to_string());
        }
        Self::Persistence(err)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::OrgContextMissing, Self::OrgContextMissing) => true,
            (Self::InvalidOrgId(a), Self::InvalidOrgId(b)) => a == b,
            (Self::OrgAccessDenied(a), Self::OrgAccessDenied(b)) => a == b,
            (Self::ProductNotFound(a), Self::ProductNotFound(b)) => a == b,
            (Self::CustomerNotFound(a), Self::CustomerNotFound(b)) => a == b,
            (Self::OrderNotFound(a), Self::OrderNotFound(b)) => a == b,
            (Self::InvalidQuantity(a), Self::InvalidQuantity(b)) => a == b,
            (Self::InvalidPrice(a), Self::InvalidPrice(b)) => a == b,
            (Self::InsufficientStock(a), Self::InsufficientStock(b)) => a == b,
            (Self::InvalidStatusTransition(a), Self::InvalidStatusTransition(b)) => a == b,
            (Self::InvalidPaymentTransition(a), Self::InvalidPaymentTransition(b)) => a == b,
            (Self::OrderNotDeletable(a), Self::OrderNotDeletable(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::ConcurrencyConflict(a), Self::ConcurrencyConflict(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::Persistence(a), Self::Persistence(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(EngineError::ConcurrencyConflict("x".to_string()).is_retryable());
        assert!(!EngineError::InsufficientStock("x".to_string()).is_retryable());
        assert!(!EngineError::Persistence(DbErr::Custom("x".to_string())).is_retryable());
    }

    #[test]
    fn locked_database_becomes_conflict() {
        let err = EngineError::from(DbErr::Custom("database is locked".to_string()));
        assert_eq!(err.kind(), "CONCURRENCY_CONFLICT");

        let err = EngineError::from(DbErr::Custom("no such table: orders".to_string()));
        assert_eq!(err.kind(), "PERSISTENCE_ERROR");
    }

    #[test]
    fn persistence_message_hides_detail() {
        let err = EngineError::from(DbErr::Custom("secret sql detail".to_string()));
        assert_eq!(err.to_string(), "persistence error");
    }
}
