use std::time::Duration;

use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::{EngineError, ResultEngine};

mod access;
mod customers;
mod inventory;
mod numbering;
mod orders;
mod organizations;
mod pricing;
mod products;
mod retry;
mod stats;

pub use access::OrgContext;
pub use customers::CustomerListFilter;
pub use numbering::format_order_number;
pub use orders::{DateRange, OrderListFilter};
pub use products::ProductListFilter;
pub use retry::RetryPolicy;
pub use stats::{SalesStatistics, StatusCount, TopProduct};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = ::sea_orm::TransactionTrait::begin(&$self.database).await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Tunables of the engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Backoff for transparently retried `ConcurrencyConflict`s.
    pub retry: RetryPolicy,
    /// Upper bound for a single attempt of an operation.
    pub operation_timeout: Duration,
    pub default_page_limit: u64,
    pub max_page_limit: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            operation_timeout: Duration::from_secs(10),
            default_page_limit: 50,
            max_page_limit: 200,
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    config: EngineConfig,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a 1-based page and a limit, applying the configured defaults.
    fn resolve_pagination(&self, pagination: Pagination) -> ResultEngine<(u64, u64)> {
        let page = pagination.page.unwrap_or(1);
        if page == 0 {
            return Err(EngineError::InvalidInput("page starts at 1".to_string()));
        }
        let limit = pagination.limit.unwrap_or(self.config.default_page_limit);
        if limit == 0 {
            return Err(EngineError::InvalidInput("limit must be > 0".to_string()));
        }
        let limit = limit.min(self.config.max_page_limit);
        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| i64::try_from(*offset).is_ok());
        if offset.is_none() {
            return Err(EngineError::InvalidInput(format!(
                "page {page} is out of range"
            )));
        }
        Ok((page, limit))
    }
}

/// Page request. `page` is 1-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pagination {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.config.max_page_limit == 0 || self.config.default_page_limit == 0 {
            return Err(EngineError::InvalidInput(
                "page limits must be > 0".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            config: self.config,
        })
    }
}
