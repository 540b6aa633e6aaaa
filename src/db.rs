//! Database access
//!
//! Each engine exposes the same two capabilities: list the base tables
//! visible to the configured login, and count the rows of one table.

pub mod oracle;
pub mod postgres;
pub mod queries;
pub mod sqlserver;

use crate::connection::{ConnectionParams, DatabaseType};
use crate::error::QueryError;
use crate::reconcile::RowCounter;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

pub use self::oracle::OracleSource;
pub use self::postgres::PostgresSource;
pub use self::sqlserver::SqlServerSource;

/// Catalog source for one engine. Row counting comes from [`RowCounter`].
#[async_trait]
pub trait TableSource: RowCounter {
    fn db_type(&self) -> DatabaseType;

    /// Names of user base tables; order is not guaranteed
    async fn list_base_tables(&self) -> Result<Vec<String>, QueryError>;
}

/// Build the source matching the descriptor's engine.
///
/// `max_connections` caps the pool size for PostgreSQL and the number of
/// blocking Oracle workers; SQL Server opens a connection per operation.
pub fn open_source(
    params: ConnectionParams,
    max_connections: usize,
) -> Result<Arc<dyn TableSource>, QueryError> {
    debug!(db = %params.to_display_string(), "Opening table source");

    let source: Arc<dyn TableSource> = match params.db_type {
        DatabaseType::SqlServer => Arc::new(SqlServerSource::new(params)),
        DatabaseType::Oracle => Arc::new(OracleSource::new(params, max_connections)),
        DatabaseType::Postgres => Arc::new(PostgresSource::new(&params, max_connections)?),
    };
    Ok(source)
}

/// Convert a driver's signed count into a row count
pub(crate) fn non_negative(count: i64) -> Result<u64, QueryError> {
    u64::try_from(count)
        .map_err(|_| QueryError::UnexpectedResult(format!("negative row count {}", count)))
}

/// Run blocking driver work on the blocking pool while holding a permit.
///
/// The permit moves into the worker, so it is released only when the work
/// really ends, even if the awaiting future was dropped by a timeout.
pub(crate) async fn run_blocking_bounded<T, F>(permits: Arc<Semaphore>, work: F) -> Result<T, QueryError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, QueryError> + Send + 'static,
{
    let permit = permits
        .acquire_owned()
        .await
        .map_err(|_| QueryError::Query("blocking worker queue closed".to_string()))?;

    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        work()
    })
    .await
    .map_err(|e| QueryError::Query(format!("blocking worker failed: {}", e)))?
}
