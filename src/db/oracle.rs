//! Oracle source over ODPI-C
//!
//! The driver is blocking, so every operation runs on the blocking pool with
//! its own short-lived connection. Workers hold a permit for their whole
//! lifetime, which bounds open sessions even when a caller times out.

use super::queries::SqlBuilder;
use super::{non_negative, run_blocking_bounded, TableSource};
use crate::connection::{ConnectionParams, DatabaseType};
use crate::error::QueryError;
use crate::reconcile::RowCounter;
use async_trait::async_trait;
use ::oracle::Connection;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

pub struct OracleSource {
    params: ConnectionParams,
    workers: Arc<Semaphore>,
}

impl OracleSource {
    pub fn new(params: ConnectionParams, max_workers: usize) -> Self {
        Self {
            params,
            workers: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }

    /// EZConnect string, `//host:port/service`
    fn connect_string(&self) -> String {
        format!("//{}:{}/{}", self.params.host, self.params.port, self.params.database)
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T, QueryError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, QueryError> + Send + 'static,
    {
        let user = self.params.user.clone();
        let password = self.params.password.clone();
        let connect_string = self.connect_string();
        let target = self.params.to_display_string();

        run_blocking_bounded(Arc::clone(&self.workers), move || {
            let conn = Connection::connect(&user, password.expose(), &connect_string)
                .map_err(|e| QueryError::Connect(format!("{}: {}", target, e)))?;
            debug!(db = %target, "Oracle connection established");

            let result = op(&conn);
            if let Err(e) = conn.close() {
                debug!(error = %e, "Oracle connection close failed");
            }
            result
        })
        .await
    }
}

#[async_trait]
impl RowCounter for OracleSource {
    async fn count_rows(&self, table: &str) -> Result<u64, QueryError> {
        let sql = SqlBuilder::count_rows(DatabaseType::Oracle, table);
        let count = self
            .with_connection(move |conn| Ok(conn.query_row_as::<i64>(&sql, &[])?))
            .await?;
        non_negative(count)
    }
}

#[async_trait]
impl TableSource for OracleSource {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Oracle
    }

    async fn list_base_tables(&self) -> Result<Vec<String>, QueryError> {
        self.with_connection(|conn| {
            let rows = conn.query_as::<String>(SqlBuilder::list_tables(DatabaseType::Oracle), &[])?;
            let names = rows
                .map(|row| row.map_err(QueryError::from))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })
        .await
    }
}
