//! PostgreSQL source over a small deadpool pool

use super::queries::SqlBuilder;
use super::{non_negative, TableSource};
use crate::connection::{ConnectionParams, DatabaseType};
use crate::error::QueryError;
use crate::reconcile::RowCounter;
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::debug;

pub struct PostgresSource {
    pool: Pool,
}

impl PostgresSource {
    /// Create the pool. No connection is made until the first query.
    pub fn new(params: &ConnectionParams, max_size: usize) -> Result<Self, QueryError> {
        let mut cfg = Config::new();
        cfg.host = Some(params.host.clone());
        cfg.port = Some(params.port);
        cfg.user = Some(params.user.clone());
        cfg.password = Some(params.password.expose().to_string());
        cfg.dbname = Some(params.database.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(max_size.max(1)));

        let use_tls = params.flag("sslmode");

        let pool = if use_tls {
            let certs = rustls_native_certs::load_native_certs();
            let mut root_store = rustls::RootCertStore::empty();
            for cert in certs.certs {
                root_store.add(cert).ok();
            }

            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth();

            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
            cfg.create_pool(Some(Runtime::Tokio1), tls)
        } else {
            cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        }
        .map_err(|e| QueryError::Connect(format!("Failed to create pool: {}", e)))?;

        debug!(db = %params.to_display_string(), tls = use_tls, "PostgreSQL pool created");
        Ok(Self { pool })
    }
}

#[async_trait]
impl RowCounter for PostgresSource {
    async fn count_rows(&self, table: &str) -> Result<u64, QueryError> {
        let client = self.pool.get().await?;
        let sql = SqlBuilder::count_rows(DatabaseType::Postgres, table);
        let row = client.query_one(sql.as_str(), &[]).await?;
        non_negative(row.try_get::<_, i64>(0)?)
    }
}

#[async_trait]
impl TableSource for PostgresSource {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    async fn list_base_tables(&self) -> Result<Vec<String>, QueryError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(SqlBuilder::list_tables(DatabaseType::Postgres), &[])
            .await?;

        rows.iter()
            .map(|row| row.try_get::<_, String>("table_name").map_err(QueryError::from))
            .collect()
    }
}
