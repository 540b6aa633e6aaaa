//! SQL Server source over TDS (tiberius)

use super::queries::SqlBuilder;
use super::{non_negative, TableSource};
use crate::connection::{ConnectionParams, DatabaseType};
use crate::error::QueryError;
use crate::reconcile::RowCounter;
use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

type TdsClient = Client<Compat<TcpStream>>;

/// Opens a fresh TDS connection per operation
pub struct SqlServerSource {
    params: ConnectionParams,
}

impl SqlServerSource {
    pub fn new(params: ConnectionParams) -> Self {
        Self { params }
    }

    fn config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.params.host);
        config.port(self.params.port);
        config.database(&self.params.database);
        config.authentication(AuthMethod::sql_server(
            &self.params.user,
            self.params.password.expose(),
        ));
        if self.params.flag("trust_server_certificate") {
            config.trust_cert();
        }
        config
    }

    async fn connect(&self) -> Result<TdsClient, QueryError> {
        let config = self.config();
        let target = self.params.to_display_string();

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| QueryError::Connect(format!("{}: {}", target, e)))?;
        tcp.set_nodelay(true)
            .map_err(|e| QueryError::Connect(format!("{}: {}", target, e)))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| QueryError::Connect(format!("{}: {}", target, e)))?;

        debug!(db = %target, "SQL Server connection established");
        Ok(client)
    }
}

#[async_trait]
impl RowCounter for SqlServerSource {
    async fn count_rows(&self, table: &str) -> Result<u64, QueryError> {
        let mut client = self.connect().await?;
        let sql = SqlBuilder::count_rows(DatabaseType::SqlServer, table);

        let row = client
            .simple_query(sql)
            .await?
            .into_row()
            .await?
            .ok_or_else(|| QueryError::UnexpectedResult("COUNT returned no row".to_string()))?;

        let count = row
            .try_get::<i64, _>(0)?
            .ok_or_else(|| QueryError::UnexpectedResult("COUNT returned NULL".to_string()))?;
        non_negative(count)
    }
}

#[async_trait]
impl TableSource for SqlServerSource {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::SqlServer
    }

    async fn list_base_tables(&self) -> Result<Vec<String>, QueryError> {
        let mut client = self.connect().await?;

        let rows = client
            .simple_query(SqlBuilder::list_tables(DatabaseType::SqlServer))
            .await?
            .into_first_result()
            .await?;

        rows.iter()
            .map(|row| {
                row.try_get::<&str, _>(0)?
                    .map(str::to_owned)
                    .ok_or_else(|| QueryError::UnexpectedResult("NULL table name".to_string()))
            })
            .collect()
    }
}
