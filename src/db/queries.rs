//! SQL query constants and builders
//!
//! Contains the catalog and row-count queries for each supported engine.

use crate::connection::DatabaseType;

/// User base tables in the login's default schema.
/// `sys.tables` already excludes views, synonyms and system objects.
pub const SQLSERVER_LIST_TABLES: &str = r#"
    SELECT t.name
    FROM sys.tables t
    WHERE t.schema_id = SCHEMA_ID()
        AND t.is_ms_shipped = 0
    ORDER BY t.name
"#;

/// Tables owned by the connected schema, minus recycle-bin, nested,
/// secondary (domain index) and IOT overflow segments.
pub const ORACLE_LIST_TABLES: &str = r#"
    SELECT table_name
    FROM user_tables
    WHERE dropped = 'NO'
        AND nested = 'NO'
        AND secondary = 'N'
        AND (iot_type IS NULL OR iot_type = 'IOT')
    ORDER BY table_name
"#;

/// Base tables in the first schema of the search path
pub const POSTGRES_LIST_TABLES: &str = r#"
    SELECT t.table_name::text AS table_name
    FROM information_schema.tables t
    WHERE t.table_schema = current_schema()
        AND t.table_type = 'BASE TABLE'
    ORDER BY t.table_name
"#;

/// SQL builder for dialect-specific identifier quoting
pub struct SqlBuilder;

impl SqlBuilder {
    /// Quote an identifier (table name) for the given engine
    pub fn quote_ident(db_type: DatabaseType, ident: &str) -> String {
        match db_type {
            // T-SQL delimited identifier
            DatabaseType::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            // ANSI delimited identifier, case-sensitive on both engines
            DatabaseType::Oracle | DatabaseType::Postgres => {
                format!("\"{}\"", ident.replace('"', "\"\""))
            }
        }
    }

    /// Catalog query for the given engine
    pub fn list_tables(db_type: DatabaseType) -> &'static str {
        match db_type {
            DatabaseType::SqlServer => SQLSERVER_LIST_TABLES,
            DatabaseType::Oracle => ORACLE_LIST_TABLES,
            DatabaseType::Postgres => POSTGRES_LIST_TABLES,
        }
    }

    /// Build the scalar row-count query for one table
    pub fn count_rows(db_type: DatabaseType, table: &str) -> String {
        let quoted = Self::quote_ident(db_type, table);
        match db_type {
            // COUNT(*) is INT on SQL Server and overflows past 2^31 rows
            DatabaseType::SqlServer => format!("SELECT COUNT_BIG(*) FROM {}", quoted),
            DatabaseType::Oracle | DatabaseType::Postgres => format!("SELECT COUNT(*) FROM {}", quoted),
        }
    }
}
