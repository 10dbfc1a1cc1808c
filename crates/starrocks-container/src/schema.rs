use crate::{Result, StarRocksContainer};
use mysql_async::prelude::*;
use tracing::info;

pub const TEST_OUTPUT_TABLE: &str = "test_output1";

/// Primary-key sink table written by the sort jobs under test.
pub const CREATE_TEST_OUTPUT_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS test_output1 (
       id INT NOT NULL,
       name VARCHAR(255) NOT NULL DEFAULT 'flink',
       description VARCHAR(512)
)
PRIMARY KEY(id)
DISTRIBUTED BY HASH(id) PROPERTIES ("replication_num" = "1");"#;

/// Creates `test_output1` in the fixture database.
///
/// Safe to call repeatedly. SQL failures are returned as-is and never
/// retried; the connection is closed on every path.
pub async fn initialize_starrocks_table(starrocks: &StarRocksContainer) -> Result<()> {
    let mut conn = mysql_async::Conn::new(starrocks.opts()?).await?;

    let created = conn.query_drop(CREATE_TEST_OUTPUT_TABLE).await;
    let closed = conn.disconnect().await;
    created?;
    closed?;

    info!(
        "Table {}.{} is in place",
        starrocks.database_name(),
        TEST_OUTPUT_TABLE
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StarRocksError, FE_QUERY_PORT};
    use docker_runtime::testing::RecordingRuntime;
    use std::sync::Arc;

    #[test]
    fn test_create_table_statement() {
        assert!(CREATE_TEST_OUTPUT_TABLE.starts_with("CREATE TABLE IF NOT EXISTS test_output1 ("));
        assert!(CREATE_TEST_OUTPUT_TABLE.contains("name VARCHAR(255) NOT NULL DEFAULT 'flink'"));
        assert!(CREATE_TEST_OUTPUT_TABLE.contains("PRIMARY KEY(id)"));
        assert!(CREATE_TEST_OUTPUT_TABLE.contains(r#""replication_num" = "1""#));
    }

    #[tokio::test]
    async fn test_connection_failure_is_sql_error() {
        // A port nothing listens on once the listener is dropped
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let runtime = Arc::new(RecordingRuntime::new().with_mapped_port(FE_QUERY_PORT, port));
        let mut starrocks = StarRocksContainer::default().with_runtime(runtime);
        starrocks.start().unwrap();

        let err = initialize_starrocks_table(&starrocks).await.unwrap_err();
        assert!(matches!(err, StarRocksError::Sql(_)), "{err:?}");
    }
}
