//! Integration tests for the MySQL fixture against a real docker daemon
//!
//! Run with `cargo test -p mysql-container -- --ignored`.

use anyhow::{Context, Result};
use mysql_async::prelude::*;
use mysql_container::{MySqlContainer, MySqlVersion, MYSQL_HOST_PORT};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for tests
fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn test_mysql_fixture_with_overrides() -> Result<()> {
    init_logging();

    let mut cnf = tempfile::Builder::new().suffix(".cnf").tempfile()?;
    writeln!(
        cnf,
        "[mysqld]\nserver-id = 223344\nlog_bin = mysql-bin\nbinlog_format = ROW\n"
    )?;
    let mut setup = tempfile::Builder::new().suffix(".sql").tempfile()?;
    writeln!(
        setup,
        "CREATE TABLE IF NOT EXISTS products (id INT PRIMARY KEY, name VARCHAR(255));"
    )?;

    // mysqld inside the container runs as a different user
    for file in [cnf.path(), setup.path()] {
        std::fs::set_permissions(file, std::fs::Permissions::from_mode(0o644))?;
    }

    let mut mysql = MySqlContainer::new(MySqlVersion::V8_0)
        .with_container_name("sort-e2e-mysql-it")
        .with_configuration_override(cnf.path())
        .with_setup_sql(setup.path());
    mysql.start_and_wait(Duration::from_secs(120)).await?;

    assert_eq!(mysql.database_port()?, MYSQL_HOST_PORT);
    let url = mysql.jdbc_url()?;
    info!("JDBC URL: {}", url);
    assert!(url.ends_with("/test?useSSL=false&allowPublicKeyRetrieval=true"));

    let pool = mysql.get_pool()?;
    let mut conn = pool.get_conn().await?;

    // The override is read as my.cnf, so binlog settings are live
    let format: Option<(String, String)> = conn
        .query_first("SHOW VARIABLES LIKE 'binlog_format'")
        .await?;
    let (_, value) = format.context("binlog_format variable missing")?;
    assert_eq!(value, "ROW");

    let tables: Vec<String> = conn.query("SHOW TABLES").await?;
    assert!(tables.contains(&"products".to_string()), "{tables:?}");

    drop(conn);
    pool.disconnect().await?;
    mysql.stop()?;
    Ok(())
}
