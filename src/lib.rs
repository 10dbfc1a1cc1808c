//! Sort e2e fixtures
//!
//! Docker fixtures for the sort pipeline end-to-end tests: a MySQL source
//! database and a StarRocks sink prepared from a derived image.
//!
//! # CLI Usage
//!
//! ```bash
//! # MySQL 8.0 with a binlog-enabled my.cnf, published on port 33306
//! sort-e2e-fixtures mysql up --version 8.0 --config-override docker/mysql/my.cnf
//!
//! # Build inlong-starrocks:latest, start it, create test_output1
//! sort-e2e-fixtures starrocks build-image
//! sort-e2e-fixtures starrocks up
//! sort-e2e-fixtures starrocks init-table
//! ```

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

pub mod config;

pub use config::{parse_duration, FixtureProfile, MySqlProfile, StarRocksProfile};
pub use mysql_container as mysql;
pub use starrocks_container as starrocks;

use mysql_container::{DriverLookup, MySqlContainer, MySqlVersion};
use starrocks_container::StarRocksContainer;

const DEFAULT_MYSQL_READY_TIMEOUT: &str = "2m";
const DEFAULT_STARROCKS_READY_TIMEOUT: &str = "5m";

#[derive(Args, Clone, Debug, Default)]
pub struct MySqlOpts {
    /// MySQL server version (5.5, 5.6, 5.7, 8.0)
    #[arg(long = "version", env = "SORT_MYSQL_VERSION")]
    pub mysql_version: Option<MySqlVersion>,

    /// Container name
    #[arg(long, env = "SORT_MYSQL_NAME")]
    pub name: Option<String>,

    /// User-defined docker network to join
    #[arg(long, env = "SORT_MYSQL_NETWORK")]
    pub network: Option<String>,

    /// Database created on first start
    #[arg(long, env = "SORT_MYSQL_DATABASE")]
    pub database: Option<String>,

    #[arg(long, env = "SORT_MYSQL_USERNAME")]
    pub username: Option<String>,

    /// Empty is only accepted for the root user
    #[arg(long, env = "SORT_MYSQL_PASSWORD")]
    pub password: Option<String>,

    /// File mounted as /etc/mysql/my.cnf
    #[arg(long, env = "SORT_MYSQL_CONFIG_OVERRIDE")]
    pub config_override: Option<PathBuf>,

    /// SQL file run by the image on first start
    #[arg(long, env = "SORT_MYSQL_SETUP_SQL")]
    pub setup_sql: Option<PathBuf>,

    /// Directory holding the pipeline's MySQL connector jars
    #[arg(long, env = "SORT_MYSQL_CONNECTOR_DIR")]
    pub connector_dir: Option<PathBuf>,

    /// Extra JDBC URL parameter (format: key=value)
    #[arg(long = "url-param", value_name = "KEY=VALUE")]
    pub url_params: Vec<String>,

    /// How long to wait for the server, e.g. "90s", "2m"
    #[arg(long, env = "SORT_MYSQL_READY_TIMEOUT")]
    pub ready_timeout: Option<String>,
}

impl MySqlOpts {
    /// Builds the container from these flags, falling back to the profile.
    pub fn resolve(&self, profile: &MySqlProfile) -> anyhow::Result<MySqlContainer> {
        let version = match (&self.mysql_version, &profile.version) {
            (Some(version), _) => *version,
            (None, Some(version)) => version
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid mysql.version in profile")?,
            (None, None) => MySqlVersion::default(),
        };

        let mut mysql = MySqlContainer::new(version);
        if let Some(name) = self.name.as_ref().or(profile.name.as_ref()) {
            mysql = mysql.with_container_name(name);
        }
        if let Some(network) = self.network.as_ref().or(profile.network.as_ref()) {
            mysql = mysql.with_network(network);
        }
        if let Some(database) = self.database.as_ref().or(profile.database.as_ref()) {
            mysql = mysql.with_database_name(database);
        }
        if let Some(username) = self.username.as_ref().or(profile.username.as_ref()) {
            mysql = mysql.with_username(username);
        }
        if let Some(password) = self.password.as_ref().or(profile.password.as_ref()) {
            mysql = mysql.with_password(password);
        }
        if let Some(path) = self
            .config_override
            .as_ref()
            .or(profile.config_override.as_ref())
        {
            mysql = mysql.with_configuration_override(path);
        }
        if let Some(path) = self.setup_sql.as_ref().or(profile.setup_sql.as_ref()) {
            mysql = mysql.with_setup_sql(path);
        }
        if let Some(dir) = self.connector_dir.as_ref().or(profile.connector_dir.as_ref()) {
            mysql = mysql.with_driver_lookup(DriverLookup::ConnectorDir(dir.clone()));
        }

        for (key, value) in &profile.url_params {
            mysql = mysql.with_url_param(key, value);
        }
        for param in &self.url_params {
            let (key, value) = param
                .split_once('=')
                .with_context(|| format!("Invalid URL parameter '{param}', expected key=value"))?;
            mysql = mysql.with_url_param(key, value);
        }
        Ok(mysql)
    }

    pub fn ready_timeout(&self, profile: &MySqlProfile) -> anyhow::Result<Duration> {
        parse_duration(
            self.ready_timeout
                .as_deref()
                .or(profile.ready_timeout.as_deref())
                .unwrap_or(DEFAULT_MYSQL_READY_TIMEOUT),
        )
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct StarRocksOpts {
    /// Image to run (defaults to the derived inlong-starrocks:latest)
    #[arg(long, env = "SORT_STARROCKS_IMAGE")]
    pub image: Option<String>,

    /// Container name
    #[arg(long, env = "SORT_STARROCKS_NAME")]
    pub name: Option<String>,

    /// User-defined docker network to join, reachable there as `starrocks`
    #[arg(long, env = "SORT_STARROCKS_NETWORK")]
    pub network: Option<String>,

    /// Database holding test_output1
    #[arg(long, env = "SORT_STARROCKS_DATABASE")]
    pub database: Option<String>,

    /// How long to wait for the FE, e.g. "5m"
    #[arg(long, env = "SORT_STARROCKS_READY_TIMEOUT")]
    pub ready_timeout: Option<String>,
}

impl StarRocksOpts {
    pub fn resolve(&self, profile: &StarRocksProfile) -> StarRocksContainer {
        let mut starrocks = match self.image.as_ref().or(profile.image.as_ref()) {
            Some(image) => StarRocksContainer::new(image),
            None => StarRocksContainer::default(),
        };
        if let Some(name) = self.name.as_ref().or(profile.name.as_ref()) {
            starrocks = starrocks.with_container_name(name);
        }
        if let Some(network) = self.network.as_ref().or(profile.network.as_ref()) {
            starrocks = starrocks.with_network(network);
        }
        if let Some(database) = self.database.as_ref().or(profile.database.as_ref()) {
            starrocks = starrocks.with_database_name(database);
        }
        starrocks
    }

    /// Container name to address, defaulting to the fixture default.
    pub fn container_name(&self, profile: &StarRocksProfile) -> String {
        self.name
            .clone()
            .or_else(|| profile.name.clone())
            .unwrap_or_else(|| starrocks_container::DEFAULT_CONTAINER_NAME.to_string())
    }

    pub fn ready_timeout(&self, profile: &StarRocksProfile) -> anyhow::Result<Duration> {
        parse_duration(
            self.ready_timeout
                .as_deref()
                .or(profile.ready_timeout.as_deref())
                .unwrap_or(DEFAULT_STARROCKS_READY_TIMEOUT),
        )
    }
}
