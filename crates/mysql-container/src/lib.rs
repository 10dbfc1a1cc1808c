//! MySQL fixture container for the sort end-to-end tests
//!
//! Differs from a stock MySQL fixture in two ways: a configuration override
//! is mounted as `/etc/mysql/my.cnf` rather than under `conf.d`, and JDBC
//! URLs always carry `useSSL=false&allowPublicKeyRetrieval=true` exactly once.

mod container;
mod driver;
mod error;
pub mod jdbc;
mod ready;
mod version;

pub use container::{
    MySqlContainer, DEFAULT_CONTAINER_NAME, IMAGE, MYSQL_HOST_PORT, MYSQL_PORT,
};
pub use driver::{resolve_driver_class, DriverLookup, LEGACY_DRIVER, MODERN_DRIVER};
pub use error::{ContainerError, Result};
pub use ready::wait_for_query;
pub use version::MySqlVersion;
