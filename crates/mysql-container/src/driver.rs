//! JDBC driver class selection
//!
//! The pipeline under test loads whatever MySQL connector jar ships with it.
//! Connector/J 8 and later expose `com.mysql.cj.jdbc.Driver`; older jars only
//! the legacy class name.

use std::path::PathBuf;
use tracing::debug;

pub const MODERN_DRIVER: &str = "com.mysql.cj.jdbc.Driver";
pub const LEGACY_DRIVER: &str = "com.mysql.jdbc.Driver";

/// Returns the modern driver when available, otherwise the legacy one.
pub fn resolve_driver_class(is_available: impl Fn(&str) -> bool) -> &'static str {
    if is_available(MODERN_DRIVER) {
        MODERN_DRIVER
    } else {
        LEGACY_DRIVER
    }
}

/// How driver availability is decided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DriverLookup {
    /// No connector directory known; assume a current Connector/J.
    #[default]
    AssumeModern,
    /// Inspect the connector jars in this directory.
    ConnectorDir(PathBuf),
}

impl DriverLookup {
    pub fn is_available(&self, class_name: &str) -> bool {
        match self {
            DriverLookup::AssumeModern => true,
            DriverLookup::ConnectorDir(dir) if class_name == MODERN_DRIVER => {
                let Ok(entries) = std::fs::read_dir(dir) else {
                    debug!("Connector directory {} is not readable", dir.display());
                    return false;
                };
                entries
                    .filter_map(|entry| entry.ok())
                    .filter_map(|entry| entry.file_name().into_string().ok())
                    .any(|name| is_modern_connector_jar(&name))
            }
            DriverLookup::ConnectorDir(_) => class_name == LEGACY_DRIVER,
        }
    }
}

fn is_modern_connector_jar(file_name: &str) -> bool {
    if !file_name.ends_with(".jar") {
        return false;
    }
    if file_name.starts_with("mysql-connector-j-") {
        return true;
    }
    file_name
        .strip_prefix("mysql-connector-java-")
        .and_then(|rest| rest.split('.').next())
        .and_then(|major| major.parse::<u32>().ok())
        .is_some_and(|major| major >= 8)
}
