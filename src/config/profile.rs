//! TOML fixture profile
//!
//! ```toml
//! [mysql]
//! version = "8.0"
//! username = "flink"
//! password = "flinkpw"
//! config_override = "docker/mysql/my.cnf"
//! url_params = { serverTimezone = "UTC" }
//!
//! [starrocks]
//! ready_timeout = "5m"
//! ```
//!
//! Every field is optional; command-line flags take precedence.

use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureProfile {
    #[serde(default)]
    pub mysql: MySqlProfile,
    #[serde(default)]
    pub starrocks: StarRocksProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MySqlProfile {
    pub version: Option<String>,
    pub name: Option<String>,
    pub network: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub config_override: Option<PathBuf>,
    pub setup_sql: Option<PathBuf>,
    pub connector_dir: Option<PathBuf>,
    pub ready_timeout: Option<String>,
    #[serde(default)]
    pub url_params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StarRocksProfile {
    pub image: Option<String>,
    pub name: Option<String>,
    pub network: Option<String>,
    pub database: Option<String>,
    pub script: Option<PathBuf>,
    pub ready_timeout: Option<String>,
}

impl FixtureProfile {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Invalid fixture profile")
    }

    /// Loads a profile; relative paths inside it resolve against its directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture profile {}", path.display()))?;
        let mut profile = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let Some(base) = path.parent() {
            for field in [
                &mut profile.mysql.config_override,
                &mut profile.mysql.setup_sql,
                &mut profile.mysql.connector_dir,
                &mut profile.starrocks.script,
            ] {
                let resolved = field
                    .as_ref()
                    .filter(|p| p.is_relative())
                    .map(|p| base.join(p));
                if resolved.is_some() {
                    *field = resolved;
                }
            }
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile() {
        assert_eq!(FixtureProfile::from_toml("").unwrap(), FixtureProfile::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = FixtureProfile::from_toml("[mysql]\nimage_tag = \"8.0\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("image_tag"), "{err:#}");
    }

    #[test]
    fn test_relative_paths_resolve_against_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.toml");
        std::fs::write(
            &path,
            "[mysql]\nconfig_override = \"mysql/my.cnf\"\nsetup_sql = \"/abs/setup.sql\"\n\n[starrocks]\nscript = \"start_fe_be.sh\"\n",
        )
        .unwrap();

        let profile = FixtureProfile::load(&path).unwrap();
        assert_eq!(
            profile.mysql.config_override,
            Some(dir.path().join("mysql/my.cnf"))
        );
        assert_eq!(profile.mysql.setup_sql, Some(PathBuf::from("/abs/setup.sql")));
        assert_eq!(
            profile.starrocks.script,
            Some(dir.path().join("start_fe_be.sh"))
        );
    }
}
