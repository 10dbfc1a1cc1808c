//! StarRocks fixture container running the derived image

use crate::image::{new_starrocks_image_name, STARTUP_SCRIPT_PATH};
use crate::Result;
use docker_runtime::{ContainerId, ContainerRuntime, DockerCli, PortBinding, RunSpec};
use mysql_container::{jdbc, wait_for_query, ContainerError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Name other containers on the fixture network reach StarRocks by
pub const INTER_CONTAINER_STAR_ROCKS_ALIAS: &str = "starrocks";
/// FE MySQL-protocol port
pub const FE_QUERY_PORT: u16 = 9030;
pub const FE_HTTP_PORT: u16 = 8030;
pub const BE_HTTP_PORT: u16 = 8040;
pub const DEFAULT_CONTAINER_NAME: &str = "sort-e2e-starrocks";

pub struct StarRocksContainer {
    runtime: Arc<dyn ContainerRuntime>,
    image: String,
    container_name: String,
    network: Option<String>,
    database_name: String,
    username: String,
    password: String,
    url_params: Vec<(String, String)>,
    container_id: Option<ContainerId>,
}

impl Default for StarRocksContainer {
    fn default() -> Self {
        Self::new(new_starrocks_image_name())
    }
}

impl StarRocksContainer {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            runtime: Arc::new(DockerCli::from_env()),
            image: image.into(),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            network: None,
            database_name: "test".to_string(),
            username: "root".to_string(),
            password: String::new(),
            url_params: Vec::new(),
            container_id: None,
        }
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = name.into();
        self
    }

    /// Joins a user-defined network under [`INTER_CONTAINER_STAR_ROCKS_ALIAS`].
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn with_database_name(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = database_name.into();
        self
    }

    pub fn with_url_param(mut self, key: &str, value: &str) -> Self {
        jdbc::set_param(&mut self.url_params, key, value);
        self
    }

    /// Attaches to an already running container instead of starting one.
    pub fn with_container_id(mut self, id: ContainerId) -> Self {
        self.container_id = Some(id);
        self
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn container_id(&self) -> Option<&ContainerId> {
        self.container_id.as_ref()
    }

    pub fn configure(&self) -> RunSpec {
        let mut spec = RunSpec::new(&self.image);
        spec.name = Some(self.container_name.clone());
        if let Some(network) = &self.network {
            spec.network = Some(network.clone());
            spec.network_aliases
                .push(INTER_CONTAINER_STAR_ROCKS_ALIAS.to_string());
        }
        for port in [FE_QUERY_PORT, FE_HTTP_PORT, BE_HTTP_PORT] {
            spec.ports.push(PortBinding::ephemeral(port));
        }
        spec.command.push(STARTUP_SCRIPT_PATH.to_string());
        spec
    }

    pub fn start(&mut self) -> Result<()> {
        let spec = self.configure();
        info!("Starting StarRocks container: {}", self.container_name);
        if let Err(e) = self.runtime.remove(&self.container_name) {
            debug!("No stale container removed: {}", e);
        }
        self.container_id = Some(self.runtime.run(&spec)?);
        Ok(())
    }

    fn started_id(&self) -> Result<&ContainerId> {
        Ok(self.container_id.as_ref().ok_or(ContainerError::NotStarted)?)
    }

    pub fn host(&self) -> String {
        self.runtime.host()
    }

    /// Host port mapped to the FE query port.
    pub fn query_port(&self) -> Result<u16> {
        let id = self.started_id()?;
        Ok(self.runtime.mapped_port(id, FE_QUERY_PORT)?)
    }

    pub fn jdbc_url(&self) -> Result<String> {
        Ok(jdbc::mysql_url(
            &self.host(),
            self.query_port()?,
            &self.database_name,
            &self.url_params,
        ))
    }

    fn opts_builder(&self) -> Result<mysql_async::OptsBuilder> {
        Ok(mysql_async::OptsBuilder::default()
            .ip_or_hostname(self.host())
            .tcp_port(self.query_port()?)
            .user(Some(self.username.clone()))
            .pass(Some(self.password.clone())))
    }

    /// Connection options with the fixture database selected.
    pub fn opts(&self) -> Result<mysql_async::Opts> {
        Ok(self
            .opts_builder()?
            .db_name(Some(self.database_name.clone()))
            .into())
    }

    /// Waits for the FE to accept DDL, creating the fixture database on the way.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        let create_database = format!("CREATE DATABASE IF NOT EXISTS `{}`", self.database_name);
        wait_for_query(self.opts_builder()?.into(), &create_database, timeout).await?;
        Ok(())
    }

    pub fn logs(&self) -> Result<String> {
        Ok(self.runtime.logs(self.started_id()?)?)
    }

    pub fn stop(&mut self) -> Result<()> {
        let Some(id) = self.container_id.take() else {
            return Ok(());
        };
        self.runtime.stop(&id)?;
        self.runtime.remove(id.as_str())?;
        info!("StarRocks container stopped and removed");
        Ok(())
    }

    /// Leaves the container running after this value is dropped.
    pub fn detach(mut self) -> Option<ContainerId> {
        self.container_id.take()
    }
}

impl Drop for StarRocksContainer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StarRocksError;
    use docker_runtime::testing::RecordingRuntime;

    #[test]
    fn test_configure() {
        let spec = StarRocksContainer::default().configure();

        assert_eq!(spec.image, "inlong-starrocks:latest");
        assert_eq!(spec.name.as_deref(), Some(DEFAULT_CONTAINER_NAME));
        assert_eq!(
            spec.ports,
            vec![
                PortBinding::ephemeral(9030),
                PortBinding::ephemeral(8030),
                PortBinding::ephemeral(8040),
            ]
        );
        assert_eq!(spec.command, vec![STARTUP_SCRIPT_PATH.to_string()]);
        assert_eq!(spec.network, None);
        assert!(spec.network_aliases.is_empty());
    }

    #[test]
    fn test_network_alias() {
        let spec = StarRocksContainer::default()
            .with_network("sort-e2e")
            .configure();

        assert_eq!(spec.network.as_deref(), Some("sort-e2e"));
        assert_eq!(spec.network_aliases, vec!["starrocks".to_string()]);
        let args = spec.to_docker_args();
        assert_eq!(
            args[..7],
            [
                "-d",
                "--name",
                DEFAULT_CONTAINER_NAME,
                "--network",
                "sort-e2e",
                "--network-alias",
                INTER_CONTAINER_STAR_ROCKS_ALIAS,
            ]
        );
    }

    #[test]
    fn test_jdbc_url_uses_query_port() {
        let runtime = Arc::new(RecordingRuntime::new().with_mapped_port(FE_QUERY_PORT, 49160));
        let mut starrocks = StarRocksContainer::default().with_runtime(runtime.clone());

        assert!(matches!(
            starrocks.jdbc_url(),
            Err(StarRocksError::Container(ContainerError::NotStarted))
        ));

        starrocks.start().unwrap();
        assert_eq!(
            starrocks.jdbc_url().unwrap(),
            "jdbc:mysql://localhost:49160/test?useSSL=false&allowPublicKeyRetrieval=true"
        );
    }
}
