//! MySQL fixture configuration and lifecycle

use crate::driver::{resolve_driver_class, DriverLookup};
use crate::{jdbc, ContainerError, MySqlVersion, Result};
use docker_runtime::{BindMount, ContainerId, ContainerRuntime, DockerCli, PortBinding, RunSpec};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const IMAGE: &str = "mysql";
pub const MYSQL_PORT: u16 = 3306;
/// Host port the fixture is always published on
pub const MYSQL_HOST_PORT: u16 = 33306;
pub const DEFAULT_CONTAINER_NAME: &str = "sort-e2e-mysql";

const MYSQL_ROOT_USER: &str = "root";
const STARTUP_ATTEMPTS: u32 = 3;
const CONFIG_OVERRIDE_TARGET: &str = "/etc/mysql/my.cnf";
const INITDB_DIR: &str = "/docker-entrypoint-initdb.d";
const AUTH_PLUGIN_FLAG: &str = "--default-authentication-plugin=mysql_native_password";

/// A MySQL container for the sort e2e suites.
///
/// Configure with the `with_*` setters, then [`start`](Self::start). The
/// container is stopped and removed when this value is dropped unless it was
/// [`detach`](Self::detach)ed.
pub struct MySqlContainer {
    runtime: Arc<dyn ContainerRuntime>,
    version: MySqlVersion,
    container_name: String,
    network: Option<String>,
    database_name: String,
    username: String,
    password: String,
    config_override: Option<PathBuf>,
    setup_sql: Option<PathBuf>,
    url_params: Vec<(String, String)>,
    driver_lookup: DriverLookup,
    container_id: Option<ContainerId>,
}

impl Default for MySqlContainer {
    fn default() -> Self {
        Self::new(MySqlVersion::default())
    }
}

impl MySqlContainer {
    pub fn new(version: MySqlVersion) -> Self {
        Self {
            runtime: Arc::new(DockerCli::from_env()),
            version,
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            network: None,
            database_name: "test".to_string(),
            username: "inlong".to_string(),
            password: "inlong".to_string(),
            config_override: None,
            setup_sql: None,
            url_params: Vec::new(),
            driver_lookup: DriverLookup::default(),
            container_id: None,
        }
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_database_name(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = database_name.into();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Mounts this file as the server's `my.cnf`.
    pub fn with_configuration_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_override = Some(path.into());
        self
    }

    /// Runs this SQL file through the image's init hook on first start.
    pub fn with_setup_sql(mut self, path: impl Into<PathBuf>) -> Self {
        self.setup_sql = Some(path.into());
        self
    }

    pub fn with_url_param(mut self, key: &str, value: &str) -> Self {
        jdbc::set_param(&mut self.url_params, key, value);
        self
    }

    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = name.into();
        self
    }

    /// Attaches the container to a user-defined docker network.
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn with_driver_lookup(mut self, lookup: DriverLookup) -> Self {
        self.driver_lookup = lookup;
        self
    }

    pub fn image(&self) -> String {
        format!("{IMAGE}:{}", self.version.tag())
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

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn container_id(&self) -> Option<&ContainerId> {
        self.container_id.as_ref()
    }

    pub fn test_query_string(&self) -> &'static str {
        "SELECT 1"
    }

    /// Resolves the fixture into a run request.
    ///
    /// Fails when the password is empty and the user is not `root`.
    pub fn configure(&self) -> Result<RunSpec> {
        let mut spec = RunSpec::new(self.image());
        spec.name = Some(self.container_name.clone());
        spec.network = self.network.clone();
        spec.ports.push(PortBinding::fixed(MYSQL_HOST_PORT, MYSQL_PORT));

        if let Some(sql) = &self.setup_sql {
            let target = format!("{INITDB_DIR}/{}", file_name(sql)?);
            spec.mounts.push(BindMount::read_only(absolute(sql), target));
        }
        if let Some(cnf) = &self.config_override {
            spec.mounts
                .push(BindMount::read_only(absolute(cnf), CONFIG_OVERRIDE_TARGET));
        }

        spec.add_env("MYSQL_DATABASE", &self.database_name);
        let is_root = self.username.eq_ignore_ascii_case(MYSQL_ROOT_USER);
        if !self.password.is_empty() {
            // The image rejects MYSQL_USER=root; root is configured through MYSQL_ROOT_PASSWORD
            if !is_root {
                spec.add_env("MYSQL_USER", &self.username);
            }
            spec.add_env("MYSQL_PASSWORD", &self.password);
            spec.add_env("MYSQL_ROOT_PASSWORD", &self.password);
        } else if is_root {
            spec.add_env("MYSQL_ALLOW_EMPTY_PASSWORD", "yes");
        } else {
            return Err(ContainerError::Configuration(
                "Empty password can be used only with the root user".to_string(),
            ));
        }

        spec.command.push(AUTH_PLUGIN_FLAG.to_string());
        spec.startup_attempts = STARTUP_ATTEMPTS;
        Ok(spec)
    }

    pub fn driver_class_name(&self) -> &'static str {
        resolve_driver_class(|class| self.driver_lookup.is_available(class))
    }

    /// Starts the container, retrying runtime failures up to the startup attempt count.
    ///
    /// Configuration errors are returned before anything is started. Use
    /// [`start_and_wait`](Self::start_and_wait) to retry a container that
    /// starts but never accepts queries.
    pub fn start(&mut self) -> Result<()> {
        let spec = self.prepare_start()?;
        let mut attempt = 1;
        loop {
            match self.run_attempt(&spec, attempt) {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= spec.startup_attempts => {
                    return Err(ContainerError::Startup {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!("MySQL start attempt {} failed: {}", attempt, e);
                    self.discard_attempt();
                    attempt += 1;
                }
            }
        }
    }

    /// Starts the container and waits for the test query, counting both
    /// toward the startup attempts.
    ///
    /// Each attempt gets the full `timeout`. After the last failed attempt
    /// the container is kept so [`logs`](Self::logs) can still be read.
    pub async fn start_and_wait(&mut self, timeout: Duration) -> Result<()> {
        let query = self.test_query_string();
        self.start_with_readiness(move |opts| crate::wait_for_query(opts, query, timeout))
            .await
    }

    async fn start_with_readiness<F, Fut>(&mut self, mut ready: F) -> Result<()>
    where
        F: FnMut(mysql_async::Opts) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let spec = self.prepare_start()?;
        let mut attempt = 1;
        loop {
            let outcome = match self.run_attempt(&spec, attempt) {
                Ok(()) => match self.opts() {
                    Ok(opts) => ready(opts).await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= spec.startup_attempts => {
                    return Err(ContainerError::Startup {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!("MySQL start attempt {} failed: {}", attempt, e);
                    self.discard_attempt();
                    attempt += 1;
                }
            }
        }
    }

    fn prepare_start(&self) -> Result<RunSpec> {
        let spec = self.configure()?;
        info!("Starting MySQL container: {}", self.container_name);

        // A container left behind by an earlier run would hold the name and port
        if let Err(e) = self.runtime.remove(&self.container_name) {
            debug!("No stale container removed: {}", e);
        }
        Ok(spec)
    }

    fn run_attempt(&mut self, spec: &RunSpec, attempt: u32) -> Result<()> {
        let id = self.runtime.run(spec)?;
        info!("MySQL container {} started on attempt {}", id, attempt);
        self.container_id = Some(id);
        Ok(())
    }

    /// Removes whatever the failed attempt left behind.
    fn discard_attempt(&mut self) {
        let target = match self.container_id.take() {
            Some(id) => id.as_str().to_string(),
            None => self.container_name.clone(),
        };
        if let Err(e) = self.runtime.remove(&target) {
            debug!("Failed to remove {}: {}", target, e);
        }
    }

    fn started_id(&self) -> Result<&ContainerId> {
        self.container_id.as_ref().ok_or(ContainerError::NotStarted)
    }

    pub fn host(&self) -> String {
        self.runtime.host()
    }

    /// Host port mapped to the MySQL port.
    pub fn database_port(&self) -> Result<u16> {
        let id = self.started_id()?;
        Ok(self.runtime.mapped_port(id, MYSQL_PORT)?)
    }

    pub fn liveness_check_ports(&self) -> Result<Vec<u16>> {
        Ok(vec![self.database_port()?])
    }

    pub fn jdbc_url(&self) -> Result<String> {
        self.jdbc_url_for(&self.database_name)
    }

    pub fn jdbc_url_for(&self, database_name: &str) -> Result<String> {
        Ok(jdbc::mysql_url(
            &self.host(),
            self.database_port()?,
            database_name,
            &self.url_params,
        ))
    }

    /// Connection options for the native client.
    pub fn opts(&self) -> Result<mysql_async::Opts> {
        let builder = mysql_async::OptsBuilder::default()
            .ip_or_hostname(self.host())
            .tcp_port(self.database_port()?)
            .user(Some(self.username.clone()))
            .pass(Some(self.password.clone()))
            .db_name(Some(self.database_name.clone()));
        Ok(builder.into())
    }

    /// `mysql://` URL for the native client, as printed by the CLI.
    pub fn connection_url(&self) -> Result<String> {
        let credentials = if self.password.is_empty() {
            self.username.clone()
        } else {
            format!("{}:{}", self.username, self.password)
        };
        Ok(format!(
            "mysql://{credentials}@{}:{}/{}",
            jdbc::url_host(&self.host()),
            self.database_port()?,
            self.database_name
        ))
    }

    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        crate::wait_for_query(self.opts()?, self.test_query_string(), timeout).await
    }

    pub fn get_pool(&self) -> Result<mysql_async::Pool> {
        Ok(mysql_async::Pool::new(self.opts()?))
    }

    pub fn logs(&self) -> Result<String> {
        Ok(self.runtime.logs(self.started_id()?)?)
    }

    /// Stops and removes the container.
    pub fn stop(&mut self) -> Result<()> {
        let Some(id) = self.container_id.take() else {
            return Ok(());
        };
        self.runtime.stop(&id)?;
        self.runtime.remove(id.as_str())?;
        info!("Container stopped and removed");
        Ok(())
    }

    /// Leaves the container running after this value is dropped.
    pub fn detach(mut self) -> Option<ContainerId> {
        self.container_id.take()
    }
}

impl Drop for MySqlContainer {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.stop();
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ContainerError::Configuration(format!("Not a file path: {}", path.display()))
        })
}

/// Bind mounts need absolute sources.
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
