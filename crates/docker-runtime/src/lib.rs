//! Container runtime abstraction for the sort e2e fixtures
//!
//! Fixtures describe the container they need as a [`RunSpec`] and drive it
//! through a [`ContainerRuntime`]. [`DockerCli`] is the production runtime and
//! shells out to the `docker` binary; [`testing::RecordingRuntime`] records
//! calls so fixture logic can be tested without a daemon.

mod cli;
mod error;
mod spec;
pub mod testing;

pub use cli::{host_from_docker_host, DockerCli};
pub use error::{Result, RuntimeError};
pub use spec::{BindMount, ContainerId, ExecOutput, ImageRef, PortBinding, RunSpec};

use std::path::Path;

/// Operations the fixtures need from a container engine.
pub trait ContainerRuntime: Send + Sync {
    /// Starts a detached container and returns its id.
    fn run(&self, spec: &RunSpec) -> Result<ContainerId>;

    /// Copies a host file or directory into a running container.
    fn copy_into(&self, id: &ContainerId, source: &Path, destination: &str) -> Result<()>;

    /// Runs a command inside a running container.
    ///
    /// A non-zero exit code is reported through [`ExecOutput`], not as an error.
    fn exec(&self, id: &ContainerId, command: &[&str]) -> Result<ExecOutput>;

    /// Commits the container filesystem as a new image.
    fn commit(&self, id: &ContainerId, image: &ImageRef) -> Result<()>;

    fn stop(&self, id: &ContainerId) -> Result<()>;

    /// Removes a container by name or id.
    fn remove(&self, name_or_id: &str) -> Result<()>;

    /// Host port bound to the given container TCP port.
    fn mapped_port(&self, id: &ContainerId, container_port: u16) -> Result<u16>;

    fn logs(&self, id: &ContainerId) -> Result<String>;

    /// Host name tests should use to reach published ports.
    fn host(&self) -> String;
}
