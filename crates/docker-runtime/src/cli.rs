//! `ContainerRuntime` backed by the docker command line

use crate::{
    ContainerId, ContainerRuntime, ExecOutput, ImageRef, Result, RunSpec, RuntimeError,
};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, info};

/// Drives containers by invoking the `docker` binary.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: PathBuf,
    host: String,
}

impl DockerCli {
    pub fn new(binary: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            host: host.into(),
        }
    }

    /// Uses `DOCKER_BIN` (default `docker`) and derives the host from `DOCKER_HOST`.
    pub fn from_env() -> Self {
        let binary = std::env::var("DOCKER_BIN").unwrap_or_else(|_| "docker".to_string());
        let docker_host = std::env::var("DOCKER_HOST").ok();
        Self::new(binary, host_from_docker_host(docker_host.as_deref()))
    }

    fn invoke(&self, args: &[&str]) -> Result<Output> {
        debug!("docker {}", args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        Ok(output)
    }

    /// Invokes docker and fails on a non-zero exit status.
    fn checked(&self, args: &[&str]) -> Result<String> {
        let output = self.invoke(args)?;
        if !output.status.success() {
            return Err(RuntimeError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ContainerRuntime for DockerCli {
    fn run(&self, spec: &RunSpec) -> Result<ContainerId> {
        info!("Starting container from image {}", spec.image);
        let mut args = vec!["run".to_string()];
        args.extend(spec.to_docker_args());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let stdout = self.checked(&args)?;
        // `docker run -d` may print pull progress before the id
        let id = stdout.lines().last().unwrap_or_default().trim();
        if id.is_empty() {
            return Err(RuntimeError::UnexpectedOutput {
                command: "run".to_string(),
                output: stdout,
            });
        }
        info!("Started container: {}", id);
        Ok(ContainerId::new(id))
    }

    fn copy_into(&self, id: &ContainerId, source: &Path, destination: &str) -> Result<()> {
        let target = format!("{id}:{destination}");
        let source = source.to_string_lossy();
        self.checked(&["cp", &source, &target])?;
        Ok(())
    }

    fn exec(&self, id: &ContainerId, command: &[&str]) -> Result<ExecOutput> {
        let mut args = vec!["exec", id.as_str()];
        args.extend_from_slice(command);
        let output = self.invoke(&args)?;
        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn commit(&self, id: &ContainerId, image: &ImageRef) -> Result<()> {
        let reference = image.to_string();
        info!("Committing container {} as {}", id, reference);
        self.checked(&["commit", id.as_str(), &reference])?;
        Ok(())
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        info!("Stopping container: {}", id);
        self.checked(&["stop", id.as_str()])?;
        Ok(())
    }

    fn remove(&self, name_or_id: &str) -> Result<()> {
        self.checked(&["rm", "-f", "-v", name_or_id])?;
        Ok(())
    }

    fn mapped_port(&self, id: &ContainerId, container_port: u16) -> Result<u16> {
        let port_spec = format!("{container_port}/tcp");
        let stdout = self.checked(&["port", id.as_str(), &port_spec])?;
        parse_port_output(&stdout).ok_or(RuntimeError::UnexpectedOutput {
            command: "port".to_string(),
            output: stdout,
        })
    }

    fn logs(&self, id: &ContainerId) -> Result<String> {
        let output = self.invoke(&["logs", id.as_str()])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        Ok(format!("STDOUT:\n{stdout}\n\nSTDERR:\n{stderr}"))
    }

    fn host(&self) -> String {
        self.host.clone()
    }
}

/// Resolves the host that published ports are reachable on.
///
/// `tcp://10.0.0.5:2375` yields `10.0.0.5`; unix sockets and an unset
/// variable yield `localhost`.
pub fn host_from_docker_host(docker_host: Option<&str>) -> String {
    docker_host
        .and_then(|value| value.strip_prefix("tcp://"))
        .and_then(|rest| rest.split('/').next())
        .and_then(|authority| match authority.strip_prefix('[') {
            // IPv6 literal: tcp://[::1]:2375
            Some(bracketed) => bracketed.split_once(']').map(|(host, _)| host),
            None => authority.split(':').next(),
        })
        .filter(|host| !host.is_empty())
        .unwrap_or("localhost")
        .to_string()
}

/// Extracts the host port from `docker port` output such as
/// `0.0.0.0:33306` followed by `[::]:33306`.
fn parse_port_output(output: &str) -> Option<u16> {
    output
        .lines()
        .filter_map(|line| line.trim().rsplit_once(':'))
        .find_map(|(_, port)| port.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_from_docker_host() {
        assert_eq!(host_from_docker_host(None), "localhost");
        assert_eq!(
            host_from_docker_host(Some("unix:///var/run/docker.sock")),
            "localhost"
        );
        assert_eq!(
            host_from_docker_host(Some("tcp://10.0.0.5:2375")),
            "10.0.0.5"
        );
        assert_eq!(host_from_docker_host(Some("tcp://dind")), "dind");
    }

    #[test]
    fn test_host_from_ipv6_docker_host() {
        assert_eq!(host_from_docker_host(Some("tcp://[::1]:2375")), "::1");
        assert_eq!(
            host_from_docker_host(Some("tcp://[fd00::5]/")),
            "fd00::5"
        );
        assert_eq!(host_from_docker_host(Some("tcp://[]:2375")), "localhost");
        assert_eq!(host_from_docker_host(Some("tcp://[::1")), "localhost");
    }

    #[test]
    fn test_parse_port_output() {
        assert_eq!(parse_port_output("0.0.0.0:33306\n[::]:33306\n"), Some(33306));
        assert_eq!(parse_port_output("[::]:49153"), Some(49153));
        assert_eq!(parse_port_output(""), None);
        assert_eq!(parse_port_output("no port here"), None);
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let docker = DockerCli::new(dir.path().join("no-such-docker"), "localhost");

        let err = docker.remove("anything").unwrap_err();
        assert!(matches!(err, RuntimeError::Io(_)), "got {err:?}");
    }
}
