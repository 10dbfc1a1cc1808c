//! Value types describing containers and images

use std::fmt;
use std::path::PathBuf;

/// Identifier returned by `docker run`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An image reference split into repository and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Parses `repository[:tag]`, defaulting the tag to `latest`.
    ///
    /// A colon that belongs to a registry port (`host:5000/repo`) is not
    /// treated as the tag separator.
    pub fn parse(reference: &str) -> Self {
        match reference.rsplit_once(':') {
            Some((repository, tag)) if !tag.contains('/') => Self::new(repository, tag),
            _ => Self::new(reference, "latest"),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// Publishes a container TCP port, on a fixed host port or an ephemeral one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBinding {
    pub host: Option<u16>,
    pub container: u16,
}

impl PortBinding {
    pub fn fixed(host: u16, container: u16) -> Self {
        Self {
            host: Some(host),
            container,
        }
    }

    pub fn ephemeral(container: u16) -> Self {
        Self {
            host: None,
            container,
        }
    }

    fn to_arg(self) -> String {
        match self.host {
            Some(host) => format!("{host}:{}", self.container),
            None => self.container.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: String,
    pub read_only: bool,
}

impl BindMount {
    pub fn read_only(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: true,
        }
    }

    fn to_arg(&self) -> String {
        let mut arg = format!("{}:{}", self.source.display(), self.target);
        if self.read_only {
            arg.push_str(":ro");
        }
        arg
    }
}

/// A fully resolved `docker run` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub name: Option<String>,
    /// User-defined network to attach to
    pub network: Option<String>,
    /// Names other containers on `network` can reach this one by
    pub network_aliases: Vec<String>,
    /// Environment variables in insertion order
    pub env: Vec<(String, String)>,
    /// Arguments passed after the image name
    pub command: Vec<String>,
    pub ports: Vec<PortBinding>,
    pub mounts: Vec<BindMount>,
    /// How many times the runtime caller should try to start the container
    pub startup_attempts: u32,
}

impl RunSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: None,
            network: None,
            network_aliases: Vec::new(),
            env: Vec::new(),
            command: Vec::new(),
            ports: Vec::new(),
            mounts: Vec::new(),
            startup_attempts: 1,
        }
    }

    /// Sets an environment variable, replacing an earlier value for the same key.
    pub fn add_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.env.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.env.push((key, value)),
        }
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Arguments for `docker run`, excluding the `run` verb itself.
    pub fn to_docker_args(&self) -> Vec<String> {
        let mut args = vec!["-d".to_string()];
        if let Some(name) = &self.name {
            args.push("--name".to_string());
            args.push(name.clone());
        }
        if let Some(network) = &self.network {
            args.push("--network".to_string());
            args.push(network.clone());
            // Aliases are only meaningful on a user-defined network
            for alias in &self.network_aliases {
                args.push("--network-alias".to_string());
                args.push(alias.clone());
            }
        }
        for (key, value) in &self.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        for port in &self.ports {
            args.push("-p".to_string());
            args.push(port.to_arg());
        }
        for mount in &self.mounts {
            args.push("-v".to_string());
            args.push(mount.to_arg());
        }
        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());
        args
    }
}

/// Result of `docker exec`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
