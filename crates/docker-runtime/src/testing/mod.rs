//! In-memory runtime for exercising fixture logic without a docker daemon

use crate::{
    ContainerId, ContainerRuntime, ExecOutput, ImageRef, Result, RunSpec, RuntimeError,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A runtime call as observed by [`RecordingRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Run(RunSpec),
    CopyInto {
        id: ContainerId,
        source: PathBuf,
        destination: String,
    },
    Exec {
        id: ContainerId,
        command: Vec<String>,
    },
    Commit {
        id: ContainerId,
        image: ImageRef,
    },
    Stop(ContainerId),
    Remove(String),
}

/// Records every call and fails on request.
#[derive(Debug, Default)]
pub struct RecordingRuntime {
    calls: Mutex<Vec<Call>>,
    /// Number of `run` calls that fail before one succeeds
    failing_runs: Mutex<usize>,
    fail_exec: bool,
    fail_commit: bool,
    ports: HashMap<u16, u16>,
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_runs(self, count: usize) -> Self {
        *self.failing_runs.lock().unwrap() = count;
        self
    }

    pub fn with_failing_exec(mut self) -> Self {
        self.fail_exec = true;
        self
    }

    pub fn with_failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn with_mapped_port(mut self, container_port: u16, host_port: u16) -> Self {
        self.ports.insert(container_port, host_port);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn run_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Run(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ContainerRuntime for RecordingRuntime {
    fn run(&self, spec: &RunSpec) -> Result<ContainerId> {
        self.record(Call::Run(spec.clone()));
        let mut failing = self.failing_runs.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(RuntimeError::CommandFailed {
                command: "run".to_string(),
                stderr: "simulated start failure".to_string(),
            });
        }
        Ok(ContainerId::new(format!("fake-{}", self.run_count())))
    }

    fn copy_into(&self, id: &ContainerId, source: &Path, destination: &str) -> Result<()> {
        self.record(Call::CopyInto {
            id: id.clone(),
            source: source.to_path_buf(),
            destination: destination.to_string(),
        });
        Ok(())
    }

    fn exec(&self, id: &ContainerId, command: &[&str]) -> Result<ExecOutput> {
        self.record(Call::Exec {
            id: id.clone(),
            command: command.iter().map(|s| s.to_string()).collect(),
        });
        if self.fail_exec {
            return Err(RuntimeError::CommandFailed {
                command: "exec".to_string(),
                stderr: "simulated exec failure".to_string(),
            });
        }
        Ok(ExecOutput::default())
    }

    fn commit(&self, id: &ContainerId, image: &ImageRef) -> Result<()> {
        self.record(Call::Commit {
            id: id.clone(),
            image: image.clone(),
        });
        if self.fail_commit {
            return Err(RuntimeError::CommandFailed {
                command: "commit".to_string(),
                stderr: "simulated commit failure".to_string(),
            });
        }
        Ok(())
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        self.record(Call::Stop(id.clone()));
        Ok(())
    }

    fn remove(&self, name_or_id: &str) -> Result<()> {
        self.record(Call::Remove(name_or_id.to_string()));
        Ok(())
    }

    fn mapped_port(&self, _id: &ContainerId, container_port: u16) -> Result<u16> {
        self.ports
            .get(&container_port)
            .copied()
            .ok_or_else(|| RuntimeError::UnexpectedOutput {
                command: "port".to_string(),
                output: format!("no binding for {container_port}/tcp"),
            })
    }

    fn logs(&self, id: &ContainerId) -> Result<String> {
        Ok(format!("logs of {id}"))
    }

    fn host(&self) -> String {
        "localhost".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failing_runs_then_success() {
        let runtime = RecordingRuntime::new().with_failing_runs(2);
        let spec = RunSpec::new("mysql:5.7");

        assert!(runtime.run(&spec).is_err());
        assert!(runtime.run(&spec).is_err());
        let id = runtime.run(&spec).unwrap();

        assert_eq!(id.as_str(), "fake-3");
        assert_eq!(runtime.run_count(), 3);
    }
}
