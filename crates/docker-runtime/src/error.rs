use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Failed to invoke docker: {0}")]
    Io(#[from] std::io::Error),

    #[error("docker {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Unexpected output from docker {command}: {output}")]
    UnexpectedOutput { command: String, output: String },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
