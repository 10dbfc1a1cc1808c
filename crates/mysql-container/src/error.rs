use docker_runtime::RuntimeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Invalid container configuration: {0}")]
    Configuration(String),

    #[error("Container has not been started")]
    NotStarted,

    #[error("Container failed to start after {attempts} attempt(s)")]
    Startup {
        attempts: u32,
        /// Failure of the last attempt
        #[source]
        source: Box<ContainerError>,
    },

    #[error("Container runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Database did not become ready within {0} seconds")]
    ReadyTimeout(u64),

    #[error("MySQL error: {0}")]
    Sql(#[from] mysql_async::Error),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
