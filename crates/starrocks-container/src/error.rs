use docker_runtime::RuntimeError;
use mysql_container::ContainerError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarRocksError {
    #[error("Container runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("StarRocks SQL error: {0}")]
    Sql(#[from] mysql_async::Error),

    #[error("Startup script not found: {0}")]
    ScriptNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, StarRocksError>;
