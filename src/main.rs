//! Command-line interface for the sort e2e fixtures
//!
//! # Usage Examples
//!
//! ## MySQL
//! ```bash
//! # Start MySQL 5.7 on port 33306 and print its JDBC URL
//! sort-e2e-fixtures mysql up
//!
//! # Root without a password, extra JDBC parameters
//! sort-e2e-fixtures mysql up --username root --password "" \
//!   --url-param serverTimezone=UTC
//!
//! sort-e2e-fixtures mysql down
//! ```
//!
//! ## StarRocks
//! ```bash
//! sort-e2e-fixtures starrocks build-image --script docker/starrocks/start_fe_be.sh
//! sort-e2e-fixtures starrocks up --ready-timeout 5m
//! sort-e2e-fixtures starrocks init-table
//! ```
//!
//! Every command accepts `--config fixtures.toml`; flags override the profile.

use anyhow::Context;
use clap::{Parser, Subcommand};
use docker_runtime::{ContainerId, ContainerRuntime, DockerCli};
use sort_e2e_fixtures::{mysql, starrocks, FixtureProfile, MySqlOpts, StarRocksOpts};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "sort-e2e-fixtures")]
#[command(about = "Docker fixtures for the sort pipeline end-to-end tests")]
#[command(long_about = None)]
struct Cli {
    /// Fixture profile (TOML)
    #[arg(long, global = true, env = "SORT_FIXTURES_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// MySQL source fixture
    Mysql {
        #[command(subcommand)]
        action: MySqlCommand,
    },
    /// StarRocks sink fixture
    Starrocks {
        #[command(subcommand)]
        action: StarRocksCommand,
    },
}

#[derive(Subcommand)]
enum MySqlCommand {
    /// Start MySQL and wait until it accepts queries
    Up(MySqlOpts),
    /// Stop and remove the MySQL container
    Down {
        /// Container name
        #[arg(long, default_value = mysql::DEFAULT_CONTAINER_NAME)]
        name: String,
    },
}

#[derive(Subcommand)]
enum StarRocksCommand {
    /// Commit inlong-starrocks:latest with the FE/BE startup script
    BuildImage {
        /// Startup script (default: docker/starrocks/start_fe_be.sh in an ancestor directory)
        #[arg(long, env = "SORT_STARROCKS_SCRIPT")]
        script: Option<PathBuf>,
    },
    /// Start StarRocks and create the fixture database
    Up(StarRocksOpts),
    /// Create test_output1 in a running StarRocks fixture
    InitTable(StarRocksOpts),
    /// Stop and remove the StarRocks container
    Down {
        /// Container name
        #[arg(long, default_value = starrocks::DEFAULT_CONTAINER_NAME)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let profile = match &cli.config {
        Some(path) => FixtureProfile::load(path)?,
        None => FixtureProfile::default(),
    };
    let docker = Arc::new(DockerCli::from_env());

    match cli.command {
        Commands::Mysql { action } => match action {
            MySqlCommand::Up(opts) => {
                let timeout = opts.ready_timeout(&profile.mysql)?;
                let mut mysql = opts
                    .resolve(&profile.mysql)?
                    .with_runtime(docker.clone());
                if let Err(e) = mysql.start_and_wait(timeout).await {
                    if let Ok(logs) = mysql.logs() {
                        eprintln!("{logs}");
                    }
                    return Err(e).context("MySQL did not become ready");
                }

                println!("jdbc_url={}", mysql.jdbc_url()?);
                println!("connection_url={}", mysql.connection_url()?);
                println!("driver={}", mysql.driver_class_name());
                if let Some(id) = mysql.detach() {
                    info!("MySQL container {} left running", id);
                }
            }
            MySqlCommand::Down { name } => {
                docker
                    .remove(&name)
                    .with_context(|| format!("Failed to remove container {name}"))?;
                info!("Removed {}", name);
            }
        },
        Commands::Starrocks { action } => match action {
            StarRocksCommand::BuildImage { script } => {
                let script = match script.or(profile.starrocks.script.clone()) {
                    Some(script) => script,
                    None => starrocks::find_startup_script()?,
                };
                let image = starrocks::build_starrocks_image(docker.as_ref(), &script)
                    .context("Failed to build StarRocks image")?;
                println!("image={image}");
            }
            StarRocksCommand::Up(opts) => {
                let timeout = opts.ready_timeout(&profile.starrocks)?;
                let mut fixture = opts.resolve(&profile.starrocks).with_runtime(docker.clone());
                fixture.start().context("Failed to start StarRocks")?;
                fixture
                    .wait_until_ready(timeout)
                    .await
                    .context("StarRocks did not become ready")?;

                println!("jdbc_url={}", fixture.jdbc_url()?);
                if let Some(id) = fixture.detach() {
                    info!("StarRocks container {} left running", id);
                }
            }
            StarRocksCommand::InitTable(opts) => {
                let name = opts.container_name(&profile.starrocks);
                let fixture = opts
                    .resolve(&profile.starrocks)
                    .with_runtime(docker.clone())
                    .with_container_id(ContainerId::new(name));
                let result = starrocks::initialize_starrocks_table(&fixture).await;
                // Attached, not owned: never stop it on drop
                fixture.detach();
                result.context("Failed to create test_output1")?;
                println!("table={}", starrocks::TEST_OUTPUT_TABLE);
            }
            StarRocksCommand::Down { name } => {
                docker
                    .remove(&name)
                    .with_context(|| format!("Failed to remove container {name}"))?;
                info!("Removed {}", name);
            }
        },
    }

    Ok(())
}
