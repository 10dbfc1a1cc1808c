use crate::{ContainerError, Result};
use mysql_async::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// Polls until `query` succeeds over a fresh connection or `timeout` elapses.
///
/// Every attempt, including the connection handshake, is bounded by the time
/// left, so a server that accepts TCP but never answers cannot stall past
/// `timeout`.
pub async fn wait_for_query(opts: mysql_async::Opts, query: &str, timeout: Duration) -> Result<()> {
    info!("Waiting for database to be ready...");
    let start = Instant::now();
    let deadline = start + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, try_query(opts.clone(), query)).await {
            Ok(Ok(())) => {
                info!("Database is ready after {:?}", start.elapsed());
                return Ok(());
            }
            Ok(Err(e)) => debug!("Connection attempt failed: {}", e),
            Err(_) => debug!("Connection attempt timed out"),
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(RETRY_INTERVAL.min(remaining)).await;
    }

    Err(ContainerError::ReadyTimeout(timeout.as_secs()))
}

async fn try_query(opts: mysql_async::Opts, query: &str) -> std::result::Result<(), mysql_async::Error> {
    let mut conn = mysql_async::Conn::new(opts).await?;
    let result = conn.query_drop(query).await;
    conn.disconnect().await?;
    result
}
