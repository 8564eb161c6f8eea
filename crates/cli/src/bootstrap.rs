//! Startup helpers: collaborator construction with fixed-delay retry and
//! the process exit codes for the failures that cannot be retried away.

use std::{future::Future, time::Duration};

use {herald_config::StartupConfig, tracing::warn};

/// Process exit codes for unrecoverable startup failures.
pub mod exit {
    pub const TRANSPORT: i32 = 10;
    pub const MODULE_INIT: i32 = 11;
    pub const CACHE: i32 = 12;
    pub const STORE: i32 = 13;
}

/// Run `op` until it succeeds, waiting a fixed delay between attempts.
/// Gives up after `startup.retry_attempts` tries and returns the last error.
pub async fn with_retry<T, F, Fut>(
    startup: &StartupConfig,
    what: &str,
    mut op: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = startup.retry_attempts.max(1);
    let delay = Duration::from_secs(startup.retry_delay_secs);
    let mut last = None;
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(what, attempt, attempts, error = %e, "startup step failed");
                last = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            },
        }
    }
    Err(last.unwrap_or_else(|| anyhow::anyhow!("{what}: startup gave up")))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn startup(attempts: u32) -> StartupConfig {
        StartupConfig {
            retry_delay_secs: 0,
            retry_attempts: attempts,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&startup(5), "thing", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                anyhow::bail!("not yet");
            }
            Ok(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_configured_attempts() {
        let calls = AtomicU32::new(0);
        let result: anyhow::Result<()> = with_retry(&startup(3), "thing", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("still down");
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
