//! Periodic external uptime ping, independent of message handling.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawn the heartbeat loop: GET the configured URL every `interval_secs`.
/// Failures are logged at debug level and never affect the rest of the process.
pub fn start(url: String, interval_secs: u64) -> JoinHandle<()> {
    log::info!("heartbeat: pinging {} every {}s", url, interval_secs);
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // First tick fires immediately; skip it so the ping cadence starts
        // one interval after boot.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match client.get(&url).send().await {
                Ok(res) if res.status().is_success() => {
                    log::debug!("heartbeat ping ok");
                }
                Ok(res) => {
                    log::debug!("heartbeat ping returned {}", res.status());
                }
                Err(e) => {
                    log::debug!("heartbeat ping failed: {}", e);
                }
            }
        }
    })
}
