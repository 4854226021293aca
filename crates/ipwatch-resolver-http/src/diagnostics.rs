//! Reachability diagnostics for total resolution failure
//!
//! When every echo endpoint fails the interesting question for the operator
//! is "is the box offline, or are the services down?". These probes answer
//! that in the logs and nowhere else: they never touch the store and never
//! fail the tick.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{info, warn};

/// Well-known anycast resolvers; if neither accepts a TCP connect on port
/// 53, the local network path is almost certainly down.
const PROBE_TARGETS: &[&str] = &["1.1.1.1:53", "8.8.8.8:53"];

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Probe basic network reachability and log the results.
///
/// Log-only: returns nothing and swallows every failure.
pub async fn log_reachability_diagnostics() {
    for target in PROBE_TARGETS {
        match timeout(PROBE_TIMEOUT, TcpStream::connect(target)).await {
            Ok(Ok(_)) => info!("reachability probe {}: ok", target),
            Ok(Err(e)) => warn!("reachability probe {}: connect failed: {}", target, e),
            Err(_) => warn!(
                "reachability probe {}: no answer within {:?}",
                target, PROBE_TIMEOUT
            ),
        }
    }
}
