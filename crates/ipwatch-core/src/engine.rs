//! Core tick engine
//!
//! The TickEngine is responsible for:
//! - Resolving the current public IPv4 address via IpResolver
//! - Deciding what the sample means against the persisted history
//! - Applying the resulting store mutations
//!
//! ## Decision flow per tick
//!
//! ```text
//! ┌─────────────┐
//! │ IpResolver  │─── Ipv4Addr ──────┐
//! └─────────────┘                   │
//!        │ failure                  ▼
//!        │                  ┌──────────────┐
//!        │                  │  TickEngine  │
//!        │                  └──────────────┘
//!        │                          │
//!        ▼                          ▼
//! ┌─────────────┐           ┌──────────────┐
//! │ error event │           │ HistoryStore │
//! │ (append)    │           │ (read/write) │
//! └─────────────┘           └──────────────┘
//! ```
//!
//! The engine holds no state across invocations: "current period" is a
//! store query, never a cached field, so the job is safely restartable
//! after a crash.

use std::net::Ipv4Addr;

use tracing::{error, info, warn};

use crate::error::Result;
use crate::store::HistoryStore;
use crate::traits::IpResolver;

/// What a single tick concluded about the sample
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// First-ever observation: the store was empty
    FirstRun { ip: Ipv4Addr },

    /// The address matches the current period; its `last_seen` advanced
    Continued {
        ip: Ipv4Addr,
        since_last_secs: f64,
        gap_recorded: bool,
    },

    /// The address differs from the current period; a new period was opened
    Changed {
        ip: Ipv4Addr,
        previous: Ipv4Addr,
        gap_recorded: bool,
    },

    /// Resolution failed; an error event was recorded, no period touched
    ResolutionFailed { message: String },
}

/// Core tick engine
///
/// One instance per process invocation. Construct with [`TickEngine::new`],
/// then call [`TickEngine::run_tick`] exactly once per scheduler tick.
pub struct TickEngine {
    /// Resolver for the current public address
    resolver: Box<dyn IpResolver>,

    /// Interval between successful samples above which a gap event is
    /// persisted, in seconds
    gap_threshold_secs: f64,
}

impl TickEngine {
    /// Create a new tick engine
    pub fn new(resolver: Box<dyn IpResolver>, gap_threshold_secs: f64) -> Self {
        Self {
            resolver,
            gap_threshold_secs,
        }
    }

    /// Run one tick: resolve, decide, persist.
    ///
    /// Resolution failure is handled locally (error event appended, outcome
    /// [`TickOutcome::ResolutionFailed`]) and is *not* an `Err`: the
    /// scheduler tick must not abort for it. Store failures are fatal to
    /// the tick and propagate.
    pub async fn run_tick(&self, store: &HistoryStore, now: f64) -> Result<TickOutcome> {
        let resolve_started = std::time::Instant::now();
        match self.resolver.resolve().await {
            Ok(ip) => {
                info!(
                    "resolved public ip {} in {:.3}s",
                    ip,
                    resolve_started.elapsed().as_secs_f64()
                );
                self.process_sample(ip, now, store)
            }
            Err(e) => {
                warn!("ip resolution failed: {}", e);
                let message = e.to_string();
                store.insert_error(now, &message)?;
                Ok(TickOutcome::ResolutionFailed { message })
            }
        }
    }

    /// Apply the decision algorithm for one successfully resolved sample.
    ///
    /// Reads the current observation period, then either opens the first
    /// period, advances the matching one, or opens a new one for a changed
    /// address. A gap event is recorded independently of the same/changed
    /// branch whenever the interval since the previous sample exceeds the
    /// threshold.
    pub fn process_sample(
        &self,
        ip: Ipv4Addr,
        now: f64,
        store: &HistoryStore,
    ) -> Result<TickOutcome> {
        let Some(prev) = store.current_period()? else {
            info!("first run, opening period for {}", ip);
            let id = store.insert_period(ip, now)?;
            if id != 1 {
                // row-count surprises are logged, not fatal: keep recording
                error!("expected first period to get id 1, got {}", id);
            }
            return Ok(TickOutcome::FirstRun { ip });
        };

        let since_last = now - prev.last_seen;

        let gap_recorded = if since_last > self.gap_threshold_secs {
            let reason = format!("no successful sample for {:.1}s", since_last);
            warn!(
                "scheduler gap detected: {:.1}s since last sample (threshold {:.0}s)",
                since_last, self.gap_threshold_secs
            );
            store.insert_gap(prev.last_seen, now, Some(&reason))?;
            true
        } else {
            false
        };

        if ip == prev.ip {
            info!(
                "ip unchanged ({}), {:.1}s since last sample",
                ip, since_last
            );
            let affected = store.touch_period(prev.id, now)?;
            if affected != 1 {
                error!(
                    "expected touch of period {} to affect 1 row, affected {}",
                    prev.id, affected
                );
            }
            Ok(TickOutcome::Continued {
                ip,
                since_last_secs: since_last,
                gap_recorded,
            })
        } else {
            info!("ip changed: {} -> {}", prev.ip, ip);
            store.insert_period(ip, now)?;
            Ok(TickOutcome::Changed {
                ip,
                previous: prev.ip,
                gap_recorded,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedResolver(Ipv4Addr);

    #[async_trait]
    impl IpResolver for FixedResolver {
        async fn resolve(&self) -> Result<Ipv4Addr> {
            Ok(self.0)
        }
    }

    fn engine(ip: &str) -> TickEngine {
        TickEngine::new(Box::new(FixedResolver(ip.parse().unwrap())), 180.0)
    }

    #[test]
    fn identical_samples_keep_a_single_period() {
        let store = HistoryStore::open_in_memory().unwrap();
        let engine = engine("1.2.3.4");
        let ip = "1.2.3.4".parse().unwrap();

        engine.process_sample(ip, 1000.0, &store).unwrap();
        engine.process_sample(ip, 1040.0, &store).unwrap();
        engine.process_sample(ip, 1090.0, &store).unwrap();

        assert_eq!(store.count_periods().unwrap(), 1);
        let current = store.current_period().unwrap().unwrap();
        assert_eq!(current.first_seen, 1000.0);
        assert_eq!(current.last_seen, 1090.0);
        assert_eq!(store.count_gaps().unwrap(), 0);
    }
}
