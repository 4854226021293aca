// # ipwatch - public IP history batch job
//
// The ipwatch binary is a THIN integration layer:
// 1. Reading configuration from environment variables
// 2. Initializing tracing
// 3. Running one tick (resolve -> decide -> persist)
// 4. Rendering the HTML report
//
// All decision logic lives in ipwatch-core; all HTTP lives in
// ipwatch-resolver-http. The binary is invoked with no arguments, once per
// scheduler tick (e.g. a crontab minute entry), and exits when done.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `IPWATCH_DB_PATH`: SQLite database path (default: public_ip.db)
// - `IPWATCH_REPORT_PATH`: HTML report path (default: index.html)
// - `IPWATCH_ENDPOINTS`: comma-separated IP-echo URL override
// - `IPWATCH_TIMEOUT_SECS`: per-endpoint HTTP timeout (default: 5)
// - `IPWATCH_GAP_THRESHOLD_SECS`: persisted gap threshold (default: 180)
// - `IPWATCH_REPORT_GAP_THRESHOLD_SECS`: display-only STRANGE threshold
//   (default: 90)
// - `IPWATCH_LOG_LEVEL`: trace|debug|info|warn|error (default: info)
//
// ## Example
//
// ```bash
// export IPWATCH_DB_PATH=/var/lib/ipwatch/public_ip.db
// export IPWATCH_REPORT_PATH=/var/www/ip/index.html
//
// ipwatch
// ```

use std::env;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use ipwatch_core::{
    HistoryStore, ReportMeta, TickEngine, TickOutcome, WatchConfig, render_report, write_report,
};
use ipwatch_resolver_http::HttpIpResolver;

/// Exit codes for different termination scenarios
///
/// - 0: Tick completed (a handled resolution failure is still a completed tick)
/// - 1: Configuration error
/// - 2: Runtime error (store unavailable, report write failure)
#[derive(Debug, Clone, Copy)]
enum IpwatchExitCode {
    CleanTick = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<IpwatchExitCode> for ExitCode {
    fn from(code: IpwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Load configuration from environment variables
fn config_from_env() -> Result<(WatchConfig, String)> {
    let mut config = WatchConfig::new();

    if let Ok(path) = env::var("IPWATCH_DB_PATH") {
        config.db_path = path;
    }
    if let Ok(path) = env::var("IPWATCH_REPORT_PATH") {
        config.report_path = path;
    }
    if let Ok(list) = env::var("IPWATCH_ENDPOINTS") {
        config.endpoints = list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(raw) = env::var("IPWATCH_TIMEOUT_SECS") {
        config.timeout_secs = raw
            .parse()
            .map_err(|_| anyhow::anyhow!("IPWATCH_TIMEOUT_SECS must be an integer, got {:?}", raw))?;
    }
    if let Ok(raw) = env::var("IPWATCH_GAP_THRESHOLD_SECS") {
        config.gap_threshold_secs = raw.parse().map_err(|_| {
            anyhow::anyhow!("IPWATCH_GAP_THRESHOLD_SECS must be a number, got {:?}", raw)
        })?;
    }
    if let Ok(raw) = env::var("IPWATCH_REPORT_GAP_THRESHOLD_SECS") {
        config.report_gap_threshold_secs = raw.parse().map_err(|_| {
            anyhow::anyhow!(
                "IPWATCH_REPORT_GAP_THRESHOLD_SECS must be a number, got {:?}",
                raw
            )
        })?;
    }

    let log_level = env::var("IPWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    match log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        other => anyhow::bail!(
            "IPWATCH_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            other
        ),
    }

    config.validate()?;
    Ok((config, log_level))
}

fn main() -> ExitCode {
    let (config, log_level) = match config_from_env() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return IpwatchExitCode::ConfigError.into();
        }
    };

    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IpwatchExitCode::ConfigError.into();
    }

    // the whole pipeline is sequential; one thread is all there is to schedule
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpwatchExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_tick_job(config).await {
            Ok(()) => IpwatchExitCode::CleanTick,
            Err(e) => {
                error!("tick failed: {}", e);
                IpwatchExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run one full tick: resolve -> decide -> persist -> render
async fn run_tick_job(config: WatchConfig) -> Result<()> {
    let tick_started = Instant::now();

    let store = HistoryStore::open(&config.db_path)?;

    let resolver = HttpIpResolver::with_endpoints(
        config.endpoints.clone(),
        Duration::from_secs(config.timeout_secs),
    );
    let engine = TickEngine::new(Box::new(resolver), config.gap_threshold_secs);

    let outcome = engine.run_tick(&store, unix_now()).await?;
    match &outcome {
        TickOutcome::FirstRun { ip } => info!("first run, recorded {}", ip),
        TickOutcome::Continued {
            ip,
            since_last_secs,
            ..
        } => info!("ip {} unchanged, {:.1}s since last run", ip, since_last_secs),
        TickOutcome::Changed { ip, previous, .. } => {
            info!("ip changed {} -> {}", previous, ip)
        }
        TickOutcome::ResolutionFailed { message } => {
            error!("resolution failed: {}", message);
            // operator visibility only; the tick already recorded the error
            ipwatch_resolver_http::diagnostics::log_reachability_diagnostics().await;
        }
    }

    // best effort over whatever history exists, including after a failed tick
    let report_started = Instant::now();
    let meta = ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: unix_now(),
    };
    let html = render_report(&store, config.report_gap_threshold_secs, &meta)?;
    write_report(&config.report_path, &html)?;
    info!(
        "report written to {} in {:.3}s",
        config.report_path,
        report_started.elapsed().as_secs_f64()
    );

    store.close()?;
    info!("tick took {:.3}s", tick_started.elapsed().as_secs_f64());
    Ok(())
}

/// Current unix time with sub-second precision
fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}
