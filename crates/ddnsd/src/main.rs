// # ddnsd - DNSPod DDNS Daemon
//
// Thin integration layer: reads the environment, loads the JSON record
// configuration, wires the TCP echo resolver and the DNSPod client into the
// engine and runs it until SIGTERM/SIGINT. All reconciliation logic lives in
// ddns-core.
//
// ## Configuration
//
// - `DDNS_CONFIG`: path to the JSON configuration file (required)
// - `DDNS_INTERVAL_SECS`: overrides `engine.interval_secs` from the file
// - `DDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export DDNS_CONFIG=/etc/ddns/config.json
// export DDNS_LOG_LEVEL=debug
//
// ddnsd
// ```
//
// with `/etc/ddns/config.json`:
//
// ```json
// {
//   "credentials": { "token_id": "12345", "token": "..." },
//   "records": [
//     { "domain": "example.com", "sub_domain": "home" },
//     { "domain": "example.com", "sub_domain": "v6", "record_type": "AAAA" }
//   ]
// }
// ```

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, DdnsEngine, EngineEvent, Error};
use ddns_ip_echo::EchoIpResolver;
use ddns_provider_dnspod::DnspodClient;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
/// - 3: The provider refused the credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// Credential validation failed
    CredentialInvalid = 3,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DdnsExitCode {
    /// Exit code for an error returned by the engine
    fn for_engine_error(err: &Error) -> Self {
        match err {
            Error::CredentialInvalid(_) => DdnsExitCode::CredentialInvalid,
            Error::Config(_) => DdnsExitCode::ConfigError,
            _ => DdnsExitCode::RuntimeError,
        }
    }
}

/// Settings taken from the environment
#[derive(Debug)]
struct DaemonEnv {
    config_path: PathBuf,
    interval_secs: Option<u64>,
    log_level: Level,
}

impl DaemonEnv {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = lookup("DDNS_CONFIG")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .context(
                "DDNS_CONFIG is required. \
                Set it via: export DDNS_CONFIG=/etc/ddns/config.json",
            )?;

        let interval_secs = match lookup("DDNS_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().with_context(|| {
                    format!("DDNS_INTERVAL_SECS must be a number of seconds. Got: {}", raw)
                })?;
                if secs == 0 {
                    anyhow::bail!("DDNS_INTERVAL_SECS must be greater than 0");
                }
                Some(secs)
            }
            None => None,
        };

        let log_level = match lookup("DDNS_LOG_LEVEL") {
            Some(raw) => parse_log_level(&raw)?,
            None => Level::INFO,
        };

        Ok(Self {
            config_path,
            interval_secs,
            log_level,
        })
    }

    /// Load the configuration file and apply environment overrides
    fn load_config(&self) -> Result<DdnsConfig> {
        let mut config = DdnsConfig::load(&self.config_path)
            .with_context(|| format!("failed to load {}", self.config_path.display()))?;

        if let Some(secs) = self.interval_secs {
            config.engine.interval_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}

fn main() -> ExitCode {
    let daemon_env = match DaemonEnv::from_env() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(daemon_env.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config = match daemon_env.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration validation error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Starting ddnsd daemon");
    info!(
        "Configuration loaded: {} record(s), interval {}s",
        config.records.len(),
        config.engine.interval_secs
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Run the daemon until a shutdown signal or a fatal engine error
async fn run_daemon(config: DdnsConfig) -> DdnsExitCode {
    let resolver = EchoIpResolver::from_config(&config);
    let directory = match DnspodClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create DNSPod client: {}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    for record in &config.records {
        info!("Managing record: {} ({})", record.fqdn(), record.record_type);
    }

    let created = DdnsEngine::new(Box::new(resolver), Box::new(directory), config);
    let (engine, event_rx) = match created {
        Ok(created) => created,
        Err(e) => {
            error!("Failed to create engine: {}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let mut signals = match ShutdownSignals::install() {
        Ok(signals) => signals,
        Err(e) => {
            error!("Shutdown error: {:#}", e);
            return DdnsExitCode::RuntimeError;
        }
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let signal_task = tokio::spawn(async move {
        let name = signals.recv().await;
        info!("Received shutdown signal: {}", name);
        let _ = shutdown_tx.send(());
    });

    let events_task = tokio::spawn(log_events(event_rx));

    let result = engine.run_with_shutdown(Some(shutdown_rx)).await;

    signal_task.abort();
    // Dropping the engine closes the event channel
    drop(engine);
    let _ = events_task.await;

    match result {
        Ok(()) => {
            info!("Shutting down daemon");
            DdnsExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Daemon error: {}", e);
            DdnsExitCode::for_engine_error(&e)
        }
    }
}

/// Drain engine events into the log
async fn log_events(mut event_rx: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = event_rx.recv().await {
        match event {
            EngineEvent::CycleCompleted { succeeded, failed } if failed > 0 => {
                warn!("Cycle finished with {} failure(s), {} ok", failed, succeeded);
            }
            other => debug!("Engine event: {:?}", other),
        }
    }
}

/// SIGTERM and SIGINT handlers, installed before the engine starts
#[cfg(unix)]
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?,
            sigint: signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?,
        })
    }

    /// Wait for either signal, returning its name
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// CTRL-C only on non-Unix platforms
#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
        }
        "SIGINT"
    }
}
