//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Validating the provider credentials once at startup
//! - Resolving the public IP at the start of every cycle
//! - Matching or creating remote records (see [`sync`])
//! - Pushing the current IP to every record (see [`reconcile`])
//! - Repeating the above on a fixed interval until shutdown
//!
//! ## Architecture
//!
//! ```text
//!                 tick (interval)
//!                       │
//!                       ▼
//! ┌─────────────┐  ┌──────────────┐  ┌─────────────────┐
//! │ IpResolver  │─▶│ DdnsEngine   │─▶│ RecordDirectory │
//! │ (resolve)   │  │ (reconcile)  │  │ list/create/mod │
//! └─────────────┘  └──────────────┘  └─────────────────┘
//!                       │
//!                       ▼
//!                 EngineEvent (notify)
//! ```
//!
//! ## Failure Model
//!
//! Credential validation failure is fatal and returned from [`DdnsEngine::run`]
//! before any cycle starts. Everything else is contained: an IP resolution
//! failure ends the current cycle, a record failure only affects that record,
//! and the next tick starts over regardless.

pub mod reconcile;
pub mod sync;

use std::net::IpAddr;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::record::DesiredRecord;
use crate::traits::{IpResolver, RecordDirectory};
use reconcile::{CycleReport, RecordAction};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { records_count: usize },

    /// Provider accepted the credentials
    CredentialsValidated,

    /// A reconciliation cycle began
    CycleStarted,

    /// Public IP resolved for the current cycle
    IpResolved { ip: IpAddr },

    /// A missing remote record was created
    RecordCreated { record_name: String, remote_id: String },

    /// A record update was accepted by the provider
    RecordUpdated {
        record_name: String,
        remote_id: String,
        ip: IpAddr,
    },

    /// A record could not be reconciled this cycle
    RecordFailed { record_name: String, error: String },

    /// The cycle ended before touching any record
    CycleFailed { error: String },

    /// The cycle went through every record
    CycleCompleted { succeeded: usize, failed: usize },

    /// Engine stopped
    Stopped { reason: String },
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`]
/// 3. Credentials are validated, then cycles run on every tick
/// 4. Engine runs until shutdown signal received
///
/// ## Threading
///
/// All cycles run on the caller's task, one at a time. The record set is
/// held behind an async mutex for the duration of a cycle, so a record is
/// never matched or created twice concurrently.
pub struct DdnsEngine {
    /// Public IP source
    resolver: Box<dyn IpResolver>,

    /// Provider record API
    directory: Box<dyn RecordDirectory>,

    /// Desired records, with remote ids cached once resolved
    records: Mutex<Vec<DesiredRecord>>,

    /// Time between two cycle starts
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        resolver: Box<dyn IpResolver>,
        directory: Box<dyn RecordDirectory>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            resolver,
            directory,
            records: Mutex::new(config.records),
            interval: config.engine.interval(),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Override the cycle interval
    ///
    /// Configuration only allows whole seconds; tests need less.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Snapshot of the record set, including resolved remote ids
    pub async fn records(&self) -> Vec<DesiredRecord> {
        self.records.lock().await.clone()
    }

    /// Run the engine until SIGINT
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error::CredentialInvalid)`: The provider refused the credentials
    /// - `Err(Error)`: Credential validation could not be performed
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// With `None`, behaves like [`DdnsEngine::run`]. A cycle in progress is
    /// finished before shutdown is observed.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let records_count = self.records.lock().await.len();
        self.emit_event(EngineEvent::Started { records_count });
        info!(
            "Engine started: {} record(s), interval {:?}",
            records_count, self.interval
        );

        if let Err(e) = self.validate_credentials().await {
            self.emit_event(EngineEvent::Stopped {
                reason: e.to_string(),
            });
            return Err(e);
        }

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }

                Some(_) = ticks.next() => {
                    let report = self.run_cycle().await;
                    debug!(
                        "Cycle took {} ms",
                        (report.finished_at - report.started_at).num_milliseconds()
                    );
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    /// Check the credentials with the provider
    ///
    /// A provider rejection (or an unreadable answer) becomes
    /// [`Error::CredentialInvalid`]. Network errors are returned unchanged,
    /// since they say nothing about the token.
    pub async fn validate_credentials(&self) -> Result<()> {
        match self.directory.validate_credentials().await {
            Ok(()) => {
                info!(
                    "Credentials accepted by {}",
                    self.directory.provider_name()
                );
                self.emit_event(EngineEvent::CredentialsValidated);
                Ok(())
            }
            Err(Error::ProviderRejected { code, message }) => {
                error!("Credential validation failed (code {}): {}", code, message);
                Err(Error::credential(format!("{} (code {})", message, code)))
            }
            Err(Error::MalformedResponse(msg)) => {
                error!("Credential validation returned an unreadable response: {}", msg);
                Err(Error::credential(msg))
            }
            Err(e) => {
                error!("Credential validation could not be performed: {}", e);
                Err(e)
            }
        }
    }

    /// Run one reconciliation cycle
    ///
    /// Never fails: every problem ends up in the returned report and the log.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        self.emit_event(EngineEvent::CycleStarted);
        info!("--- Reconciliation cycle started ---");

        let ip = match self.resolve_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                error!("Cycle aborted, public IP unavailable: {}", e);
                self.emit_event(EngineEvent::CycleFailed {
                    error: e.to_string(),
                });
                return CycleReport::aborted(started_at, e);
            }
        };

        info!("Current public IP: {}", ip);
        self.emit_event(EngineEvent::IpResolved { ip });

        let outcomes = {
            let mut records = self.records.lock().await;
            reconcile::reconcile(self.directory.as_ref(), ip, &mut records).await
        };

        for outcome in &outcomes {
            match &outcome.result {
                Ok(RecordAction::Updated { remote_id, created }) => {
                    if *created {
                        self.emit_event(EngineEvent::RecordCreated {
                            record_name: outcome.name.clone(),
                            remote_id: remote_id.clone(),
                        });
                    }
                    self.emit_event(EngineEvent::RecordUpdated {
                        record_name: outcome.name.clone(),
                        remote_id: remote_id.clone(),
                        ip,
                    });
                }
                Err(e) => {
                    self.emit_event(EngineEvent::RecordFailed {
                        record_name: outcome.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            ip: Some(ip),
            error: None,
            outcomes,
        };

        info!(
            "--- Reconciliation cycle finished: {} updated, {} failed ---",
            report.succeeded(),
            report.failed()
        );
        self.emit_event(EngineEvent::CycleCompleted {
            succeeded: report.succeeded(),
            failed: report.failed(),
        });

        report
    }

    /// Resolve and validate the public IP
    async fn resolve_ip(&self) -> Result<IpAddr> {
        let raw = self.resolver.resolve().await?;
        let text = raw.trim();

        if text.is_empty() {
            return Err(Error::malformed(format!(
                "{} returned an empty address",
                self.resolver.resolver_name()
            )));
        }

        text.parse().map_err(|_| {
            Error::malformed(format!(
                "{} returned an invalid address: {:?}",
                self.resolver.resolver_name(),
                text
            ))
        })
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_events_compare_by_value() {
        let event = EngineEvent::RecordUpdated {
            record_name: "home.example.com".to_string(),
            remote_id: "123".to_string(),
            ip: IpAddr::from([203, 0, 113, 5]),
        };

        assert_eq!(event.clone(), event);
    }
}
