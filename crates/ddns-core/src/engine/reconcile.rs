//! One reconciliation pass over the desired record set

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::sync::{Resolution, match_or_create};
use crate::error::{Error, Result};
use crate::record::DesiredRecord;
use crate::traits::RecordDirectory;

/// What happened to a record that was reconciled successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordAction {
    /// The update call was accepted
    Updated {
        remote_id: String,
        /// The remote record was created during this pass
        created: bool,
    },
}

/// Per-record result of a pass
#[derive(Debug)]
pub struct RecordOutcome {
    /// `sub_domain.domain`
    pub name: String,
    pub result: Result<RecordAction>,
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Report for one reconciliation cycle
#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The address used for this cycle, `None` when resolution failed
    pub ip: Option<IpAddr>,
    /// Set when the cycle ended before touching any record
    pub error: Option<Error>,
    /// One entry per record, in configuration order
    pub outcomes: Vec<RecordOutcome>,
}

impl CycleReport {
    /// A cycle that failed before reaching the records
    pub fn aborted(started_at: DateTime<Utc>, error: Error) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            ip: None,
            error: Some(error),
            outcomes: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when the cycle ran and every record was updated
    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.failed() == 0
    }
}

/// Reconcile every record against the provider using `ip`
///
/// Records are handled one after another, each in its own failure boundary:
/// an error on one record is recorded in its outcome and the next record is
/// still processed. Nothing is retried here.
///
/// `remote_id` is filled in on records that get matched or created, and kept
/// even if the subsequent update fails.
pub async fn reconcile(
    directory: &dyn RecordDirectory,
    ip: IpAddr,
    records: &mut [DesiredRecord],
) -> Vec<RecordOutcome> {
    let mut outcomes = Vec::with_capacity(records.len());

    for record in records.iter_mut() {
        let name = record.fqdn();
        let result = reconcile_record(directory, ip, record).await;

        match &result {
            Err(e) if e.is_transient() => warn!(
                "Failed to reconcile {} (domain: {}, sub_domain: {}), retrying next cycle: {}",
                name, record.domain, record.sub_domain, e
            ),
            Err(e) => error!(
                "Failed to reconcile {} (domain: {}, sub_domain: {}): {}",
                name, record.domain, record.sub_domain, e
            ),
            Ok(_) => {}
        }

        outcomes.push(RecordOutcome { name, result });
    }

    outcomes
}

async fn reconcile_record(
    directory: &dyn RecordDirectory,
    ip: IpAddr,
    record: &mut DesiredRecord,
) -> Result<RecordAction> {
    if !record.record_type.accepts(&ip) {
        return Err(Error::family_mismatch(format!(
            "{} record cannot hold address {}",
            record.record_type, ip
        )));
    }

    let mut created = false;
    let remote_id = match record.resolved_id() {
        Some(id) => id.to_string(),
        None => {
            let resolution = match_or_create(directory, record, ip).await?;
            created = matches!(resolution, Resolution::Created(_));
            let id = resolution.into_remote_id();
            record.remote_id = Some(id.clone());
            id
        }
    };

    let value = ip.to_string();
    directory.modify_record(record, &remote_id, &value).await?;
    info!("Updated record {} -> {} [id: {}]", record.fqdn(), value, remote_id);

    Ok(RecordAction::Updated { remote_id, created })
}
