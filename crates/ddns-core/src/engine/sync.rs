//! Match-or-create
//!
//! Finds the provider identifier for a desired record, creating the record
//! when the provider has nothing for its domain/sub-domain pair.

use std::net::IpAddr;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{DesiredRecord, RecordList};
use crate::traits::RecordDirectory;

/// How a remote identifier was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An existing remote record was adopted
    Matched(String),
    /// No remote record existed, one was created with the current IP
    Created(String),
}

impl Resolution {
    pub fn into_remote_id(self) -> String {
        match self {
            Resolution::Matched(id) | Resolution::Created(id) => id,
        }
    }
}

/// Find the remote identifier for `desired`, or create the record
///
/// The first listed record wins. Records sharing the sub-domain across
/// types or lines are not told apart.
///
/// A hard list error is returned as-is and nothing is created. Only
/// [`RecordList::Empty`] leads to a create call.
pub async fn match_or_create(
    directory: &dyn RecordDirectory,
    desired: &DesiredRecord,
    ip: IpAddr,
) -> Result<Resolution> {
    let listed = directory
        .list_records(&desired.domain, Some(&desired.sub_domain))
        .await?;

    match listed {
        RecordList::Found(records) => {
            if records.len() > 1 {
                debug!(
                    "{} remote records match {}, taking the first",
                    records.len(),
                    desired.fqdn()
                );
            }
            let first = records
                .into_iter()
                .next()
                .ok_or_else(|| Error::malformed("record list marked as found but empty"))?;
            if first.id.is_empty() {
                return Err(Error::malformed(format!(
                    "remote record for {} has an empty id",
                    desired.fqdn()
                )));
            }
            debug!("Matched {} to remote record {}", desired.fqdn(), first.id);
            Ok(Resolution::Matched(first.id))
        }
        RecordList::Empty => {
            let value = ip.to_string();
            let id = directory.create_record(desired, &value).await?;
            if id.is_empty() {
                return Err(Error::malformed(format!(
                    "provider returned an empty id for new record {}",
                    desired.fqdn()
                )));
            }
            info!(
                "Created record {} ({}) -> {} [id: {}]",
                desired.fqdn(),
                desired.record_type,
                value,
                id
            );
            Ok(Resolution::Created(id))
        }
    }
}
