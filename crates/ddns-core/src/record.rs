//! Record model
//!
//! [`DesiredRecord`] is what the operator declares; [`RemoteRecordSnapshot`] is
//! what the provider reports back for a single lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A", alias = "a")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA", alias = "aaaa")]
    Aaaa,
}

impl RecordType {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Whether an address of this family can be stored in this record type
    pub fn accepts(&self, ip: &IpAddr) -> bool {
        match self {
            RecordType::A => ip.is_ipv4(),
            RecordType::Aaaa => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record resolution status on the provider side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Enable,
    Disable,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Enable => "enable",
            RecordStatus::Disable => "disable",
        }
    }
}

/// A DNS record the operator wants to exist and track the public IP
///
/// Everything except `remote_id` comes from configuration. `remote_id` is
/// filled in by the reconciler the first time the record is matched or
/// created, and is then trusted for the rest of the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecord {
    /// Zone, e.g. "example.com"
    pub domain: String,

    /// Host part, e.g. "home" ("@" for the apex)
    #[serde(default = "default_sub_domain")]
    pub sub_domain: String,

    #[serde(default = "default_record_type")]
    pub record_type: RecordType,

    /// Resolution line, provider specific
    #[serde(default = "default_record_line")]
    pub record_line: String,

    #[serde(default = "default_ttl")]
    pub ttl: u32,

    #[serde(default)]
    pub status: RecordStatus,

    /// Provider-assigned identifier, never read from configuration
    #[serde(skip)]
    pub remote_id: Option<String>,
}

impl DesiredRecord {
    /// Create a record with the default type, line, TTL and status
    pub fn new(domain: impl Into<String>, sub_domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            sub_domain: sub_domain.into(),
            record_type: default_record_type(),
            record_line: default_record_line(),
            ttl: default_ttl(),
            status: RecordStatus::default(),
            remote_id: None,
        }
    }

    /// Set the record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Pretend the record was already resolved
    pub fn with_remote_id(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = Some(remote_id.into());
        self
    }

    /// Fully qualified name, for logs
    pub fn fqdn(&self) -> String {
        if self.sub_domain.is_empty() || self.sub_domain == "@" {
            self.domain.clone()
        } else {
            format!("{}.{}", self.sub_domain, self.domain)
        }
    }

    /// The cached identifier, ignoring empty strings
    pub fn resolved_id(&self) -> Option<&str> {
        self.remote_id.as_deref().filter(|id| !id.is_empty())
    }
}

fn default_sub_domain() -> String {
    "@".to_string()
}

fn default_record_type() -> RecordType {
    RecordType::A
}

fn default_record_line() -> String {
    "默认".to_string()
}

fn default_ttl() -> u32 {
    600
}

/// The provider's view of one record, valid for a single lookup only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecordSnapshot {
    pub id: String,
    pub name: String,
    pub record_type: String,
    pub line: String,
    pub value: String,
    pub enabled: bool,
}

/// Outcome of listing records for a domain/sub-domain pair
///
/// `Empty` is the provider telling us nothing matches, which is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordList {
    Found(Vec<RemoteRecordSnapshot>),
    Empty,
}

impl RecordList {
    /// Normalise a possibly empty vector
    pub fn from_records(records: Vec<RemoteRecordSnapshot>) -> Self {
        if records.is_empty() {
            RecordList::Empty
        } else {
            RecordList::Found(records)
        }
    }
}
