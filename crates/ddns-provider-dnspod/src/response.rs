//! Response side of the DNSPod API
//!
//! Every response is a JSON object with `status: {code, message}`. Code "1" is
//! success; anything else is a provider error. Bodies are decoded once into an
//! [`ApiOutcome`] over a per-endpoint payload type.

use ddns_core::record::RemoteRecordSnapshot;
use ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Status code of a successful call
pub const SUCCESS_CODE: &str = "1";

/// Status code of Record.List when nothing matches (with `error_on_empty=yes`)
pub const EMPTY_RESULT_CODE: &str = "10";

/// Decoded provider answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome<T> {
    Success(T),
    Failure { code: String, message: String },
}

impl<T> ApiOutcome<T> {
    /// Turn a provider failure into [`Error::ProviderRejected`]
    pub fn into_result(self) -> Result<T> {
        match self {
            ApiOutcome::Success(payload) => Ok(payload),
            ApiOutcome::Failure { code, message } => Err(Error::rejected(code, message)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(deserialize_with = "string_or_number")]
    code: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Head {
    status: Status,
    /// Some error answers put the message next to the status
    #[serde(default)]
    message: Option<String>,
}

/// Decode a response body
///
/// The payload is only decoded for successful answers, so failure bodies
/// never need to match the success schema.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<ApiOutcome<T>> {
    let head: Head = serde_json::from_str(body)
        .map_err(|e| Error::malformed(format!("missing or invalid status: {}", e)))?;

    if head.status.code == SUCCESS_CODE {
        let payload = serde_json::from_str(body)
            .map_err(|e| Error::malformed(format!("unexpected payload: {}", e)))?;
        return Ok(ApiOutcome::Success(payload));
    }

    let message = head
        .status
        .message
        .filter(|m| !m.is_empty())
        .or(head.message)
        .unwrap_or_default();

    Ok(ApiOutcome::Failure {
        code: head.status.code,
        message,
    })
}

/// Payload of calls whose body we do not need (User.Detail, Record.Modify)
#[derive(Debug, Default, Deserialize)]
pub struct Ack {}

/// Payload of Record.List
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RecordListPayload {
    #[serde(default)]
    pub records: Vec<RemoteRecord>,
}

/// One record as listed by DNSPod
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub enabled: String,
}

impl From<RemoteRecord> for RemoteRecordSnapshot {
    fn from(record: RemoteRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            record_type: record.record_type,
            line: record.line,
            value: record.value,
            enabled: record.enabled != "0",
        }
    }
}

/// Payload of Record.Create
#[derive(Debug, Deserialize)]
pub struct RecordCreatePayload {
    #[serde(default)]
    pub record: Option<CreatedRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// DNSPod sends codes and ids as strings, but tolerate numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
