// # DNSPod Record Directory
//
// Talks to the DNSPod API (https://dnsapi.cn) to list, create and modify
// records. Every call is a single form POST; the engine owns scheduling,
// so nothing here retries or caches.
//
// ## Security
//
// - The login token travels only in the request body
// - The token never appears in logs, errors or Debug output
//
// ## API Reference
//
// - `POST /User.Detail`: account details (credential check)
// - `POST /Record.List`: records of a domain, filtered by sub-domain
// - `POST /Record.Create`: create a record
// - `POST /Record.Modify`: overwrite a record by id

pub mod api;
pub mod response;

use async_trait::async_trait;
use ddns_core::config::{DdnsConfig, PublicCredentials};
use ddns_core::record::{DesiredRecord, RecordList};
use ddns_core::traits::RecordDirectory;
use ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use api::ApiRequest;
pub use response::{ApiOutcome, EMPTY_RESULT_CODE, SUCCESS_CODE};

use response::{Ack, RecordCreatePayload, RecordListPayload};

/// Public DNSPod API endpoint
pub const DNSPOD_API_BASE: &str = "https://dnsapi.cn";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("ddnsd/", env!("CARGO_PKG_VERSION"));

/// DNSPod API client
///
/// Holds the account credentials for its whole lifetime, so callers never
/// pass them per operation.
pub struct DnspodClient {
    /// ⚠️ Contains the token: NEVER log this value
    credentials: PublicCredentials,

    /// API base URL without trailing slash
    base_url: String,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for DnspodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnspodClient")
            .field("token_id", &self.credentials.token_id)
            .field("token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DnspodClient {
    /// Create a client against `base_url`
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the credentials are incomplete or the HTTP
    ///   client cannot be built
    pub fn new(
        credentials: PublicCredentials,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        credentials.validate()?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a client from the daemon configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(
            config.credentials.clone(),
            config.engine.api_base_url.clone(),
            config.engine.http_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and decode its answer
    ///
    /// Transport failures and HTTP 5xx/429 are `NetworkUnavailable`; any
    /// other non-2xx answer or undecodable body is `MalformedResponse`.
    async fn call<T: DeserializeOwned>(&self, request: ApiRequest<'_>) -> Result<ApiOutcome<T>> {
        let endpoint = request.endpoint();
        let url = format!("{}/{}", self.base_url, endpoint);

        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .form(&request.form(&self.credentials))
            .send()
            .await
            .map_err(|e| Error::network(format!("{} request failed: {}", endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return match status.as_u16() {
                429 | 500..=599 => Err(Error::network(format!(
                    "{} returned {} (transient)",
                    endpoint, status
                ))),
                _ => Err(Error::malformed(format!(
                    "{} returned {}: {}",
                    endpoint, status, error_text
                ))),
            };
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("{} body read failed: {}", endpoint, e)))?;

        response::decode(&body)
    }
}

#[async_trait]
impl RecordDirectory for DnspodClient {
    async fn validate_credentials(&self) -> Result<()> {
        self.call::<Ack>(ApiRequest::UserDetail)
            .await?
            .into_result()
            .map(|_| ())
    }

    async fn list_records(&self, domain: &str, sub_domain: Option<&str>) -> Result<RecordList> {
        let outcome = self
            .call::<RecordListPayload>(ApiRequest::RecordList { domain, sub_domain })
            .await?;

        match outcome {
            ApiOutcome::Success(payload) => {
                tracing::debug!(
                    "Record.List {} {:?}: {} record(s)",
                    domain,
                    sub_domain,
                    payload.records.len()
                );
                Ok(RecordList::from_records(
                    payload.records.into_iter().map(Into::into).collect(),
                ))
            }
            ApiOutcome::Failure { code, .. } if code == EMPTY_RESULT_CODE => Ok(RecordList::Empty),
            ApiOutcome::Failure { code, message } => Err(Error::rejected(code, message)),
        }
    }

    async fn create_record(&self, record: &DesiredRecord, value: &str) -> Result<String> {
        let payload = self
            .call::<RecordCreatePayload>(ApiRequest::RecordCreate { record, value })
            .await?
            .into_result()?;

        payload
            .record
            .map(|created| created.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::malformed("Record.Create: response carries no record id"))
    }

    async fn modify_record(
        &self,
        record: &DesiredRecord,
        remote_id: &str,
        value: &str,
    ) -> Result<()> {
        self.call::<Ack>(ApiRequest::RecordModify {
            record,
            record_id: remote_id,
            value,
        })
        .await?
        .into_result()
        .map(|_| ())
    }

    fn provider_name(&self) -> &'static str {
        "dnspod"
    }
}
