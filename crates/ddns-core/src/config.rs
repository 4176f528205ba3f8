//! Configuration types for the DDNS system
//!
//! The daemon reads a single JSON document:
//!
//! ```json
//! {
//!   "credentials": { "token_id": "12345", "token": "abcdef" },
//!   "records": [ { "domain": "example.com", "sub_domain": "home" } ],
//!   "engine": { "interval_secs": 600 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::record::DesiredRecord;

/// Maximum TTL accepted by the provider
const MAX_TTL: u32 = 604_800;

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Provider credentials and public request parameters
    pub credentials: PublicCredentials,

    /// DNS records to manage, in reconciliation order
    pub records: Vec<DesiredRecord>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with default engine settings
    pub fn new(credentials: PublicCredentials, records: Vec<DesiredRecord>) -> Self {
        Self {
            credentials,
            records,
            engine: EngineConfig::default(),
        }
    }

    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file without validating it
    ///
    /// Callers that apply overrides must call [`DdnsConfig::validate`] afterwards.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse either the native layout or the legacy `Setting`/`Records` one
    pub fn from_json_str(raw: &str) -> Result<Self, crate::Error> {
        let value: serde_json::Value = serde_json::from_str(raw)?;

        if value.get("Setting").is_some() {
            let legacy: LegacyConfig = serde_json::from_value(value)?;
            return Ok(legacy.into());
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.credentials.validate()?;

        if self.records.is_empty() {
            return Err(crate::Error::config("No records configured"));
        }

        for record in &self.records {
            validate_record(record)?;
        }

        self.engine.validate()
    }
}

/// Layout used by DNSPodHelper configuration files
///
/// ```json
/// {
///   "Setting": { "api_token": { "id": "12345", "token": "abcdef" } },
///   "Records": [ { "domain": "example.com", "sub_domain": "home" } ]
/// }
/// ```
#[derive(Debug, Deserialize)]
struct LegacyConfig {
    #[serde(rename = "Setting")]
    setting: LegacySetting,

    #[serde(rename = "Records")]
    records: Vec<DesiredRecord>,
}

#[derive(Debug, Deserialize)]
struct LegacySetting {
    api_token: LegacyToken,
}

#[derive(Deserialize)]
struct LegacyToken {
    id: String,
    token: String,
}

impl fmt::Debug for LegacyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyToken")
            .field("id", &self.id)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl From<LegacyConfig> for DdnsConfig {
    fn from(legacy: LegacyConfig) -> Self {
        let token = legacy.setting.api_token;
        DdnsConfig::new(PublicCredentials::new(token.id, token.token), legacy.records)
    }
}

fn validate_record(record: &DesiredRecord) -> Result<(), crate::Error> {
    validate_domain_name(&record.domain)?;

    if record.sub_domain.is_empty() {
        return Err(crate::Error::config(format!(
            "Record for {} has an empty sub_domain (use \"@\" for the apex)",
            record.domain
        )));
    }

    if record.record_line.is_empty() {
        return Err(crate::Error::config(format!(
            "Record {} has an empty record_line",
            record.fqdn()
        )));
    }

    if !(1..=MAX_TTL).contains(&record.ttl) {
        return Err(crate::Error::config(format!(
            "Record {} TTL must be between 1 and {}. Got: {}",
            record.fqdn(),
            MAX_TTL,
            record.ttl
        )));
    }

    Ok(())
}

/// Basic RFC 1035 domain name validation
///
/// Not exhaustive, but catches the usual typos before anything is sent to
/// the provider.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Response language requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    #[default]
    Cn,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Cn => "cn",
        }
    }
}

/// Whether the provider should report an empty result as an error status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorOnEmpty {
    Yes,
    #[default]
    No,
}

impl ErrorOnEmpty {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorOnEmpty::Yes => "yes",
            ErrorOnEmpty::No => "no",
        }
    }
}

/// Public parameters sent with every provider request
///
/// Immutable for the process lifetime. The token is never printed.
#[derive(Clone, Serialize, Deserialize)]
pub struct PublicCredentials {
    /// API token ID
    pub token_id: String,

    /// API token secret
    /// ⚠️ NEVER log this value
    pub token: String,

    /// Response format, only "json" is understood
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub lang: Lang,

    #[serde(default)]
    pub error_on_empty: ErrorOnEmpty,
}

impl fmt::Debug for PublicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicCredentials")
            .field("token_id", &self.token_id)
            .field("token", &"<REDACTED>")
            .field("format", &self.format)
            .field("lang", &self.lang)
            .field("error_on_empty", &self.error_on_empty)
            .finish()
    }
}

impl PublicCredentials {
    /// Create credentials with the default format, language and empty policy
    pub fn new(token_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            token: token.into(),
            format: default_format(),
            lang: Lang::default(),
            error_on_empty: ErrorOnEmpty::default(),
        }
    }

    /// The `login_token` wire value: "<id>,<token>"
    pub fn login_token(&self) -> String {
        format!("{},{}", self.token_id, self.token)
    }

    /// Validate the credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.token_id.trim().is_empty() {
            return Err(crate::Error::config("API token ID cannot be empty"));
        }
        if self.token.trim().is_empty() {
            return Err(crate::Error::config("API token cannot be empty"));
        }
        if self.format != "json" {
            return Err(crate::Error::config(format!(
                "Response format '{}' is not supported, use \"json\"",
                self.format
            )));
        }
        Ok(())
    }
}

fn default_format() -> String {
    "json".to_string()
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between two reconciliation cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Timeout for a single provider HTTP call
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Provider API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// `host:port` of the IP echo service
    #[serde(default = "default_echo_address")]
    pub echo_address: String,

    /// Timeout for connecting to and reading from the echo service
    #[serde(default = "default_echo_timeout_secs")]
    pub echo_timeout_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, events are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_secs(self.echo_timeout_secs)
    }

    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Reconciliation interval must be > 0"));
        }
        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }
        if self.echo_timeout_secs == 0 {
            return Err(crate::Error::config("Echo timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.echo_address.trim().is_empty() {
            return Err(crate::Error::config("Echo service address cannot be empty"));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                self.api_base_url
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            api_base_url: default_api_base_url(),
            echo_address: default_echo_address(),
            echo_timeout_secs: default_echo_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_secs() -> u64 {
    600
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_api_base_url() -> String {
    "https://dnsapi.cn".to_string()
}

fn default_echo_address() -> String {
    "ns1.dnspod.net:6666".to_string()
}

fn default_echo_timeout_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    1000
}
