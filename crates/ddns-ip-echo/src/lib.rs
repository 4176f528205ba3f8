// # TCP Echo IP Resolver
//
// Learns the public address by connecting to an echo service that writes the
// caller's address as plain text and closes the connection
// (DNSPod runs one at ns1.dnspod.net:6666).
//
// The resolver returns the raw text; trimming and parsing belong to the
// engine, which rejects empty or unparseable answers.

use async_trait::async_trait;
use ddns_core::config::DdnsConfig;
use ddns_core::traits::IpResolver;
use ddns_core::{Error, Result};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// Echo service run by DNSPod
pub const DEFAULT_ECHO_ADDRESS: &str = "ns1.dnspod.net:6666";

/// Default limit for connect and read together
pub const DEFAULT_ECHO_TIMEOUT: Duration = Duration::from_secs(10);

/// An address in text form never needs more than this
const MAX_ANSWER_BYTES: u64 = 512;

/// Resolver backed by a TCP echo service
#[derive(Debug, Clone)]
pub struct EchoIpResolver {
    /// `host:port` of the echo service
    address: String,

    /// Limit for one whole exchange
    timeout: Duration,
}

impl EchoIpResolver {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    pub fn from_config(config: &DdnsConfig) -> Self {
        Self::new(
            config.engine.echo_address.clone(),
            config.engine.echo_timeout(),
        )
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn exchange(&self) -> Result<Vec<u8>> {
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| Error::network(format!("connect to {} failed: {}", self.address, e)))?;

        let mut answer = Vec::new();
        stream
            .take(MAX_ANSWER_BYTES)
            .read_to_end(&mut answer)
            .await
            .map_err(|e| Error::network(format!("read from {} failed: {}", self.address, e)))?;

        Ok(answer)
    }
}

impl Default for EchoIpResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_ADDRESS, DEFAULT_ECHO_TIMEOUT)
    }
}

#[async_trait]
impl IpResolver for EchoIpResolver {
    async fn resolve(&self) -> Result<String> {
        tracing::debug!("Asking {} for our address", self.address);

        let answer = tokio::time::timeout(self.timeout, self.exchange())
            .await
            .map_err(|_| {
                Error::network(format!(
                    "{} did not answer within {:?}",
                    self.address, self.timeout
                ))
            })??;

        String::from_utf8(answer)
            .map_err(|_| Error::malformed(format!("{} sent a non-UTF-8 answer", self.address)))
    }

    fn resolver_name(&self) -> &'static str {
        "tcp-echo"
    }
}
