// # IP Resolver Trait
//
// Defines the interface for discovering the current public IP address.
//
// ## Implementations
//
// - TCP echo service: `ddns-ip-echo` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpResolver;
//
// let raw = resolver.resolve().await?;
// let ip: std::net::IpAddr = raw.trim().parse()?;
// ```

use async_trait::async_trait;

/// Trait for IP resolver implementations
///
/// A resolver performs exactly one lookup per call. It does not retry and does
/// not cache: the engine calls it once per reconciliation cycle and the next
/// cycle is the retry.
///
/// The returned text is not validated. Parsing it as an address is the
/// engine's job, so an empty or garbled body never reaches the provider.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Fetch the caller's public address as raw text
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The body returned by the service
    /// - `Err(Error::NetworkUnavailable)`: Connection, timeout or read failure
    async fn resolve(&self) -> Result<String, crate::Error>;

    /// Name used in logs
    fn resolver_name(&self) -> &'static str;
}
