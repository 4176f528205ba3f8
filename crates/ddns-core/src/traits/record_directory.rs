// # Record Directory Trait
//
// Defines the interface to the provider's record CRUD API.
//
// ## Implementations
//
// - DNSPod: `ddns-provider-dnspod` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::RecordDirectory;
//
// directory.validate_credentials().await?;
// match directory.list_records("example.com", Some("home")).await? {
//     RecordList::Found(records) => println!("first id: {}", records[0].id),
//     RecordList::Empty => println!("nothing yet"),
// }
// ```

use async_trait::async_trait;

use crate::record::{DesiredRecord, RecordList};

/// Trait for the remote record directory
///
/// Implementations own the credentials and the HTTP client. Every method is a
/// single request: no retries, no caching, no background tasks. All
/// coordination is owned by the engine.
///
/// A non-success provider status must come back as
/// `Error::ProviderRejected` carrying the provider's message verbatim, except
/// for the "no matching records" status of [`list_records`], which is
/// [`RecordList::Empty`].
///
/// [`list_records`]: RecordDirectory::list_records
#[async_trait]
pub trait RecordDirectory: Send + Sync {
    /// Check the credentials against the provider
    ///
    /// Called once at startup.
    async fn validate_credentials(&self) -> Result<(), crate::Error>;

    /// List records of a domain, optionally filtered by sub-domain
    async fn list_records(
        &self,
        domain: &str,
        sub_domain: Option<&str>,
    ) -> Result<RecordList, crate::Error>;

    /// Create a record holding `value`
    ///
    /// # Returns
    ///
    /// The identifier assigned by the provider
    async fn create_record(
        &self,
        record: &DesiredRecord,
        value: &str,
    ) -> Result<String, crate::Error>;

    /// Overwrite the value of an existing record
    async fn modify_record(
        &self,
        record: &DesiredRecord,
        remote_id: &str,
        value: &str,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
