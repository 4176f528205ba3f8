//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpResolver`]: Discover the current public IP address
//! - [`RecordDirectory`]: List, create and modify records via the provider API

pub mod ip_resolver;
pub mod record_directory;

pub use ip_resolver::IpResolver;
pub use record_directory::RecordDirectory;
