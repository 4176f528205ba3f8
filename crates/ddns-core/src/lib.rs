// # ddns-core
//
// Core library of the DNSPod DDNS daemon.
//
// ## Architecture Overview
//
// This library keeps a set of DNS records pointed at the current public IP:
// - **IpResolver**: Trait for discovering the current public IP
// - **RecordDirectory**: Trait for the provider's record list/create/modify API
// - **match_or_create**: Finds (or creates) the remote id of a desired record
// - **reconcile**: Pushes the current IP to every desired record
// - **DdnsEngine**: Validates credentials, then reconciles on a fixed interval
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from the HTTP and TCP clients
// 2. **Failure Isolation**: One record's failure never affects another record or cycle
// 3. **Idempotency**: Updates are unconditional, so a repeated cycle is harmless
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use config::{DdnsConfig, EngineConfig, PublicCredentials};
pub use engine::reconcile::{CycleReport, RecordAction, RecordOutcome};
pub use engine::sync::{Resolution, match_or_create};
pub use engine::{DdnsEngine, EngineEvent};
pub use error::{Error, Result};
pub use record::{DesiredRecord, RecordList, RecordStatus, RecordType, RemoteRecordSnapshot};
pub use traits::{IpResolver, RecordDirectory};
