//! Test doubles and common utilities for engine contract tests
//!
//! `FakeDirectory` behaves like a tiny in-memory provider: it stores remote
//! records, hands out ids, and logs every call so tests can assert on the
//! exact sequence of API requests.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, PublicCredentials};
use ddns_core::error::{Error, Result};
use ddns_core::record::{DesiredRecord, RecordList, RemoteRecordSnapshot};
use ddns_core::traits::{IpResolver, RecordDirectory};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One API call seen by the fake directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ValidateCredentials,
    List {
        domain: String,
        sub_domain: Option<String>,
    },
    Create {
        domain: String,
        sub_domain: String,
        value: String,
    },
    Modify {
        remote_id: String,
        value: String,
    },
}

/// Injected failure
#[derive(Debug, Clone)]
pub enum Failure {
    Rejected { code: String, message: String },
    Network(String),
}

impl Failure {
    pub fn rejected(code: &str, message: &str) -> Self {
        Failure::Rejected {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    fn to_error(&self) -> Error {
        match self {
            Failure::Rejected { code, message } => Error::rejected(code.clone(), message.clone()),
            Failure::Network(msg) => Error::network(msg.clone()),
        }
    }
}

type PairKey = (String, String);

#[derive(Default)]
struct DirectoryState {
    remote: HashMap<PairKey, Vec<RemoteRecordSnapshot>>,
    next_id: u64,
    calls: Vec<Call>,
    credentials_failure: Option<Failure>,
    list_failures: HashMap<PairKey, Failure>,
    create_failures: HashMap<PairKey, Failure>,
    modify_failures: HashMap<String, Failure>,
}

/// In-memory provider; clones share state
#[derive(Clone)]
pub struct FakeDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl FakeDirectory {
    /// Empty provider; the first created record gets id "123"
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DirectoryState {
                next_id: 123,
                ..Default::default()
            })),
        }
    }

    /// Add an existing remote record
    pub fn seed(&self, domain: &str, sub_domain: &str, id: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .remote
            .entry((domain.to_string(), sub_domain.to_string()))
            .or_default()
            .push(RemoteRecordSnapshot {
                id: id.to_string(),
                name: sub_domain.to_string(),
                record_type: "A".to_string(),
                line: "默认".to_string(),
                value: value.to_string(),
                enabled: true,
            });
    }

    pub fn fail_credentials(&self, failure: Failure) {
        self.state.lock().unwrap().credentials_failure = Some(failure);
    }

    pub fn fail_list(&self, domain: &str, sub_domain: &str, failure: Failure) {
        self.state
            .lock()
            .unwrap()
            .list_failures
            .insert((domain.to_string(), sub_domain.to_string()), failure);
    }

    pub fn fail_create(&self, domain: &str, sub_domain: &str, failure: Failure) {
        self.state
            .lock()
            .unwrap()
            .create_failures
            .insert((domain.to_string(), sub_domain.to_string()), failure);
    }

    pub fn fail_modify(&self, remote_id: &str, failure: Failure) {
        self.state
            .lock()
            .unwrap()
            .modify_failures
            .insert(remote_id.to_string(), failure);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.list_failures.clear();
        state.create_failures.clear();
        state.modify_failures.clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create { .. }))
            .count()
    }

    pub fn modify_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Modify { .. }))
            .count()
    }

    pub fn list_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .count()
    }

    /// All remote records stored for a pair
    pub fn remote_records(&self, domain: &str, sub_domain: &str) -> Vec<RemoteRecordSnapshot> {
        self.state
            .lock()
            .unwrap()
            .remote
            .get(&(domain.to_string(), sub_domain.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl RecordDirectory for FakeDirectory {
    async fn validate_credentials(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ValidateCredentials);
        match &state.credentials_failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    async fn list_records(&self, domain: &str, sub_domain: Option<&str>) -> Result<RecordList> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List {
            domain: domain.to_string(),
            sub_domain: sub_domain.map(str::to_string),
        });

        let key = (domain.to_string(), sub_domain.unwrap_or("@").to_string());
        if let Some(failure) = state.list_failures.get(&key) {
            return Err(failure.to_error());
        }

        let records = state.remote.get(&key).cloned().unwrap_or_default();
        Ok(RecordList::from_records(records))
    }

    async fn create_record(&self, record: &DesiredRecord, value: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            domain: record.domain.clone(),
            sub_domain: record.sub_domain.clone(),
            value: value.to_string(),
        });

        let key = (record.domain.clone(), record.sub_domain.clone());
        if let Some(failure) = state.create_failures.get(&key) {
            return Err(failure.to_error());
        }

        let id = state.next_id.to_string();
        state.next_id += 1;
        state.remote.entry(key).or_default().push(RemoteRecordSnapshot {
            id: id.clone(),
            name: record.sub_domain.clone(),
            record_type: record.record_type.as_str().to_string(),
            line: record.record_line.clone(),
            value: value.to_string(),
            enabled: true,
        });
        Ok(id)
    }

    async fn modify_record(
        &self,
        _record: &DesiredRecord,
        remote_id: &str,
        value: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Modify {
            remote_id: remote_id.to_string(),
            value: value.to_string(),
        });

        if let Some(failure) = state.modify_failures.get(remote_id) {
            return Err(failure.to_error());
        }

        let existing = state
            .remote
            .values_mut()
            .flat_map(|records| records.iter_mut())
            .find(|r| r.id == remote_id);

        match existing {
            Some(remote) => {
                remote.value = value.to_string();
                Ok(())
            }
            None => Err(Error::rejected("8", "记录ID错误")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Resolver that plays back a script, repeating the last entry forever
#[derive(Clone)]
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    last: Arc<Mutex<std::result::Result<String, String>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new(script: Vec<std::result::Result<&str, &str>>) -> Self {
        let script: VecDeque<_> = script
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        let last = script
            .back()
            .cloned()
            .unwrap_or_else(|| Err("empty script".to_string()));

        Self {
            script: Arc::new(Mutex::new(script)),
            last: Arc::new(Mutex::new(last)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answers `ip`
    pub fn fixed(ip: &str) -> Self {
        Self::new(vec![Ok(ip)])
    }

    /// Always fails with a network error
    pub fn unreachable() -> Self {
        Self::new(vec![Err("connection refused")])
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let answer = match next {
            Some(answer) => answer,
            None => self.last.lock().unwrap().clone(),
        };
        answer.map_err(|e| Error::network(e))
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// Helper to create a DdnsConfig for testing
pub fn config_for(records: Vec<DesiredRecord>) -> DdnsConfig {
    let mut config = DdnsConfig::new(PublicCredentials::new("12345", "test-token"), records);
    config.engine.event_channel_capacity = 1000;
    config
}

/// Drain every event currently queued
pub fn drain_events(
    rx: &mut tokio::sync::mpsc::Receiver<ddns_core::EngineEvent>,
) -> Vec<ddns_core::EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
