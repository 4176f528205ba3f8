//! Contract Test: Match-or-Create
//!
//! Constraints verified:
//! - An empty list for a domain/sub-domain pair is followed by a create call
//! - The created identifier is cached and used for later updates
//! - An existing remote record is adopted (first one wins), nothing is created
//! - A hard list error never leads to a create call

mod common;

use common::*;
use ddns_core::engine::sync::{Resolution, match_or_create};
use ddns_core::{DdnsEngine, DesiredRecord, Error};
use std::net::IpAddr;

fn home_record() -> DesiredRecord {
    DesiredRecord::new("example.com", "home")
}

#[tokio::test]
async fn empty_list_creates_record_and_caches_id() {
    let directory = FakeDirectory::new();
    let resolver = ScriptedResolver::fixed("203.0.113.5");

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(resolver),
        Box::new(directory.clone()),
        config_for(vec![home_record()]),
    )
    .expect("engine construction succeeds");

    let report = engine.run_cycle().await;
    assert!(report.is_clean(), "cycle should succeed: {:?}", report);

    assert_eq!(
        directory.calls(),
        vec![
            Call::List {
                domain: "example.com".to_string(),
                sub_domain: Some("home".to_string()),
            },
            Call::Create {
                domain: "example.com".to_string(),
                sub_domain: "home".to_string(),
                value: "203.0.113.5".to_string(),
            },
            Call::Modify {
                remote_id: "123".to_string(),
                value: "203.0.113.5".to_string(),
            },
        ]
    );

    let records = engine.records().await;
    assert_eq!(records[0].remote_id.as_deref(), Some("123"));
}

#[tokio::test]
async fn cached_id_skips_lookup_on_next_cycle() {
    let directory = FakeDirectory::new();

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(ScriptedResolver::fixed("203.0.113.5")),
        Box::new(directory.clone()),
        config_for(vec![home_record()]),
    )
    .expect("engine construction succeeds");

    engine.run_cycle().await;
    engine.run_cycle().await;

    assert_eq!(directory.list_count(), 1, "lookup happens once per process");
    assert_eq!(directory.create_count(), 1);
    assert_eq!(directory.modify_count(), 2);
}

#[tokio::test]
async fn existing_record_is_matched_first_wins() {
    let directory = FakeDirectory::new();
    directory.seed("example.com", "home", "7", "198.51.100.1");
    directory.seed("example.com", "home", "8", "198.51.100.2");

    let resolution = match_or_create(
        &directory,
        &home_record(),
        IpAddr::from([203, 0, 113, 5]),
    )
    .await
    .expect("match succeeds");

    assert_eq!(resolution, Resolution::Matched("7".to_string()));
    assert_eq!(directory.create_count(), 0);
}

#[tokio::test]
async fn hard_list_error_does_not_create() {
    let directory = FakeDirectory::new();
    directory.fail_list(
        "example.com",
        "home",
        Failure::rejected("6", "域名不存在"),
    );

    let result = match_or_create(
        &directory,
        &home_record(),
        IpAddr::from([203, 0, 113, 5]),
    )
    .await;

    match result {
        Err(Error::ProviderRejected { code, message }) => {
            assert_eq!(code, "6");
            assert_eq!(message, "域名不存在");
        }
        other => panic!("expected provider rejection, got {:?}", other),
    }
    assert_eq!(directory.create_count(), 0, "hard errors must not trigger create");
}

#[tokio::test]
async fn failed_create_leaves_record_unresolved() {
    let directory = FakeDirectory::new();
    directory.fail_create(
        "example.com",
        "home",
        Failure::rejected("104", "记录已经存在"),
    );

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(ScriptedResolver::fixed("203.0.113.5")),
        Box::new(directory.clone()),
        config_for(vec![home_record()]),
    )
    .expect("engine construction succeeds");

    let report = engine.run_cycle().await;
    assert_eq!(report.failed(), 1);
    assert_eq!(directory.modify_count(), 0, "no update without an id");
    assert_eq!(engine.records().await[0].remote_id, None);

    // Next cycle starts from the lookup again
    directory.clear_failures();
    let report = engine.run_cycle().await;
    assert!(report.is_clean());
    assert_eq!(directory.list_count(), 2);
    assert_eq!(engine.records().await[0].remote_id.as_deref(), Some("123"));
}
