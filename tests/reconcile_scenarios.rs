// tests/reconcile_scenarios.rs

mod common;

use std::sync::Arc;

use taskmaster::process::ProcessMap;
use taskmaster::reconcile::{apply, plan, reload};
use taskmaster_test_utils::{ConfigFileBuilder, ProgramConfigBuilder, RecordingSink, init_tracing};

use common::config_file;

#[tokio::test]
async fn new_program_starts_every_instance() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_program("web", ProgramConfigBuilder::new("/bin/web").numprocs(3).build())
        .build();

    let planned = plan(&ProcessMap::new(), &cfg);
    let mut sink = RecordingSink::new();
    apply(planned.commands, &mut sink).await.unwrap();

    assert_eq!(sink.starts(), vec!["web - 0", "web - 1", "web - 2"]);
    assert!(sink.stops().is_empty());
    assert_eq!(planned.state.get("web").map(|r| r.len()), Some(3));
}

#[tokio::test]
async fn changed_program_is_stopped_before_its_replacement_starts() {
    init_tracing();
    let old_cfg = ConfigFileBuilder::new()
        .with_program("worker", ProgramConfigBuilder::new("a").build())
        .build();
    let previous = plan(&ProcessMap::new(), &old_cfg).state;
    let old_record = Arc::clone(&previous.get("worker").unwrap()[0]);

    let new_cfg = ConfigFileBuilder::new()
        .with_program("worker", ProgramConfigBuilder::new("b").autostart(true).build())
        .build();
    let next = plan(&previous, &new_cfg);

    let mut sink = RecordingSink::new();
    apply(next.commands, &mut sink).await.unwrap();

    assert_eq!(
        sink.submitted(),
        vec![
            ("stop".to_string(), "worker - 0".to_string()),
            ("start".to_string(), "worker - 0".to_string()),
        ]
    );

    let new_record = &next.state.get("worker").unwrap()[0];
    assert_ne!(new_record.id(), old_record.id());
    assert_eq!(new_record.spec().cmd, "b");
}

#[tokio::test]
async fn changed_program_without_autostart_is_only_stopped() {
    let old_cfg = ConfigFileBuilder::new()
        .with_program("worker", ProgramConfigBuilder::new("a").numprocs(2).build())
        .build();
    let previous = plan(&ProcessMap::new(), &old_cfg).state;

    let new_cfg = ConfigFileBuilder::new()
        .with_program("worker", ProgramConfigBuilder::new("a").numprocs(2).autostart(false).build())
        .build();
    let next = plan(&previous, &new_cfg);

    assert_eq!(next.stops().count(), 2);
    assert_eq!(next.starts().count(), 0);
    assert_eq!(next.state.get("worker").map(|r| r.len()), Some(2));
}

#[tokio::test]
async fn removed_program_is_only_stopped() {
    let old_cfg = ConfigFileBuilder::new()
        .with_program("cache", ProgramConfigBuilder::new("/bin/cache").numprocs(2).build())
        .with_program("web", ProgramConfigBuilder::new("/bin/web").build())
        .build();
    let previous = plan(&ProcessMap::new(), &old_cfg).state;

    let new_cfg = ConfigFileBuilder::new()
        .with_program("web", ProgramConfigBuilder::new("/bin/web").build())
        .build();
    let next = plan(&previous, &new_cfg);

    let mut sink = RecordingSink::new();
    apply(next.commands, &mut sink).await.unwrap();

    assert_eq!(sink.stops(), vec!["cache - 0", "cache - 1"]);
    assert!(sink.starts().is_empty());
    assert!(!next.state.contains("cache"));
}

#[tokio::test]
async fn unchanged_program_keeps_its_records() {
    let cfg = ConfigFileBuilder::new()
        .with_program("web", ProgramConfigBuilder::new("/bin/web").numprocs(2).build())
        .build();
    let previous = plan(&ProcessMap::new(), &cfg).state;
    let next = plan(&previous, &cfg);

    assert!(next.is_noop());
    let before: Vec<u64> = previous.records().map(|r| r.id()).collect();
    let after: Vec<u64> = next.state.records().map(|r| r.id()).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn autostart_false_creates_records_without_starting() {
    let cfg = ConfigFileBuilder::new()
        .with_program("idle", ProgramConfigBuilder::new("/bin/idle").autostart(false).build())
        .build();
    let next = plan(&ProcessMap::new(), &cfg);

    assert!(next.is_noop());
    assert!(next.state.contains("idle"));
}

#[tokio::test]
async fn reload_from_file_issues_commands() {
    init_tracing();
    let file = config_file(
        r#"
[programs.web]
cmd = "/bin/web"
numprocs = 2
"#,
    );

    let mut sink = RecordingSink::new();
    let state = reload(file.path(), &ProcessMap::new(), &mut sink).await.unwrap();

    assert_eq!(sink.starts(), vec!["web - 0", "web - 1"]);
    assert_eq!(state.len(), 1);
}

#[tokio::test]
async fn invalid_file_issues_nothing() {
    init_tracing();
    let file = config_file(
        r#"
[programs.web]
cmd = "/bin/web"
stopsignal = "LOUDLY"
"#,
    );

    let mut sink = RecordingSink::new();
    let result = reload(file.path(), &ProcessMap::new(), &mut sink).await;

    assert!(result.is_err());
    assert!(sink.submitted().is_empty());
}

#[tokio::test]
async fn apply_stops_at_first_failed_submit() {
    let cfg = ConfigFileBuilder::new()
        .with_program("web", ProgramConfigBuilder::new("/bin/web").numprocs(3).build())
        .build();
    let next = plan(&ProcessMap::new(), &cfg);

    let mut sink = RecordingSink::failing_after(1);
    assert!(apply(next.commands, &mut sink).await.is_err());
    assert_eq!(sink.starts(), vec!["web - 0"]);
}
