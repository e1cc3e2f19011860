// tests/config_loading.rs

mod common;

use std::path::PathBuf;
use std::time::Duration;

use taskmaster::config::load_and_validate;
use taskmaster::errors::TaskmasterError;
use taskmaster::types::{RestartMode, RetryBudget};

use common::config_file;

#[test]
fn full_program_is_loaded_with_every_field() {
    let file = config_file(
        r#"
[programs.web]
cmd = "/usr/bin/python3"
args = ["-m", "http.server"]
numprocs = 2
umask = 0o077
workingdir = "/tmp"
autostart = false
autorestart = "always"
exitcodes = [2, 0]
startretries = 3
starttime = 5
stopsignal = "SIGTERM"
stoptime = 10
stdout = "/tmp/web.out"
env = { PORT = "8080" }
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let web = cfg.program("web").unwrap();

    assert_eq!(web.name, "web");
    assert_eq!(web.cmd, "/usr/bin/python3");
    assert_eq!(web.args, vec!["-m", "http.server"]);
    assert_eq!(web.numprocs, 2);
    assert_eq!(web.umask, 0o077);
    assert_eq!(web.workingdir, PathBuf::from("/tmp"));
    assert!(!web.autostart);
    assert_eq!(web.autorestart, RestartMode::Always);
    assert_eq!(web.exitcodes, vec![0, 2]);
    assert_eq!(web.startretries, RetryBudget::Limited(3));
    assert_eq!(web.starttime, Duration::from_secs(5));
    assert_eq!(web.stopsignal.name(), "TERM");
    assert_eq!(web.stoptime, Duration::from_secs(10));
    assert_eq!(web.stdout, Some(PathBuf::from("/tmp/web.out")));
    assert_eq!(web.stdin, None);
    assert_eq!(web.env.get("PORT").map(String::as_str), Some("8080"));
}

#[test]
fn minimal_program_gets_defaults() {
    let file = config_file(
        r#"
[programs.sleeper]
cmd = "/bin/sleep"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let spec = cfg.program("sleeper").unwrap();

    assert_eq!(spec.numprocs, 1);
    assert!(spec.autostart);
    assert_eq!(spec.autorestart, RestartMode::Never);
    assert_eq!(spec.exitcodes, vec![0]);
    assert_eq!(spec.startretries, RetryBudget::Limited(0));
    assert_eq!(spec.umask, 0o022);
    assert_eq!(spec.starttime, Duration::ZERO);
    assert_eq!(spec.stoptime, Duration::from_secs(1));
    assert_eq!(spec.stopsignal.name(), "INT");
}

#[test]
fn negative_one_retries_is_unlimited() {
    let file = config_file(
        r#"
[programs.p]
cmd = "/bin/true"
startretries = -1
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.program("p").unwrap().startretries, RetryBudget::Unlimited);
}

#[test]
fn missing_programs_table_is_a_config_error() {
    let file = config_file("title = \"nothing here\"\n");
    match load_and_validate(file.path()) {
        Err(TaskmasterError::ConfigError(msg)) => assert!(msg.contains("[programs]")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn missing_cmd_is_a_config_error() {
    let file = config_file(
        r#"
[programs.empty]
numprocs = 2
"#,
    );
    match load_and_validate(file.path()) {
        Err(TaskmasterError::ConfigError(msg)) => assert!(msg.contains("empty")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn unknown_restart_mode_is_a_config_error() {
    let file = config_file(
        r#"
[programs.p]
cmd = "/bin/true"
autorestart = "often"
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskmasterError::ConfigError(_))
    ));
}

#[test]
fn unknown_stop_signal_is_rejected() {
    let file = config_file(
        r#"
[programs.p]
cmd = "/bin/true"
stopsignal = "NOPE"
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskmasterError::InvalidSignal(_))
    ));
}

#[test]
fn retries_below_negative_one_are_rejected() {
    let file = config_file(
        r#"
[programs.p]
cmd = "/bin/true"
startretries = -2
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskmasterError::ConfigError(_))
    ));
}

#[test]
fn one_bad_program_fails_the_whole_file() {
    let file = config_file(
        r#"
[programs.good]
cmd = "/bin/true"

[programs.bad]
cmd = "/bin/true"
autorestart = "maybe"
"#,
    );
    assert!(load_and_validate(file.path()).is_err());
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = config_file("[programs.p\ncmd = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskmasterError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here.toml"),
        Err(TaskmasterError::IoError(_))
    ));
}
