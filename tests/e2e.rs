use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn uartplot() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("uartplot"))
}

#[test]
fn help_lists_config_flag_and_keys() {
    uartplot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("r/s/p"));
}

#[test]
fn missing_config_file_fails_before_opening_the_port() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    uartplot()
        .arg("--config")
        .arg(tmp.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to load configuration"));
}

#[test]
fn invalid_config_is_rejected() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let cfg_path = tmp.path().join("uartplot.toml");
    fs::write(&cfg_path, "max_points = 0\n").expect("write config");
    uartplot()
        .arg("--config")
        .arg(&cfg_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_points"));
}

#[test]
fn unreachable_port_is_fatal_at_startup() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let cfg_path = tmp.path().join("uartplot.toml");
    let cfg = format!(
        "serial_port = \"{}\"\nlog_directory = \"{}\"\n",
        tmp.path().join("no-such-tty").display(),
        tmp.path().join("logs").display()
    );
    fs::write(&cfg_path, cfg).expect("write config");
    uartplot()
        .arg("--config")
        .arg(&cfg_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open serial port"));
    // No sample log is created when the transport never came up.
    let logs: Vec<_> = fs::read_dir(tmp.path().join("logs"))
        .expect("log dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".csv"))
        .collect();
    assert!(logs.is_empty());
}

#[test]
fn unknown_argument_is_rejected() {
    uartplot()
        .arg("--bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown argument"));
}
