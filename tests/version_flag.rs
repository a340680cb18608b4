use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn prints_version() {
    Command::cargo_bin("finch")
        .expect("finch binary")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn prints_help() {
    Command::cargo_bin("finch")
        .expect("finch binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Finch"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn rejects_unknown_command() {
    Command::cargo_bin("finch")
        .expect("finch binary")
        .arg("frobnicate")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown command"));
}
