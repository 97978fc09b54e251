use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn prints_version() {
    Command::cargo_bin("vibecheck")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains("VibeCheck"));
}

#[test]
fn prints_help() {
    Command::cargo_bin("vibecheck")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("VibeCheck"))
        .stdout(predicate::str::contains("--version"))
        .stdout(predicate::str::contains("--analyze"));
}

#[test]
fn analyze_needs_a_link() {
    Command::cargo_bin("vibecheck")
        .unwrap()
        .arg("--analyze")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("needs a link"));
}

#[test]
fn analyze_rejects_unsupported_platform() {
    let home = tempfile::tempdir().unwrap();
    Command::cargo_bin("vibecheck")
        .unwrap()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_CACHE_HOME", home.path().join("cache"))
        .args(["--analyze", "https://example.com/post/1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported platform."));
}
