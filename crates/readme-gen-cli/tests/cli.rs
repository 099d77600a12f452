use std::fs;
use std::path::Path;

use predicates::prelude::*;
use readme_gen_core::ExitCode;
use tempfile::{tempdir, TempDir};

const SCENARIO: &str = "//! Hello\ncode line\n//!   World  \n";

fn cargo_bin() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("readme-gen").unwrap()
}

fn crate_dir(source: &str) -> TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src").join("lib.rs"), source).unwrap();
    dir
}

fn readme(dir: &Path) -> String {
    fs::read_to_string(dir.join("README.md")).unwrap()
}

#[test]
fn regenerates_readme_with_no_arguments() {
    let dir = crate_dir(SCENARIO);

    cargo_bin()
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    assert_eq!(readme(dir.path()), "# softbuffer-rgb\n\nHello\nWorld");
}

#[test]
fn verbatim_flag_keeps_whitespace() {
    let dir = crate_dir(SCENARIO);

    cargo_bin()
        .current_dir(dir.path())
        .arg("--verbatim")
        .assert()
        .success();

    assert_eq!(readme(dir.path()), "# softbuffer-rgb\n\n Hello\n   World  ");
}

#[test]
fn missing_source_fails_and_creates_nothing() {
    let dir = tempdir().unwrap();

    cargo_bin()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(ExitCode::Source as i32)
        .stderr(predicate::str::contains("failed to read source"));

    assert!(!dir.path().join("README.md").exists());
}

#[test]
fn check_fails_for_stale_readme_and_passes_after_regeneration() {
    let dir = crate_dir(SCENARIO);
    fs::write(dir.path().join("README.md"), "# softbuffer-rgb\n\nHello").unwrap();

    cargo_bin()
        .current_dir(dir.path())
        .arg("--check")
        .assert()
        .failure()
        .code(ExitCode::OutOfDate as i32)
        .stdout(predicate::str::contains("+World"))
        .stderr(predicate::str::contains("out of date"));

    assert_eq!(readme(dir.path()), "# softbuffer-rgb\n\nHello");

    cargo_bin().current_dir(dir.path()).assert().success();

    cargo_bin()
        .current_dir(dir.path())
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn dry_run_prints_diff_without_writing() {
    let dir = crate_dir(SCENARIO);

    cargo_bin()
        .current_dir(dir.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("+Hello"));

    assert!(!dir.path().join("README.md").exists());
}

#[test]
fn stdout_prints_exact_document() {
    let dir = crate_dir(SCENARIO);

    cargo_bin()
        .current_dir(dir.path())
        .arg("--stdout")
        .assert()
        .success()
        .stdout("# softbuffer-rgb\n\nHello\nWorld");

    assert!(!dir.path().join("README.md").exists());
}

#[test]
fn flags_override_config_file() {
    let dir = crate_dir("//! from lib\n");
    fs::write(dir.path().join("main.rs"), "//! from main\n").unwrap();
    fs::write(
        dir.path().join(".readme-gen.toml"),
        "source = \"main.rs\"\nheader = \"# configured\"\n",
    )
    .unwrap();

    cargo_bin()
        .current_dir(dir.path())
        .arg("--stdout")
        .assert()
        .success()
        .stdout("# configured\n\nfrom main");

    cargo_bin()
        .current_dir(dir.path())
        .args(["--stdout", "--source", "src/lib.rs", "--header", "# flagged"])
        .assert()
        .success()
        .stdout("# flagged\n\nfrom lib");
}

#[test]
fn working_dir_flag_resolves_paths() {
    let dir = crate_dir(SCENARIO);
    let elsewhere = tempdir().unwrap();

    cargo_bin()
        .current_dir(elsewhere.path())
        .arg("-C")
        .arg(dir.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout("");

    assert_eq!(readme(dir.path()), "# softbuffer-rgb\n\nHello\nWorld");
}

#[test]
fn json_summary_reports_counts() {
    let dir = crate_dir(SCENARIO);

    let assert = cargo_bin()
        .current_dir(dir.path())
        .args(["--format", "json"])
        .assert()
        .success();

    let summary: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(summary["mode"], "write");
    assert_eq!(summary["extracted"], 2);
    assert_eq!(summary["source_lines"], serde_json::json!([1, 3]));
    assert_eq!(summary["changed"], true);
}

#[test]
fn invalid_config_exits_with_config_code() {
    let dir = crate_dir(SCENARIO);
    fs::write(dir.path().join(".readme-gen.toml"), "payload = \"raw\"\n").unwrap();

    cargo_bin()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(ExitCode::Config as i32)
        .stderr(predicate::str::contains("unknown payload mode"));
}

#[test]
fn empty_marker_flag_is_rejected() {
    let dir = crate_dir(SCENARIO);

    cargo_bin()
        .current_dir(dir.path())
        .args(["--marker", ""])
        .assert()
        .failure()
        .code(ExitCode::InvalidArguments as i32);
}

#[test]
fn check_and_stdout_conflict() {
    cargo_bin()
        .args(["--check", "--stdout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
