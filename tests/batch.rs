// Each FILE gets its own engine; a bad FILE is reported and skipped.
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bff").unwrap();
    cmd.env("BFF_CONFIG", "/nonexistent/bff.toml")
        .env_remove("BFF_TAPE_SIZE")
        .env_remove("BFF_MAX_STEPS")
        .env_remove("BFF_TIMEOUT_MS");
    cmd
}

fn print_a() -> String {
    format!("{}.", "+".repeat(65))
}

fn write_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn runs_files_in_order_with_fresh_tapes() {
    let first = write_tempfile(&print_a());
    let second = write_tempfile(&format!("{}+.", print_a()));
    cargo_bin()
        .arg(first.path())
        .arg(second.path())
        .assert()
        .success()
        .stdout("AAB")
        .stderr("");
}

#[test]
fn missing_file_is_skipped_and_reported() {
    let first = write_tempfile(&print_a());
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.bf");
    let last = write_tempfile(&print_a());

    cargo_bin()
        .arg(first.path())
        .arg(&missing)
        .arg(last.path())
        .assert()
        .code(1)
        .stdout("AA")
        .stderr(predicate::str::contains("missing.bf"));
}

#[test]
fn failing_program_does_not_stop_the_batch() {
    let bad = write_tempfile("+.<");
    let good = write_tempfile(&print_a());
    cargo_bin()
        .arg(bad.path())
        .arg(good.path())
        .assert()
        .code(1)
        .stdout("\u{1}A")
        .stderr(predicate::str::contains("Out-of-range memory access"));
}

#[test]
fn files_run_before_eval_snippets() {
    let file = write_tempfile(&print_a());
    cargo_bin()
        .arg("-e")
        .arg(format!("{}.", "+".repeat(66)))
        .arg(file.path())
        .assert()
        .success()
        .stdout("AB");
}

#[test]
fn no_sources_prints_usage() {
    cargo_bin()
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn help_flag_prints_usage_and_succeeds() {
    cargo_bin()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("Usage:").and(predicate::str::contains("--memory")));
}
