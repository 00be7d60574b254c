use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bff").unwrap();
    cmd.env("BFF_CONFIG", "/nonexistent/bff.toml")
        .env_remove("BFF_TAPE_SIZE")
        .env_remove("BFF_MAX_STEPS")
        .env_remove("BFF_TIMEOUT_MS");
    cmd
}

#[test]
fn unterminated_loop_is_a_parse_error() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .args(["-e", "+[>+"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(
            predicate::str::contains("Parse error")
                .and(predicate::str::contains("unterminated loop at instruction 1")),
        );
}

#[test]
fn unmatched_close_is_reported_after_prior_output() {
    cargo_bin()
        .timeout(Duration::from_secs(2))
        .args(["-e", "+++.]+."])
        .assert()
        .code(1)
        .stdout("\u{3}")
        .stderr(predicate::str::contains("unmatched ']' at instruction 4"));
}

#[test]
fn pointer_left_of_tape_is_out_of_range() {
    cargo_bin()
        .args(["-e", "<"])
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("Out-of-range memory access")
                .and(predicate::str::contains("op='<'")),
        );
}

#[test]
fn pointer_past_tape_end_is_out_of_range() {
    cargo_bin()
        .args(["--memory", "4", "-e", ">>>+>"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ptr=3, op='>'"));
}

#[test]
fn error_context_shows_caret() {
    cargo_bin()
        .args(["-e", "++<<"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("  ++<<\n    ^\n"));
}

#[test]
fn zero_tape_size_is_rejected_before_running() {
    cargo_bin()
        .args(["-m", "0", "-e", "+++."])
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("invalid tape size '0'"));
}

#[test]
fn negative_tape_size_is_rejected() {
    cargo_bin()
        .args(["--memory", "-5", "-e", "+."])
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("invalid tape size '-5'"));
}

#[test]
fn bad_tape_size_from_env_is_rejected() {
    cargo_bin()
        .env("BFF_TAPE_SIZE", "lots")
        .args(["-e", "+."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("BFF_TAPE_SIZE"));
}

#[test]
fn unknown_eof_policy_is_rejected() {
    cargo_bin()
        .args(["--eof", "sometimes", "-e", ","])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown EOF policy"));
}
