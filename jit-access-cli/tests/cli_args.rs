use std::process::Command;

const VALID_ARN: &str = "arn:aws:iam::123456789012:user/alice";

fn jit_access() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jit-access"));
    // Keep the test hermetic: nothing from the developer's environment.
    cmd.env_remove("JIT_ROLE_NAME")
        .env_remove("JIT_ROLE_ARN_TO_ASSUME")
        .env_remove("JIT_AUDIT_ROLE_ARN")
        .env_remove("JIRA_SERVER")
        .env_remove("JIRA_PROJECT_KEY")
        .env_remove("JIRA_ASSIGNEE_ID");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let out = jit_access().arg("--help").output().expect("failed to run --help");
    assert!(out.status.success());
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(s.contains("modify-role"), "help was: {}", s);
    assert!(s.contains("audit-lookup"), "help was: {}", s);
    assert!(s.contains("ticket"), "help was: {}", s);
}

#[test]
fn modify_role_rejects_malformed_arn_before_any_aws_call() {
    let output = jit_access()
        .args([
            "modify-role",
            "--identity",
            "not-an-arn",
            "--op",
            "add",
            "--role-name",
            "prod-admin",
        ])
        .output()
        .expect("failed to run modify-role");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("is not an IAM user ARN"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn modify_role_rejects_unknown_op() {
    let output = jit_access()
        .args([
            "modify-role",
            "--identity",
            VALID_ARN,
            "--op",
            "delete",
            "--role-name",
            "prod-admin",
        ])
        .output()
        .expect("failed to run modify-role");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("op must be \"add\" or \"remove\""),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn modify_role_requires_a_role_name() {
    let output = jit_access()
        .args(["modify-role", "--identity", VALID_ARN, "--op", "add"])
        .output()
        .expect("failed to run modify-role");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("roleName"), "stderr was: {}", stderr);
}

#[test]
fn modify_role_reads_envelope_from_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = jit_access()
        .args(["modify-role", "--event", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn command");

    {
        let stdin = child.stdin.as_mut().expect("failed to get stdin");
        stdin
            .write_all(
                br#"{"identity":"arn:aws:iam::123456789012:user/alice","op":"destroy","roleName":"prod-admin"}"#,
            )
            .expect("failed to write to stdin");
    }
    drop(child.stdin.take()); // Close stdin to signal EOF

    let output = child.wait_with_output().expect("failed to wait for child");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    // The envelope parsed, then validation rejected the op.
    assert!(
        stderr.contains("got \"destroy\""),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn modify_role_rejects_garbage_envelope() {
    let output = jit_access()
        .args(["modify-role", "--event", "/nonexistent/envelope.json"])
        .output()
        .expect("failed to run modify-role");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("could not read request envelope"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn event_flag_conflicts_with_inline_fields() {
    let output = jit_access()
        .args([
            "modify-role",
            "--event",
            "-",
            "--identity",
            VALID_ARN,
        ])
        .output()
        .expect("failed to run modify-role");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("cannot be used with"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn audit_lookup_rejects_bad_timestamps_before_any_aws_call() {
    let output = jit_access()
        .args([
            "audit-lookup",
            "--identity",
            VALID_ARN,
            "--created",
            "123",
            "--removal",
            "1700003600",
        ])
        .output()
        .expect("failed to run audit-lookup");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("is not a valid epoch-seconds timestamp"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn audit_lookup_rejects_non_user_identity() {
    let output = jit_access()
        .args([
            "audit-lookup",
            "--identity",
            "arn:aws:iam::123456789012:role/Admin",
            "--created",
            "1700000000",
            "--removal",
            "1700003600",
        ])
        .output()
        .expect("failed to run audit-lookup");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("is not an IAM user ARN"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn audit_lookup_accepts_a_task_token() {
    let out = jit_access()
        .args(["audit-lookup", "--help"])
        .output()
        .expect("failed to run audit-lookup --help");
    assert!(out.status.success());
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(s.contains("--task-token"), "help was: {}", s);
}

#[test]
fn ticket_accepts_a_task_token_on_both_subcommands() {
    for help in [&["ticket", "--help"][..], &["ticket", "create", "--help"][..]] {
        let out = jit_access()
            .args(help)
            .output()
            .expect("failed to run ticket help");
        assert!(out.status.success());
        let s = String::from_utf8_lossy(&out.stdout);
        assert!(s.contains("--task-token"), "help was: {}", s);
    }
}

#[test]
fn direct_audit_failures_carry_a_machine_readable_kind() {
    let output = jit_access()
        .args([
            "audit-lookup",
            "--identity",
            VALID_ARN,
            "--created",
            "not-a-timestamp",
            "--removal",
            "1700003600",
        ])
        .output()
        .expect("failed to run audit-lookup");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("AuditLookupFailed"),
        "stderr was: {}",
        stderr
    );
}

#[test]
fn ticket_create_requires_jira_environment() {
    let output = jit_access()
        .args(["ticket", "create", "--reason", "debugging prod"])
        .output()
        .expect("failed to run ticket create");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("JIRA_SERVER"),
        "stderr was: {}",
        stderr
    );
}
