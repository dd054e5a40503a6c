use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const RUNNER_VARS: &[&str] = &[
    "GITHUB_ACTIONS",
    "GITHUB_OUTPUT",
    "GITHUB_ENV",
    "GITHUB_STATE",
    "GITHUB_PATH",
    "GITHUB_STEP_SUMMARY",
    "GITHUB_EVENT_PATH",
    "GITHUB_REPOSITORY",
    "RUNNER_DEBUG",
    "RUST_LOG",
    "ACTION_TOOLKIT_LOG_LEVEL",
    "ACTION_TOOLKIT_UV",
    "SYNC_LOCKED",
    "INSTALL_DEV",
    "INSTALL_ALL",
    "SHOW_PACKAGES",
];

/// Return a `Command` for the `action-toolkit` binary with runner variables
/// from the surrounding environment removed.
fn toolkit() -> Command {
    let mut cmd = cargo_bin_cmd!("action-toolkit");
    for var in RUNNER_VARS {
        cmd.env_remove(var);
    }
    for (key, _) in std::env::vars() {
        if key.starts_with("INPUT_") || key.starts_with("STATE_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// ── Global flags ────────────────────────────────────────────────────

#[test]
fn help_flag() {
    toolkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub Actions"));
}

#[test]
fn version_flag() {
    toolkit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn about_flag() {
    toolkit()
        .arg("--about")
        .assert()
        .success()
        .stdout(predicate::str::contains("action-toolkit:"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains("licence:"));
}

#[test]
fn no_args_shows_usage() {
    toolkit()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: action-toolkit"));
}

// ── Inputs and state ────────────────────────────────────────────────

#[test]
fn input_prints_trimmed_value() {
    toolkit()
        .args(["input", "my-input"])
        .env("INPUT_MY_INPUT", "  hello  ")
        .assert()
        .success()
        .stdout("hello\n");
}

#[test]
fn input_no_trim_keeps_whitespace() {
    toolkit()
        .args(["input", "x", "--no-trim"])
        .env("INPUT_X", " a ")
        .assert()
        .success()
        .stdout(" a \n");
}

#[test]
fn missing_required_input_fails() {
    toolkit()
        .args(["input", "token", "--required"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Input required and not supplied: token",
        ));
}

#[test]
fn multiline_input_skips_blank_lines() {
    toolkit()
        .args(["input", "files", "--multiline"])
        .env("INPUT_FILES", "a.txt\n\n  b.txt\n")
        .assert()
        .success()
        .stdout("a.txt\nb.txt\n");
}

#[test]
fn bool_input_lenient_and_strict() {
    toolkit()
        .args(["input", "flag", "--bool"])
        .env("INPUT_FLAG", "yes")
        .assert()
        .success()
        .stdout("true\n");
    toolkit()
        .args(["input", "flag", "--bool", "--strict"])
        .env("INPUT_FLAG", "yes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML 1.2"));
    toolkit()
        .args(["input", "flag", "--bool", "--strict"])
        .env("INPUT_FLAG", "FALSE")
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn get_state_reads_state_variable() {
    toolkit()
        .args(["get-state", "pid"])
        .env("STATE_pid", "1234")
        .assert()
        .success()
        .stdout("1234\n");
}

// ── Outputs, env, path ──────────────────────────────────────────────

#[test]
fn set_output_appends_heredoc_to_file() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("output");
    fs::write(&out, "").unwrap();
    toolkit()
        .args(["set-output", "version", "3.12"])
        .env("GITHUB_OUTPUT", &out)
        .assert()
        .success()
        .stdout("");
    let content = read(&out);
    assert!(content.starts_with("version<<ghadelimiter_"));
    assert!(content.contains("\n3.12\nghadelimiter_"));
}

#[test]
fn set_output_without_file_uses_stdout_command() {
    toolkit()
        .args(["set-output", "answer", "42"])
        .assert()
        .success()
        .stdout("::set-output name=answer::42\n");
}

#[test]
fn export_writes_env_file() {
    let dir = tempdir().unwrap();
    let env_file = dir.path().join("env");
    fs::write(&env_file, "").unwrap();
    toolkit()
        .args(["export", "MY_VAR", "value"])
        .env("GITHUB_ENV", &env_file)
        .assert()
        .success();
    assert!(read(&env_file).starts_with("MY_VAR<<ghadelimiter_"));
}

#[test]
fn add_path_writes_path_file() {
    let dir = tempdir().unwrap();
    let path_file = dir.path().join("path");
    fs::write(&path_file, "").unwrap();
    toolkit()
        .args(["add-path", "/opt/tool/bin"])
        .env("GITHUB_PATH", &path_file)
        .assert()
        .success();
    assert_eq!(read(&path_file), "/opt/tool/bin\n");
}

#[test]
fn mask_emits_add_mask() {
    toolkit()
        .args(["mask", "s3cr3t"])
        .assert()
        .success()
        .stdout("::add-mask::s3cr3t\n");
}

#[test]
fn save_state_writes_state_file() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state");
    fs::write(&state, "").unwrap();
    toolkit()
        .args(["save-state", "pid", "99"])
        .env("GITHUB_STATE", &state)
        .assert()
        .success();
    assert!(read(&state).starts_with("pid<<ghadelimiter_"));
}

// ── Annotations and groups ──────────────────────────────────────────

#[test]
fn annotate_error_with_location() {
    toolkit()
        .args([
            "annotate", "error", "bad thing", "--title", "Lint", "--file", "src/a.rs", "--line",
            "3",
        ])
        .assert()
        .success()
        .stdout("::error title=Lint,file=src/a.rs,line=3::bad thing\n");
}

#[test]
fn annotate_escapes_message() {
    toolkit()
        .args(["annotate", "warning", "50% done\nnext"])
        .assert()
        .success()
        .stdout("::warning::50%25 done%0Anext\n");
}

#[test]
fn annotate_rejects_columns_across_lines() {
    toolkit()
        .args([
            "annotate", "notice", "x", "--line", "1", "--end-line", "2", "--col", "4",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("startColumn"));
}

#[test]
fn group_and_endgroup() {
    toolkit()
        .args(["group", "Build"])
        .assert()
        .success()
        .stdout("::group::Build\n");
    toolkit()
        .arg("endgroup")
        .assert()
        .success()
        .stdout("::endgroup::\n");
}

// ── Summary ─────────────────────────────────────────────────────────

#[test]
fn summary_appends_html() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("summary.md");
    fs::write(&file, "existing\n").unwrap();
    toolkit()
        .args([
            "summary", "--heading", "Results", "--heading-level", "2", "--list", "one", "--list",
            "two",
        ])
        .env("GITHUB_STEP_SUMMARY", &file)
        .assert()
        .success();
    assert_eq!(
        read(&file),
        "existing\n<h2>Results</h2>\n<ul><li>one</li><li>two</li></ul>\n"
    );
}

#[test]
fn summary_overwrite_and_clear() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("summary.md");
    fs::write(&file, "old\n").unwrap();
    toolkit()
        .args(["summary", "--text", "fresh", "--overwrite"])
        .env("GITHUB_STEP_SUMMARY", &file)
        .assert()
        .success();
    assert_eq!(read(&file), "fresh\n");
    toolkit()
        .args(["summary", "--clear"])
        .env("GITHUB_STEP_SUMMARY", &file)
        .assert()
        .success();
    assert_eq!(read(&file), "");
}

#[test]
fn summary_print_renders_table() {
    toolkit()
        .args(["summary", "--print", "--row", "Name,Result", "--row", "lint,pass"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<th>Name</th>"))
        .stdout(predicate::str::contains("<td>pass</td>"));
}

#[test]
fn summary_without_env_fails() {
    toolkit()
        .args(["summary", "--text", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_STEP_SUMMARY"));
}

// ── Context, platform, which ────────────────────────────────────────

#[test]
fn context_json() {
    toolkit()
        .args(["context", "--format", "json"])
        .env("GITHUB_REPOSITORY", "octo/hello")
        .env("GITHUB_REF", "refs/heads/main")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"repository\": \"octo/hello\""))
        .stdout(predicate::str::contains("\"ref\": \"refs/heads/main\""));
}

#[test]
fn runner_context_text() {
    toolkit()
        .args(["context", "--runner"])
        .env("RUNNER_OS", "Linux")
        .assert()
        .success()
        .stdout(predicate::str::contains("os: Linux"));
}

#[test]
fn platform_reports_arch() {
    toolkit()
        .args(["platform", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(std::env::consts::ARCH));
}

#[cfg(unix)]
#[test]
fn which_finds_sh() {
    toolkit()
        .args(["which", "sh"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("sh\n"));
}

#[test]
fn which_missing_tool() {
    toolkit()
        .args(["which", "definitely-not-a-tool-xyz"])
        .assert()
        .code(1)
        .stdout("");
    toolkit()
        .args(["which", "definitely-not-a-tool-xyz", "--check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("definitely-not-a-tool-xyz"));
}

// ── Exec ────────────────────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn exec_streams_and_forwards_exit_code() {
    toolkit()
        .args(["exec", "--", "sh", "-c", "echo out; echo err >&2; exit 7"])
        .assert()
        .code(7)
        .stdout("out\n")
        .stderr(predicate::str::contains("err"));
}

#[cfg(unix)]
#[test]
fn exec_with_env_and_input() {
    toolkit()
        .args([
            "exec", "--env", "GREETING=hi", "--input", "piped", "--", "sh", "-c",
            "echo $GREETING; cat",
        ])
        .assert()
        .success()
        .stdout("hi\npiped\n");
}

#[cfg(unix)]
#[test]
fn exec_timeout_fails() {
    toolkit()
        .args(["exec", "--timeout", "0.2", "--", "sleep", "5"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timed out"));
}

#[test]
fn exec_dry_run_prints_command() {
    toolkit()
        .args(["exec", "--dry-run", "--", "definitely-not-a-tool-xyz", "--flag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("definitely-not-a-tool-xyz --flag"));
}

#[test]
fn exec_missing_binary() {
    toolkit()
        .args(["exec", "--", "definitely-not-a-tool-xyz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("action-toolkit exec:"));
}

// ── Sync ────────────────────────────────────────────────────────────

#[test]
fn sync_dry_run_defaults() {
    toolkit()
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout("uv sync --no-dev\n");
}

#[test]
fn sync_dry_run_all_flags() {
    toolkit()
        .args(["sync", "--dry-run", "--uv", "/opt/uv"])
        .env("SYNC_LOCKED", "true")
        .env("INSTALL_DEV", "true")
        .env("INSTALL_ALL", "true")
        .env("SHOW_PACKAGES", "true")
        .assert()
        .success()
        .stdout("/opt/uv sync --locked --dev --all-extras\n/opt/uv tree\n");
}

#[test]
fn sync_locked_requires_exact_true() {
    toolkit()
        .args(["sync", "--dry-run"])
        .env("SYNC_LOCKED", "TRUE")
        .assert()
        .success()
        .stdout(predicate::str::contains("--locked").not());
}

#[cfg(unix)]
#[test]
fn sync_failure_propagates_exit_code() {
    let dir = tempdir().unwrap();
    let uv = dir.path().join("uv");
    fs::write(&uv, "#!/bin/sh\necho \"uv $*\"\nexit 2\n").unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&uv, fs::Permissions::from_mode(0o755)).unwrap();
    }
    toolkit()
        .args(["sync", "--uv"])
        .arg(&uv)
        .env("SHOW_PACKAGES", "true")
        .assert()
        .code(2)
        .stdout("uv sync --no-dev\n");
}

// ── Setup ───────────────────────────────────────────────────────────

#[test]
fn setup_outputs_detected_version() {
    let dir = tempdir().unwrap();
    let pin = dir.path().join(".python-version");
    fs::write(&pin, "3.12\n").unwrap();
    let out = dir.path().join("output");
    fs::write(&out, "").unwrap();
    toolkit()
        .args(["setup", "--version-file"])
        .arg(&pin)
        .env("GITHUB_OUTPUT", &out)
        .assert()
        .success();
    let content = read(&out);
    assert!(content.starts_with("python-version<<ghadelimiter_"));
    assert!(content.contains("\n3.12\n"));
}

#[test]
fn setup_missing_version_file_annotates() {
    let dir = tempdir().unwrap();
    toolkit()
        .current_dir(dir.path())
        .arg("setup")
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with(
            "::error title=Missing version,file=.python-version::",
        ));
}

#[test]
fn setup_rejects_bad_cache_input() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".python-version"), "3.11\n").unwrap();
    toolkit()
        .current_dir(dir.path())
        .arg("setup")
        .env("INPUT_ENABLE_CACHE", "sometimes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("enable-cache"));
}

// ── Playground ──────────────────────────────────────────────────────

#[test]
fn playground_missing_script_fails_with_annotation() {
    let dir = tempdir().unwrap();
    toolkit()
        .current_dir(dir.path())
        .args(["playground", "--run-async", "no", "--script", "nope.py"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with(
            "::error title=Missing script,file=playground/nope.py::",
        ));
}

#[test]
fn playground_requires_run_async() {
    let dir = tempdir().unwrap();
    toolkit()
        .current_dir(dir.path())
        .arg("playground")
        .assert()
        .failure()
        .stderr(predicate::str::contains("run-async"));
}

#[test]
fn playground_rejects_bad_choice() {
    toolkit()
        .args(["playground", "--run-async", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 'yes' or 'no'"));
}

#[cfg(unix)]
#[test]
fn playground_runs_script_from_inputs() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("playground")).unwrap();
    fs::write(
        dir.path().join("playground/demo.sh"),
        "echo \"demo $*\"\nexit 5\n",
    )
    .unwrap();
    toolkit()
        .current_dir(dir.path())
        .args(["playground", "--interpreter", "sh"])
        .env("INPUT_SCRIPT", "demo.sh")
        .env("INPUT_RUN_ASYNC", "yes")
        .assert()
        .code(5)
        .stdout("demo --async\n");
}

// ── Manifest ────────────────────────────────────────────────────────

const ACTION_YML: &str = "name: Setup\n\
description: Install uv\n\
inputs:\n  uv-version:\n    default: \"0.7.12\"\n  token:\n    required: true\n\
outputs:\n  python-version:\n    value: x\n\
runs:\n  using: composite\n  steps: []\n";

#[test]
fn manifest_text_listing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("action.yml");
    fs::write(&path, ACTION_YML).unwrap();
    toolkit()
        .arg("manifest")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Setup: Install uv"))
        .stdout(predicate::str::contains("input token (required): default -"))
        .stdout(predicate::str::contains("input uv-version: default 0.7.12"))
        .stdout(predicate::str::contains("output python-version"));
}

#[test]
fn manifest_check_inputs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("action.yml");
    fs::write(&path, ACTION_YML).unwrap();
    toolkit()
        .arg("manifest")
        .arg(&path)
        .arg("--check-inputs")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "::error::Missing required inputs: token",
        ));
    toolkit()
        .arg("manifest")
        .arg(&path)
        .arg("--check-inputs")
        .env("INPUT_TOKEN", "abc")
        .assert()
        .success();
}

#[test]
fn manifest_reads_repository_setup_action() {
    toolkit()
        .args(["manifest", ".github/actions/setup/action.yml", "--check-inputs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("runs: composite"))
        .stdout(predicate::str::contains("input enable-cache: default true"))
        .stdout(predicate::str::contains("input uv-version: default 0.7.12"));
}

#[test]
fn manifest_missing_file() {
    let dir = tempdir().unwrap();
    toolkit()
        .arg("manifest")
        .arg(dir.path().join("action.yml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("action manifest not found"));
}

// ── Logging ─────────────────────────────────────────────────────────

#[test]
fn actions_mode_renders_logs_as_workflow_commands() {
    toolkit()
        .args(["exec", "--dry-run", "--", "echo", "hi"])
        .env("GITHUB_ACTIONS", "true")
        .assert()
        .success()
        .stderr(predicate::str::contains("[dry run] would execute: echo hi"))
        .stderr(predicate::str::contains("INFO").not());
}

#[test]
fn actions_mode_reports_failures_as_error_annotations() {
    toolkit()
        .args(["input", "token", "--required"])
        .env("GITHUB_ACTIONS", "true")
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("::error::input error: token"))
        .stdout(predicate::str::contains("Input required and not supplied: token"));
}

#[test]
fn quiet_suppresses_info_logs() {
    toolkit()
        .args(["--quiet", "sync", "--dry-run"])
        .assert()
        .success()
        .stderr("");
}
