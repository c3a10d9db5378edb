//! CLI subprocess integration tests.
//!
//! These tests invoke the `cacheseal` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output stability.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const DIGEST_OF_X: &str = "d752c2c51fba0e29aa190570a9d4253e44077a058d3297fa3a5630d5bd012622f97c28acaed313b5c83bb990caa7da85";

fn cacheseal_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cacheseal"));
    cmd.env_remove("CACHESEAL_LOG");
    cmd
}

fn write_project(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir.join("dist")).unwrap();
    fs::write(dir.join("dist/bundle.js"), "x").unwrap();
    fs::write(
        dir.join("sw.js"),
        "const VERSION = '__APP_VERSION__';\nconst RESOURCE_INTEGRITY = {};\n",
    )
    .unwrap();
    fs::write(dir.join("package.json"), r#"{"version": "1.0.0"}"#).unwrap();
    let config = dir.join("cacheseal.toml");
    fs::write(
        &config,
        r#"config_version = 1
host_artifact = "sw.js"

[[artifacts]]
key = "/dist/bundle.js?v={version}"
path = "dist/bundle.js"

[[version_targets]]
path = "sw.js"
placeholder = "__APP_VERSION__"

[release]
backend = "mock"
"#,
    )
    .unwrap();
    config
}

fn run(config: &Path, args: &[&str]) -> Output {
    cacheseal_bin()
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn cli_version_exits_zero() {
    let output = cacheseal_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "cacheseal --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("cacheseal"),
        "version output must contain 'cacheseal': {stdout}"
    );
}

#[test]
fn cli_help_lists_commands() {
    let output = cacheseal_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["inject-version", "update-hashes", "verify-hashes", "release"] {
        assert!(stdout.contains(command), "help must list '{command}'");
    }
}

#[test]
fn cli_update_then_verify_passes() {
    let project = tempfile::tempdir().unwrap();
    let config = write_project(project.path());

    let update = run(&config, &["update-hashes"]);
    assert!(
        update.status.success(),
        "update-hashes must exit 0. stderr: {}",
        String::from_utf8_lossy(&update.stderr)
    );
    let sw = fs::read_to_string(project.path().join("sw.js")).unwrap();
    assert!(sw.contains(&format!("\"/dist/bundle.js?v=1.0.0\": \"{DIGEST_OF_X}\"")));

    let verify = run(&config, &["verify-hashes"]);
    assert!(verify.status.success());
    let stdout = String::from_utf8_lossy(&verify.stdout);
    assert!(stdout.contains("PASS"), "stdout: {stdout}");
    assert!(stdout.contains("1/1 artifacts passed"), "stdout: {stdout}");
}

#[test]
fn cli_verify_fails_after_artifact_change() {
    let project = tempfile::tempdir().unwrap();
    let config = write_project(project.path());
    assert!(run(&config, &["update-hashes"]).status.success());

    fs::write(project.path().join("dist/bundle.js"), "y").unwrap();
    let verify = run(&config, &["verify-hashes"]);
    assert_eq!(verify.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&verify.stdout);
    assert!(stdout.contains("FAIL"));
    assert!(stdout.contains("/dist/bundle.js?v=1.0.0"));
    assert!(stdout.contains(DIGEST_OF_X));
}

#[test]
fn cli_verify_json_is_stable() {
    let project = tempfile::tempdir().unwrap();
    let config = write_project(project.path());
    assert!(run(&config, &["update-hashes"]).status.success());

    let verify = run(&config, &["--json", "verify-hashes"]);
    assert!(verify.status.success());
    let json: serde_json::Value = serde_json::from_slice(&verify.stdout).unwrap();
    assert_eq!(json["passed"], 1);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["checks"][0]["key"], "/dist/bundle.js?v=1.0.0");
    assert_eq!(json["checks"][0]["status"], "pass");
    assert_eq!(json["checks"][0]["computed"], DIGEST_OF_X);
}

#[test]
fn cli_missing_artifact_asymmetry() {
    let project = tempfile::tempdir().unwrap();
    let config = write_project(project.path());
    fs::remove_file(project.path().join("dist/bundle.js")).unwrap();

    let update = run(&config, &["update-hashes"]);
    assert!(update.status.success(), "update must tolerate missing artifacts");
    let stdout = String::from_utf8_lossy(&update.stdout);
    assert!(stdout.contains("skipped"));

    let verify = run(&config, &["verify-hashes"]);
    assert_eq!(verify.status.code(), Some(1));
}

#[test]
fn cli_update_without_manifest_block_fails() {
    let project = tempfile::tempdir().unwrap();
    let config = write_project(project.path());
    fs::write(project.path().join("sw.js"), "// reshaped\n").unwrap();

    let output = run(&config, &["update-hashes"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("RESOURCE_INTEGRITY"), "stderr: {stderr}");
}

#[test]
fn cli_inject_version_replaces_placeholder() {
    let project = tempfile::tempdir().unwrap();
    let config = write_project(project.path());

    let output = run(&config, &["inject-version"]);
    assert!(output.status.success());
    let sw = fs::read_to_string(project.path().join("sw.js")).unwrap();
    assert!(sw.starts_with("const VERSION = '1.0.0';\n"));

    // Second run finds no placeholder: warning only, file untouched.
    let again = run(&config, &["inject-version"]);
    assert!(again.status.success());
    assert_eq!(fs::read_to_string(project.path().join("sw.js")).unwrap(), sw);
    assert!(String::from_utf8_lossy(&again.stdout).contains("warning"));
}

#[test]
fn cli_release_with_mock_backend() {
    let project = tempfile::tempdir().unwrap();
    let config = write_project(project.path());

    let output = run(&config, &["--json", "release"]);
    assert!(
        output.status.success(),
        "release must exit 0. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["version"], "1.0.0");
    assert_eq!(json["commit_message"], "chore(release): v1.0.0");
    assert_eq!(json["steps"].as_array().unwrap().len(), 4);
}

#[test]
fn cli_missing_config_fails() {
    let project = tempfile::tempdir().unwrap();
    let output = run(&project.path().join("cacheseal.toml"), &["verify-hashes"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn cli_duplicate_keys_rejected() {
    let project = tempfile::tempdir().unwrap();
    let config = write_project(project.path());
    let mut text = fs::read_to_string(&config).unwrap();
    text.push_str("\n[[artifacts]]\nkey = \"/dist/bundle.js?v={version}\"\npath = \"dist/other.js\"\n");
    fs::write(&config, text).unwrap();

    let output = run(&config, &["update-hashes"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate cache key"));
    // Nothing digested, nothing written.
    assert!(fs::read_to_string(project.path().join("sw.js"))
        .unwrap()
        .contains("RESOURCE_INTEGRITY = {};"));
}

fn git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

#[test]
fn cli_release_with_git_through_relative_config_path() {
    let tmp = tempfile::tempdir().unwrap();
    if git(tmp.path(), &["--version"]).is_none() {
        return;
    }
    let web = tmp.path().join("web");
    let remote = tmp.path().join("remote.git");
    fs::create_dir_all(&web).unwrap();
    let config = write_project(&web);
    let text = fs::read_to_string(&config).unwrap().replace(
        "backend = \"mock\"",
        &format!(
            "backend = \"git\"\nremote = \"{}\"\nbranch = \"main\"",
            remote.display()
        ),
    );
    fs::write(&config, text).unwrap();
    assert!(git(tmp.path(), &["init", "-q", "--bare", "remote.git"]).is_some());
    assert!(git(&web, &["init", "-q"]).is_some());
    assert!(git(&web, &["symbolic-ref", "HEAD", "refs/heads/main"]).is_some());

    let output = cacheseal_bin()
        .current_dir(tmp.path())
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_AUTHOR_NAME", "release")
        .env("GIT_AUTHOR_EMAIL", "release@example.invalid")
        .env("GIT_COMMITTER_NAME", "release")
        .env("GIT_COMMITTER_EMAIL", "release@example.invalid")
        .args(["--config", "web/cacheseal.toml", "release"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "release must exit 0. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let committed = git(&web, &["show", "--name-only", "--format=%s", "HEAD"]).unwrap();
    assert!(committed.starts_with("chore(release): v1.0.0"));
    assert!(committed.lines().any(|l| l == "sw.js"), "{committed}");
    let pushed = git(&remote, &["log", "--format=%s", "main"]).unwrap();
    assert_eq!(pushed.trim(), "chore(release): v1.0.0");
}

#[test]
fn cli_completions_bash() {
    let output = cacheseal_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("cacheseal"));
}
