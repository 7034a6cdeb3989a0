#![warn(clippy::pedantic)]

//! Integration tests for the evm CLI.
//!
//! These tests spawn the compiled `evm` binary and validate its behavior
//! through stdout, stderr, exit codes, and the state left in the
//! installation root.
//!
//! ## Test Strategy
//!
//! 1. **Metadata**: help and version output
//! 2. **Validation**: malformed versions and plugin arguments exit 1
//! 3. **Registry commands**: `list`, `version`, `which` against fake installs
//! 4. **Activation**: `use` switching, already-active and not-installed paths
//! 5. **Removal**: `remove` guards
//! 6. **Install**: end-to-end against a local mirror, including a corrupted checksum
//! 7. **Plugin proxy**: dialect selection through a recording fake tool
//! 8. **Server control**: `status`, `stop`, `start` without a server
//!
//! ## Test Infrastructure
//!
//! - `assert_cmd` spawns the binary, `predicates` matches output
//! - Every test gets its own `EVM_HOME` from `assert_fs::TempDir`
//! - A `mockito` server stands in for the release mirrors
//!
//! Server-control tests assume no Elasticsearch node is running on the host.

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

/// Builds an `evm` command isolated to `home`.
fn evm(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("evm"));
    cmd.env("EVM_HOME", home)
        .env_remove("EVM_MIRRORS")
        .env_remove("EVM_STATUS_URL")
        .env_remove("EVM_LOG");
    cmd
}

/// Creates fake version directories under `home`.
fn fake_installs(home: &assert_fs::TempDir, versions: &[&str]) {
    for version in versions {
        home.child(format!("elasticsearch-{version}"))
            .create_dir_all()
            .unwrap();
    }
}

/// Points the active symlink at `version`.
#[cfg(unix)]
fn fake_activate(home: &assert_fs::TempDir, version: &str) {
    std::os::unix::fs::symlink(
        format!("elasticsearch-{version}"),
        home.path().join("elasticsearch"),
    )
    .unwrap();
}

/// Returns the version directory the active symlink points at.
#[cfg(unix)]
fn active_target(home: &assert_fs::TempDir) -> String {
    std::fs::read_link(home.path().join("elasticsearch"))
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

// -----------------------------------------------------------------------------
// Metadata
// -----------------------------------------------------------------------------

/// Verifies that `evm --help` lists every subcommand.
#[test]
fn help_shows_available_commands() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.arg("--help");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in [
        "install", "use", "start", "stop", "status", "remove", "list", "version", "which",
        "plugin", "doctor",
    ] {
        assert!(stdout.contains(name), "help is missing {name}");
    }
}

/// Verifies that `evm --version` prints the tool version.
#[test]
fn version_flag_shows_tool_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// -----------------------------------------------------------------------------
// Validation
// -----------------------------------------------------------------------------

/// Verifies that malformed versions are rejected with exit code 1.
#[test]
fn malformed_version_exits_one() {
    let temp = assert_fs::TempDir::new().unwrap();

    for command in ["install", "use", "remove", "which"] {
        let mut cmd = evm(temp.path());
        cmd.arg(command).arg("8.x");

        cmd.assert()
            .code(1)
            .stderr(predicate::str::contains("Error: invalid version '8.x'"));
    }
    assert!(!temp.path().join("elasticsearch").exists());
}

/// Verifies that missing and extra arguments exit 1, not clap's usage code.
#[test]
fn argument_count_errors_exit_one() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = evm(temp.path());
    cmd.arg("install");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("<VERSION>"));

    let mut cmd = evm(temp.path());
    cmd.args(["use", "8.9.0", "extra"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("extra"));

    let mut cmd = evm(temp.path());
    cmd.arg("upgrade");
    cmd.assert().code(1);

    assert!(!temp.path().join("elasticsearch").exists());
}

/// Verifies that unknown plugin subcommands are rejected.
#[test]
fn plugin_unknown_subcommand_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.args(["plugin", "upgrade", "foo"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("unknown plugin subcommand 'upgrade'"));
}

/// Verifies that `plugin install` without a name is rejected.
#[test]
fn plugin_install_requires_name() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.args(["plugin", "install"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("requires a plugin name"));
}

// -----------------------------------------------------------------------------
// Registry Commands
// -----------------------------------------------------------------------------

/// Verifies that `evm list` succeeds with nothing installed.
#[test]
fn list_shows_no_versions_message() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.arg("list");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No versions installed"));
}

/// Verifies that `evm list` orders versions and marks the active one.
#[cfg(unix)]
#[test]
fn list_marks_active_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    fake_installs(&temp, &["7.9.3", "8.9.0", "7.17.10"]);
    fake_activate(&temp, "7.17.10");

    let mut cmd = evm(temp.path());
    cmd.arg("list");

    cmd.assert().success().stdout(
        predicate::str::contains("  8.9.0\n* 7.17.10    (active)\n  7.9.3"),
    );
}

/// Verifies that `evm version` fails when nothing is active.
#[test]
fn version_without_active_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.arg("version");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("no active version"));
}

/// Verifies that `evm version` prints the active version.
#[cfg(unix)]
#[test]
fn version_prints_active_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    fake_installs(&temp, &["8.9.0"]);
    fake_activate(&temp, "8.9.0");

    let mut cmd = evm(temp.path());
    cmd.arg("version");

    cmd.assert().success().stdout("8.9.0\n");
}

/// Verifies that a dangling pointer is reported rather than trusted.
#[cfg(unix)]
#[test]
fn dangling_pointer_is_reported() {
    let temp = assert_fs::TempDir::new().unwrap();
    fake_installs(&temp, &["8.9.0"]);
    fake_activate(&temp, "5.6.0");

    let mut cmd = evm(temp.path());
    cmd.arg("list");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("points to missing"));

    let mut cmd = evm(temp.path());
    cmd.arg("version");
    cmd.assert().code(1);
}

/// Verifies that `evm which` defaults to the active version.
#[cfg(unix)]
#[test]
fn which_defaults_to_active_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    fake_installs(&temp, &["7.17.10", "8.9.0"]);
    fake_activate(&temp, "8.9.0");

    let mut cmd = evm(temp.path());
    cmd.arg("which");
    cmd.assert()
        .success()
        .stdout(predicate::str::ends_with("elasticsearch-8.9.0\n"));

    let mut cmd = evm(temp.path());
    cmd.args(["which", "7.17.10"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::ends_with("elasticsearch-7.17.10\n"));
}

/// Verifies that `evm which` rejects versions that are not installed.
#[test]
fn which_unknown_version_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.args(["which", "8.9.0"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("8.9.0 is not installed"));
}

// -----------------------------------------------------------------------------
// Activation
// -----------------------------------------------------------------------------

/// Verifies that `evm use` switches the pointer.
#[cfg(unix)]
#[test]
fn use_switches_active_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    fake_installs(&temp, &["7.17.10", "8.9.0"]);
    fake_activate(&temp, "7.17.10");

    let mut cmd = evm(temp.path());
    cmd.args(["use", "8.9.0"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Now using Elasticsearch 8.9.0"));
    assert_eq!(active_target(&temp), "elasticsearch-8.9.0");
}

/// Verifies that activating the active version again fails without changes.
#[cfg(unix)]
#[test]
fn use_active_version_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    fake_installs(&temp, &["8.9.0"]);
    fake_activate(&temp, "8.9.0");

    let mut cmd = evm(temp.path());
    cmd.args(["use", "8.9.0"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("already in use"));
    assert_eq!(active_target(&temp), "elasticsearch-8.9.0");
}

/// Verifies that `evm use` of a missing version lists alternatives and exits 0.
#[cfg(unix)]
#[test]
fn use_missing_version_lists_installed() {
    let temp = assert_fs::TempDir::new().unwrap();
    fake_installs(&temp, &["7.17.10", "8.9.0"]);
    fake_activate(&temp, "7.17.10");

    let mut cmd = evm(temp.path());
    cmd.args(["use", "9.9.9"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("9.9.9 is not installed"))
        .stdout(predicate::str::contains("8.9.0"))
        .stdout(predicate::str::contains("7.17.10"));
    assert_eq!(active_target(&temp), "elasticsearch-7.17.10");
}

// -----------------------------------------------------------------------------
// Removal
// -----------------------------------------------------------------------------

/// Verifies that the active version cannot be removed and others can.
#[cfg(unix)]
#[test]
fn remove_guards_active_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    fake_installs(&temp, &["7.17.10", "8.9.0"]);
    fake_activate(&temp, "8.9.0");

    let mut cmd = evm(temp.path());
    cmd.args(["remove", "8.9.0"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("is in use"));
    temp.child("elasticsearch-8.9.0")
        .assert(predicate::path::is_dir());

    let mut cmd = evm(temp.path());
    cmd.args(["remove", "7.17.10"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("7.17.10 removed"));
    temp.child("elasticsearch-7.17.10")
        .assert(predicate::path::missing());
}

/// Verifies that removing a version that is not installed fails.
#[test]
fn remove_missing_version_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.args(["remove", "8.9.0"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("not installed"));
}

// -----------------------------------------------------------------------------
// Install
// -----------------------------------------------------------------------------

/// Builds a release-shaped tarball for `version` (legacy, platform-neutral name).
fn release_tarball(version: &str) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let launcher = b"#!/bin/sh\nexit 0\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(launcher.len() as u64);
    header.set_mode(0o755);
    header.set_entry_type(tar::EntryType::Regular);
    builder
        .append_data(
            &mut header,
            format!("elasticsearch-{version}/bin/elasticsearch"),
            &launcher[..],
        )
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

fn sha512_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha512};
    hex::encode(Sha512::digest(data))
}

/// Verifies a full install from a local mirror and auto-activation.
#[test]
fn install_from_mirror_activates_first_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    let tarball = release_tarball("6.8.0");
    let mut server = mockito::Server::new();
    server
        .mock("HEAD", "/elasticsearch-6.8.0.tar.gz")
        .with_status(200)
        .create();
    server
        .mock("GET", "/elasticsearch-6.8.0.tar.gz")
        .with_body(&tarball)
        .create();
    server
        .mock("GET", "/elasticsearch-6.8.0.tar.gz.sha512")
        .with_body(format!("{}  elasticsearch-6.8.0.tar.gz\n", sha512_hex(&tarball)))
        .create();

    let mut cmd = evm(temp.path());
    cmd.env("EVM_MIRRORS", server.url()).args(["install", "6.8.0"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Elasticsearch 6.8.0 installed"))
        .stdout(predicate::str::contains("Now using Elasticsearch 6.8.0"));
    temp.child("elasticsearch-6.8.0/bin/elasticsearch")
        .assert(predicate::path::is_file());
    temp.child("elasticsearch-6.8.0.tar.gz")
        .assert(predicate::path::missing());

    let mut cmd = evm(temp.path());
    cmd.arg("version");
    cmd.assert().success().stdout("6.8.0\n");

    let mut cmd = evm(temp.path());
    cmd.env("EVM_MIRRORS", server.url()).args(["install", "6.8.0"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("already installed"));
}

/// Verifies that a corrupted checksum aborts the install and leaves no trace.
#[test]
fn install_with_corrupted_checksum_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let tarball = release_tarball("6.8.0");
    let mut server = mockito::Server::new();
    server
        .mock("HEAD", "/elasticsearch-6.8.0.tar.gz")
        .with_status(200)
        .create();
    server
        .mock("GET", "/elasticsearch-6.8.0.tar.gz")
        .with_body(&tarball)
        .create();
    server
        .mock("GET", "/elasticsearch-6.8.0.tar.gz.sha512")
        .with_body("0".repeat(128))
        .create();

    let mut cmd = evm(temp.path());
    cmd.env("EVM_MIRRORS", server.url()).args(["install", "6.8.0"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("checksum mismatch"));
    temp.child("elasticsearch-6.8.0")
        .assert(predicate::path::missing());
    temp.child("elasticsearch-6.8.0.tar.gz")
        .assert(predicate::path::missing());
    temp.child("elasticsearch").assert(predicate::path::missing());
}

/// Verifies that an artifact missing from every mirror is reported.
#[test]
fn install_unknown_artifact_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = mockito::Server::new();

    let mut cmd = evm(temp.path());
    cmd.env("EVM_MIRRORS", server.url()).args(["install", "6.8.0"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("not found on any mirror"));
}

// -----------------------------------------------------------------------------
// Plugin Proxy
// -----------------------------------------------------------------------------

/// Installs an executable fake plugin tool that records its arguments.
#[cfg(unix)]
fn fake_plugin_tool(home: &assert_fs::TempDir, version: &str, tool: &str, exit_code: i32) {
    use std::os::unix::fs::PermissionsExt;

    let record = home.path().join("plugin-args.txt");
    let bin = home.child(format!("elasticsearch-{version}/bin"));
    bin.create_dir_all().unwrap();
    let script = bin.child(tool);
    script
        .write_str(&format!(
            "#!/bin/sh\necho \"$@\" > '{}'\nexit {exit_code}\n",
            record.display()
        ))
        .unwrap();
    std::fs::set_permissions(script.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Verifies dialect selection for the oldest and newest plugin tools.
#[cfg(unix)]
#[test]
fn plugin_install_uses_version_dialect() {
    let legacy = assert_fs::TempDir::new().unwrap();
    fake_plugin_tool(&legacy, "1.7.6", "plugin", 0);
    fake_activate(&legacy, "1.7.6");

    let mut cmd = evm(legacy.path());
    cmd.args(["plugin", "install", "foo"]);
    cmd.assert().success();
    legacy
        .child("plugin-args.txt")
        .assert("--install foo\n");

    let modern = assert_fs::TempDir::new().unwrap();
    fake_plugin_tool(&modern, "9.0.0", "elasticsearch-plugin", 0);
    fake_activate(&modern, "9.0.0");

    let mut cmd = evm(modern.path());
    cmd.args(["plugin", "install", "foo"]);
    cmd.assert().success();
    modern.child("plugin-args.txt").assert("install foo\n");
}

/// Verifies that a failing plugin tool fails the command.
#[cfg(unix)]
#[test]
fn plugin_failure_exits_one() {
    let temp = assert_fs::TempDir::new().unwrap();
    fake_plugin_tool(&temp, "8.9.0", "elasticsearch-plugin", 3);
    fake_activate(&temp, "8.9.0");

    let mut cmd = evm(temp.path());
    cmd.args(["plugin", "remove", "foo"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("exited with code 3"));
}

/// Verifies that the plugin proxy requires an active version.
#[test]
fn plugin_without_active_version_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.args(["plugin", "list"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("no active version"));
}

// -----------------------------------------------------------------------------
// Server Control
// -----------------------------------------------------------------------------

/// Verifies that `evm status` reports a stopped server.
#[cfg(unix)]
#[test]
fn status_reports_not_running() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.arg("status");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("is not running"));
}

/// Verifies that `evm stop` without a server fails.
#[cfg(unix)]
#[test]
fn stop_without_server_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.arg("stop");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("not running"));
}

/// Verifies that `evm start` requires an active version.
#[cfg(unix)]
#[test]
fn start_without_active_version_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.args(["start", "-E", "cluster.name=dev"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("no active version"));
}

/// Verifies that malformed `-E` settings are rejected by argument parsing.
#[test]
fn start_rejects_malformed_setting() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.args(["start", "-E", "cluster.name"]);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("expected key=value"));
}

// -----------------------------------------------------------------------------
// Doctor
// -----------------------------------------------------------------------------

/// Verifies that `evm doctor` always succeeds and reports its checks.
#[test]
fn doctor_reports_checks() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = evm(temp.path());
    cmd.arg("doctor");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Checking Elasticsearch installation"))
        .stdout(predicate::str::contains("Active version"));
}
