//! Build script for the evm CLI.
//!
//! Embeds the git commit of the build so `evm doctor` can report it.

use std::process::Command;

fn main() {
    let commit = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=EVM_GIT_COMMIT={commit}");

    if let Some(toplevel) = git_output(&["rev-parse", "--show-toplevel"]) {
        println!("cargo:rerun-if-changed={toplevel}/.git/HEAD");
    }
}

fn git_short_hash() -> Option<String> {
    git_output(&["rev-parse", "--short", "HEAD"])
}

/// Runs git with the given arguments and returns trimmed stdout on success.
fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
