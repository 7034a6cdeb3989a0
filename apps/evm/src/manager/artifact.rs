//! Artifact naming and mirror URL construction.
//!
//! Releases before 7.0 ship a single platform-independent tarball; later
//! releases ship one per OS/architecture. No native ARM64 build exists up to
//! 7.15, so ARM hosts fetch the `x86_64` build for those.

use super::platform::{Arch, Platform};
use super::version::EsVersion;
use crate::manager::config::PRODUCT;

/// Placeholder substituted with the version inside mirror templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Returns the tarball file name for `version` on `platform`.
#[must_use]
pub fn artifact_name(version: &EsVersion, platform: Platform) -> String {
    if version.major() < 7 {
        return format!("{PRODUCT}-{version}.tar.gz");
    }
    let arch = artifact_arch(version, platform.arch);
    format!(
        "{PRODUCT}-{version}-{}-{}.tar.gz",
        platform.os.as_str(),
        arch.as_str()
    )
}

fn artifact_arch(version: &EsVersion, host: Arch) -> Arch {
    match host {
        Arch::Aarch64 if version.major() == 7 && version.minor() <= 15 => Arch::X86_64,
        other => other,
    }
}

/// Expands a mirror template into the base URL for `version`.
#[must_use]
pub fn mirror_base(template: &str, version: &EsVersion) -> String {
    template
        .replace(VERSION_PLACEHOLDER, version.as_str())
        .trim_end_matches('/')
        .to_string()
}

/// Returns the full artifact URL on every mirror, in mirror order.
#[must_use]
pub fn candidate_urls(mirrors: &[String], version: &EsVersion, filename: &str) -> Vec<String> {
    mirrors
        .iter()
        .map(|m| format!("{}/{filename}", mirror_base(m, version)))
        .collect()
}
