//! Checksum verification for downloaded artifacts.
//!
//! Mirrors publish a companion file next to each archive. Newer releases ship
//! `.sha512`, older ones `.sha1` or `.sha1.txt`. The first whitespace-separated
//! token of the companion file is the hex digest.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha1::Sha1;
use sha2::{Digest, Sha512};

use crate::errors::EvmError;

/// Hash algorithm behind a checksum companion file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    Sha512,
    Sha1,
}

impl ChecksumAlgorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha512 => "sha512",
            Self::Sha1 => "sha1",
        }
    }
}

/// Companion file extensions, in lookup order.
pub const CHECKSUM_EXTENSIONS: [(&str, ChecksumAlgorithm); 3] = [
    ("sha512", ChecksumAlgorithm::Sha512),
    ("sha1", ChecksumAlgorithm::Sha1),
    ("sha1.txt", ChecksumAlgorithm::Sha1),
];

/// Extracts the digest from a checksum file body.
///
/// Returns `None` if the body holds no hex token.
#[must_use]
pub fn parse_checksum_file(body: &str) -> Option<String> {
    body.split_whitespace()
        .next()
        .filter(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_hexdigit()))
        .map(str::to_lowercase)
}

/// Verifies that a file matches the expected digest.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened or read
/// - The computed digest differs from `expected` ([`EvmError::ChecksumMismatch`])
pub fn verify_checksum(file_path: &Path, expected: &str, algorithm: ChecksumAlgorithm) -> Result<()> {
    let computed = compute_digest(file_path, algorithm)?;
    let expected = expected.to_lowercase();

    if computed != expected {
        let artifact = file_path
            .file_name()
            .map_or_else(|| file_path.display().to_string(), |n| n.to_string_lossy().into_owned());
        return Err(EvmError::ChecksumMismatch {
            artifact,
            expected,
            actual: computed,
        }
        .into());
    }

    Ok(())
}

/// Computes the hex digest of a file with the given algorithm.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_digest(file_path: &Path, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Sha512 => digest_file::<Sha512>(file_path),
        ChecksumAlgorithm::Sha1 => digest_file::<Sha1>(file_path),
    }
}

fn digest_file<D: Digest>(file_path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open file for checksum: {}", file_path.display()))?;

    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).with_context(|| {
            format!("Failed to read file for checksum: {}", file_path.display())
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
