//! Elasticsearch version strings.
//!
//! A version is accepted only in the shape `MAJOR.MINOR.PATCH[-suffix]` where
//! the suffix is a single alphanumeric identifier (`8.0.0-rc1`). The raw string
//! is kept because it doubles as a key in directory and artifact names.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::errors::EvmError;

/// A validated Elasticsearch version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EsVersion {
    raw: String,
    parsed: semver::Version,
}

impl EsVersion {
    /// Parses and validates a version string.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError::InvalidVersion`] when the input is not
    /// `MAJOR.MINOR.PATCH` with an optional `-alphanumeric` suffix.
    pub fn parse(input: &str) -> Result<Self, EvmError> {
        let invalid = || EvmError::InvalidVersion {
            version: input.to_string(),
        };

        let (core, suffix) = match input.split_once('-') {
            Some((core, suffix)) => (core, Some(suffix)),
            None => (input, None),
        };
        let mut components = core.split('.').map(numeric);
        let (Some(Some(major)), Some(Some(minor)), Some(Some(patch)), None) = (
            components.next(),
            components.next(),
            components.next(),
            components.next(),
        ) else {
            return Err(invalid());
        };

        let mut parsed = semver::Version::new(major, minor, patch);
        if let Some(suffix) = suffix {
            parsed.pre = prerelease(suffix).ok_or_else(invalid)?;
        }

        Ok(Self {
            raw: input.to_string(),
            parsed,
        })
    }

    /// Returns the version exactly as it was written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.parsed.major
    }

    #[must_use]
    pub fn minor(&self) -> u64 {
        self.parsed.minor
    }
}

/// Parses a run of ASCII digits. Leading zeros are allowed.
fn numeric(component: &str) -> Option<u64> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    component.parse().ok()
}

/// Builds the precedence key of a single alphanumeric suffix. Purely numeric
/// suffixes are normalized so `01` and `1` rank alike.
fn prerelease(suffix: &str) -> Option<semver::Prerelease> {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    match numeric(suffix) {
        Some(n) => semver::Prerelease::new(&n.to_string()).ok(),
        None if suffix.bytes().all(|b| b.is_ascii_digit()) => None,
        None => semver::Prerelease::new(suffix).ok(),
    }
}

impl Ord for EsVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed
            .cmp(&other.parsed)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for EsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for EsVersion {
    type Err = EvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
