//! Artifact download and integrity verification.
//!
//! ## Mirror Selection
//!
//! Mirrors are probed in order with a HEAD request and the first one that
//! answers successfully is committed to. A transfer failure after that point
//! aborts the install; later mirrors are not tried and nothing is retried.
//!
//! ## Checksums
//!
//! After the transfer, the companion checksum is looked up on the same mirror
//! using the extensions in [`CHECKSUM_EXTENSIONS`]. Releases that never
//! published one are accepted with a warning. A checksum that exists but
//! cannot be fetched fails the download.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::artifact::{artifact_name, candidate_urls};
use super::config::EvmConfig;
use super::platform::Platform;
use super::verify::{CHECKSUM_EXTENSIONS, ChecksumAlgorithm, parse_checksum_file, verify_checksum};
use super::version::EsVersion;
use crate::errors::EvmError;

/// Minimum interval between progress updates in milliseconds.
const PROGRESS_INTERVAL_MS: u128 = 250;

/// Fetches release artifacts from the configured mirrors.
pub struct Downloader<'a> {
    config: &'a EvmConfig,
    probe_client: reqwest::Client,
    transfer_client: reqwest::Client,
    show_progress: bool,
}

impl<'a> Downloader<'a> {
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be created.
    pub fn new(config: &'a EvmConfig) -> Result<Self> {
        let probe_client = reqwest::Client::builder()
            .timeout(config.probe_timeout)
            .build()
            .context("Failed to create HTTP client")?;
        let transfer_client = reqwest::Client::builder()
            .timeout(config.transfer_timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            config,
            probe_client,
            transfer_client,
            show_progress: true,
        })
    }

    /// Disables the progress line.
    #[cfg(test)]
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Downloads and verifies the artifact for `version` into the root.
    ///
    /// Returns the path of the verified artifact.
    ///
    /// # Errors
    ///
    /// - [`EvmError::ArtifactNotFound`] if no mirror answers the probe
    /// - [`EvmError::Network`] if the transfer fails
    /// - [`EvmError::ChecksumMismatch`] if verification fails; the artifact is removed
    pub async fn download(&self, version: &EsVersion, platform: Platform) -> Result<PathBuf> {
        let filename = artifact_name(version, platform);
        let urls = candidate_urls(&self.config.mirrors, version, &filename);

        let url = self
            .find_mirror(&urls)
            .await
            .ok_or_else(|| EvmError::ArtifactNotFound {
                artifact: filename.clone(),
            })?;

        let dest = self.config.artifact_path(&filename);
        info!(%url, "downloading artifact");
        println!("Downloading {url}");
        self.transfer(&url, &dest).await?;

        if let Err(e) = self.verify(&url, &dest, &filename).await {
            std::fs::remove_file(&dest).ok();
            return Err(e);
        }

        Ok(dest)
    }

    async fn verify(&self, url: &str, dest: &Path, filename: &str) -> Result<()> {
        match self.fetch_checksum(url).await? {
            Some((expected, algorithm)) => {
                debug!(algorithm = algorithm.as_str(), "verifying checksum");
                verify_checksum(dest, &expected, algorithm)
            }
            None => {
                warn!(artifact = %filename, "no checksum published; skipping verification");
                Ok(())
            }
        }
    }

    async fn find_mirror(&self, urls: &[String]) -> Option<String> {
        for url in urls {
            match self.probe_client.head(url).send().await {
                Ok(response) if response.status().is_success() => return Some(url.clone()),
                Ok(response) => debug!(%url, status = %response.status(), "mirror probe rejected"),
                Err(e) => debug!(%url, error = %e, "mirror probe failed"),
            }
        }
        None
    }

    /// Looks up the companion checksum of `artifact_url`.
    ///
    /// Only an extension answering "not found" counts as unpublished; any
    /// other failure aborts the lookup.
    async fn fetch_checksum(
        &self,
        artifact_url: &str,
    ) -> Result<Option<(String, ChecksumAlgorithm)>> {
        for (extension, algorithm) in CHECKSUM_EXTENSIONS {
            let url = format!("{artifact_url}.{extension}");
            let response = self
                .probe_client
                .get(&url)
                .send()
                .await
                .map_err(|e| EvmError::network(format!("failed to fetch checksum {url}"), e))?;

            let status = response.status();
            if is_unpublished(status) {
                debug!(%url, %status, "checksum not published");
                continue;
            }
            if !status.is_success() {
                return Err(
                    EvmError::network_message(format!("HTTP error {status}: {url}")).into(),
                );
            }

            let body = response
                .text()
                .await
                .map_err(|e| EvmError::network(format!("failed to read checksum {url}"), e))?;
            match parse_checksum_file(&body) {
                Some(digest) => return Ok(Some((digest, algorithm))),
                None => debug!(%url, "checksum file holds no digest"),
            }
        }
        Ok(None)
    }

    /// Streams `url` into `dest` through a `.part` file.
    async fn transfer(&self, url: &str, dest: &Path) -> Result<()> {
        let part = part_path(dest);
        let result = self.stream_to(url, &part).await;
        if let Err(e) = result {
            tokio::fs::remove_file(&part).await.ok();
            return Err(e);
        }
        tokio::fs::rename(&part, dest).await.with_context(|| {
            format!("Failed to rename {} to {}", part.display(), dest.display())
        })
    }

    async fn stream_to(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .transfer_client
            .get(url)
            .send()
            .await
            .map_err(|e| EvmError::network(format!("failed to connect to {url}"), e))?;

        if !response.status().is_success() {
            return Err(
                EvmError::network_message(format!("HTTP error {}: {url}", response.status())).into(),
            );
        }

        let total_size = response.content_length().unwrap_or(0);

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        let start_time = Instant::now();
        let mut last_update = Instant::now();

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| EvmError::network(format!("transfer from {url} interrupted"), e))?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write to {}", dest.display()))?;
            downloaded += chunk.len() as u64;

            if self.show_progress && last_update.elapsed().as_millis() >= PROGRESS_INTERVAL_MS {
                print_progress(downloaded, total_size, start_time.elapsed().as_secs_f64());
                last_update = Instant::now();
            }
        }

        file.flush()
            .await
            .with_context(|| format!("Failed to flush {}", dest.display()))?;

        if self.show_progress {
            print_progress(downloaded, total_size, start_time.elapsed().as_secs_f64());
            println!();
        }
        Ok(())
    }
}

/// Statuses meaning the mirror has no such checksum file. S3-backed mirrors
/// answer 403 for missing keys.
fn is_unpublished(status: reqwest::StatusCode) -> bool {
    matches!(
        status,
        reqwest::StatusCode::NOT_FOUND | reqwest::StatusCode::FORBIDDEN
    )
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn print_progress(downloaded: u64, total: u64, elapsed_secs: f64) {
    let percent = if total > 0 {
        (downloaded as f64 / total as f64 * 100.0) as u8
    } else {
        0
    };
    let speed = if elapsed_secs > 0.0 {
        downloaded as f64 / elapsed_secs
    } else {
        0.0
    };

    print!(
        "\r{}/{} ({percent}%) {}/s     ",
        format_size(downloaded as f64),
        format_size(total as f64),
        format_size(speed)
    );
    let _ = std::io::stdout().flush();
}

/// Formats a byte quantity as B, KB, MB, or GB.
fn format_size(bytes: f64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    const STEP: f64 = 1024.0;

    if bytes < STEP {
        return format!("{bytes:.0} B");
    }
    let mut value = bytes / STEP;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < STEP {
            break;
        }
        value /= STEP;
        unit = next;
    }
    format!("{value:.2} {unit}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::{ErrorKind, kind_of};
    use crate::manager::platform::{Arch, Os};

    const PAYLOAD: &[u8] = b"hello world\n";
    const PAYLOAD_SHA1: &str = "22596363b3de40b06f981fb85d82312e8c0ed511";
    const ARTIFACT: &str = "elasticsearch-6.8.0.tar.gz";

    fn platform() -> Platform {
        Platform::new(Os::Linux, Arch::X86_64)
    }

    fn v(s: &str) -> EsVersion {
        EsVersion::parse(s).unwrap()
    }

    fn config_for(root: &Path, mirrors: Vec<String>) -> EvmConfig {
        let mut config = EvmConfig::with_root(root.to_path_buf());
        config.mirrors = mirrors;
        config
    }

    async fn serve_artifact(server: &mut mockito::ServerGuard, path: &str) {
        server
            .mock("HEAD", path)
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", path)
            .with_body(PAYLOAD)
            .create_async()
            .await;
    }

    /// Answers 404 for every checksum companion of `path`.
    pub(crate) async fn unpublished_checksums(server: &mut mockito::ServerGuard, path: &str) {
        for (extension, _) in CHECKSUM_EXTENSIONS {
            server
                .mock("GET", format!("{path}.{extension}").as_str())
                .with_status(404)
                .create_async()
                .await;
        }
    }

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(512.0), "512 B");
        assert_eq!(format_size(1536.0), "1.50 KB");
        assert_eq!(format_size(5.0 * 1024.0 * 1024.0), "5.00 MB");
        assert_eq!(format_size(3.0 * 1024.0 * 1024.0 * 1024.0), "3.00 GB");
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/r/elasticsearch-6.8.0.tar.gz")),
            PathBuf::from("/r/elasticsearch-6.8.0.tar.gz.part")
        );
    }

    #[tokio::test]
    async fn commits_to_first_responding_mirror() {
        let mut dead = mockito::Server::new_async().await;
        let mut live = mockito::Server::new_async().await;
        dead.mock("HEAD", format!("/{ARTIFACT}").as_str())
            .with_status(404)
            .create_async()
            .await;
        live.mock("HEAD", format!("/{ARTIFACT}").as_str())
            .with_status(200)
            .create_async()
            .await;
        live.mock("GET", format!("/{ARTIFACT}").as_str())
            .with_body(PAYLOAD)
            .create_async()
            .await;
        live.mock("GET", format!("/{ARTIFACT}.sha512").as_str())
            .with_status(404)
            .create_async()
            .await;
        live.mock("GET", format!("/{ARTIFACT}.sha1").as_str())
            .with_body(format!("{PAYLOAD_SHA1}  {ARTIFACT}\n"))
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path(), vec![dead.url(), live.url()]);
        let path = Downloader::new(&config)
            .unwrap()
            .quiet()
            .download(&v("6.8.0"), platform())
            .await
            .unwrap();

        assert_eq!(path, temp.path().join(ARTIFACT));
        assert_eq!(std::fs::read(&path).unwrap(), PAYLOAD);
        assert!(!temp.path().join(format!("{ARTIFACT}.part")).exists());
    }

    #[tokio::test]
    async fn no_responding_mirror_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", format!("/{ARTIFACT}").as_str())
            .with_status(404)
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path(), vec![server.url()]);
        let err = Downloader::new(&config)
            .unwrap()
            .quiet()
            .download(&v("6.8.0"), platform())
            .await
            .unwrap_err();

        assert_eq!(kind_of(&err), Some(ErrorKind::Network));
        assert!(matches!(
            err.downcast_ref::<EvmError>(),
            Some(EvmError::ArtifactNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn transfer_failure_does_not_fall_back() {
        let mut first = mockito::Server::new_async().await;
        let mut second = mockito::Server::new_async().await;
        first
            .mock("HEAD", format!("/{ARTIFACT}").as_str())
            .with_status(200)
            .create_async()
            .await;
        first
            .mock("GET", format!("/{ARTIFACT}").as_str())
            .with_status(500)
            .create_async()
            .await;
        let fallback = second
            .mock("HEAD", format!("/{ARTIFACT}").as_str())
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path(), vec![first.url(), second.url()]);
        let err = Downloader::new(&config)
            .unwrap()
            .quiet()
            .download(&v("6.8.0"), platform())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EvmError>(),
            Some(EvmError::Network { .. })
        ));
        fallback.assert_async().await;
        assert!(!temp.path().join(format!("{ARTIFACT}.part")).exists());
        assert!(!temp.path().join(ARTIFACT).exists());
    }

    #[tokio::test]
    async fn corrupted_checksum_removes_artifact() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", format!("/{ARTIFACT}").as_str())
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", format!("/{ARTIFACT}").as_str())
            .with_body(PAYLOAD)
            .create_async()
            .await;
        server
            .mock("GET", format!("/{ARTIFACT}.sha512").as_str())
            .with_body(format!("{}  {ARTIFACT}", "0".repeat(128)))
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path(), vec![server.url()]);
        let err = Downloader::new(&config)
            .unwrap()
            .quiet()
            .download(&v("6.8.0"), platform())
            .await
            .unwrap_err();

        assert_eq!(kind_of(&err), Some(ErrorKind::Integrity));
        assert!(!temp.path().join(ARTIFACT).exists());
    }

    #[tokio::test]
    async fn missing_checksum_is_accepted() {
        let mut server = mockito::Server::new_async().await;
        serve_artifact(&mut server, &format!("/{ARTIFACT}")).await;
        unpublished_checksums(&mut server, &format!("/{ARTIFACT}")).await;

        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path(), vec![server.url()]);
        let path = Downloader::new(&config)
            .unwrap()
            .quiet()
            .download(&v("6.8.0"), platform())
            .await
            .unwrap();
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn unreachable_checksum_fails_download() {
        let mut server = mockito::Server::new_async().await;
        serve_artifact(&mut server, &format!("/{ARTIFACT}")).await;
        server
            .mock("GET", format!("/{ARTIFACT}.sha512").as_str())
            .with_status(503)
            .create_async()
            .await;
        let legacy = server
            .mock("GET", format!("/{ARTIFACT}.sha1").as_str())
            .with_body(format!("{PAYLOAD_SHA1}  {ARTIFACT}\n"))
            .expect(0)
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path(), vec![server.url()]);
        let err = Downloader::new(&config)
            .unwrap()
            .quiet()
            .download(&v("6.8.0"), platform())
            .await
            .unwrap_err();

        assert_eq!(kind_of(&err), Some(ErrorKind::Network));
        assert!(err.to_string().contains("503"));
        legacy.assert_async().await;
        assert!(!temp.path().join(ARTIFACT).exists());
    }

    #[tokio::test]
    async fn forbidden_checksum_counts_as_unpublished() {
        let mut server = mockito::Server::new_async().await;
        serve_artifact(&mut server, &format!("/{ARTIFACT}")).await;
        server
            .mock("GET", format!("/{ARTIFACT}.sha512").as_str())
            .with_status(403)
            .create_async()
            .await;
        server
            .mock("GET", format!("/{ARTIFACT}.sha1").as_str())
            .with_body(format!("{PAYLOAD_SHA1}  {ARTIFACT}\n"))
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path(), vec![server.url()]);
        let path = Downloader::new(&config)
            .unwrap()
            .quiet()
            .download(&v("6.8.0"), platform())
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), PAYLOAD);
    }

    #[tokio::test]
    async fn mirror_template_substitutes_version() {
        let mut server = mockito::Server::new_async().await;
        serve_artifact(&mut server, &format!("/6.8.0/{ARTIFACT}")).await;
        unpublished_checksums(&mut server, &format!("/6.8.0/{ARTIFACT}")).await;

        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path(), vec![format!("{}/{{version}}/", server.url())]);
        Downloader::new(&config)
            .unwrap()
            .quiet()
            .download(&v("6.8.0"), platform())
            .await
            .unwrap();
    }
}
