//! Image downloads for the most recently scraped page

use crate::output::ExportResult;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Extensions recognised from the image URL; anything else is saved as png
const KNOWN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg"];

/// Outcome of an image download batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Files written, in download order
    pub saved: Vec<PathBuf>,
    /// URLs that failed, with the reason
    pub failed: Vec<(String, String)>,
}

/// Picks the file extension for an image URL
pub fn image_extension(url: &str) -> &'static str {
    let lower = url.to_ascii_lowercase();
    KNOWN_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(&format!(".{}", ext)))
        .copied()
        .unwrap_or("png")
}

/// Downloads images into `directory` as `image{n}.{ext}`
///
/// At most `max_images` URLs are attempted; `n` is the 1-based position of the
/// URL in `urls`, so a failed download leaves a gap in the numbering. Failures
/// (network errors and non-200 responses) are logged and reported, never fatal.
///
/// # Returns
///
/// * `Ok(DownloadReport)` - Which images were saved and which failed
/// * `Err(ExportError)` - The directory could not be created or a file written
pub async fn download_images(
    client: &Client,
    urls: &[String],
    directory: &Path,
    max_images: usize,
) -> ExportResult<DownloadReport> {
    tokio::fs::create_dir_all(directory).await?;

    let mut report = DownloadReport::default();

    for (index, url) in urls.iter().take(max_images).enumerate() {
        let number = index + 1;

        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Error downloading image {}: {}", number, e);
                report.failed.push((url.clone(), e.to_string()));
                continue;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            let reason = format!("Status code {}", response.status().as_u16());
            tracing::warn!("Failed to download image {}: {}", number, reason);
            report.failed.push((url.clone(), reason));
            continue;
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Error reading image {}: {}", number, e);
                report.failed.push((url.clone(), e.to_string()));
                continue;
            }
        };

        let path = directory.join(format!("image{}.{}", number, image_extension(url)));
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!("Saved {} ({} bytes)", path.display(), bytes.len());
        report.saved.push(path);
    }

    tracing::info!(
        "Downloaded {} images to {} ({} failed)",
        report.saved.len(),
        directory.display(),
        report.failed.len()
    );

    Ok(report)
}
