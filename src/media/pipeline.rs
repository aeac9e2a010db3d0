use crate::core::error::IngestError;
use anyhow::{Context, Result};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

/// Fetches remote images and stores them as fixed-size JPEGs
pub struct ImagePipeline {
    client: reqwest::Client,
    fetch_timeout: Duration,
    max_image_bytes: usize,
    jpeg_quality: u8,
}

impl ImagePipeline {
    pub fn new(fetch_timeout: Duration, max_image_bytes: usize, jpeg_quality: u8) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            fetch_timeout,
            max_image_bytes,
            jpeg_quality,
        })
    }

    /// Fetch `source_url`, crop it to exactly `width` x `height` and store it
    /// as JPEG at `destination`.
    ///
    /// The destination is only ever replaced by a fully written file, so on
    /// any error nothing new is visible there.
    #[instrument(skip(self, destination), fields(destination = %destination.display()))]
    pub async fn ingest(
        &self,
        source_url: &str,
        width: u32,
        height: u32,
        destination: &Path,
    ) -> Result<(), IngestError> {
        if width == 0 || height == 0 {
            return Err(IngestError::InvalidDimensions { width, height });
        }

        let body = self.fetch(source_url).await?;
        let fetched_bytes = body.len();

        let quality = self.jpeg_quality;
        let encoded = tokio::task::spawn_blocking(move || transform(&body, width, height, quality))
            .await
            .map_err(|e| IngestError::Encode(format!("image worker failed: {}", e)))??;

        write_atomically(destination, &encoded).await?;

        debug!(
            fetched_bytes,
            stored_bytes = encoded.len(),
            width,
            height,
            "Image stored"
        );

        Ok(())
    }

    async fn fetch(&self, source_url: &str) -> Result<Vec<u8>, IngestError> {
        let mut response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(IngestError::Status(response.status().as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_image_bytes as u64 {
                return Err(IngestError::TooLarge {
                    limit: self.max_image_bytes,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > self.max_image_bytes {
                return Err(IngestError::TooLarge {
                    limit: self.max_image_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn classify(&self, err: reqwest::Error) -> IngestError {
        if err.is_timeout() {
            IngestError::Timeout(self.fetch_timeout)
        } else {
            IngestError::Fetch(err.to_string())
        }
    }
}

/// Decode, cover-crop and JPEG-encode in one blocking step
fn transform(bytes: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, IngestError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| IngestError::Decode(e.to_string()))?;

    let cropped = cover(&decoded, width, height);

    encode_jpeg(&cropped, quality)
}

/// Scale so the box is fully covered, then center-crop the overflow
pub fn cover(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_to_fill(width, height, FilterType::Lanczos3)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, IngestError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();

    let mut buf = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| IngestError::Encode(e.to_string()))?;
    }

    Ok(buf)
}

/// Write to a hidden sibling, fsync, then rename over the destination
async fn write_atomically(destination: &Path, data: &[u8]) -> Result<(), IngestError> {
    let file_name = destination
        .file_name()
        .ok_or_else(|| IngestError::Write("destination has no file name".to_string()))?;

    let parent = match destination.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| IngestError::Write(format!("{}: {}", parent.display(), e)))?;

    let temp_path = parent.join(format!(
        ".{}.{:08x}.part",
        file_name.to_string_lossy(),
        rand::random::<u32>()
    ));

    let result: std::io::Result<()> = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, destination).await
    }
    .await;

    if let Err(e) = result {
        if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove partial image");
            }
        }
        return Err(IngestError::Write(e.to_string()));
    }

    // The rename is only durable once the directory entry is flushed
    if let Err(e) = sync_dir(parent).await {
        if let Err(cleanup) = tokio::fs::remove_file(destination).await {
            warn!(path = %destination.display(), error = %cleanup, "Failed to remove unsynced image");
        }
        return Err(IngestError::Write(format!("{}: {}", parent.display(), e)));
    }

    Ok(())
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
