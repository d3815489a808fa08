//! Release archive download and extraction

use crate::common::{Error, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Fetches a URL to a local file
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Streams downloads over HTTP(S) with a progress bar
#[derive(Debug, Clone, Default)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", "systest")
            .send()
            .await
            .map_err(|e| Error::download(url, e))?;

        if !response.status().is_success() {
            return Err(Error::download(
                url,
                format!("server returned status {}", response.status()),
            ));
        }

        let total_size = response.content_length().unwrap_or(0);

        let pb = if total_size > 0 {
            let pb = ProgressBar::new(total_size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            Some(pb)
        } else {
            tracing::info!("Downloading...");
            None
        };

        let mut file = std::fs::File::create(dest)?;

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::download(url, e))?;
            std::io::Write::write_all(&mut file, &chunk)?;
            downloaded += chunk.len() as u64;
            if let Some(ref pb) = pb {
                pb.set_position(downloaded);
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        Ok(())
    }
}

/// Extract a tar.gz archive into `dest_dir`
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path).map_err(|e| Error::Extract {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive.set_preserve_permissions(true);

    archive.unpack(dest_dir).map_err(|e| Error::Extract {
        path: archive_path.to_path_buf(),
        reason: e.to_string(),
    })
}
