//! Cloud SDK provisioning and credential setup
//!
//! The SDK is treated as a black box living under one root directory:
//!
//! ```text
//! <root>/
//!   google-cloud-sdk/          extracted release, bin/gcloud inside
//!   application_default_credentials.json
//! ```
//!
//! The root doubles as the SDK's config directory (`CLOUDSDK_CONFIG`) so a
//! run never touches the operator's own gcloud configuration.

pub mod credentials;
pub mod download;
pub mod provisioner;

pub use credentials::CredentialInstaller;
pub use download::{Downloader, HttpDownloader};
pub use provisioner::{Provisioned, SdkProvisioner};

use crate::common::config::{SdkRootChoice, SDK_DIST_FILENAME};
use crate::common::paths::ensure_dir;
use crate::common::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Overrides the SDK config directory (normally `~/.config/gcloud`)
pub const CLOUDSDK_CONFIG_ENV: &str = "CLOUDSDK_CONFIG";

/// Python interpreter the SDK should use
pub const CLOUDSDK_PYTHON_ENV: &str = "CLOUDSDK_PYTHON";

/// Directory name inside the release archive
const INSTALL_DIR_NAME: &str = "google-cloud-sdk";

/// File the SDK reads application default credentials from
const ADC_FILE_NAME: &str = "application_default_credentials.json";

/// The directory the SDK is installed into for this run
#[derive(Debug)]
pub struct SdkRoot {
    path: PathBuf,
    temp: Option<TempDir>,
    keep: bool,
}

impl SdkRoot {
    /// Create (or reuse) the root described by `choice`
    ///
    /// A temporary root is removed by [`SdkRoot::finish`] unless `keep` is set.
    pub fn prepare(choice: &SdkRootChoice, keep: bool) -> Result<Self> {
        match choice {
            SdkRootChoice::Explicit(path) => Ok(Self::at(ensure_dir(path)?)),
            SdkRootChoice::Temporary => {
                let temp = tempfile::Builder::new().prefix("cloud-sdk-").tempdir()?;
                tracing::debug!("Using temporary SDK root {}", temp.path().display());
                Ok(Self {
                    path: temp.path().to_path_buf(),
                    temp: Some(temp),
                    keep,
                })
            }
        }
    }

    /// Like [`SdkRoot::prepare`], but an explicit root is left uncreated
    pub fn preview(choice: &SdkRootChoice) -> Result<Self> {
        match choice {
            SdkRootChoice::Explicit(path) => Ok(Self::at(path)),
            SdkRootChoice::Temporary => Self::prepare(choice, false),
        }
    }

    /// An existing, operator-owned root
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp: None,
            keep: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Extracted SDK directory
    pub fn install_dir(&self) -> PathBuf {
        self.path.join(INSTALL_DIR_NAME)
    }

    /// The `gcloud` executable; its presence marks a finished install
    pub fn gcloud(&self) -> PathBuf {
        self.install_dir().join("bin").join("gcloud")
    }

    /// Bundled install script
    pub fn install_script(&self) -> PathBuf {
        self.install_dir().join("install.sh")
    }

    /// Where the downloaded release archive is written
    pub fn archive_path(&self) -> PathBuf {
        self.path.join(SDK_DIST_FILENAME)
    }

    /// Application default credentials file
    pub fn credentials_path(&self) -> PathBuf {
        self.path.join(ADC_FILE_NAME)
    }

    /// End of run: remove a temporary root unless it should be kept
    ///
    /// Returns the root path if it still exists afterwards.
    pub fn finish(mut self) -> Result<Option<PathBuf>> {
        match self.temp.take() {
            None => Ok(Some(self.path)),
            Some(temp) if self.keep => {
                let path = temp.into_path();
                tracing::info!(
                    "Kept SDK root {}; set CLOUD_SDK_ROOT to reuse it",
                    path.display()
                );
                Ok(Some(path))
            }
            Some(temp) => {
                temp.close()?;
                Ok(None)
            }
        }
    }
}
