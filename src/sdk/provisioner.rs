//! Idempotent Cloud SDK installation

use super::download::{extract_tar_gz, Downloader};
use super::{SdkRoot, CLOUDSDK_CONFIG_ENV, CLOUDSDK_PYTHON_ENV};
use crate::common::config::Settings;
use crate::common::{Error, Result};
use crate::process::{CommandRunner, CommandSpec, SessionEnv};

/// Flags passed to the bundled install script
const INSTALL_FLAGS: [&str; 6] = [
    "--usage-reporting",
    "false",
    "--path-update",
    "false",
    "--command-completion",
    "false",
];

/// What [`SdkProvisioner::ensure`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// `gcloud` was already present; nothing was touched
    AlreadyInstalled,
    /// The release was downloaded, extracted and installed
    Installed,
}

/// Makes sure the SDK exists under an [`SdkRoot`]
pub struct SdkProvisioner<'a> {
    root: &'a SdkRoot,
    settings: &'a Settings,
    runner: &'a dyn CommandRunner,
    downloader: &'a dyn Downloader,
    dry_run: bool,
}

impl<'a> SdkProvisioner<'a> {
    pub fn new(
        root: &'a SdkRoot,
        settings: &'a Settings,
        runner: &'a dyn CommandRunner,
        downloader: &'a dyn Downloader,
    ) -> Self {
        Self {
            root,
            settings,
            runner,
            downloader,
            dry_run: false,
        }
    }

    /// Log the download and extraction instead of performing them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Point the session at the SDK root and install the SDK if missing
    ///
    /// The session env always receives `CLOUDSDK_CONFIG` (and
    /// `CLOUDSDK_PYTHON` when an interpreter is known). If `bin/gcloud`
    /// already exists nothing else happens; the install is never updated.
    pub async fn ensure(&self, env: &mut SessionEnv) -> Result<Provisioned> {
        env.insert(
            CLOUDSDK_CONFIG_ENV.to_string(),
            self.root.path().display().to_string(),
        );
        if let Some(python) = &self.settings.sdk_python {
            env.insert(CLOUDSDK_PYTHON_ENV.to_string(), python.display().to_string());
        }

        if self.root.gcloud().exists() {
            tracing::debug!("Cloud SDK already installed at {}", self.root.install_dir().display());
            return Ok(Provisioned::AlreadyInstalled);
        }

        let url = &self.settings.download_url;
        let archive = self.root.archive_path();

        if self.dry_run {
            println!("$ download {} -> {}", url, archive.display());
            println!("$ extract {} -> {}", archive.display(), self.root.path().display());
        } else {
            tracing::info!("Downloading Cloud SDK from {}", url);
            self.downloader.download(url, &archive).await?;

            tracing::info!("Extracting {}", archive.display());
            extract_tar_gz(&archive, self.root.path())?;
            std::fs::remove_file(&archive)?;
        }

        let install = CommandSpec::path(&self.root.install_script())
            .args(INSTALL_FLAGS)
            .envs(env)
            .silent();
        self.runner.run(&install).await?;

        let gcloud = self.root.gcloud();
        if !self.dry_run && !gcloud.exists() {
            return Err(Error::SdkNotFound(gcloud));
        }

        tracing::info!("Installed Cloud SDK into {}", self.root.install_dir().display());
        Ok(Provisioned::Installed)
    }
}
