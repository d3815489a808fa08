//! Application default credentials for the SDK

use super::provisioner::SdkProvisioner;
use super::SdkRoot;
use crate::common::{Error, Result};
use crate::process::{CommandRunner, CommandSpec, SessionEnv};
use std::path::{Path, PathBuf};

/// Installs a credential payload where the SDK reads it and validates it
pub struct CredentialInstaller<'a> {
    root: &'a SdkRoot,
    runner: &'a dyn CommandRunner,
    dry_run: bool,
}

impl<'a> CredentialInstaller<'a> {
    pub fn new(root: &'a SdkRoot, runner: &'a dyn CommandRunner) -> Self {
        Self {
            root,
            runner,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn gcloud(&self) -> CommandSpec {
        CommandSpec::path(&self.root.gcloud())
    }

    /// Copy `source` over the SDK's credentials file
    ///
    /// The payload is copied as-is; any previous file is removed first.
    pub fn install(&self, source: &Path) -> Result<PathBuf> {
        let dest = self.root.credentials_path();
        if !source.is_file() {
            return Err(Error::CredentialsNotFound(source.to_path_buf()));
        }
        if self.dry_run {
            println!("$ cp {} {}", source.display(), dest.display());
            return Ok(dest);
        }

        if dest.exists() {
            std::fs::remove_file(&dest)?;
        }
        std::fs::copy(source, &dest)?;
        tracing::debug!("Installed credentials {} -> {}", source.display(), dest.display());
        Ok(dest)
    }

    /// Set the active project, or clear it when `project` is `None`
    pub async fn set_project(&self, project: Option<&str>, env: &SessionEnv) -> Result<()> {
        let spec = match project {
            Some(id) => self.gcloud().args(["config", "set", "project", id]),
            None => self.gcloud().args(["config", "unset", "project"]),
        };
        self.runner.run(&spec.envs(env)).await
    }

    /// Make the SDK mint a token from the installed credentials
    ///
    /// Output is discarded entirely: it contains a live access token.
    pub async fn validate(&self, env: &SessionEnv) -> Result<()> {
        let spec = self
            .gcloud()
            .args(["auth", "application-default", "print-access-token"])
            .envs(env)
            .secret();
        self.runner.run(&spec).await
    }

    /// Provision the SDK, set or clear the project, install and validate `source`
    pub async fn configure(
        &self,
        provisioner: &SdkProvisioner<'_>,
        source: &Path,
        project: Option<&str>,
        env: &mut SessionEnv,
    ) -> Result<()> {
        provisioner.ensure(env).await?;
        self.set_project(project, env).await?;
        self.install(source)?;
        self.validate(env).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{OutputMode, RecordingRunner};

    #[test]
    fn test_install_replaces_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let root = SdkRoot::at(tmp.path());
        let runner = RecordingRunner::new();
        std::fs::write(root.credentials_path(), b"{\"old\": true, \"padding\": \"xxxxxxxx\"}").unwrap();

        let source = tmp.path().join("authorized_user.json");
        std::fs::write(&source, b"{\"type\": \"authorized_user\"}").unwrap();

        let dest = CredentialInstaller::new(&root, &runner).install(&source).unwrap();
        assert_eq!(dest, root.credentials_path());
        assert_eq!(
            std::fs::read(&dest).unwrap(),
            b"{\"type\": \"authorized_user\"}"
        );
    }

    #[test]
    fn test_install_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let root = SdkRoot::at(tmp.path());
        let runner = RecordingRunner::new();
        let err = CredentialInstaller::new(&root, &runner)
            .install(&tmp.path().join("missing.json"))
            .unwrap_err();
        assert!(matches!(err, Error::CredentialsNotFound(_)));
    }

    #[tokio::test]
    async fn test_validate_is_secret() {
        let root = SdkRoot::at("/sdk");
        let runner = RecordingRunner::new();
        CredentialInstaller::new(&root, &runner)
            .validate(&SessionEnv::new())
            .await
            .unwrap();
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].output, OutputMode::Secret);
        assert_eq!(
            calls[0].to_string(),
            "/sdk/google-cloud-sdk/bin/gcloud auth application-default print-access-token"
        );
    }

    #[tokio::test]
    async fn test_set_and_unset_project() {
        let root = SdkRoot::at("/sdk");
        let runner = RecordingRunner::new();
        let installer = CredentialInstaller::new(&root, &runner);
        installer
            .set_project(Some("example-project"), &SessionEnv::new())
            .await
            .unwrap();
        installer.set_project(None, &SessionEnv::new()).await.unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![
                "/sdk/google-cloud-sdk/bin/gcloud config set project example-project",
                "/sdk/google-cloud-sdk/bin/gcloud config unset project",
            ]
        );
    }
}
