//! Generic scenario interpreter
//!
//! Runs one [`Scenario`] at a time: skip check, env assembly, optional setup,
//! then exactly one invocation of the test command. Any failing step abandons
//! the scenario; nothing is retried.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use tracing::Instrument;

use super::report::{Outcome, RunReport, SessionResult};
use super::scenario::{Scenario, Setup};
use crate::common::config::Settings;
use crate::common::{Error, Result};
use crate::process::{CommandRunner, CommandSpec, SessionEnv};
use crate::sdk::{CredentialInstaller, Downloader, SdkProvisioner, SdkRoot};

/// Credential file picked up by the auth library
pub const EXPLICIT_CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Explicit project id
pub const EXPLICIT_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Tells the tests a project id must be discoverable
pub const EXPECT_PROJECT_ENV: &str = "EXPECT_PROJECT_ID";

/// URL of the deployed App Engine test app
pub const TEST_APP_URL_ENV: &str = "TEST_APP_URL";

/// Stands in for the ambient project when a dry run cannot look it up
pub const DRY_RUN_PROJECT: &str = "<project>";

/// Deployment URL of `service` in `project`
pub fn app_engine_url(service: &str, project: &str) -> String {
    format!("https://{}-dot-{}.appspot.com", service, project)
}

/// Runs scenarios against one shared SDK root
pub struct SessionRunner {
    settings: Settings,
    root: SdkRoot,
    runner: Arc<dyn CommandRunner>,
    downloader: Arc<dyn Downloader>,
    dry_run: bool,
}

impl SessionRunner {
    pub fn new(
        settings: Settings,
        root: SdkRoot,
        runner: Arc<dyn CommandRunner>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            settings,
            root,
            runner,
            downloader,
            dry_run: false,
        }
    }

    /// Skip filesystem and network side effects; commands still go to the runner
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn provisioner(&self) -> SdkProvisioner<'_> {
        SdkProvisioner::new(&self.root, &self.settings, &*self.runner, &*self.downloader)
            .dry_run(self.dry_run)
    }

    fn credential_installer(&self) -> CredentialInstaller<'_> {
        CredentialInstaller::new(&self.root, &*self.runner).dry_run(self.dry_run)
    }

    /// Run every scenario in order
    ///
    /// With `fail_fast` the run stops after the first failure.
    pub async fn run_all(&self, scenarios: &[&Scenario], fail_fast: bool) -> RunReport {
        let mut report = RunReport::default();
        for scenario in scenarios {
            let result = self.run(scenario).await;
            let failed = matches!(result.outcome, Outcome::Failed(_));
            report.push(result);
            if failed && fail_fast {
                tracing::warn!("Stopping after first failure");
                break;
            }
        }
        report
    }

    /// Run a single scenario; errors become [`Outcome::Failed`]
    pub async fn run(&self, scenario: &Scenario) -> SessionResult {
        eprintln!(
            "\n{} {}",
            "Running Session:".blue().bold(),
            scenario.name.white().bold()
        );

        let started = Instant::now();
        let span = tracing::info_span!("session", name = %scenario.name);
        let outcome = match self.try_run(scenario).instrument(span).await {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("  {} {}", "✗".red(), e);
                Outcome::Failed(e.to_string())
            }
        };
        SessionResult::new(&scenario.name, outcome, started.elapsed())
    }

    async fn try_run(&self, scenario: &Scenario) -> Result<Outcome> {
        if let Some(var) = &scenario.skip_env {
            if self.settings.env.contains(var) {
                tracing::info!("Skipping {}.", scenario.name);
                return Ok(Outcome::Skipped);
            }
        }

        let mut env = self.scenario_env(scenario);

        match &scenario.setup {
            Setup::None => {}
            Setup::CloudSdk {
                credentials,
                project,
            } => {
                let source = self.settings.data_dir().join(credentials.file_name());
                self.credential_installer()
                    .configure(&self.provisioner(), &source, project.as_deref(), &mut env)
                    .await?;
                eprintln!("  {} Cloud SDK configured", "✓".green());
            }
            Setup::AppEngine => {
                let url = self.deploy_app_engine(&env).await?;
                eprintln!("  {} Deployed {}", "✓".green(), url.dimmed());
                env.insert(TEST_APP_URL_ENV.to_string(), url);
            }
        }

        self.run_tests(scenario, &env).await?;
        eprintln!("  {} {}", "✓".green(), scenario.test_file.dimmed());
        Ok(Outcome::Passed)
    }

    /// Env assignments declared by the scenario itself
    pub fn scenario_env(&self, scenario: &Scenario) -> SessionEnv {
        let mut env = scenario.env.clone();
        if let Some(fixture) = scenario.credentials {
            env.insert(
                EXPLICIT_CREDENTIALS_ENV.to_string(),
                self.settings.data_dir().join(fixture.file_name()).display().to_string(),
            );
        }
        if let Some(project) = &scenario.project {
            env.insert(EXPLICIT_PROJECT_ENV.to_string(), project.clone());
        }
        if scenario.expect_project {
            env.insert(EXPECT_PROJECT_ENV.to_string(), "1".to_string());
        }
        env
    }

    /// Look up the ambient SDK's project, vendor dependencies and deploy
    ///
    /// Returns the deployed app's URL.
    async fn deploy_app_engine(&self, env: &SessionEnv) -> Result<String> {
        // The operator's gcloud from PATH, not the provisioned one
        let lookup = CommandSpec::new("gcloud").args([
            "config",
            "list",
            "project",
            "--format",
            "value(core.project)",
        ]);
        let mut project = self.runner.output(&lookup).await?.trim().to_string();
        if project.is_empty() {
            if !self.dry_run {
                return Err(Error::MissingProject);
            }
            project = DRY_RUN_PROJECT.to_string();
        }

        let url = app_engine_url(&self.settings.app_engine_service, &project);
        let app_dir = self.settings.app_engine_dir();

        let vendor = CommandSpec::new("pip")
            .args(["install", "--target", "lib", "-r", "requirements.txt"])
            .envs(env)
            .cwd(&app_dir)
            .silent();
        self.runner.run(&vendor).await?;

        let deploy = CommandSpec::new("gcloud")
            .args(["app", "deploy", "-q", "app.yaml"])
            .envs(env)
            .cwd(&app_dir);
        self.runner.run(&deploy).await?;

        Ok(url)
    }

    async fn run_tests(&self, scenario: &Scenario, env: &SessionEnv) -> Result<()> {
        let (program, args) = self
            .settings
            .test_command
            .split_first()
            .ok_or_else(|| Error::Config("Test command is empty".to_string()))?;

        let spec = CommandSpec::new(program.as_str())
            .args(args.iter().cloned())
            .arg(scenario.test_file.as_str())
            .envs(env)
            .cwd(&self.settings.tests_dir);
        self.runner.run(&spec).await
    }

    /// Release the SDK root according to the keep policy
    pub fn finish(self) -> Result<Option<PathBuf>> {
        self.root.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_engine_url() {
        assert_eq!(
            app_engine_url("google-auth-system-tests", "example-project"),
            "https://google-auth-system-tests-dot-example-project.appspot.com"
        );
    }
}
