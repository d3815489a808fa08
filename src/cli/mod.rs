//! CLI command handling
//!
//! Resolves settings, builds the session runner and formats output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commands::{Commands, PathArgs, TableArgs};
use crate::common::config::{CliOverrides, Config, EnvOverrides, Settings};
use crate::common::{Error, Result};
use crate::process::{CommandRunner, RecordingRunner, SessionEnv, SystemRunner};
use crate::sdk::{HttpDownloader, Provisioned, SdkProvisioner, SdkRoot};
use crate::session::{scenario, Scenario, SessionRunner};

/// Dispatch a CLI command
///
/// `config` overrides the default config file location.
pub async fn dispatch(command: Commands, config: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Run {
            names,
            table,
            paths,
            keep_sdk_root,
            fail_fast,
            dry_run,
            json,
        } => {
            let scenarios = load_table(&table)?;
            let selected = scenario::select(&scenarios, &names)?;
            let settings = resolve_settings(config.as_deref(), &paths, keep_sdk_root)?;
            let root = if dry_run {
                SdkRoot::preview(&settings.sdk_root)?
            } else {
                SdkRoot::prepare(&settings.sdk_root, settings.keep_sdk_root)?
            };

            let runner: Arc<dyn CommandRunner> = if dry_run {
                Arc::new(RecordingRunner::new().echo())
            } else {
                Arc::new(SystemRunner)
            };
            let sessions = SessionRunner::new(settings, root, runner, Arc::new(HttpDownloader::new()))
                .dry_run(dry_run);

            let report = sessions.run_all(&selected, fail_fast).await;
            sessions.finish()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }

            if report.success() {
                Ok(())
            } else {
                Err(Error::ScenariosFailed(report.failed()))
            }
        }

        Commands::List { table, json } => {
            let scenarios = load_table(&table)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&scenarios)?);
            } else {
                print_scenarios(&scenarios);
            }
            Ok(())
        }

        Commands::Provision { paths } => {
            let settings = resolve_settings(config.as_deref(), &paths, true)?;
            let root = SdkRoot::prepare(&settings.sdk_root, true)?;

            let mut env = SessionEnv::new();
            let status = SdkProvisioner::new(&root, &settings, &SystemRunner, &HttpDownloader::new())
                .ensure(&mut env)
                .await?;

            match status {
                Provisioned::Installed => println!("Installed Cloud SDK"),
                Provisioned::AlreadyInstalled => println!("Cloud SDK already installed"),
            }
            println!("  gcloud: {}", root.gcloud().display());
            if root.is_temporary() {
                println!("  Reuse with: CLOUD_SDK_ROOT={}", root.path().display());
            }
            root.finish()?;
            Ok(())
        }
    }
}

fn load_table(table: &TableArgs) -> Result<Vec<Scenario>> {
    match &table.scenarios {
        Some(path) => scenario::load(path),
        None => Ok(scenario::builtin()),
    }
}

fn resolve_settings(config: Option<&Path>, paths: &PathArgs, keep_sdk_root: bool) -> Result<Settings> {
    let file = Config::load(config)?;
    let cli = CliOverrides {
        tests_dir: paths.tests_dir.clone(),
        sdk_root: paths.sdk_root.clone(),
        keep_sdk_root,
    };
    let cwd = std::env::current_dir()?;
    Settings::resolve(file, EnvOverrides::from_process(), cli, &cwd)
}

fn print_scenarios(scenarios: &[Scenario]) {
    for s in scenarios {
        let mut notes = Vec::new();
        if let Some(creds) = s.credentials {
            notes.push(format!("credentials={}", creds.file_name()));
        }
        if let Some(project) = &s.project {
            notes.push(format!("project={}", project));
        }
        if s.expect_project {
            notes.push("expect-project".to_string());
        }
        if let Some(var) = &s.skip_env {
            notes.push(format!("skip-if={}", var));
        }
        println!(
            "  {:54} {:10} {:28} {}",
            s.name,
            s.setup.label(),
            s.test_file,
            notes.join(" ")
        );
    }
}
