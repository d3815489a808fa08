//! Configuration file handling and settings resolution
//!
//! [`Config`] mirrors the optional TOML file. [`Settings`] is the resolved
//! view handed to every component, merged with precedence
//! CLI flag > environment override > config file > built-in default.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::paths::{config_path, resolve_against};
use super::{Error, Result};

/// Environment variable naming a persistent SDK install root
pub const CLOUD_SDK_ROOT_ENV: &str = "CLOUD_SDK_ROOT";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Cloud SDK settings
    #[serde(default)]
    pub sdk: SdkConfig,

    /// Test suite settings
    #[serde(default)]
    pub tests: TestsConfig,

    /// App Engine deployment settings
    #[serde(default)]
    pub app_engine: AppEngineConfig,
}

/// Cloud SDK provisioning settings
#[derive(Debug, Deserialize)]
pub struct SdkConfig {
    /// Persistent install root; a temporary directory is used when unset
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Release archive URL
    #[serde(default = "default_download_url")]
    pub download_url: String,

    /// Python interpreter handed to the SDK via `CLOUDSDK_PYTHON`
    #[serde(default)]
    pub python: Option<PathBuf>,

    /// Keep a temporary install root after the run
    #[serde(default)]
    pub keep_root: bool,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            root: None,
            download_url: default_download_url(),
            python: None,
            keep_root: false,
        }
    }
}

/// Name of the SDK release archive
pub const SDK_DIST_FILENAME: &str = "google-cloud-sdk.tar.gz";

fn default_download_url() -> String {
    format!("https://dl.google.com/dl/cloudsdk/release/{}", SDK_DIST_FILENAME)
}

/// Test suite settings
#[derive(Debug, Deserialize)]
pub struct TestsConfig {
    /// Directory holding the test files, `data/` and the App Engine app
    #[serde(default = "default_tests_dir")]
    pub dir: PathBuf,

    /// Test-execution command; the test file is appended as the last argument
    #[serde(default = "default_test_command")]
    pub command: Vec<String>,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            dir: default_tests_dir(),
            command: default_test_command(),
        }
    }
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_test_command() -> Vec<String> {
    vec!["pytest".to_string()]
}

/// App Engine deployment settings
#[derive(Debug, Deserialize)]
pub struct AppEngineConfig {
    /// Service name the test app is deployed as
    #[serde(default = "default_service")]
    pub service: String,
}

impl Default for AppEngineConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
        }
    }
}

fn default_service() -> String {
    "google-auth-system-tests".to_string()
}

impl Config {
    /// Load configuration from `path`, or the default config file
    ///
    /// Returns default configuration if the file doesn't exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => config_path(),
        };

        if let Some(path) = path {
            if path.exists() {
                let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
                    path: path.display().to_string(),
                    error: e.to_string(),
                })?;
                return Self::parse(&content);
            }
        }
        Ok(Self::default())
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

/// Snapshot of the process environment taken once at startup
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    vars: BTreeMap<String, String>,
}

impl EnvOverrides {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Whether `name` was present, regardless of value
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Value of `name`, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Settings supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub tests_dir: Option<PathBuf>,
    pub sdk_root: Option<PathBuf>,
    pub keep_sdk_root: bool,
}

/// Where the SDK lives for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkRootChoice {
    /// Operator-provided directory, created if missing and never removed
    Explicit(PathBuf),
    /// Fresh temporary directory
    Temporary,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub sdk_root: SdkRootChoice,
    pub download_url: String,
    pub sdk_python: Option<PathBuf>,
    pub keep_sdk_root: bool,
    /// Absolute tests directory
    pub tests_dir: PathBuf,
    pub test_command: Vec<String>,
    pub app_engine_service: String,
    pub env: EnvOverrides,
}

impl Settings {
    /// Defaults rooted at `tests_dir`, with an empty environment
    pub fn new(tests_dir: impl Into<PathBuf>) -> Self {
        let config = Config::default();
        Self {
            sdk_root: SdkRootChoice::Temporary,
            download_url: config.sdk.download_url,
            sdk_python: None,
            keep_sdk_root: false,
            tests_dir: tests_dir.into(),
            test_command: config.tests.command,
            app_engine_service: config.app_engine.service,
            env: EnvOverrides::default(),
        }
    }

    /// Merge config file, environment and CLI flags
    ///
    /// Relative paths are resolved against `cwd`.
    pub fn resolve(config: Config, env: EnvOverrides, cli: CliOverrides, cwd: &Path) -> Result<Self> {
        if config.tests.command.is_empty() {
            return Err(Error::Config("tests.command must not be empty".to_string()));
        }

        let tests_dir = cli.tests_dir.unwrap_or(config.tests.dir);
        let tests_dir = resolve_against(cwd, &tests_dir);

        let sdk_root = cli
            .sdk_root
            .or_else(|| env.get(CLOUD_SDK_ROOT_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
            .or(config.sdk.root)
            .map(|p| SdkRootChoice::Explicit(resolve_against(cwd, &p)))
            .unwrap_or(SdkRootChoice::Temporary);

        let sdk_python = config.sdk.python.or_else(|| which::which("python2").ok());

        Ok(Self {
            sdk_root,
            download_url: config.sdk.download_url,
            sdk_python,
            keep_sdk_root: cli.keep_sdk_root || config.sdk.keep_root,
            tests_dir,
            test_command: config.tests.command,
            app_engine_service: config.app_engine.service,
            env,
        })
    }

    /// Directory holding the fixture credential files
    pub fn data_dir(&self) -> PathBuf {
        self.tests_dir.join("data")
    }

    /// Directory holding the App Engine test application
    pub fn app_engine_dir(&self) -> PathBuf {
        self.tests_dir.join("app_engine_test_app")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.sdk.root.is_none());
        assert_eq!(
            config.sdk.download_url,
            "https://dl.google.com/dl/cloudsdk/release/google-cloud-sdk.tar.gz"
        );
        assert_eq!(config.tests.command, vec!["pytest"]);
        assert_eq!(config.app_engine.service, "google-auth-system-tests");
    }

    #[test]
    fn test_parse_partial_config() {
        let config = Config::parse(
            r#"
            [sdk]
            root = "/var/cache/sdk"
            keep_root = true

            [tests]
            command = ["python", "-m", "pytest"]
            "#,
        )
        .unwrap();
        assert_eq!(config.sdk.root, Some(PathBuf::from("/var/cache/sdk")));
        assert!(config.sdk.keep_root);
        assert_eq!(config.tests.command.len(), 3);
        assert_eq!(config.tests.dir, PathBuf::from("."));
    }

    #[test]
    fn test_parse_invalid_config() {
        let err = Config::parse("[sdk\nroot = 1").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&tmp.path().join("nope.toml"))).unwrap();
        assert!(config.sdk.python.is_none());
    }

    #[test]
    fn test_sdk_root_precedence() {
        let cwd = Path::new("/work");
        let file = || Config::parse("[sdk]\nroot = \"from-file\"").unwrap();
        let env = EnvOverrides::from_pairs([(CLOUD_SDK_ROOT_ENV, "/from-env")]);

        let s = Settings::resolve(file(), EnvOverrides::default(), CliOverrides::default(), cwd).unwrap();
        assert_eq!(s.sdk_root, SdkRootChoice::Explicit(PathBuf::from("/work/from-file")));

        let s = Settings::resolve(file(), env.clone(), CliOverrides::default(), cwd).unwrap();
        assert_eq!(s.sdk_root, SdkRootChoice::Explicit(PathBuf::from("/from-env")));

        let cli = CliOverrides {
            sdk_root: Some(PathBuf::from("/from-cli")),
            ..Default::default()
        };
        let s = Settings::resolve(file(), env, cli, cwd).unwrap();
        assert_eq!(s.sdk_root, SdkRootChoice::Explicit(PathBuf::from("/from-cli")));

        let s = Settings::resolve(Config::default(), EnvOverrides::default(), CliOverrides::default(), cwd)
            .unwrap();
        assert_eq!(s.sdk_root, SdkRootChoice::Temporary);
    }

    #[test]
    fn test_tests_dir_is_absolute() {
        let s = Settings::resolve(
            Config::default(),
            EnvOverrides::default(),
            CliOverrides {
                tests_dir: Some(PathBuf::from("system_tests")),
                ..Default::default()
            },
            Path::new("/repo"),
        )
        .unwrap();
        assert_eq!(s.tests_dir, PathBuf::from("/repo/system_tests"));
        assert_eq!(s.data_dir(), PathBuf::from("/repo/system_tests/data"));
        assert_eq!(
            s.app_engine_dir(),
            PathBuf::from("/repo/system_tests/app_engine_test_app")
        );
    }

    #[test]
    fn test_empty_test_command_rejected() {
        let config = Config::parse("[tests]\ncommand = []").unwrap();
        let err = Settings::resolve(config, EnvOverrides::default(), CliOverrides::default(), Path::new("/"))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_keep_root_from_either_source() {
        let config = Config::parse("[sdk]\nkeep_root = true").unwrap();
        let s = Settings::resolve(config, EnvOverrides::default(), CliOverrides::default(), Path::new("/"))
            .unwrap();
        assert!(s.keep_sdk_root);

        let cli = CliOverrides {
            keep_sdk_root: true,
            ..Default::default()
        };
        let s = Settings::resolve(Config::default(), EnvOverrides::default(), cli, Path::new("/")).unwrap();
        assert!(s.keep_sdk_root);
    }
}
