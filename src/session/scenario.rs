//! Scenario descriptors
//!
//! Each scenario is a declarative recipe: env assignments, an optional setup
//! step and a single test file. The built-in table covers the auth library's
//! system tests; a YAML file with the same shape can replace it.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Project id used by every scenario that configures one
pub const EXAMPLE_PROJECT: &str = "example-project";

/// Skip variable for the App Engine scenario
pub const SKIP_APP_ENGINE_ENV: &str = "SKIP_APP_ENGINE_SYSTEM_TEST";

/// A fixture credential file under the data directory
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialFixture {
    ServiceAccount,
    AuthorizedUser,
}

impl CredentialFixture {
    pub fn file_name(self) -> &'static str {
        match self {
            CredentialFixture::ServiceAccount => "service_account.json",
            CredentialFixture::AuthorizedUser => "authorized_user.json",
        }
    }
}

/// Extra work done before the test command
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Setup {
    #[default]
    None,
    /// Install the SDK, set or clear its project and install credentials
    CloudSdk {
        credentials: CredentialFixture,
        #[serde(default)]
        project: Option<String>,
    },
    /// Deploy the test app with the ambient SDK and expose its URL
    AppEngine,
}

impl Setup {
    pub fn label(&self) -> &'static str {
        match self {
            Setup::None => "none",
            Setup::CloudSdk { .. } => "cloud_sdk",
            Setup::AppEngine => "app_engine",
        }
    }
}

/// One named test-session recipe
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    /// Exposed as `GOOGLE_APPLICATION_CREDENTIALS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialFixture>,
    /// Exposed as `GOOGLE_CLOUD_PROJECT`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Sets `EXPECT_PROJECT_ID=1` for the tests
    #[serde(default)]
    pub expect_project: bool,
    #[serde(default)]
    pub setup: Setup,
    /// Single argument handed to the test command
    pub test_file: String,
    /// The scenario is skipped when this variable is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_env: Option<String>,
    /// Additional literal assignments
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Scenario {
    fn new(name: &str, test_file: &str) -> Self {
        Self {
            name: name.to_string(),
            credentials: None,
            project: None,
            expect_project: false,
            setup: Setup::None,
            test_file: test_file.to_string(),
            skip_env: None,
            env: BTreeMap::new(),
        }
    }

    fn credentials(mut self, fixture: CredentialFixture) -> Self {
        self.credentials = Some(fixture);
        self
    }

    fn project(mut self, id: &str) -> Self {
        self.project = Some(id.to_string());
        self
    }

    fn expect_project(mut self) -> Self {
        self.expect_project = true;
        self
    }

    fn setup(mut self, setup: Setup) -> Self {
        self.setup = setup;
        self
    }

    fn skip_env(mut self, var: &str) -> Self {
        self.skip_env = Some(var.to_string());
        self
    }
}

fn cloud_sdk(credentials: CredentialFixture, project: Option<&str>) -> Setup {
    Setup::CloudSdk {
        credentials,
        project: project.map(str::to_string),
    }
}

/// The built-in scenario table, in run order
pub fn builtin() -> Vec<Scenario> {
    use CredentialFixture::{AuthorizedUser, ServiceAccount};

    vec![
        Scenario::new("service_account", "test_service_account.py"),
        Scenario::new("oauth2_credentials", "test_oauth2_credentials.py"),
        Scenario::new("default_explicit_service_account", "test_default.py")
            .credentials(ServiceAccount)
            .expect_project(),
        Scenario::new("default_explicit_authorized_user", "test_default.py")
            .credentials(AuthorizedUser),
        Scenario::new(
            "default_explicit_authorized_user_explicit_project",
            "test_default.py",
        )
        .credentials(AuthorizedUser)
        .project(EXAMPLE_PROJECT)
        .expect_project(),
        Scenario::new("default_cloud_sdk_service_account", "test_default.py")
            .setup(cloud_sdk(ServiceAccount, None))
            .expect_project(),
        Scenario::new("default_cloud_sdk_authorized_user", "test_default.py")
            .setup(cloud_sdk(AuthorizedUser, None)),
        Scenario::new(
            "default_cloud_sdk_authorized_user_configured_project",
            "test_default.py",
        )
        .setup(cloud_sdk(AuthorizedUser, Some(EXAMPLE_PROJECT)))
        .expect_project(),
        Scenario::new("compute_engine", "test_compute_engine.py"),
        Scenario::new("app_engine", "test_app_engine.py")
            .setup(Setup::AppEngine)
            .skip_env(SKIP_APP_ENGINE_ENV),
        Scenario::new("grpc", "test_grpc.py").credentials(ServiceAccount),
    ]
}

/// Parse and validate a scenario table from YAML text
pub fn parse(content: &str) -> Result<Vec<Scenario>> {
    let scenarios: Vec<Scenario> = serde_yaml::from_str(content)
        .map_err(|e| Error::ConfigParse(format!("Failed to parse scenarios: {}", e)))?;
    validate(&scenarios)?;
    Ok(scenarios)
}

/// Load a scenario table from a YAML file
pub fn load(path: &Path) -> Result<Vec<Scenario>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    parse(&content)
}

fn validate(scenarios: &[Scenario]) -> Result<()> {
    let mut seen = HashSet::new();
    for scenario in scenarios {
        if scenario.name.trim().is_empty() {
            return Err(Error::Config("Scenario with an empty name".to_string()));
        }
        if !seen.insert(scenario.name.as_str()) {
            return Err(Error::Config(format!(
                "Duplicate scenario name '{}'",
                scenario.name
            )));
        }
        if scenario.test_file.trim().is_empty() {
            return Err(Error::Config(format!(
                "Scenario '{}' has no test_file",
                scenario.name
            )));
        }
    }
    Ok(())
}

/// Pick scenarios by name, keeping table order; empty `names` selects all
pub fn select<'a>(table: &'a [Scenario], names: &[String]) -> Result<Vec<&'a Scenario>> {
    if names.is_empty() {
        return Ok(table.iter().collect());
    }

    for name in names {
        if !table.iter().any(|s| &s.name == name) {
            let known: Vec<&str> = table.iter().map(|s| s.name.as_str()).collect();
            return Err(Error::unknown_scenario(name, &known));
        }
    }

    Ok(table.iter().filter(|s| names.contains(&s.name)).collect())
}
