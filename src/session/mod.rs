//! Test sessions
//!
//! Scenarios are data ([`scenario`]); a single [`SessionRunner`] interprets
//! them and collects a [`RunReport`].

mod report;
mod runner;
pub mod scenario;

pub use report::{Outcome, RunReport, SessionResult};
pub use runner::{
    app_engine_url, SessionRunner, DRY_RUN_PROJECT, EXPECT_PROJECT_ENV, EXPLICIT_CREDENTIALS_ENV,
    EXPLICIT_PROJECT_ENV, TEST_APP_URL_ENV,
};
pub use scenario::{CredentialFixture, Scenario, Setup};
