//! Per-scenario outcomes and the run summary

use colored::Colorize;
use serde::Serialize;
use std::time::Duration;

/// How a scenario ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Skipped,
    Failed(String),
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_ms: u64,
}

impl SessionResult {
    pub fn new(name: &str, outcome: Outcome, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            outcome,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// All results of a run, in execution order
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub results: Vec<SessionResult>,
}

impl RunReport {
    pub fn push(&mut self, result: SessionResult) {
        self.results.push(result);
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|o| *o == Outcome::Passed)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| *o == Outcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    /// Human-readable summary
    pub fn print(&self) {
        println!("\n{}", "Summary:".cyan());
        for result in &self.results {
            match &result.outcome {
                Outcome::Passed => println!("  {} {}", "✓".green(), result.name),
                Outcome::Skipped => {
                    println!("  {} {} {}", "-".yellow(), result.name, "(skipped)".dimmed())
                }
                Outcome::Failed(error) => {
                    println!("  {} {}", "✗".red(), result.name);
                    println!("      {}", error.dimmed());
                }
            }
        }

        let line = format!(
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        );
        if self.success() {
            println!("\n{}\n", line.green().bold());
        } else {
            println!("\n{}\n", line.red().bold());
        }
    }
}
