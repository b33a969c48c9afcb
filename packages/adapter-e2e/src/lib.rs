use std::fmt;
use std::time::Duration;

pub mod balance_setter;
pub mod config;
pub mod deploy;
pub mod evm;
pub mod fixture;
pub mod runner;
pub mod tests;

pub use balance_setter::StorageSlotBalanceSetter;
pub use config::{HarnessConfig, TokenTable};
pub use deploy::{deploy_adapter, AdapterDeployment};
pub use evm::AnvilClient;
pub use fixture::{Checkpoint, TestFixture};
pub use runner::{scenario_matrix, MatrixPlan, MatrixReport, SwapConformanceRunner};
pub use tests::{run_conformance, run_slot_checks, Selection};

/// Represents the outcome of a single test
#[derive(Debug, Clone)]
pub enum TestResult {
    Pass {
        name: String,
        duration: Duration,
    },
    Fail {
        name: String,
        error: String,
        duration: Duration,
    },
    Skip {
        name: String,
        reason: String,
    },
}

impl TestResult {
    /// Create a new pass result
    pub fn pass(name: impl Into<String>, duration: Duration) -> Self {
        Self::Pass {
            name: name.into(),
            duration,
        }
    }

    /// Create a new fail result
    pub fn fail(name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self::Fail {
            name: name.into(),
            error: error.into(),
            duration,
        }
    }

    /// Create a new skip result
    pub fn skip(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Skip {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass { name, duration } => {
                write!(
                    f,
                    "\x1b[32mPASS\x1b[0m: {} ({:.2}ms)",
                    name,
                    duration.as_millis()
                )
            }
            Self::Fail {
                name,
                error,
                duration,
            } => {
                write!(
                    f,
                    "\x1b[31mFAIL\x1b[0m: {} - {}\n    ({:.2}ms)",
                    name,
                    error,
                    duration.as_millis()
                )
            }
            Self::Skip { name, reason } => {
                write!(f, "\x1b[33mSKIP\x1b[0m: {} - {}", name, reason)
            }
        }
    }
}

/// Aggregates test results and provides summary
#[derive(Debug, Clone)]
pub struct TestSuite {
    name: String,
    results: Vec<TestResult>,
    /// Why the run stopped early, if it did
    aborted: Option<String>,
    start_time: std::time::Instant,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Vec::new(),
            aborted: None,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn add_result(&mut self, result: TestResult) {
        self.results.push(result);
    }

    /// Mark the run as aborted; the first reason wins
    pub fn abort(&mut self, reason: impl Into<String>) {
        if self.aborted.is_none() {
            self.aborted = Some(reason.into());
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn abort_reason(&self) -> Option<&str> {
        self.aborted.as_deref()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_fail()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.is_pass() && !r.is_fail())
            .count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True if every test passed and the run was not aborted
    pub fn all_passed(&self) -> bool {
        !self.is_aborted() && self.results.iter().all(|r| r.is_pass())
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Print a summary of the test results
    pub fn print_summary(&self) {
        let elapsed = self.elapsed();
        let failed = self.failed();

        println!();
        println!("Test Suite: {}", self.name);
        println!("----------------------------------------");
        println!("Total:   {}", self.total());
        println!("Passed:  \x1b[32m{}\x1b[0m", self.passed());
        println!("Failed:  \x1b[31m{}\x1b[0m", failed);
        println!("Skipped: \x1b[33m{}\x1b[0m", self.skipped());
        println!("Elapsed: {:.2}ms", elapsed.as_millis());
        if let Some(reason) = &self.aborted {
            println!("\x1b[31mABORTED\x1b[0m: {}", reason);
        }
        println!("----------------------------------------");

        if failed > 0 {
            println!("\nFailed tests:");
            for result in &self.results {
                if result.is_fail() {
                    println!("  {}", result);
                }
            }
        }
    }
}

impl fmt::Display for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TestSuite({} - {} passed, {} failed",
            self.name,
            self.passed(),
            self.failed()
        )?;
        if let Some(reason) = &self.aborted {
            write!(f, ", aborted: {}", reason)?;
        }
        write!(f, ")")
    }
}
