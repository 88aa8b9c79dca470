//! Report rendering: turns a case's evaluated validators into a pass/fail
//! summary for the terminal.

use apirun_core::validator::{CheckResult, Validator};
use std::fmt::Write as _;

/// Outcome of running one test step.
pub struct StepReport {
    pub name: String,
    pub validators: Vec<Validator>,
    pub error: Option<String>,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.validators.iter().all(|v| v.check_result != CheckResult::Fail)
    }
}

/// Outcome of running one test case (one document, all its steps).
pub struct CaseReport {
    pub name: String,
    pub steps: Vec<StepReport>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepReport::passed)
    }
}

/// Render a human-readable report across every case, in the spirit of a
/// CLI test-runner summary: per-step pass/fail lines, then a totals line.
pub fn render(cases: &[CaseReport]) -> String {
    let mut out = String::new();
    let mut passed_steps = 0usize;
    let mut failed_steps = 0usize;

    for case in cases {
        let _ = writeln!(out, "{}", case.name);
        for step in &case.steps {
            if step.passed() {
                passed_steps += 1;
                let _ = writeln!(out, "  [PASS] {}", step.name);
            } else {
                failed_steps += 1;
                let _ = writeln!(out, "  [FAIL] {}", step.name);
                if let Some(error) = &step.error {
                    let _ = writeln!(out, "          {error}");
                }
                for v in &step.validators {
                    if v.check_result == CheckResult::Fail {
                        let _ = writeln!(
                            out,
                            "          {} {} {} — got {}",
                            v.check,
                            v.comparator,
                            v.expect,
                            v.check_value.as_ref().unwrap_or(&serde_json::Value::Null)
                        );
                    }
                }
            }
        }
    }

    let _ = writeln!(out, "\n{passed_steps} passed, {failed_steps} failed");
    out
}
