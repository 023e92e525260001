//! `vibesafe check`: bundle lint + type + examples + drift across all
//! units; non-zero exit on any failure.

use serde::Serialize;
use vibesafe_utils::error::VibesafeError;

use crate::commands::{diff, test};
use crate::orchestrator::Workspace;

#[derive(Debug, Serialize)]
pub struct CheckEntry {
    pub unit_id: String,
    pub gates_passed: bool,
    pub drifted: bool,
    pub failures: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub units: Vec<CheckEntry>,
}

impl CheckReport {
    #[must_use]
    pub fn all_clean(&self) -> bool {
        self.units.iter().all(|u| u.gates_passed && !u.drifted)
    }
}

pub async fn run(ws: &Workspace) -> Result<CheckReport, VibesafeError> {
    let test_report = test::run(ws, None).await?;
    let diff_report = diff::run(ws, None)?;

    let mut units = Vec::with_capacity(test_report.results.len());
    for test_entry in test_report.results {
        let drifted = diff_report
            .units
            .iter()
            .find(|d| d.unit_id == test_entry.unit_id)
            .is_some_and(|d| d.drifted);
        units.push(CheckEntry {
            unit_id: test_entry.unit_id,
            gates_passed: test_entry.passed,
            drifted,
            failures: test_entry.failures,
        });
    }
    Ok(CheckReport { units })
}
