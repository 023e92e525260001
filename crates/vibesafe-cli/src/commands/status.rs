//! `vibesafe status`: summarise coverage and drift across all units.

use serde::Serialize;
use vibesafe_utils::error::VibesafeError;

use crate::commands::scan;
use crate::orchestrator::Workspace;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub total: usize,
    pub compiled_active: usize,
    pub drifted: usize,
    pub uncompiled: usize,
    pub missing_examples: usize,
}

pub fn run(ws: &Workspace) -> Result<StatusReport, VibesafeError> {
    let scan_report = scan::run(ws)?;
    let mut report = StatusReport {
        total: scan_report.units.len(),
        compiled_active: 0,
        drifted: 0,
        uncompiled: 0,
        missing_examples: 0,
    };
    for entry in &scan_report.units {
        match entry.status.as_str() {
            "compiled_active" => report.compiled_active += 1,
            "drifted" => report.drifted += 1,
            "uncompiled" => report.uncompiled += 1,
            "missing_examples" => report.missing_examples += 1,
            _ => {}
        }
    }
    Ok(report)
}
