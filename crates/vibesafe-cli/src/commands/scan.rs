//! `vibesafe scan`: list units and their coverage status.

use serde::Serialize;
use vibesafe_utils::error::VibesafeError;

use crate::orchestrator::{discover_units, unit_status, Workspace};

#[derive(Debug, Serialize)]
pub struct ScanEntry {
    pub unit_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub units: Vec<ScanEntry>,
}

pub fn run(ws: &Workspace) -> Result<ScanReport, VibesafeError> {
    let specs = discover_units(ws)?;
    let mut units = Vec::with_capacity(specs.len());
    for spec in &specs {
        units.push(ScanEntry {
            unit_id: spec.unit_id.clone(),
            status: unit_status(ws, spec)?.as_str().to_string(),
        });
    }
    Ok(ScanReport { units })
}
