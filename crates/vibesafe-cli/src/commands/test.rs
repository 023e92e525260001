//! `vibesafe test [--target ...]`: run the Verification Harness against the
//! latest candidate, or the active checkpoint if no candidate exists.
//!
//! Gates for different units run with up to [`MAX_INFLIGHT`] concurrent
//! invocations (`SPEC_FULL.md` §5); the gates within one unit still run
//! strictly sequentially inside `run_all_gates`.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use vibesafe_utils::error::VibesafeError;

use crate::commands::select_targets;
use crate::orchestrator::{candidate_checkpoint, discover_units, test_unit, Workspace, MAX_INFLIGHT};

#[derive(Debug, Serialize)]
pub struct TestEntry {
    pub unit_id: String,
    pub passed: bool,
    pub failures: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TestReport {
    pub results: Vec<TestEntry>,
}

impl TestReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}

async fn test_one(ws: &Workspace, spec: &vibesafe_spec::Spec) -> Result<TestEntry, VibesafeError> {
    let Some(h_chk) = candidate_checkpoint(ws, &spec.unit_id)? else {
        return Ok(TestEntry {
            unit_id: spec.unit_id.clone(),
            passed: false,
            failures: vec!["no compiled candidate or active checkpoint exists".to_string()],
        });
    };
    let report = test_unit(ws, spec, &h_chk).await?;
    let failures = report
        .results
        .iter()
        .filter(|r| !r.passed())
        .filter_map(|r| r.outcome.as_ref().err().map(ToString::to_string))
        .collect();
    Ok(TestEntry {
        unit_id: spec.unit_id.clone(),
        passed: report.all_passed(),
        failures,
    })
}

pub async fn run(ws: &Workspace, target: Option<&str>) -> Result<TestReport, VibesafeError> {
    let specs = discover_units(ws)?;
    let targets = select_targets(&specs, target);

    let mut indexed: Vec<(usize, Result<TestEntry, VibesafeError>)> = stream::iter(targets.into_iter().enumerate())
        .map(|(index, spec)| async move { (index, test_one(ws, spec).await) })
        .buffer_unordered(MAX_INFLIGHT)
        .collect()
        .await;

    indexed.sort_unstable_by_key(|(index, _)| *index);
    let results = indexed
        .into_iter()
        .map(|(_, result)| result)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TestReport { results })
}
