//! `vibesafe save [--target ...] [--freeze-http-deps]`.
//!
//! Units are gated with up to [`MAX_INFLIGHT`] concurrent harness runs in
//! flight (`SPEC_FULL.md` §5); activation itself stays per-unit and
//! sequential inside `save_unit`, so two units never race on the same
//! index entry.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use vibesafe_utils::error::VibesafeError;

use crate::commands::select_targets;
use crate::orchestrator::{discover_units, save_unit, Workspace, MAX_INFLIGHT};

#[derive(Debug, Serialize)]
pub struct SaveEntry {
    pub unit_id: String,
    pub activated: bool,
    pub failures: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveReport {
    pub results: Vec<SaveEntry>,
}

impl SaveReport {
    #[must_use]
    pub fn all_activated(&self) -> bool {
        self.results.iter().all(|r| r.activated)
    }
}

async fn save_one(ws: &Workspace, spec: &vibesafe_spec::Spec, freeze_http_deps: bool) -> SaveEntry {
    match save_unit(ws, spec, freeze_http_deps).await {
        Ok(report) => SaveEntry {
            unit_id: spec.unit_id.clone(),
            activated: report.all_passed(),
            failures: report
                .results
                .iter()
                .filter_map(|r| r.outcome.as_ref().err().map(ToString::to_string))
                .collect(),
        },
        Err(e) => SaveEntry {
            unit_id: spec.unit_id.clone(),
            activated: false,
            failures: vec![e.to_string()],
        },
    }
}

pub async fn run(
    ws: &Workspace,
    target: Option<&str>,
    freeze_http_deps: bool,
) -> Result<SaveReport, VibesafeError> {
    let specs = discover_units(ws)?;
    let targets = select_targets(&specs, target);

    let mut indexed: Vec<(usize, SaveEntry)> = stream::iter(targets.into_iter().enumerate())
        .map(|(index, spec)| async move { (index, save_one(ws, spec, freeze_http_deps).await) })
        .buffer_unordered(MAX_INFLIGHT)
        .collect()
        .await;

    indexed.sort_unstable_by_key(|(index, _)| *index);
    let results = indexed.into_iter().map(|(_, entry)| entry).collect();
    Ok(SaveReport { results })
}
