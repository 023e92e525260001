//! `vibesafe compile [--target id|module] [--force]`.
//!
//! Units are compiled with up to [`MAX_INFLIGHT`] provider requests in
//! flight at once (`SPEC_FULL.md` §5); a single unit's own render -> cache
//! -> generate -> validate -> write pipeline stays sequential.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use vibesafe_utils::error::VibesafeError;

use crate::commands::select_targets;
use crate::orchestrator::{compile_unit, discover_units, Workspace, MAX_INFLIGHT};

#[derive(Debug, Serialize)]
pub struct CompileEntry {
    pub unit_id: String,
    pub h_chk: String,
    pub cache_hit: bool,
}

#[derive(Debug, Serialize)]
pub struct CompileReport {
    pub compiled: Vec<CompileEntry>,
}

pub async fn run(ws: &Workspace, target: Option<&str>, force: bool) -> Result<CompileReport, VibesafeError> {
    let specs = discover_units(ws)?;
    let targets = select_targets(&specs, target);

    let mut indexed: Vec<(usize, Result<CompileEntry, VibesafeError>)> = stream::iter(targets.into_iter().enumerate())
        .map(|(index, spec)| async move {
            let result = compile_unit(ws, spec, force).await.map(|outcome| CompileEntry {
                unit_id: spec.unit_id.clone(),
                h_chk: outcome.h_chk,
                cache_hit: outcome.cache_hit,
            });
            (index, result)
        })
        .buffer_unordered(MAX_INFLIGHT)
        .collect()
        .await;

    indexed.sort_unstable_by_key(|(index, _)| *index);
    let compiled = indexed
        .into_iter()
        .map(|(_, result)| result)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CompileReport { compiled })
}
