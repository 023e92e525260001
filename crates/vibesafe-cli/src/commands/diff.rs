//! `vibesafe diff [--target id]`: prompt/code deltas between the current
//! spec and the active checkpoint.

use serde::Serialize;
use vibesafe_hash::hash_spec;
use vibesafe_utils::error::VibesafeError;

use crate::commands::select_targets;
use crate::orchestrator::{discover_units, Workspace};

#[derive(Debug, Serialize)]
pub struct DiffEntry {
    pub unit_id: String,
    pub active_h_spec: Option<String>,
    pub current_h_spec: String,
    pub drifted: bool,
    pub current_prompt: String,
}

#[derive(Debug, Serialize)]
pub struct DiffReport {
    pub units: Vec<DiffEntry>,
}

pub fn run(ws: &Workspace, target: Option<&str>) -> Result<DiffReport, VibesafeError> {
    let specs = discover_units(ws)?;
    let targets = select_targets(&specs, target);
    let mut units = Vec::with_capacity(targets.len());
    for spec in targets {
        let current_prompt = vibesafe_template::render(spec)?;
        let active_h_spec = match ws.store.active(&spec.unit_id)? {
            Some(h_chk) => {
                let (_, meta) = ws.store.read(&spec.unit_id, &h_chk)?;
                Some(meta.spec_hash)
            }
            None => None,
        };

        let (_, provider_cfg) = ws.provider_config(&spec.provider_ref)?;
        let identity = vibesafe_hash::ProviderIdentity {
            kind: provider_cfg.kind.clone(),
            model: provider_cfg.model.clone(),
        };
        let params = vibesafe_hash::ProviderParams {
            seed: provider_cfg.seed,
            temperature: provider_cfg.temperature,
            max_tokens: provider_cfg.max_tokens,
        };
        let current_h_spec = hash_spec(spec, &identity, &params);
        let drifted = active_h_spec.as_deref() != Some(current_h_spec.as_str());

        units.push(DiffEntry {
            unit_id: spec.unit_id.clone(),
            active_h_spec,
            current_h_spec,
            drifted,
            current_prompt,
        });
    }
    Ok(DiffReport { units })
}
