//! The Verification Harness (`spec.md` §4.7): decides whether a validated
//! checkpoint earns activation. Runs the Example, Lint, and Type gates,
//! plus an optional property-test gate, reporting per-gate results. `save`
//! requires all configured gates to pass.

pub mod gate_tool;
mod example_gate;
mod property_gate;

use std::time::Duration;

use camino::Utf8Path;
use vibesafe_spec::Example;
use vibesafe_utils::error::{GateFailure, GateFailureCategory};

pub use example_gate::{matches_expected, run_example_gate};
pub use gate_tool::GateOutput;
pub use property_gate::run_property_gate;
use vibesafe_introspect::TargetIntrospector;

/// The outcome of one gate.
#[derive(Debug, Clone)]
pub struct GateResult {
    pub category: GateFailureCategory,
    pub outcome: Result<(), GateFailure>,
}

impl GateResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Everything the Harness needs for one unit's verification run.
pub struct HarnessInput<'a> {
    pub unit_id: &'a str,
    pub examples: &'a [Example],
    pub artifact_path: &'a Utf8Path,
    pub artifact_text: &'a str,
    pub property_block: Option<&'a str>,
    pub lint_cmd: &'a [String],
    pub type_cmd: &'a [String],
    pub property_cmd: &'a [String],
    pub timeout: Duration,
}

/// The full set of gate results for one verification run.
#[derive(Debug, Clone)]
pub struct HarnessReport {
    pub results: Vec<GateResult>,
}

impl HarnessReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(GateResult::passed)
    }
}

async fn run_tool_gate(
    unit_id: &str,
    category: GateFailureCategory,
    cmd: &[String],
    timeout: Duration,
) -> Result<(), GateFailure> {
    if cmd.is_empty() {
        return Ok(());
    }
    let output = gate_tool::run_subprocess(cmd, timeout)
        .await
        .map_err(|e| GateFailure {
            unit_id: unit_id.to_string(),
            category,
            message: e.to_string(),
        })?;
    if output.timed_out {
        return Err(GateFailure {
            unit_id: unit_id.to_string(),
            category: GateFailureCategory::Timeout,
            message: format!("{category} gate exceeded {timeout:?}"),
        });
    }
    if !output.success() {
        return Err(GateFailure {
            unit_id: unit_id.to_string(),
            category,
            message: output.stderr,
        });
    }
    Ok(())
}

/// Run every applicable gate in sequence (the pipeline within one unit is
/// strictly sequential, per `spec.md` §5) and collect a full report, never
/// stopping early, so a caller always sees every gate's outcome.
pub async fn run_all_gates(
    input: &HarnessInput<'_>,
    introspector: &dyn TargetIntrospector,
) -> HarnessReport {
    tracing::debug!(unit_id = input.unit_id, "running verification gates");
    let mut results = Vec::new();

    let example_outcome = run_example_gate(
        input.unit_id,
        input.examples,
        input.artifact_path,
        input.artifact_text,
        introspector,
    );
    results.push(GateResult {
        category: GateFailureCategory::ExampleMismatch,
        outcome: example_outcome,
    });

    results.push(GateResult {
        category: GateFailureCategory::Lint,
        outcome: run_tool_gate(
            input.unit_id,
            GateFailureCategory::Lint,
            input.lint_cmd,
            input.timeout,
        )
        .await,
    });

    results.push(GateResult {
        category: GateFailureCategory::Type,
        outcome: run_tool_gate(
            input.unit_id,
            GateFailureCategory::Type,
            input.type_cmd,
            input.timeout,
        )
        .await,
    });

    if let Some(outcome) = run_property_gate(
        input.unit_id,
        input.property_block,
        input.property_cmd,
        input.timeout,
    )
    .await
    {
        results.push(GateResult {
            category: GateFailureCategory::ExampleMismatch,
            outcome,
        });
    }

    HarnessReport { results }
}
