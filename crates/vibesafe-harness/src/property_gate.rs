//! The optional property-test gate (`spec.md` §4.7): only runs when a
//! docstring carries a fenced ` ```hypothesis ` block. Its contents are
//! handed verbatim to a configured property-test runner's stdin.

use std::time::Duration;

use vibesafe_utils::error::{GateFailure, GateFailureCategory};

use crate::gate_tool::run_subprocess_with_stdin;

fn fail(unit_id: &str, category: GateFailureCategory, message: impl Into<String>) -> GateFailure {
    GateFailure {
        unit_id: unit_id.to_string(),
        category,
        message: message.into(),
    }
}

/// Run the property-test gate if `property_block` is present and a runner
/// is configured. Returns `None` when the gate does not apply (no block in
/// the docstring), matching the Harness's "optional" framing.
pub async fn run_property_gate(
    unit_id: &str,
    property_block: Option<&str>,
    runner_cmd: &[String],
    timeout: Duration,
) -> Option<Result<(), GateFailure>> {
    let block = property_block?;
    if runner_cmd.is_empty() {
        return None;
    }

    let outcome = run_subprocess_with_stdin(runner_cmd, Some(block), timeout).await;
    Some(match outcome {
        Ok(output) if output.timed_out => Err(fail(
            unit_id,
            GateFailureCategory::Timeout,
            format!("property gate exceeded {timeout:?}"),
        )),
        Ok(output) if output.success() => Ok(()),
        Ok(output) => Err(fail(unit_id, GateFailureCategory::ExampleMismatch, output.stderr)),
        Err(e) => Err(fail(unit_id, GateFailureCategory::ExampleMismatch, e.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_block_means_the_gate_does_not_apply() {
        let result = run_property_gate("u", None, &["pytest".to_string()], Duration::from_secs(1)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn present_block_with_no_runner_configured_does_not_apply() {
        let result = run_property_gate("u", Some("given(st.integers())"), &[], Duration::from_secs(1)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn present_block_runs_the_configured_runner() {
        let result = run_property_gate(
            "u",
            Some("given(st.integers())"),
            &["true".to_string()],
            Duration::from_secs(5),
        )
        .await;
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn a_failing_runner_reports_a_gate_failure() {
        let result = run_property_gate(
            "u",
            Some("given(st.integers())"),
            &["false".to_string()],
            Duration::from_secs(5),
        )
        .await;
        assert!(result.unwrap().is_err());
    }
}
