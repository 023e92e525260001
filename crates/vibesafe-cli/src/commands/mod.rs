pub mod check;
pub mod compile;
pub mod diff;
pub mod doctor;
pub mod save;
pub mod scan;
pub mod status;
pub mod test;

/// Select the units a `--target` flag names: either one exact `unit_id`,
/// every unit under a module prefix, or all units when unset.
pub fn select_targets<'a>(
    specs: &'a [vibesafe_spec::Spec],
    target: Option<&str>,
) -> Vec<&'a vibesafe_spec::Spec> {
    match target {
        None => specs.iter().collect(),
        Some(t) => specs
            .iter()
            .filter(|s| s.unit_id == t || s.unit_id.starts_with(&format!("{t}/")) || s.unit_id.starts_with(&format!("{t}.")))
            .collect(),
    }
}
