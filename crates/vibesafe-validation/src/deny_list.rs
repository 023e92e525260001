//! Configurable forbidden-construct deny-list (`spec.md` §4.5 check 4),
//! grounded in the teacher's `xchecker-redaction` pattern-set scanning:
//! named patterns compiled once into a single `RegexSet`, advisory and
//! empty by default.

use regex::{Regex, RegexSet};

/// One named, documented deny-list pattern.
#[derive(Debug, Clone)]
pub struct ForbiddenPatternDef {
    pub id: String,
    pub regex: String,
    pub description: String,
}

/// A compiled set of forbidden-construct patterns. Empty by default, as
/// `spec.md` §4.5 requires: the check is advisory until a project opts in.
pub struct DenyList {
    ids: Vec<String>,
    set: RegexSet,
}

impl DenyList {
    /// Build a deny-list from zero or more pattern definitions. An empty
    /// slice produces a deny-list that matches nothing.
    pub fn from_patterns(patterns: &[ForbiddenPatternDef]) -> Result<Self, regex::Error> {
        let ids = patterns.iter().map(|p| p.id.clone()).collect();
        let set = RegexSet::new(patterns.iter().map(|p| p.regex.as_str()))?;
        Ok(Self { ids, set })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            ids: Vec::new(),
            set: RegexSet::new(std::iter::empty::<&str>()).expect("empty pattern set is valid"),
        }
    }

    /// The id of the first pattern that matches `text`, if any.
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.set
            .matches(text)
            .iter()
            .next()
            .map(|idx| self.ids[idx].as_str())
    }
}

/// Two patterns the spec names as examples of forbidden constructs:
/// shelling out and raw `eval`. Not enabled by default — a project opts in
/// by passing these (or its own) to [`DenyList::from_patterns`].
#[must_use]
pub fn common_patterns() -> Vec<ForbiddenPatternDef> {
    vec![
        ForbiddenPatternDef {
            id: "shell_exec".to_string(),
            regex: r"\b(os\.system|subprocess\.(Popen|run|call)|shell_exec)\s*\(".to_string(),
            description: "shelling out to an external process".to_string(),
        },
        ForbiddenPatternDef {
            id: "raw_eval".to_string(),
            regex: r"\b(eval|exec)\s*\(".to_string(),
            description: "raw eval/exec of dynamic code".to_string(),
        },
    ]
}

#[must_use]
pub fn is_valid_pattern(regex: &str) -> bool {
    Regex::new(regex).is_ok()
}
