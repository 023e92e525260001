//! Docstring normalisation and `>>>` Example parsing (`spec.md` §4.1).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Example;

static PROMPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)>>>\s?(.*)$").expect("valid regex"));
static CONTINUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)\.\.\.\s?(.*)$").expect("valid regex"));

/// Strip the common leading indentation shared by every non-blank line,
/// normalise newlines to `\n`. Trailing whitespace on individual lines is
/// preserved, since it may be significant inside an expected-output block.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n");
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    // The first line sits on the same source line as the opening quote, so
    // it never carries the docstring's real indentation; only the
    // remaining lines are used to find the common indent to strip.
    let first = lines.remove(0);

    let common_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut normalized: Vec<String> = vec![first.trim_end().to_string()];
    normalized.extend(lines.into_iter().map(|l| {
        if l.trim().is_empty() {
            String::new()
        } else {
            l.chars().skip(common_indent).collect()
        }
    }));
    normalized.join("\n")
}

/// A fenced ```` ```hypothesis ```` block inside a docstring, stored
/// verbatim for the Verification Harness's optional property gate.
#[must_use]
pub fn extract_property_block(normalized: &str) -> Option<String> {
    let start_marker = "```hypothesis";
    let start = normalized.find(start_marker)?;
    let after_start = start + start_marker.len();
    let rest = &normalized[after_start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim_matches('\n').to_string())
}

/// Parse every `>>>` Example out of a normalised docstring.
#[must_use]
pub fn parse_examples(normalized: &str) -> Vec<Example> {
    let lines: Vec<&str> = normalized.split('\n').collect();
    let mut examples = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = PROMPT_RE.captures(lines[i]) else {
            i += 1;
            continue;
        };
        let indent = caps[1].to_string();
        let mut input_parts = vec![caps[2].to_string()];
        i += 1;

        while i < lines.len() {
            if let Some(cont) = CONTINUATION_RE.captures(lines[i]) {
                if cont[1] == indent {
                    input_parts.push(cont[2].to_string());
                    i += 1;
                    continue;
                }
            }
            break;
        }

        let mut expected_lines = Vec::new();
        while i < lines.len() {
            let line = lines[i];
            if line.trim().is_empty() || PROMPT_RE.is_match(line) {
                break;
            }
            expected_lines.push(line.to_string());
            i += 1;
        }

        examples.push(Example {
            input_source: input_parts.join("\n"),
            expected_output: expected_lines.join("\n"),
        });
    }

    examples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_common_indentation_from_continuation_lines() {
        let raw = "first line\n    second line\n    third line\n";
        assert_eq!(normalize(raw), "first line\nsecond line\nthird line");
    }

    #[test]
    fn parses_single_example() {
        let doc = "Adds two strings.\n\n>>> add_strs(\"2\", \"3\")\n'5'\n";
        let examples = parse_examples(doc);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].input_source, "add_strs(\"2\", \"3\")");
        assert_eq!(examples[0].expected_output, "'5'");
    }

    #[test]
    fn parses_multiple_examples() {
        let doc = ">>> f(1)\n1\n>>> f(2)\n2\n";
        let examples = parse_examples(doc);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1].expected_output, "2");
    }

    #[test]
    fn extracts_hypothesis_block() {
        let doc = "desc\n\n```hypothesis\ngiven(st.integers())\n```\n";
        let block = extract_property_block(doc).unwrap();
        assert_eq!(block, "given(st.integers())");
    }
}
