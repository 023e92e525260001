//! JCS-canonical JSON emission (RFC 8785) for every verb's `--json` mode,
//! mirroring the teacher's `emit_jcs` helper so status/scan/check output is
//! stable for diffing regardless of field order.

use serde::Serialize;
use vibesafe_utils::error::VibesafeError;

pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String, VibesafeError> {
    let json_value = serde_json::to_value(value)
        .map_err(|e| VibesafeError::Io(std::io::Error::other(e.to_string())))?;
    let bytes = serde_json_canonicalizer::to_vec(&json_value)
        .map_err(|e| VibesafeError::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| VibesafeError::Io(std::io::Error::other(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        b: u32,
        a: u32,
    }

    #[test]
    fn emits_keys_in_canonical_sorted_order() {
        let json = emit_jcs(&Sample { b: 2, a: 1 }).unwrap();
        assert_eq!(json, r#"{"a":1,"b":2}"#);
    }
}
