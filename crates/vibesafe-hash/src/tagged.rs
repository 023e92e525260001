//! A small tagged, length-prefixed byte-stream builder. Every hashable
//! field is fed through `feed`, which forces an explicit tag and writes an
//! 8-byte big-endian length prefix before the bytes themselves — so two
//! different sequences of fields can never collide on the same byte
//! stream by concatenation alone. This is the mechanical device that makes
//! hash sensitivity (`spec.md` invariant 2) hold by construction.

use sha2::{Digest, Sha256};

pub struct TaggedHasher {
    inner: Sha256,
}

impl TaggedHasher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Feed one tagged field: `[tag: u8][len: u64 BE][bytes]`.
    pub fn feed(&mut self, tag: u8, bytes: &[u8]) -> &mut Self {
        self.inner.update([tag]);
        self.inner.update((bytes.len() as u64).to_be_bytes());
        self.inner.update(bytes);
        self
    }

    #[must_use]
    pub fn finalize_hex(self) -> String {
        hex_encode(self.inner.finalize())
    }
}

impl Default for TaggedHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain (untagged) SHA-256 hex digest, used for `H_prompt` and `H_impl`
/// which hash a single opaque byte string rather than several fields.
#[must_use]
pub fn plain_sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(hasher.finalize())
}

fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.as_ref().len() * 2);
    for byte in bytes.as_ref() {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feeding_different_tags_changes_the_digest() {
        let mut a = TaggedHasher::new();
        a.feed(1, b"same");
        let mut b = TaggedHasher::new();
        b.feed(2, b"same");
        assert_ne!(a.finalize_hex(), b.finalize_hex());
    }

    #[test]
    fn concatenation_is_unambiguous() {
        let mut a = TaggedHasher::new();
        a.feed(1, b"ab").feed(1, b"c");
        let mut b = TaggedHasher::new();
        b.feed(1, b"a").feed(1, b"bc");
        assert_ne!(a.finalize_hex(), b.finalize_hex());
    }
}
