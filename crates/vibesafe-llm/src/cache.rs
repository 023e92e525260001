//! Content-addressed cache for provider responses, keyed by
//! `H_prompt || provider_identity` (`spec.md` §4.4). Writes are atomic
//! (temp file, then rename), so a cancelled compile never leaves a partial
//! cache entry that a later `read` could trust.

use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use vibesafe_utils::atomic_write::write_file_atomic;

/// The cache key for one `(H_prompt, provider_identity)` pair.
#[must_use]
pub fn cache_key(h_prompt: &str, provider_identity: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(h_prompt.as_bytes());
    hasher.update(b"|");
    hasher.update(provider_identity.as_bytes());
    let digest = hasher.finalize();
    use std::fmt::Write;
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// A directory-backed cache of raw provider responses.
pub struct ResponseCache {
    root: Utf8PathBuf,
}

impl ResponseCache {
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, h_prompt: &str, provider_identity: &str) -> Utf8PathBuf {
        self.root
            .join(format!("{}.bin", cache_key(h_prompt, provider_identity)))
    }

    #[must_use]
    pub fn get(&self, h_prompt: &str, provider_identity: &str) -> Option<String> {
        let path = self.entry_path(h_prompt, provider_identity);
        std::fs::read_to_string(path).ok()
    }

    pub fn put(
        &self,
        h_prompt: &str,
        provider_identity: &str,
        response: &str,
    ) -> anyhow::Result<()> {
        let path = self.entry_path(h_prompt, provider_identity);
        write_file_atomic(&path, response.as_bytes())?;
        Ok(())
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}
