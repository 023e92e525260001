//! Small filesystem helpers shared across crates.

use std::fs;
use std::io;
use std::path::Path;

/// `fs::create_dir_all` that treats a pre-existing directory as success,
/// tolerating benign races between concurrent `compile` invocations.
pub fn ensure_dir_all(path: &Path) -> io::Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if path.is_dir() => {
            let _ = e;
            Ok(())
        }
        Err(e) => Err(e),
    }
}
