//! `clap`-derived argument parsing (`spec.md` §4.9): global flags for config
//! path, provider/model override, output format; per-subcommand flags for
//! `--target`, `--force`, `--freeze-http-deps`.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vibesafe", version, about = "Spec -> hash -> checkpoint -> verify -> activate")]
pub struct Cli {
    /// Path to `vibesafe.toml`; defaults to an upward search from the cwd.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Override the configured provider's model.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Emit machine-readable, JCS-canonical JSON instead of human text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List units and their coverage status.
    Scan,
    /// Run Extractor -> Hasher -> Prompt -> Provider -> Validator -> Store.write.
    Compile {
        #[arg(long)]
        target: Option<String>,
        /// Bypass the provider response cache.
        #[arg(long)]
        force: bool,
    },
    /// Run the Verification Harness against the latest candidate checkpoint.
    Test {
        #[arg(long)]
        target: Option<String>,
    },
    /// Require all gates to pass, then activate.
    Save {
        #[arg(long)]
        target: Option<String>,
        /// Record dependency content hashes into `meta.toml`.
        #[arg(long)]
        freeze_http_deps: bool,
    },
    /// Show prompt/code deltas between the current spec and the active checkpoint.
    Diff {
        #[arg(long)]
        target: Option<String>,
    },
    /// Summarise coverage and drift across all units.
    Status,
    /// Bundle lint + type + examples + drift across all units.
    Check,
    /// Check environment prerequisites: provider credentials, Gate Tools on
    /// `$PATH`, and a writable lock directory.
    Doctor,
}
