//! The `vibesafe` CLI (`spec.md` §4.9): composes the pipeline crates into
//! `scan`/`compile`/`test`/`save`/`diff`/`status`/`check`/`doctor`.
//!
//! `main.rs` only invokes [`run`]; all logic lives here so the binary
//! crate stays a thin entrypoint, mirroring the teacher's `main.rs` ->
//! `cli::run()` split.

pub mod cli_args;
pub mod commands;
pub mod json_output;
pub mod orchestrator;

use std::collections::HashMap;

use camino::Utf8PathBuf;
use clap::Parser;
use vibesafe_config::{Config, TomlConfig};
use vibesafe_loader::Loader;
use vibesafe_utils::error::VibesafeError;
use vibesafe_utils::exit_codes::ExitCode;

use cli_args::{Cli, Command};
use json_output::emit_jcs;
use orchestrator::{discover_units, CliCompiler, Workspace};

/// Parse arguments, resolve configuration, and dispatch to the requested
/// verb. All output is written here; `main` only maps the return value to
/// a process exit code.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    if cli.json {
        vibesafe_utils::logging::init_json();
    } else {
        vibesafe_utils::logging::init();
    }

    match dispatch(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", vibesafe_redaction::redact(&e.to_string()));
            e.to_exit_code()
        }
    }
}

async fn dispatch(cli: &Cli) -> Result<ExitCode, VibesafeError> {
    let project_root = Utf8PathBuf::from_path_buf(std::env::current_dir()?)
        .unwrap_or_else(|_| Utf8PathBuf::from("."));

    let config_path = cli
        .config
        .clone()
        .or_else(|| {
            vibesafe_config::discover_config_file_from(project_root.as_std_path())
                .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
        });
    let toml_config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path.as_std_path())?;
            Some(TomlConfig::parse(&content, path)?)
        }
        None => None,
    };
    let env_var = std::env::var("VIBESAFE_ENV").ok();
    let mut config = Config::resolve(toml_config, env_var.as_deref())?;
    if let Some(model) = &cli.model {
        for provider in config.providers.values_mut() {
            provider.model = model.clone();
        }
    }

    let ws = Workspace::new(project_root, config);

    match &cli.command {
        Command::Scan => {
            let report = commands::scan::run(&ws)?;
            print_or_json(cli.json, &report, |r| {
                for unit in &r.units {
                    println!("{}  {}", unit.unit_id, unit.status);
                }
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Compile { target, force } => {
            let report = commands::compile::run(&ws, target.as_deref(), *force).await?;
            print_or_json(cli.json, &report, |r| {
                for entry in &r.compiled {
                    println!(
                        "{}  {}  {}",
                        entry.unit_id,
                        entry.h_chk,
                        if entry.cache_hit { "(cache hit)" } else { "(generated)" }
                    );
                }
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Test { target } => {
            let report = commands::test::run(&ws, target.as_deref()).await?;
            let all_passed = report.all_passed();
            print_or_json(cli.json, &report, |r| {
                for entry in &r.results {
                    println!("{}  {}", entry.unit_id, if entry.passed { "pass" } else { "fail" });
                    for failure in &entry.failures {
                        println!("    {failure}");
                    }
                }
            })?;
            Ok(if all_passed { ExitCode::SUCCESS } else { ExitCode::EXPECTED_FAILURE })
        }
        Command::Save { target, freeze_http_deps } => {
            let report = commands::save::run(&ws, target.as_deref(), *freeze_http_deps).await?;
            let all_activated = report.all_activated();
            print_or_json(cli.json, &report, |r| {
                for entry in &r.results {
                    println!(
                        "{}  {}",
                        entry.unit_id,
                        if entry.activated { "activated" } else { "refused" }
                    );
                    for failure in &entry.failures {
                        println!("    {failure}");
                    }
                }
            })?;
            Ok(if all_activated { ExitCode::SUCCESS } else { ExitCode::EXPECTED_FAILURE })
        }
        Command::Diff { target } => {
            let report = commands::diff::run(&ws, target.as_deref())?;
            print_or_json(cli.json, &report, |r| {
                for unit in &r.units {
                    println!(
                        "{}  active={:?}  current={}  drifted={}",
                        unit.unit_id, unit.active_h_spec, unit.current_h_spec, unit.drifted
                    );
                }
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let report = commands::status::run(&ws)?;
            print_or_json(cli.json, &report, |r| {
                println!(
                    "total={} active={} drifted={} uncompiled={} missing_examples={}",
                    r.total, r.compiled_active, r.drifted, r.uncompiled, r.missing_examples
                );
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => {
            let report = commands::check::run(&ws).await?;
            let all_clean = report.all_clean();
            print_or_json(cli.json, &report, |r| {
                for unit in &r.units {
                    println!(
                        "{}  gates={}  drifted={}",
                        unit.unit_id, unit.gates_passed, unit.drifted
                    );
                }
            })?;
            Ok(if all_clean { ExitCode::SUCCESS } else { ExitCode::EXPECTED_FAILURE })
        }
        Command::Doctor => {
            let report = commands::doctor::run(&ws.config);
            print_or_json(cli.json, &report, |r| {
                for check in &r.checks {
                    println!("[{}] {}: {}", if check.ok { "ok" } else { "FAIL" }, check.name, check.detail);
                }
            })?;
            Ok(if report.ok { ExitCode::SUCCESS } else { ExitCode::EXPECTED_FAILURE })
        }
    }
}

fn print_or_json<T: serde::Serialize>(
    json: bool,
    value: &T,
    human: impl FnOnce(&T),
) -> Result<(), VibesafeError> {
    if json {
        println!("{}", emit_jcs(value)?);
    } else {
        human(value);
    }
    Ok(())
}

/// Build a [`vibesafe_loader::Loader`] plus its [`CliCompiler`] for a given
/// workspace, used by runtime-loading call sites outside the CLI's own
/// command handlers (e.g. an embedding host's `prod`/`dev` resolution).
pub fn loader_for<'a>(ws: &'a Workspace, run_mode: vibesafe_config::RunMode) -> (Loader<'a>, CliCompiler<'a>) {
    let specs_by_unit: HashMap<String, vibesafe_spec::Spec> = discover_units(ws)
        .unwrap_or_default()
        .into_iter()
        .map(|s| (s.unit_id.clone(), s))
        .collect();
    (
        Loader::new(&ws.store, &ws.introspector, run_mode),
        CliCompiler { ws, specs_by_unit },
    )
}
