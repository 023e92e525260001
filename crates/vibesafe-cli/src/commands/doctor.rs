//! `vibesafe doctor`: environment health checks, grounded in the teacher's
//! `xchecker-doctor` crate's exit-non-zero-on-any-failure convention.

use serde::Serialize;
use vibesafe_config::Config;

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub ok: bool,
    pub checks: Vec<DoctorCheck>,
}

/// Run every health check against the resolved config. Never fails itself;
/// failed checks are reported, not raised as errors.
#[must_use]
pub fn run(config: &Config) -> DoctorReport {
    let mut checks = Vec::new();

    for (name, provider) in &config.providers {
        let check = match &provider.api_key_env {
            None => DoctorCheck {
                name: format!("provider.{name}.api_key_env"),
                ok: true,
                detail: "no credential env var configured".to_string(),
            },
            Some(var) => {
                let present = std::env::var(var).is_ok();
                DoctorCheck {
                    name: format!("provider.{name}.api_key_env"),
                    ok: present,
                    detail: if present {
                        format!("{var} is set")
                    } else {
                        format!("{var} is not set in the environment")
                    },
                }
            }
        };
        checks.push(check);
    }

    checks.push(gate_tool_check("lint_cmd", &config.gates.lint_cmd));
    checks.push(gate_tool_check("type_cmd", &config.gates.type_cmd));

    let lock_dir = config
        .paths
        .checkpoints
        .parent()
        .map_or_else(|| config.paths.checkpoints.clone(), camino::Utf8Path::to_path_buf);
    checks.push(writable_dir_check("lock_dir", lock_dir.as_std_path()));

    let ok = checks.iter().all(|c| c.ok);
    DoctorReport { ok, checks }
}

fn gate_tool_check(field: &str, cmd: &[String]) -> DoctorCheck {
    let Some(program) = cmd.first() else {
        return DoctorCheck {
            name: format!("gates.{field}"),
            ok: true,
            detail: "not configured".to_string(),
        };
    };
    let resolvable = which(program);
    DoctorCheck {
        name: format!("gates.{field}"),
        ok: resolvable,
        detail: if resolvable {
            format!("'{program}' resolves on $PATH")
        } else {
            format!("'{program}' was not found on $PATH")
        },
    }
}

fn which(program: &str) -> bool {
    let Some(path_var) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path_var).any(|dir| dir.join(program).is_file())
}

fn writable_dir_check(name: &str, dir: &std::path::Path) -> DoctorCheck {
    let probe = dir.join(".vibesafe-doctor-probe");
    match std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&probe, b"ok")) {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            DoctorCheck {
                name: name.to_string(),
                ok: true,
                detail: format!("{} is writable", dir.display()),
            }
        }
        Err(e) => DoctorCheck {
            name: name.to_string(),
            ok: false,
            detail: format!("{} is not writable: {e}", dir.display()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibesafe_config::Config;

    #[test]
    fn reports_ok_when_nothing_is_configured() {
        let config = Config::resolve(None, None).unwrap();
        let report = run(&config);
        assert!(report.checks.iter().any(|c| c.name == "gates.lint_cmd"));
    }

    #[test]
    fn flags_an_unresolvable_gate_tool() {
        let mut config = Config::resolve(None, None).unwrap();
        config.gates.lint_cmd = vec!["definitely-not-a-real-binary-xyz".to_string()];
        let report = run(&config);
        assert!(!report.ok);
    }
}
