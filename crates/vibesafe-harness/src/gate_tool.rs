//! Subprocess execution for Gate Tools (`spec.md` §6.7): argv-only, no
//! shell string evaluation, with a per-call timeout. Generalized from the
//! teacher's Claude CLI process runner (`tokio::time::timeout` wrapping a
//! piped child) to "run an arbitrary configured subprocess and parse its
//! exit code."

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Raw result of one subprocess invocation.
#[derive(Debug, Clone)]
pub struct GateOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl GateOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }
}

fn timed_out() -> GateOutput {
    GateOutput {
        stdout: String::new(),
        stderr: String::new(),
        exit_code: None,
        timed_out: true,
    }
}

/// Run `argv[0]` with `argv[1..]` as discrete arguments (never via a shell),
/// enforcing `timeout`. An empty `argv` is treated as "no tool configured"
/// and trivially succeeds.
pub async fn run_subprocess(argv: &[String], timeout: Duration) -> std::io::Result<GateOutput> {
    run_subprocess_with_stdin(argv, None, timeout).await
}

/// As [`run_subprocess`], optionally piping `stdin_content` to the child's
/// stdin before closing it — used by the optional property-test gate to
/// hand a `hypothesis:` block to a configured runner.
pub async fn run_subprocess_with_stdin(
    argv: &[String],
    stdin_content: Option<&str>,
    timeout: Duration,
) -> std::io::Result<GateOutput> {
    let Some((program, args)) = argv.split_first() else {
        return Ok(GateOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            timed_out: false,
        });
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin_content.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn()?;
    if let Some(content) = stdin_content {
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(content.as_bytes()).await?;
        }
    }

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(GateOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            timed_out: false,
        }),
        Ok(Err(e)) => Err(e),
        Err(_elapsed) => Ok(timed_out()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_argv_trivially_succeeds() {
        let output = run_subprocess(&[], Duration::from_secs(1)).await.unwrap();
        assert!(output.success());
    }

    #[tokio::test]
    async fn a_zero_exit_command_succeeds() {
        let argv = vec!["true".to_string()];
        let output = run_subprocess(&argv, Duration::from_secs(5)).await.unwrap();
        assert!(output.success());
    }

    #[tokio::test]
    async fn a_nonzero_exit_command_fails() {
        let argv = vec!["false".to_string()];
        let output = run_subprocess(&argv, Duration::from_secs(5)).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(1));
    }

    #[tokio::test]
    async fn a_slow_command_times_out() {
        let argv = vec!["sleep".to_string(), "5".to_string()];
        let output = run_subprocess(&argv, Duration::from_millis(50))
            .await
            .unwrap();
        assert!(output.timed_out);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn stdin_content_is_delivered() {
        let argv = vec!["cat".to_string()];
        let output = run_subprocess_with_stdin(&argv, Some("hello"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(output.stdout, "hello");
    }
}
