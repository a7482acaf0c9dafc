//! Child Process Utilities

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub success: bool,
}

/// Options for [`run_command`].
#[derive(Debug, Default)]
pub struct CommandOptions<'a> {
    /// Extra environment variables
    pub env: Vec<(&'a str, String)>,
    /// Text written to the child's stdin, which is then closed
    pub stdin: Option<&'a str>,
    /// Timeout in seconds, 0 disables
    pub timeout_secs: u64,
    pub cwd: Option<&'a Path>,
}

/// Run `argv` to completion, capturing stdout and stderr.
///
/// The executable is resolved on `PATH` first so a missing tool is
/// reported by name instead of as a bare spawn error.
pub async fn run_command(argv: &[String], options: CommandOptions<'_>) -> anyhow::Result<CommandOutput> {
    let start = Instant::now();

    let Some((exe, args)) = argv.split_first() else {
        anyhow::bail!("empty command line");
    };
    let program = which::which(exe).with_context(|| format!("executable not found: {}", exe))?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if options.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &options.env {
        command.env(key, value);
    }
    if let Some(cwd) = options.cwd {
        command.current_dir(cwd);
    }

    tracing::debug!(command = %argv.join(" "), "Spawning process");
    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn {}", exe))?;

    // Stdin is fed concurrently with output collection; the timeout covers both
    let writer = match (options.stdin, child.stdin.take()) {
        (Some(input), Some(mut stdin)) => {
            let input = input.to_owned();
            Some(tokio::spawn(async move {
                let result = stdin.write_all(input.as_bytes()).await;
                // Dropping closes the pipe so the child sees EOF
                drop(stdin);
                result
            }))
        }
        _ => None,
    };

    let output = if options.timeout_secs > 0 {
        tokio::time::timeout(
            Duration::from_secs(options.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("{} timed out after {} seconds", exe, options.timeout_secs))??
    } else {
        child.wait_with_output().await?
    };

    if let Some(writer) = writer {
        match writer.await.context("stdin writer task failed")? {
            Ok(()) => {}
            // The child may exit without reading all of its input
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::debug!(command = %exe, "Child closed stdin early");
            }
            Err(e) => return Err(e).context("failed to write to child stdin"),
        }
    }

    Ok(CommandOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration_ms: start.elapsed().as_millis() as u64,
        success: output.status.success(),
    })
}
