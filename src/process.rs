//! Subprocess plumbing shared by the command-backed clients.
//!
//! Both `CommandCompletion` and `CommandStore` talk to an external program
//! the same way: write the request to stdin, read the reply from stdout,
//! and treat a non-zero exit as a failure described by stderr.

use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of one piped invocation.
#[derive(Debug, Clone)]
pub(crate) struct PipedOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl PipedOutput {
    /// Best description of a failed run: stderr if present, else the exit status.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            "command exited with a non-zero status".to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Run `program args..` with `input` on stdin and collect its output.
///
/// The child is killed if the returned future is dropped, so callers can
/// bound it with a timeout.
pub(crate) async fn run_piped(
    program: &str,
    args: &[String],
    input: &str,
) -> std::io::Result<PipedOutput> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    // Feed stdin concurrently so a chatty child can't deadlock on a full pipe.
    let writer = child.stdin.take().map(|mut stdin| {
        let bytes = input.as_bytes().to_vec();
        tokio::spawn(async move {
            let _ = stdin.write_all(&bytes).await;
            let _ = stdin.shutdown().await;
        })
    });

    let output = child.wait_with_output().await?;
    if let Some(writer) = writer {
        let _ = writer.await;
    }

    Ok(PipedOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Split a command line on whitespace into program and arguments.
///
/// No shell quoting is interpreted; wrap anything fancier in a script.
pub(crate) fn split_command_line(line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}
