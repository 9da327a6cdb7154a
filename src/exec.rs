//! Python code execution
//!
//! Submissions run in a `python3` subprocess with a wall-clock timeout and
//! an output cap. This is bounded execution, not a sandbox: the subprocess
//! keeps the bot user's filesystem and network access. Failures of any kind
//! (spawn, non-zero exit, timeout) come back as output text, never as
//! errors, so the conversation always proceeds.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const MAX_OUTPUT_LEN: usize = 64 * 1024; // 64KiB
const SNIP_SIZE: usize = 4 * 1024; // 4KiB each end

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs submissions via `python3 -c`
#[derive(Debug, Clone)]
pub struct PythonRunner {
    python_bin: String,
    timeout: Duration,
}

impl PythonRunner {
    pub fn new(python_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python_bin: python_bin.into(),
            timeout,
        }
    }

    /// Captured output of the submission, or an error rendered as text
    pub async fn run(&self, source: &str) -> String {
        let mut cmd = Command::new(&self.python_bin);
        cmd.args(["-c", source])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must reap the subprocess
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => return format!("Erreur : {e}"),
        };

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "code run timed out");
                format!("Erreur : execution timed out after {:?}", self.timeout)
            }
            Ok(Err(e)) => format!("Erreur : {e}"),
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let combined = if !stderr.is_empty() && !stdout.is_empty() {
                    format!("{stdout}{stderr}")
                } else if stderr.is_empty() {
                    stdout.to_string()
                } else {
                    stderr.to_string()
                };
                let formatted = truncate_output(&combined);
                if output.status.success() {
                    formatted
                } else {
                    format!("Erreur : {formatted}")
                }
            }
        }
    }
}

impl Default for PythonRunner {
    fn default() -> Self {
        Self::new("python3", DEFAULT_TIMEOUT)
    }
}

fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_LEN {
        return output.to_string();
    }

    let start: String = output.chars().take(SNIP_SIZE).collect();
    let end_chars: Vec<char> = output.chars().collect();
    let end: String = end_chars
        .iter()
        .skip(end_chars.len().saturating_sub(SNIP_SIZE))
        .collect();

    format!(
        "[output truncated in middle: got {} bytes, max is {} bytes]\n{start}\n\n[snip]\n\n{end}",
        output.len(),
        MAX_OUTPUT_LEN,
    )
}
