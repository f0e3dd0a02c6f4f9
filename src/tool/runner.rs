use crate::tool::{ExecutionOutput, ToolCommand, ToolError};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Floor on the post-exit drain so output written just before a
/// late exit is still collected.
const MIN_DRAIN_WAIT: Duration = Duration::from_millis(50);

/// Process boundary for the import tool.
pub trait ToolExecutor: Send + Sync {
    fn execute(
        &self,
        command: &ToolCommand,
        timeout: Duration,
    ) -> Result<ExecutionOutput, ToolError>;
}

/// Runs the tool as a child process with stdout and stderr sharing one pipe.
/// A child still running at the deadline is killed and reaped. The deadline
/// also bounds draining the pipe after the child exits.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    poll_interval: Duration,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl ToolExecutor for ProcessExecutor {
    fn execute(
        &self,
        command: &ToolCommand,
        timeout: Duration,
    ) -> Result<ExecutionOutput, ToolError> {
        let (mut reader, writer) = std::io::pipe().map_err(|source| ToolError::Io {
            context: "creating output pipe".to_string(),
            source,
        })?;
        let stderr_writer = writer.try_clone().map_err(|source| ToolError::Io {
            context: "cloning output pipe".to_string(),
            source,
        })?;

        // The Command keeps the parent's write ends open until dropped, and
        // the reader only sees EOF once every write end is closed.
        let spawned = {
            let mut process = Command::new(&command.program);
            process
                .args(&command.args)
                .stdin(Stdio::null())
                .stdout(writer)
                .stderr(stderr_writer);
            process.spawn()
        };
        let mut child = match spawned {
            Ok(child) => child,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::MissingBinary {
                    program: command.program.clone(),
                })
            }
            Err(source) => {
                return Err(ToolError::Spawn {
                    program: command.program.clone(),
                    source,
                })
            }
        };

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let (drained_tx, drained_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut chunk = [0_u8; 8192];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(&chunk[..n]);
                        }
                    }
                }
            }
            let _ = drained_tx.send(());
        });

        let start = Instant::now();
        let exit_status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > timeout {
                        abort(&mut child);
                        // Grandchildren may still hold the pipe open, so the
                        // reader is left to finish on its own.
                        return Err(ToolError::Timeout {
                            timeout_ms: timeout.as_millis() as u64,
                            command_form: command.command_form(),
                            partial_output: snapshot(&captured),
                        });
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(source) => {
                    abort(&mut child);
                    return Err(ToolError::Io {
                        context: "waiting for import tool".to_string(),
                        source,
                    });
                }
            }
        };

        // A background process the tool left behind can keep the pipe open
        // past its exit; stop waiting for EOF once the deadline passes.
        let drain_budget = timeout
            .saturating_sub(start.elapsed())
            .max(MIN_DRAIN_WAIT);
        let _ = drained_rx.recv_timeout(drain_budget);
        Ok(ExecutionOutput {
            output: snapshot(&captured),
            exit_code: exit_status.code(),
            elapsed: start.elapsed(),
        })
    }
}

fn abort(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn snapshot(captured: &Mutex<Vec<u8>>) -> String {
    captured
        .lock()
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_kills_and_reaps_the_child() {
        let mut child = Command::new("sleep")
            .arg("10")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .expect("spawn sleep");

        abort(&mut child);
        let status = child.try_wait().expect("try_wait").expect("reaped");
        assert!(!status.success());
    }
}
