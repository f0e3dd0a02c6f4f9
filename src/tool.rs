use std::time::Duration;

pub mod invocation;
pub mod invoker;
pub mod runner;

pub use invocation::build_command;
pub use invoker::{InvokeError, RunReport, ToolInvoker};
pub use runner::{ProcessExecutor, ToolExecutor};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("import tool binary missing: {program}")]
    MissingBinary { program: String },
    #[error("failed to start import tool {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("import tool io error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("import tool timed out after {timeout_ms}ms: {command_form}")]
    Timeout {
        timeout_ms: u64,
        command_form: String,
        partial_output: String,
    },
}

/// Fully rendered command line for one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn command_form(&self) -> String {
        if self.args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", self.program, self.args.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// Interleaved stdout and stderr.
    pub output: String,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}
