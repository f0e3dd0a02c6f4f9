use crate::logging::EventLog;
use crate::publish::{artifact_object_name, ArtifactPublisher, PublishError, PublishedArtifact};
use crate::run_config::RunConfiguration;
use crate::settings::ToolSettings;
use crate::tool::{build_command, ToolError, ToolExecutor};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("failed to list output directory {path}: {source}")]
    ListOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read output file {path}: {source}")]
    ReadOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub output: String,
    pub exit_code: Option<i32>,
    pub artifacts: Vec<PublishedArtifact>,
}

impl RunReport {
    pub fn render(&self) -> String {
        let mut text = format!("{}\n", self.output);
        text.push_str("Result file list:\n");
        for artifact in &self.artifacts {
            text.push_str(&format!("Result file: {}\n", artifact.public_url));
        }
        text
    }
}

/// Runs the tool for one configuration, then publishes whatever it left in
/// the output directory.
pub struct ToolInvoker {
    tool: ToolSettings,
    executor: Box<dyn ToolExecutor>,
    publisher: ArtifactPublisher,
    log: EventLog,
}

impl ToolInvoker {
    pub fn new(
        tool: ToolSettings,
        executor: impl ToolExecutor + 'static,
        publisher: ArtifactPublisher,
    ) -> Self {
        Self {
            tool,
            executor: Box::new(executor),
            publisher,
            log: EventLog::disabled(),
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    pub fn run(&self, cfg: &RunConfiguration) -> Result<RunReport, InvokeError> {
        let request_id = cfg.request_identifier();
        let command = build_command(cfg, &self.tool);
        self.log
            .info("tool.started", request_id, &command.command_form());

        let execution = match self.executor.execute(&command, self.tool.timeout()) {
            Ok(execution) => execution,
            Err(err) => {
                if let ToolError::Timeout { .. } = err {
                    self.log.error("tool.timeout", request_id, &err.to_string());
                }
                return Err(err.into());
            }
        };
        self.log.info(
            "tool.completed",
            request_id,
            &format!(
                "exit_code={} elapsed_ms={}",
                execution
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                execution.elapsed.as_millis()
            ),
        );

        let artifacts = match cfg.output_dir() {
            Some(output_dir) => self.publish_outputs(request_id, output_dir)?,
            None => Vec::new(),
        };

        Ok(RunReport {
            output: execution.output,
            exit_code: execution.exit_code,
            artifacts,
        })
    }

    fn publish_outputs(
        &self,
        request_id: &str,
        output_dir: &Path,
    ) -> Result<Vec<PublishedArtifact>, InvokeError> {
        let files = list_output_files(output_dir)?;
        let mut artifacts = Vec::with_capacity(files.len());
        for (file_name, path) in files {
            let data = fs::read(&path).map_err(|source| InvokeError::ReadOutput {
                path: path.display().to_string(),
                source,
            })?;
            let object_name = artifact_object_name(request_id, &file_name);
            let artifact = self.publisher.publish(request_id, &object_name, &data)?;
            if let Err(err) = fs::remove_file(&path) {
                self.log.warn(
                    "cleanup.failed",
                    request_id,
                    &format!("failed to remove {}: {err}", path.display()),
                );
            }
            artifacts.push(artifact);
        }
        Ok(artifacts)
    }
}

impl std::fmt::Debug for ToolInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolInvoker")
            .field("tool", &self.tool)
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

/// Regular files in `output_dir`, sorted by name. A missing directory
/// yields no files.
fn list_output_files(output_dir: &Path) -> Result<Vec<(String, PathBuf)>, InvokeError> {
    let list_err = |source: std::io::Error| InvokeError::ListOutput {
        path: output_dir.display().to_string(),
        source,
    };
    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(list_err(err)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(list_err)?;
        let file_type = entry.file_type().map_err(list_err)?;
        if !file_type.is_file() {
            continue;
        }
        files.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::MemoryObjectStore;
    use crate::run_config::Mode;
    use crate::tool::{ExecutionOutput, ToolCommand};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Writes canned files into whatever `--output-dir` it is given.
    struct ScriptedExecutor {
        outputs: Vec<(&'static str, &'static str)>,
        timeout: bool,
    }

    impl ToolExecutor for ScriptedExecutor {
        fn execute(
            &self,
            command: &ToolCommand,
            timeout: Duration,
        ) -> Result<ExecutionOutput, ToolError> {
            if self.timeout {
                return Err(ToolError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                    command_form: command.command_form(),
                    partial_output: "partial".to_string(),
                });
            }
            let out_dir = command
                .args
                .iter()
                .find_map(|a| a.strip_prefix("--output-dir="))
                .expect("output dir flag");
            for (name, body) in &self.outputs {
                fs::write(Path::new(out_dir).join(name), body).expect("write output");
            }
            Ok(ExecutionOutput {
                output: "tool says hi".to_string(),
                exit_code: Some(3),
                elapsed: Duration::from_millis(5),
            })
        }
    }

    fn config(output_dir: &Path) -> RunConfiguration {
        RunConfiguration::builder()
            .mode(Mode::Lint)
            .output_dir(output_dir)
            .request_identifier("req-9")
            .input_file_paths(vec![PathBuf::from("/in/a.csv")])
            .build()
            .expect("config")
    }

    fn executor(outputs: Vec<(&'static str, &'static str)>, timeout: bool) -> ScriptedExecutor {
        ScriptedExecutor { outputs, timeout }
    }

    #[test]
    fn publishes_outputs_in_name_order_and_removes_local_copies() {
        let dir = tempdir().expect("tempdir");
        let store = Arc::new(MemoryObjectStore::new("bucket", "storage.test"));
        let invoker = ToolInvoker::new(
            ToolSettings::default(),
            executor(vec![("summary.html", "<p/>"), ("report.json", "{}")], false),
            ArtifactPublisher::new(store.clone()),
        );

        let report = invoker.run(&config(dir.path())).expect("run");
        assert_eq!(report.exit_code, Some(3));
        let urls: Vec<&str> = report
            .artifacts
            .iter()
            .map(|a| a.public_url.as_str())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://storage.test/bucket/req-9-report.json",
                "https://storage.test/bucket/req-9-summary.html",
            ]
        );
        assert_eq!(
            report.render(),
            "tool says hi\nResult file list:\n\
             Result file: https://storage.test/bucket/req-9-report.json\n\
             Result file: https://storage.test/bucket/req-9-summary.html\n"
        );
        assert!(!dir.path().join("report.json").exists());
        assert!(!dir.path().join("summary.html").exists());
        assert_eq!(
            store.object("req-9-report.json").expect("stored").content_type,
            "application/json"
        );
    }

    #[test]
    fn empty_or_missing_output_dir_yields_no_artifacts() {
        let dir = tempdir().expect("tempdir");
        let store = Arc::new(MemoryObjectStore::new("bucket", "storage.test"));
        let invoker = ToolInvoker::new(
            ToolSettings::default(),
            executor(Vec::new(), false),
            ArtifactPublisher::new(store.clone()),
        );

        let report = invoker.run(&config(dir.path())).expect("run");
        assert!(report.artifacts.is_empty());
        assert!(report.render().ends_with("Result file list:\n"));

        assert!(list_output_files(&dir.path().join("missing"))
            .expect("missing dir")
            .is_empty());
    }

    #[test]
    fn timeout_aborts_before_publishing() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("stale.json"), "{}").expect("write");
        let store = Arc::new(MemoryObjectStore::new("bucket", "storage.test"));
        let invoker = ToolInvoker::new(
            ToolSettings::default(),
            executor(Vec::new(), true),
            ArtifactPublisher::new(store.clone()),
        );

        let err = invoker.run(&config(dir.path())).expect_err("timeout");
        assert!(matches!(err, InvokeError::Tool(ToolError::Timeout { .. })));
        assert!(store.object_names().is_empty());
    }

    #[test]
    fn publish_failure_keeps_unpublished_file_local() {
        let dir = tempdir().expect("tempdir");
        let store = Arc::new(MemoryObjectStore::new("bucket", "storage.test"));
        store.fail_puts(true);
        let invoker = ToolInvoker::new(
            ToolSettings::default(),
            executor(vec![("report.json", "{}")], false),
            ArtifactPublisher::new(store.clone()),
        );

        let err = invoker.run(&config(dir.path())).expect_err("publish fails");
        assert!(matches!(err, InvokeError::Publish(PublishError::Write { .. })));
        assert!(dir.path().join("report.json").exists());
    }
}
