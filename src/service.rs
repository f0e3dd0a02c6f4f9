use crate::error::ServiceError;
use crate::logging::EventLog;
use crate::publish::{ArtifactPublisher, GcsObjectStore};
use crate::run_config::{Mode, Resolution, RunConfiguration, ValidationError};
use crate::settings::ServiceSettings;
use crate::tool::{ProcessExecutor, RunReport, ToolInvoker};
use crate::workspace::{validate_upload_name, RequestId, WorkspaceManager};

pub const FIELD_MODE: &str = "mode";
pub const FIELD_RESOLUTION: &str = "resolution";
pub const FIELD_SAMPLE_PLACES: &str = "sample-places";
pub const FIELD_INPUT_FILES: &str = "input-files";

pub const FLAG_FIELDS: [&str; 7] = [
    "existence-checks",
    "existence-checks-place",
    "stat-checks",
    "allow-non-numeric-obs-values",
    "check-measurement-result",
    "summary-report",
    "verbose",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Parsed form fields of one request. Boolean flags carry whatever value
/// the caller sent; only presence matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFields {
    pub mode: Option<String>,
    pub resolution: Option<String>,
    pub existence_checks: Option<String>,
    pub existence_checks_place: Option<String>,
    pub stat_checks: Option<String>,
    pub allow_non_numeric_obs_values: Option<String>,
    pub check_measurement_result: Option<String>,
    pub summary_report: Option<String>,
    pub verbose: Option<String>,
    pub sample_places: Option<String>,
    pub input_files: Vec<UploadedFile>,
}

impl RequestFields {
    /// Assigns a text field by its wire name. Returns false for names the
    /// service does not know, which callers may ignore.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> bool {
        let slot = match name {
            FIELD_MODE => &mut self.mode,
            FIELD_RESOLUTION => &mut self.resolution,
            FIELD_SAMPLE_PLACES => &mut self.sample_places,
            "existence-checks" => &mut self.existence_checks,
            "existence-checks-place" => &mut self.existence_checks_place,
            "stat-checks" => &mut self.stat_checks,
            "allow-non-numeric-obs-values" => &mut self.allow_non_numeric_obs_values,
            "check-measurement-result" => &mut self.check_measurement_result,
            "summary-report" => &mut self.summary_report,
            "verbose" => &mut self.verbose,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }

    pub fn add_input_file(&mut self, file_name: impl Into<String>, data: Vec<u8>) {
        self.input_files.push(UploadedFile {
            file_name: file_name.into(),
            data,
        });
    }
}

/// Request entry point: stage uploads, build the run configuration, run the
/// tool and hand back its report.
#[derive(Debug)]
pub struct ImportService {
    workspace: WorkspaceManager,
    invoker: ToolInvoker,
    log: EventLog,
}

impl ImportService {
    pub fn new(workspace: WorkspaceManager, invoker: ToolInvoker) -> Self {
        Self {
            workspace,
            invoker,
            log: EventLog::disabled(),
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Wires the production collaborators: a child-process executor and
    /// the Cloud Storage client.
    pub fn from_settings(settings: &ServiceSettings) -> Result<Self, ServiceError> {
        settings.validate()?;
        let log = settings
            .log_path
            .as_ref()
            .map(EventLog::new)
            .unwrap_or_default();
        let workspace = WorkspaceManager::new(&settings.input_root, &settings.output_root)
            .with_log(log.clone());
        let publisher = ArtifactPublisher::new(GcsObjectStore::from_settings(&settings.storage))
            .with_log(log.clone());
        let invoker = ToolInvoker::new(
            settings.tool.clone(),
            ProcessExecutor::default(),
            publisher,
        )
        .with_log(log.clone());
        Ok(Self::new(workspace, invoker).with_log(log))
    }

    /// Handles one request and returns the rendered text report.
    pub fn handle(&self, fields: RequestFields) -> Result<String, ServiceError> {
        self.handle_report(fields).map(|report| report.render())
    }

    pub fn handle_report(&self, fields: RequestFields) -> Result<RunReport, ServiceError> {
        let mode = parse_required(fields.mode.as_deref(), FIELD_MODE, Mode::parse)?;
        let resolution = parse_required(
            fields.resolution.as_deref(),
            FIELD_RESOLUTION,
            Resolution::parse,
        )?;
        if fields.input_files.is_empty() {
            return Err(ValidationError::NoInputFiles.into());
        }
        for file in &fields.input_files {
            validate_upload_name(&file.file_name)?;
        }

        let request_id = self.workspace.allocate_request()?;
        let result = self.run_request(&request_id, mode, resolution, &fields);
        if let Err(err) = &result {
            self.log
                .error("run.failed", request_id.as_str(), &err.to_string());
        }
        self.workspace.cleanup(&request_id);
        result
    }

    fn run_request(
        &self,
        request_id: &RequestId,
        mode: Mode,
        resolution: Resolution,
        fields: &RequestFields,
    ) -> Result<RunReport, ServiceError> {
        let dirs = self.workspace.prepare_directories(request_id)?;
        let mut input_paths = Vec::with_capacity(fields.input_files.len());
        for file in &fields.input_files {
            let path =
                self.workspace
                    .stage_upload(&dirs.input_dir, &file.file_name, file.data.as_slice())?;
            self.log.info(
                "upload.staged",
                request_id.as_str(),
                &format!("{} ({} bytes)", path.display(), file.data.len()),
            );
            input_paths.push(path);
        }

        let cfg = RunConfiguration::builder()
            .request_identifier(request_id.as_str())
            .mode(mode)
            .resolution(resolution)
            .existence_checks(enabled(&fields.existence_checks))
            .existence_checks_place(enabled(&fields.existence_checks_place))
            .stat_checks(enabled(&fields.stat_checks))
            .allow_non_numeric_obs_values(enabled(&fields.allow_non_numeric_obs_values))
            .check_measurement_result(enabled(&fields.check_measurement_result))
            .summary_report(enabled(&fields.summary_report))
            .verbose(enabled(&fields.verbose))
            .output_dir(&dirs.output_dir)
            .sample_places(fields.sample_places.clone())
            .input_file_paths(input_paths)
            .build()?;

        Ok(self.invoker.run(&cfg)?)
    }
}

/// Any value, including an empty string, enables the flag.
fn enabled(field: &Option<String>) -> bool {
    field.is_some()
}

fn parse_required<T>(
    raw: Option<&str>,
    field: &'static str,
    parse: fn(&str) -> Result<T, ValidationError>,
) -> Result<T, ValidationError> {
    let raw = raw.ok_or(ValidationError::MissingField(field))?;
    parse(raw)
}
