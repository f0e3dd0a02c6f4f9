use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid value `{value}` for `{field}`: expected one of {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("sample-places should only be set if stat-checks is true")]
    SamplePlacesWithoutStatChecks,
    #[error("at least one input file is required")]
    NoInputFiles,
    #[error("invalid input file name `{0}`")]
    InvalidFileName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Lint,
    Genmcf,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lint => "lint",
            Self::Genmcf => "genmcf",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lint" => Ok(Self::Lint),
            "genmcf" => Ok(Self::Genmcf),
            _ => Err(ValidationError::InvalidValue {
                field: "mode",
                value: raw.to_string(),
                expected: "lint, genmcf",
            }),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Entity-resolution strictness passed through to the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    None,
    #[default]
    Local,
    Full,
}

impl Resolution {
    /// Flag form, upper-cased as the tool expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Local => "LOCAL",
            Self::Full => "FULL",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "LOCAL" => Ok(Self::Local),
            "FULL" => Ok(Self::Full),
            _ => Err(ValidationError::InvalidValue {
                field: "resolution",
                value: raw.to_string(),
                expected: "none, local, full",
            }),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable description of a single tool run.
///
/// Only constructible through [`RunConfiguration::builder`], which checks
/// cross-field constraints before handing out a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    mode: Mode,
    resolution: Resolution,
    existence_checks: bool,
    existence_checks_place: bool,
    stat_checks: bool,
    allow_non_numeric_obs_values: bool,
    check_measurement_result: bool,
    summary_report: bool,
    verbose: bool,
    output_dir: Option<PathBuf>,
    sample_places: Option<String>,
    input_file_paths: Vec<PathBuf>,
    request_identifier: String,
}

impl RunConfiguration {
    pub fn builder() -> RunConfigurationBuilder {
        RunConfigurationBuilder::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn existence_checks(&self) -> bool {
        self.existence_checks
    }

    pub fn existence_checks_place(&self) -> bool {
        self.existence_checks_place
    }

    pub fn stat_checks(&self) -> bool {
        self.stat_checks
    }

    pub fn allow_non_numeric_obs_values(&self) -> bool {
        self.allow_non_numeric_obs_values
    }

    pub fn check_measurement_result(&self) -> bool {
        self.check_measurement_result
    }

    pub fn summary_report(&self) -> bool {
        self.summary_report
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn sample_places(&self) -> Option<&str> {
        self.sample_places.as_deref()
    }

    pub fn input_file_paths(&self) -> &[PathBuf] {
        &self.input_file_paths
    }

    pub fn request_identifier(&self) -> &str {
        &self.request_identifier
    }
}

#[derive(Debug, Clone)]
pub struct RunConfigurationBuilder {
    mode: Option<Mode>,
    resolution: Resolution,
    existence_checks: bool,
    existence_checks_place: bool,
    stat_checks: bool,
    allow_non_numeric_obs_values: bool,
    check_measurement_result: bool,
    summary_report: bool,
    verbose: bool,
    output_dir: Option<PathBuf>,
    sample_places: Option<String>,
    input_file_paths: Option<Vec<PathBuf>>,
    request_identifier: Option<String>,
}

impl Default for RunConfigurationBuilder {
    fn default() -> Self {
        Self {
            mode: None,
            resolution: Resolution::Local,
            existence_checks: true,
            existence_checks_place: false,
            stat_checks: true,
            allow_non_numeric_obs_values: false,
            check_measurement_result: false,
            summary_report: true,
            verbose: false,
            output_dir: None,
            sample_places: None,
            input_file_paths: None,
            request_identifier: None,
        }
    }
}

impl RunConfigurationBuilder {
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn existence_checks(mut self, enabled: bool) -> Self {
        self.existence_checks = enabled;
        self
    }

    pub fn existence_checks_place(mut self, enabled: bool) -> Self {
        self.existence_checks_place = enabled;
        self
    }

    pub fn stat_checks(mut self, enabled: bool) -> Self {
        self.stat_checks = enabled;
        self
    }

    pub fn allow_non_numeric_obs_values(mut self, enabled: bool) -> Self {
        self.allow_non_numeric_obs_values = enabled;
        self
    }

    pub fn check_measurement_result(mut self, enabled: bool) -> Self {
        self.check_measurement_result = enabled;
        self
    }

    pub fn summary_report(mut self, enabled: bool) -> Self {
        self.summary_report = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn sample_places(mut self, sample_places: Option<String>) -> Self {
        self.sample_places = sample_places;
        self
    }

    pub fn input_file_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.input_file_paths = Some(paths);
        self
    }

    pub fn request_identifier(mut self, request_identifier: impl Into<String>) -> Self {
        self.request_identifier = Some(request_identifier.into());
        self
    }

    pub fn build(self) -> Result<RunConfiguration, ValidationError> {
        let mode = self.mode.ok_or(ValidationError::MissingField("mode"))?;
        let input_file_paths = self
            .input_file_paths
            .ok_or(ValidationError::MissingField("input-files"))?;
        if input_file_paths.is_empty() {
            return Err(ValidationError::NoInputFiles);
        }
        let request_identifier = self
            .request_identifier
            .filter(|id| !id.trim().is_empty())
            .ok_or(ValidationError::MissingField("request-identifier"))?;
        if self.sample_places.is_some() && !self.stat_checks {
            return Err(ValidationError::SamplePlacesWithoutStatChecks);
        }

        Ok(RunConfiguration {
            mode,
            resolution: self.resolution,
            existence_checks: self.existence_checks,
            existence_checks_place: self.existence_checks_place,
            stat_checks: self.stat_checks,
            allow_non_numeric_obs_values: self.allow_non_numeric_obs_values,
            check_measurement_result: self.check_measurement_result,
            summary_report: self.summary_report,
            verbose: self.verbose,
            output_dir: self.output_dir,
            sample_places: self.sample_places,
            input_file_paths,
            request_identifier,
        })
    }
}
