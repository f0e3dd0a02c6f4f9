use crate::logging::EventLog;
use crate::run_config::ValidationError;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write staged upload {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to generate request identifier: {0}")]
    Random(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Opaque per-request token; every directory and object name of a run is
/// keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// 128 random bits rendered in the RFC 4122 version-4 layout.
    pub fn generate() -> Result<Self, WorkspaceError> {
        let mut bytes = [0_u8; 16];
        getrandom::getrandom(&mut bytes).map_err(|err| WorkspaceError::Random(err.to_string()))?;
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;

        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Ok(Self(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )))
    }

    #[cfg(test)]
    pub(crate) fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("request id must be non-empty".to_string());
        }
        if raw
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Ok(Self(raw.to_string()));
        }
        Err("request id must use only ASCII letters, digits, '-' or '_'".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectories {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    input_root: PathBuf,
    output_root: PathBuf,
    log: EventLog,
}

impl WorkspaceManager {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            log: EventLog::disabled(),
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    pub fn allocate_request(&self) -> Result<RequestId, WorkspaceError> {
        let id = RequestId::generate()?;
        self.log
            .info("request.allocated", id.as_str(), "allocated request workspace");
        Ok(id)
    }

    pub fn directories(&self, request_id: &RequestId) -> RunDirectories {
        RunDirectories {
            input_dir: self.input_root.join(request_id.as_str()),
            output_dir: self.output_root.join(request_id.as_str()),
        }
    }

    pub fn prepare_directories(
        &self,
        request_id: &RequestId,
    ) -> Result<RunDirectories, WorkspaceError> {
        let dirs = self.directories(request_id);
        for path in [&dirs.input_dir, &dirs.output_dir] {
            fs::create_dir_all(path).map_err(|source| WorkspaceError::CreateDir {
                path: path.display().to_string(),
                source,
            })?;
        }
        Ok(dirs)
    }

    /// Writes the whole stream to `input_dir/original_name`, replacing any
    /// file of the same name. A failed write leaves no file behind.
    pub fn stage_upload(
        &self,
        input_dir: &Path,
        original_name: &str,
        mut reader: impl Read,
    ) -> Result<PathBuf, WorkspaceError> {
        validate_upload_name(original_name)?;
        let path = input_dir.join(original_name);
        let write_err = |source: std::io::Error| WorkspaceError::Write {
            path: path.display().to_string(),
            source,
        };

        let result = fs::File::create(&path).and_then(|mut file| {
            std::io::copy(&mut reader, &mut file)?;
            file.flush()?;
            file.sync_all()
        });
        if let Err(err) = result {
            let _ = fs::remove_file(&path);
            return Err(write_err(err));
        }
        Ok(path)
    }

    /// Best-effort removal of both request directories.
    pub fn cleanup(&self, request_id: &RequestId) {
        let dirs = self.directories(request_id);
        for path in [&dirs.input_dir, &dirs.output_dir] {
            match fs::remove_dir_all(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => self.log.warn(
                    "cleanup.failed",
                    request_id.as_str(),
                    &format!("failed to remove {}: {err}", path.display()),
                ),
            }
        }
    }
}

pub fn validate_upload_name(name: &str) -> Result<(), ValidationError> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(ValidationError::InvalidFileName(name.to_string()));
    }
    Ok(())
}
