use crate::publish::PublishError;
use crate::run_config::ValidationError;
use crate::settings::ConfigError;
use crate::tool::{InvokeError, ToolError};
use crate::workspace::WorkspaceError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Io,
    Process,
    Timeout,
    Publish,
    Config,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Workspace(WorkspaceError::Validation(_)) => {
                ErrorKind::Validation
            }
            Self::Workspace(_) => ErrorKind::Io,
            Self::Invoke(InvokeError::Tool(ToolError::Timeout { .. })) => ErrorKind::Timeout,
            Self::Invoke(InvokeError::Tool(_)) => ErrorKind::Process,
            Self::Invoke(InvokeError::Publish(_)) => ErrorKind::Publish,
            Self::Invoke(InvokeError::ListOutput { .. } | InvokeError::ReadOutput { .. }) => {
                ErrorKind::Io
            }
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<ToolError> for ServiceError {
    fn from(err: ToolError) -> Self {
        Self::Invoke(InvokeError::Tool(err))
    }
}

impl From<PublishError> for ServiceError {
    fn from(err: PublishError) -> Self {
        Self::Invoke(InvokeError::Publish(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_failure_classes() {
        let err: ServiceError = ValidationError::SamplePlacesWithoutStatChecks.into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: ServiceError = ToolError::Timeout {
            timeout_ms: 10,
            command_form: "tool lint".to_string(),
            partial_output: String::new(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err: ServiceError = ToolError::MissingBinary {
            program: "tool".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Process);

        let err: ServiceError = PublishError::Auth("no token".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Publish);

        let err: ServiceError = WorkspaceError::Write {
            path: "/in/a.csv".to_string(),
            source: std::io::Error::other("disk full"),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
