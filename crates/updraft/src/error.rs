use updraft_backend::{DownloadError, SettingsError};
use updraft_core::CheckError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorDetail {
    Message(String),
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
    Settings(SettingsError),
    Check(CheckError),
}

impl std::fmt::Display for AppErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{message}"),
            Self::Io { kind, message } => write!(f, "{kind}: {message}"),
            Self::Settings(error) => write!(f, "{error}"),
            Self::Check(error) => write!(f, "{error}"),
        }
    }
}

impl From<String> for AppErrorDetail {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for AppErrorDetail {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<std::io::Error> for AppErrorDetail {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<SettingsError> for AppErrorDetail {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<CheckError> for AppErrorDetail {
    fn from(value: CheckError) -> Self {
        Self::Check(value)
    }
}

impl From<DownloadError> for AppErrorDetail {
    fn from(value: DownloadError) -> Self {
        Self::Check(CheckError::Download(value))
    }
}

impl From<reqwest::Error> for AppErrorDetail {
    fn from(value: reqwest::Error) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<updraft_platform::AppPathsError> for AppErrorDetail {
    fn from(value: updraft_platform::AppPathsError) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<crate::single_instance::AcquireError> for AppErrorDetail {
    fn from(value: crate::single_instance::AcquireError) -> Self {
        Self::Message(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    StartupFailed {
        stage: &'static str,
        details: AppErrorDetail,
    },
    AlreadyRunning,
    SettingsUpdateFailed {
        setting: &'static str,
        details: AppErrorDetail,
    },
    UpdateCheckFailed {
        details: AppErrorDetail,
    },
    SchedulerCancelled,
}

impl AppError {
    pub fn startup_failed(stage: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::StartupFailed {
            stage,
            details: details.into(),
        }
    }

    pub fn settings_update_failed(
        setting: &'static str,
        details: impl Into<AppErrorDetail>,
    ) -> Self {
        Self::SettingsUpdateFailed {
            setting,
            details: details.into(),
        }
    }

    pub fn update_check_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::UpdateCheckFailed {
            details: details.into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartupFailed { stage, details } => {
                write!(f, "Failed to {stage}: {details}")
            }
            Self::AlreadyRunning => write!(f, "Another updraft scheduler is already running"),
            Self::SettingsUpdateFailed { setting, details } => {
                write!(f, "Failed to update {setting}: {details}")
            }
            Self::UpdateCheckFailed { details } => write!(f, "Update check failed: {details}"),
            Self::SchedulerCancelled => write!(f, "Update check cancelled"),
        }
    }
}

impl std::error::Error for AppError {}
