use crate::config::{ConfigError, SettingsError};
use crate::telemetry::TelemetryError;
use crate::workflows::watch::{
    NotifyError, PipelineError, SourceError, StoreError, WatchServiceError,
};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Settings(SettingsError),
    Source(SourceError),
    Notify(NotifyError),
    Pipeline(PipelineError),
    Busy(WatchServiceError),
    Store(StoreError),
    Io(std::io::Error),
    Server(axum::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Settings(err) => write!(f, "settings error: {}", err),
            AppError::Source(err) => write!(f, "source error: {}", err),
            AppError::Notify(err) => write!(f, "notifier error: {}", err),
            AppError::Pipeline(err) => {
                write!(f, "run failed while {}: {}", err.failed_in().label(), err)
            }
            AppError::Busy(err) => write!(f, "service busy: {}", err),
            AppError::Store(err) => write!(f, "storage error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Settings(err) => Some(err),
            AppError::Source(err) => Some(err),
            AppError::Notify(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::Busy(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<SettingsError> for AppError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<SourceError> for AppError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<NotifyError> for AppError {
    fn from(value: NotifyError) -> Self {
        Self::Notify(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<WatchServiceError> for AppError {
    fn from(value: WatchServiceError) -> Self {
        match value {
            WatchServiceError::Pipeline(err) => Self::Pipeline(err),
            busy @ WatchServiceError::RunInProgress => Self::Busy(busy),
        }
    }
}
