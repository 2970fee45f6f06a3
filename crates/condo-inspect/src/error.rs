use crate::app::CommandError;
use crate::config::ConfigError;
use crate::report::{ExportError, ShareError};
use crate::telemetry::TelemetryError;
use crate::wizard::WizardError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Command(CommandError),
    Export(ExportError),
    Share(ShareError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Command(err) => write!(f, "{}", err),
            AppError::Export(err) => write!(f, "{}", err),
            AppError::Share(err) => write!(f, "share error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Command(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Share(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Command(CommandError::Registry(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Command(CommandError::NotFound { .. })
            | AppError::Command(CommandError::Wizard(WizardError::SessionNotFound)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Command(CommandError::Wizard(WizardError::PhotoLimitReached)) => {
                StatusCode::CONFLICT
            }
            AppError::Command(CommandError::Wizard(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Export(_) | AppError::Share(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Command(CommandError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Command(CommandError::NotFound { back, .. }) => {
                json!({ "error": self.to_string(), "back": back })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
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

impl From<CommandError> for AppError {
    fn from(value: CommandError) -> Self {
        Self::Command(value)
    }
}

impl From<WizardError> for AppError {
    fn from(value: WizardError) -> Self {
        Self::Command(CommandError::Wizard(value))
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<ShareError> for AppError {
    fn from(value: ShareError) -> Self {
        Self::Share(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn command_errors_map_to_client_statuses() {
        assert_eq!(
            status_of(AppError::from(CommandError::Registry(
                RegistryError::MissingFields {
                    missing: vec!["name"]
                }
            ))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::from(WizardError::PhotoLimitReached)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::from(WizardError::SessionNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::from(ShareError::Unsupported)),
            StatusCode::BAD_GATEWAY
        );
    }
}
