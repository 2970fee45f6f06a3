use std::fmt::Debug;
use std::process::Command;

use serde::Serialize;
use tracing::info;

use crate::domain::Inspection;

pub const SHARE_GUIDANCE: &str =
    "Compartilhamento não suportado neste dispositivo. Baixe o PDF pelo botão de download.";

/// What the platform share action receives. No file is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_inspection(inspection: &Inspection, url: impl Into<String>) -> Self {
        Self {
            title: format!("Relatório MS SUPERVISION - {}", inspection.condominium_name),
            text: format!("Vistoria realizada em {}", inspection.date_label()),
            url: url.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("sharing is not supported on this platform")]
    Unsupported,
    #[error("share command '{program}' failed: {detail}")]
    Failed { program: String, detail: String },
}

/// Result surfaced to the user after a share attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShareOutcome {
    Shared { payload: SharePayload },
    Guidance { message: String, download: String },
}

pub trait ShareTarget: Debug + Send + Sync {
    fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

/// Default when no share integration is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedShareTarget;

impl ShareTarget for UnsupportedShareTarget {
    fn share(&self, _payload: &SharePayload) -> Result<(), ShareError> {
        Err(ShareError::Unsupported)
    }
}

/// Hands the payload to an external command as `<title> <text> <url>`.
#[derive(Debug, Clone)]
pub struct CommandShareTarget {
    program: String,
}

impl CommandShareTarget {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ShareTarget for CommandShareTarget {
    fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
        let output = Command::new(&self.program)
            .arg(&payload.title)
            .arg(&payload.text)
            .arg(&payload.url)
            .output()
            .map_err(|err| ShareError::Failed {
                program: self.program.clone(),
                detail: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(ShareError::Failed {
                program: self.program.clone(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        info!(program = %self.program, title = %payload.title, "report shared");
        Ok(())
    }
}

/// Share through `target`; an unsupported platform yields guidance
/// pointing at `download` instead of an error.
pub fn share_report(
    target: &dyn ShareTarget,
    payload: SharePayload,
    download: impl Into<String>,
) -> Result<ShareOutcome, ShareError> {
    match target.share(&payload) {
        Ok(()) => Ok(ShareOutcome::Shared { payload }),
        Err(ShareError::Unsupported) => Ok(ShareOutcome::Guidance {
            message: SHARE_GUIDANCE.to_string(),
            download: download.into(),
        }),
        Err(err) => Err(err),
    }
}
