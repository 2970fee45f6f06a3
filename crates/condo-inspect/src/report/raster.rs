use std::fmt::Debug;
use std::fs;
use std::process::Command;

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("rasterizer '{program}' could not be started: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("rasterizer '{program}' failed: {detail}")]
    Failed { program: String, detail: String },
    #[error("rasterizer workspace unavailable: {0}")]
    Workspace(#[from] std::io::Error),
}

/// Turns a printable HTML document into a bitmap (PNG or JPEG bytes).
pub trait Rasterizer: Debug + Send + Sync {
    fn rasterize(&self, html: &str, scale: f32) -> Result<Vec<u8>, RasterError>;
}

/// Rasterizes through an external HTML-to-image tool with the
/// `wkhtmltoimage` command-line contract.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    program: String,
}

impl CommandRasterizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Rasterizer for CommandRasterizer {
    fn rasterize(&self, html: &str, scale: f32) -> Result<Vec<u8>, RasterError> {
        let workspace = tempfile::tempdir()?;
        let source = workspace.path().join("report.html");
        let target = workspace.path().join("report.png");
        fs::write(&source, html)?;

        let output = Command::new(&self.program)
            .arg("--quiet")
            .args(["--format", "png"])
            .args(["--zoom", &format!("{scale}")])
            .arg(&source)
            .arg(&target)
            .output()
            .map_err(|source| RasterError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RasterError::Failed {
                program: self.program.clone(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let bitmap = fs::read(&target)?;
        debug!(program = %self.program, bytes = bitmap.len(), "report rasterized");
        Ok(bitmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_launch_error() {
        let rasterizer = CommandRasterizer::new("condo-inspect-no-such-rasterizer");
        let err = rasterizer
            .rasterize("<html></html>", 2.0)
            .expect_err("program does not exist");
        assert!(matches!(err, RasterError::Launch { .. }));
        assert!(err.to_string().contains("could not be started"));
    }
}
