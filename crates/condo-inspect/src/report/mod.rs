//! Report export: HTML rendering, rasterization, PDF assembly and sharing.

mod html;
mod pdf;
mod raster;
mod share;

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::Inspection;

pub use html::render_report_html;
pub use pdf::{
    bitmap_to_pdf, PageGeometry, PdfDocument, PdfError, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
pub use raster::{CommandRasterizer, RasterError, Rasterizer};
pub use share::{
    share_report, CommandShareTarget, ShareError, ShareOutcome, SharePayload, ShareTarget,
    UnsupportedShareTarget, SHARE_GUIDANCE,
};

pub const RASTER_SCALE: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Erro ao gerar PDF: {0}")]
    Raster(#[from] RasterError),
    #[error("Erro ao gerar PDF: {0}")]
    Pdf(#[from] PdfError),
}

/// A finished export ready to download.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub file_name: String,
    pub mime: mime::Mime,
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// `Relatorio_<NAME>_<dd-mm-yyyy>.pdf` on the local date, name uppercased with
/// spaces as `_`.
pub fn report_file_name(inspection: &Inspection) -> String {
    let name = inspection.condominium_name.to_uppercase().replace(' ', "_");
    format!(
        "Relatorio_{name}_{}.pdf",
        inspection.local_date().format("%d-%m-%Y")
    )
}

#[derive(Debug, Clone)]
pub struct ReportExporter {
    rasterizer: Arc<dyn Rasterizer>,
}

impl ReportExporter {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Render, rasterize and paginate one inspection. Blocking; run it off
    /// the async executor.
    pub fn export(&self, inspection: &Inspection) -> Result<ExportedReport, ExportError> {
        let html = render_report_html(inspection);
        let bitmap = self
            .rasterizer
            .rasterize(&html, RASTER_SCALE)
            .inspect_err(|err| {
                warn!(inspection = %inspection.id, error = %err, "rasterization failed");
            })?;
        let document = bitmap_to_pdf(&bitmap)?;

        let report = ExportedReport {
            file_name: report_file_name(inspection),
            mime: mime::APPLICATION_PDF,
            pages: document.geometry.page_count,
            bytes: document.bytes,
        };
        info!(
            inspection = %inspection.id,
            file = %report.file_name,
            pages = report.pages,
            "report exported"
        );
        Ok(report)
    }
}
