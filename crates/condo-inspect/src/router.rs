//! HTTP navigation surface over the application state and wizard sessions.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::app::InspectionApp;
use crate::archive::InspectionSummary;
use crate::domain::{InspectionStatus, RecordId};
use crate::error::AppError;
use crate::registry::{CondominiumDraft, CondominiumSummary};
use crate::report::{share_report, ReportExporter, SharePayload, ShareTarget};
use crate::wizard::{PhotoUpload, SessionAdvance, SessionId, WizardError, WizardSessions, WizardView};

/// Photos travel base64-encoded inside JSON, six per area at most.
const PHOTO_BODY_LIMIT: usize = 48 * 1024 * 1024;

/// Shared handles behind every route.
#[derive(Debug, Clone)]
pub struct InspectionState {
    pub app: Arc<Mutex<InspectionApp>>,
    pub sessions: Arc<WizardSessions>,
    pub exporter: ReportExporter,
    pub share: Arc<dyn ShareTarget>,
    /// Base address used to build the shareable detail link.
    pub public_url: String,
}

impl InspectionState {
    pub fn new(
        app: InspectionApp,
        exporter: ReportExporter,
        share: Arc<dyn ShareTarget>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            app: Arc::new(Mutex::new(app)),
            sessions: Arc::new(WizardSessions::default()),
            exporter,
            share,
            public_url: public_url.into(),
        }
    }
}

pub fn inspection_router(state: InspectionState) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/condos", get(list_condos_handler).post(create_condo_handler))
        .route("/condos/new", get(new_condo_handler))
        .route(
            "/condos/edit/:id",
            get(edit_condo_handler).put(update_condo_handler),
        )
        .route("/condos/:id", delete(delete_condo_handler))
        .route("/inspection/:condo_id", post(start_inspection_handler))
        .route(
            "/wizard/:session",
            get(wizard_view_handler).delete(wizard_cancel_handler),
        )
        .route("/wizard/:session/next", post(wizard_next_handler))
        .route("/wizard/:session/prev", post(wizard_prev_handler))
        .route("/wizard/:session/status", put(wizard_status_handler))
        .route("/wizard/:session/notes", put(wizard_notes_handler))
        .route("/wizard/:session/photos", post(wizard_photos_handler))
        .route(
            "/wizard/:session/photos/:index",
            delete(wizard_remove_photo_handler),
        )
        .route("/history", get(history_handler))
        .route("/history/:id", get(history_detail_handler))
        .route("/history/:id/report.pdf", get(report_pdf_handler))
        .route("/history/:id/share", post(share_handler))
        .fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(PHOTO_BODY_LIMIT))
        .with_state(state)
}

async fn fallback_handler() -> Redirect {
    Redirect::to("/")
}

async fn dashboard_handler(State(state): State<InspectionState>) -> Response {
    let view = state.app.lock().await.dashboard();
    (StatusCode::OK, Json(view)).into_response()
}

async fn list_condos_handler(
    State(state): State<InspectionState>,
) -> Json<Vec<CondominiumSummary>> {
    Json(state.app.lock().await.condominium_summaries())
}

async fn new_condo_handler() -> Json<CondominiumDraft> {
    Json(CondominiumDraft::seeded())
}

async fn create_condo_handler(
    State(state): State<InspectionState>,
    Json(draft): Json<CondominiumDraft>,
) -> Result<Response, AppError> {
    let created = state.app.lock().await.create_condominium(draft)?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn edit_condo_handler(
    State(state): State<InspectionState>,
    Path(id): Path<RecordId>,
) -> Result<Json<CondominiumDraft>, AppError> {
    Ok(Json(state.app.lock().await.edit_draft(&id)?))
}

async fn update_condo_handler(
    State(state): State<InspectionState>,
    Path(id): Path<RecordId>,
    Json(draft): Json<CondominiumDraft>,
) -> Result<Response, AppError> {
    let updated = state.app.lock().await.update_condominium(&id, draft)?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

async fn delete_condo_handler(
    State(state): State<InspectionState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, AppError> {
    state.app.lock().await.delete_condominium(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_inspection_handler(
    State(state): State<InspectionState>,
    Path(condo_id): Path<RecordId>,
) -> Result<Response, AppError> {
    let wizard = state.app.lock().await.start_inspection(&condo_id)?;
    let view = wizard.view();
    let session = state.sessions.open(wizard);
    let payload = json!({
        "session": session,
        "location": format!("/wizard/{session}"),
        "view": view,
    });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

async fn wizard_view_handler(
    State(state): State<InspectionState>,
    Path(session): Path<SessionId>,
) -> Result<Json<WizardView>, AppError> {
    Ok(Json(state.sessions.view(&session)?))
}

async fn wizard_cancel_handler(
    State(state): State<InspectionState>,
    Path(session): Path<SessionId>,
) -> Result<StatusCode, AppError> {
    if state.sessions.discard(&session) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(WizardError::SessionNotFound.into())
    }
}

async fn wizard_next_handler(
    State(state): State<InspectionState>,
    Path(session): Path<SessionId>,
) -> Result<Response, AppError> {
    let inspector = state.app.lock().await.inspector().to_string();
    match state.sessions.advance(&session, &inspector, Utc::now())? {
        SessionAdvance::Step(view) => {
            let payload = json!({ "status": "in_progress", "view": view });
            Ok((StatusCode::OK, Json(payload)).into_response())
        }
        SessionAdvance::Finished(inspection) => {
            let mut app = state.app.lock().await;
            let archived = app.record_inspection(inspection)?;
            let payload = json!({
                "status": "finished",
                "inspection": archived.id,
                "redirect": format!("/history/{}", archived.id),
            });
            Ok((StatusCode::CREATED, Json(payload)).into_response())
        }
    }
}

async fn wizard_prev_handler(
    State(state): State<InspectionState>,
    Path(session): Path<SessionId>,
) -> Result<Json<WizardView>, AppError> {
    let view = state.sessions.with_wizard(&session, |wizard| {
        wizard.prev();
        wizard.view()
    })?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: InspectionStatus,
}

async fn wizard_status_handler(
    State(state): State<InspectionState>,
    Path(session): Path<SessionId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<WizardView>, AppError> {
    let view = state.sessions.with_wizard(&session, |wizard| {
        wizard.set_status(update.status);
        wizard.view()
    })?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct NotesUpdate {
    #[serde(default)]
    notes: String,
}

async fn wizard_notes_handler(
    State(state): State<InspectionState>,
    Path(session): Path<SessionId>,
    Json(update): Json<NotesUpdate>,
) -> Result<Json<WizardView>, AppError> {
    let view = state.sessions.with_wizard(&session, |wizard| {
        wizard.set_notes(update.notes);
        wizard.view()
    })?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct PhotoFile {
    #[serde(default)]
    name: Option<String>,
    /// Base64 file content, with or without a `data:` prefix.
    content: String,
}

#[derive(Debug, Deserialize)]
struct PhotoBatch {
    files: Vec<PhotoFile>,
}

impl PhotoFile {
    fn into_upload(self) -> PhotoUpload {
        let encoded = match self.content.split_once(";base64,") {
            Some((_, data)) => data,
            None => self.content.as_str(),
        };
        // Undecodable content becomes an empty upload and is skipped downstream.
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .unwrap_or_default();
        PhotoUpload {
            name: self.name,
            bytes,
        }
    }
}

async fn wizard_photos_handler(
    State(state): State<InspectionState>,
    Path(session): Path<SessionId>,
    Json(batch): Json<PhotoBatch>,
) -> Result<Response, AppError> {
    let uploads = batch.files.into_iter().map(PhotoFile::into_upload).collect();
    let outcomes = state.sessions.attach_uploads(&session, uploads).await?;
    let view = state.sessions.view(&session)?;
    let payload = json!({ "outcomes": outcomes, "view": view });
    Ok((StatusCode::OK, Json(payload)).into_response())
}

async fn wizard_remove_photo_handler(
    State(state): State<InspectionState>,
    Path((session, index)): Path<(SessionId, usize)>,
) -> Result<Response, AppError> {
    let (removed, view) = state.sessions.with_wizard(&session, |wizard| {
        let removed = wizard.remove_photo(index).is_some();
        (removed, wizard.view())
    })?;
    let payload = json!({ "removed": removed, "view": view });
    Ok((StatusCode::OK, Json(payload)).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    filter: Option<String>,
}

async fn history_handler(
    State(state): State<InspectionState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<InspectionSummary>> {
    let filter = query.filter.unwrap_or_default();
    Json(state.app.lock().await.inspection_summaries(&filter))
}

async fn history_detail_handler(
    State(state): State<InspectionState>,
    Path(id): Path<RecordId>,
) -> Result<Response, AppError> {
    let app = state.app.lock().await;
    let inspection = app.inspection(&id)?;
    let payload = json!({
        "id_label": format!("#{}", inspection.id.as_str().to_uppercase()),
        "date_label": inspection.date_label(),
        "non_conforming": inspection.non_conforming_count(),
        "inspection": inspection,
        "back": "/history",
        "report": format!("/history/{id}/report.pdf"),
        "share": format!("/history/{id}/share"),
    });
    Ok((StatusCode::OK, Json(payload)).into_response())
}

async fn report_pdf_handler(
    State(state): State<InspectionState>,
    Path(id): Path<RecordId>,
) -> Result<Response, AppError> {
    let inspection = state.app.lock().await.inspection(&id)?.clone();
    let exporter = state.exporter.clone();
    let report = tokio::task::spawn_blocking(move || exporter.export(&inspection))
        .await
        .map_err(|err| AppError::Io(std::io::Error::other(err)))??;

    let headers = [
        (header::CONTENT_TYPE, report.mime.to_string()),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&report.file_name),
        ),
    ];
    Ok((StatusCode::OK, headers, report.bytes).into_response())
}

async fn share_handler(
    State(state): State<InspectionState>,
    Path(id): Path<RecordId>,
) -> Result<Response, AppError> {
    let inspection = state.app.lock().await.inspection(&id)?.clone();
    let payload = SharePayload::for_inspection(
        &inspection,
        format!("{}/history/{id}", state.public_url.trim_end_matches('/')),
    );
    let download = format!("/history/{id}/report.pdf");
    let target = state.share.clone();
    let outcome =
        tokio::task::spawn_blocking(move || share_report(target.as_ref(), payload, download))
            .await
            .map_err(|err| AppError::Io(std::io::Error::other(err)))??;
    Ok((StatusCode::OK, Json(outcome)).into_response())
}

/// `attachment` disposition with an ASCII fallback and the UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect();
    let mut encoded = String::new();
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-_.~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_keeps_ascii_names_and_encodes_accents() {
        assert_eq!(
            content_disposition("Relatorio_SOLAR_01-02-2025.pdf"),
            "attachment; filename=\"Relatorio_SOLAR_01-02-2025.pdf\"; \
filename*=UTF-8''Relatorio_SOLAR_01-02-2025.pdf"
        );
        let header = content_disposition("Relatorio_EDIFÍCIO_X.pdf");
        assert!(header.contains("filename=\"Relatorio_EDIF_CIO_X.pdf\""));
        assert!(header.contains("filename*=UTF-8''Relatorio_EDIF%C3%8DCIO_X.pdf"));
    }

    #[test]
    fn photo_content_accepts_data_url_prefix() {
        let file = PhotoFile {
            name: Some("a.png".to_string()),
            content: "data:image/png;base64,aGVsbG8=".to_string(),
        };
        assert_eq!(file.into_upload().bytes, b"hello");

        let broken = PhotoFile {
            name: None,
            content: "%%%".to_string(),
        };
        assert!(broken.into_upload().bytes.is_empty());
    }
}
