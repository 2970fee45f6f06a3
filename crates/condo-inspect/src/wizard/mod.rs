//! Linear inspection wizard.
//!
//! One step per area, visited strictly in order. Only the area at the current
//! step is editable; advancing past the last step finalizes the inspection.

mod photos;
mod session;

pub use photos::{decode_photo, encode_data_url, PhotoUpload};
pub use session::{PhotoOutcome, PhotoTicket, SessionAdvance, SessionId, WizardSessions};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::{
    AreaInspection, Condominium, Inspection, InspectionStatus, RecordId, MAX_PHOTOS_PER_AREA,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("condominium '{0}' has no areas to inspect")]
    NoAreas(String),
    #[error("photo limit of {} reached for this area", MAX_PHOTOS_PER_AREA)]
    PhotoLimitReached,
    #[error("inspection session not found")]
    SessionNotFound,
    #[error("step {0} is outside this inspection")]
    StepOutOfRange(usize),
}

#[derive(Debug, Clone)]
pub struct InspectionWizard {
    condominium_id: RecordId,
    condominium_name: String,
    areas: Vec<AreaInspection>,
    current_step: usize,
}

/// Result of advancing the wizard.
#[derive(Debug)]
pub enum WizardAdvance {
    Continue(InspectionWizard),
    Finished(Inspection),
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardProgress {
    pub step: usize,
    pub total: usize,
    pub percent: f32,
    pub can_go_back: bool,
    pub primary_action: &'static str,
}

/// Snapshot of the wizard as shown to the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub condominium_id: RecordId,
    pub condominium_name: String,
    pub progress: WizardProgress,
    pub area: AreaInspection,
    pub photo_count: usize,
    pub can_add_photo: bool,
}

impl InspectionWizard {
    /// Snapshot the condominium's areas, all starting as `Conforme`.
    pub fn start(condo: &Condominium) -> Result<Self, WizardError> {
        if condo.areas.is_empty() {
            return Err(WizardError::NoAreas(condo.name.clone()));
        }

        Ok(Self {
            condominium_id: condo.id.clone(),
            condominium_name: condo.name.clone(),
            areas: condo.areas.iter().map(AreaInspection::from_area).collect(),
            current_step: 0,
        })
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_count(&self) -> usize {
        self.areas.len()
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 == self.areas.len()
    }

    pub fn current(&self) -> &AreaInspection {
        &self.areas[self.current_step]
    }

    fn current_mut(&mut self) -> &mut AreaInspection {
        &mut self.areas[self.current_step]
    }

    pub fn areas(&self) -> &[AreaInspection] {
        &self.areas
    }

    pub fn condominium_name(&self) -> &str {
        &self.condominium_name
    }

    pub fn progress(&self) -> WizardProgress {
        let total = self.areas.len();
        let step = self.current_step + 1;
        WizardProgress {
            step,
            total,
            percent: step as f32 / total as f32 * 100.0,
            can_go_back: self.current_step > 0,
            primary_action: if self.is_last_step() {
                "Finalizar Vistoria"
            } else {
                "Próximo Item"
            },
        }
    }

    pub fn view(&self) -> WizardView {
        WizardView {
            condominium_id: self.condominium_id.clone(),
            condominium_name: self.condominium_name.clone(),
            progress: self.progress(),
            area: self.current().clone(),
            photo_count: self.current().photos.len(),
            can_add_photo: self.can_add_photo(),
        }
    }

    /// Move forward, or finalize the inspection when already on the last step.
    pub fn next(mut self, inspector: &str, now: DateTime<Utc>) -> WizardAdvance {
        if !self.is_last_step() {
            self.current_step += 1;
            return WizardAdvance::Continue(self);
        }

        let inspection = Inspection {
            id: RecordId::random(),
            condominium_id: self.condominium_id,
            condominium_name: self.condominium_name,
            date: now,
            inspector: inspector.to_string(),
            areas: self.areas,
        };
        info!(
            id = %inspection.id,
            condominium = %inspection.condominium_name,
            non_conforming = inspection.non_conforming_count(),
            "inspection finalized"
        );
        WizardAdvance::Finished(inspection)
    }

    /// Step back. Returns `false` at the first step.
    pub fn prev(&mut self) -> bool {
        if self.current_step == 0 {
            return false;
        }
        self.current_step -= 1;
        true
    }

    pub fn set_status(&mut self, status: InspectionStatus) {
        self.current_mut().status = status;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.current_mut().notes = notes.into();
    }

    pub fn can_add_photo(&self) -> bool {
        self.current().photos.len() < MAX_PHOTOS_PER_AREA
    }

    /// Append a photo to the current area, refusing beyond the cap.
    pub fn add_photo(&mut self, data_url: String) -> Result<(), WizardError> {
        let step = self.current_step;
        self.attach_photo(step, data_url)
    }

    /// Append a photo to a specific step. Used by decodes that finish after the
    /// inspector already moved on; the cap is checked at append time.
    pub fn attach_photo(&mut self, step: usize, data_url: String) -> Result<(), WizardError> {
        let Some(area) = self.areas.get_mut(step) else {
            return Err(WizardError::StepOutOfRange(step));
        };
        if area.photos.len() >= MAX_PHOTOS_PER_AREA {
            return Err(WizardError::PhotoLimitReached);
        }
        area.photos.push(data_url);
        Ok(())
    }

    /// Remove a photo from the current area; out-of-range indexes are ignored.
    pub fn remove_photo(&mut self, index: usize) -> Option<String> {
        let photos = &mut self.current_mut().photos;
        if index < photos.len() {
            Some(photos.remove(index))
        } else {
            None
        }
    }
}
