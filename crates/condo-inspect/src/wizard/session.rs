use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::photos::{decode_photo, PhotoUpload};
use super::{InspectionWizard, WizardAdvance, WizardError, WizardView};
use crate::domain::{Inspection, RecordId};

pub type SessionId = RecordId;

/// Captures where a photo was requested so a late decode lands on the same
/// area, or is dropped when the wizard is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoTicket {
    pub session: SessionId,
    pub step: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoOutcome {
    Attached,
    LimitReached,
    Unreadable,
    Stale,
}

#[derive(Debug)]
pub enum SessionAdvance {
    Step(WizardView),
    Finished(Inspection),
}

/// Wizards in progress, keyed by session. Every mutation happens under one lock.
#[derive(Debug, Default)]
pub struct WizardSessions {
    sessions: Mutex<HashMap<SessionId, InspectionWizard>>,
}

impl WizardSessions {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, InspectionWizard>> {
        self.sessions.lock().expect("wizard sessions mutex poisoned")
    }

    pub fn open(&self, wizard: InspectionWizard) -> SessionId {
        let id = SessionId::random();
        debug!(session = %id, steps = wizard.step_count(), "wizard session opened");
        self.lock().insert(id.clone(), wizard);
        id
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn view(&self, id: &SessionId) -> Result<WizardView, WizardError> {
        self.with_wizard(id, |wizard| wizard.view())
    }

    /// Run `edit` against the session's wizard.
    pub fn with_wizard<T>(
        &self,
        id: &SessionId,
        edit: impl FnOnce(&mut InspectionWizard) -> T,
    ) -> Result<T, WizardError> {
        let mut guard = self.lock();
        let wizard = guard.get_mut(id).ok_or(WizardError::SessionNotFound)?;
        Ok(edit(wizard))
    }

    /// Drop a session without producing an inspection.
    pub fn discard(&self, id: &SessionId) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            debug!(session = %id, "wizard session discarded");
        }
        removed
    }

    /// Advance the session. A finished wizard leaves the registry.
    pub fn advance(
        &self,
        id: &SessionId,
        inspector: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionAdvance, WizardError> {
        let mut guard = self.lock();
        let wizard = guard.remove(id).ok_or(WizardError::SessionNotFound)?;
        match wizard.next(inspector, now) {
            WizardAdvance::Continue(wizard) => {
                let view = wizard.view();
                guard.insert(id.clone(), wizard);
                Ok(SessionAdvance::Step(view))
            }
            WizardAdvance::Finished(inspection) => Ok(SessionAdvance::Finished(inspection)),
        }
    }

    /// Reserve a photo slot on the current step. Refused once the area is full.
    pub fn ticket(&self, id: &SessionId) -> Result<PhotoTicket, WizardError> {
        let guard = self.lock();
        let wizard = guard.get(id).ok_or(WizardError::SessionNotFound)?;
        if !wizard.can_add_photo() {
            return Err(WizardError::PhotoLimitReached);
        }
        Ok(PhotoTicket {
            session: id.clone(),
            step: wizard.current_step(),
        })
    }

    /// Apply a finished decode. The cap is re-checked here, under the lock.
    pub fn apply_photo(&self, ticket: &PhotoTicket, decoded: Option<String>) -> PhotoOutcome {
        let Some(data_url) = decoded else {
            return PhotoOutcome::Unreadable;
        };

        let mut guard = self.lock();
        let Some(wizard) = guard.get_mut(&ticket.session) else {
            debug!(session = %ticket.session, "photo decoded after session closed; ignored");
            return PhotoOutcome::Stale;
        };

        match wizard.attach_photo(ticket.step, data_url) {
            Ok(()) => PhotoOutcome::Attached,
            Err(WizardError::PhotoLimitReached) => PhotoOutcome::LimitReached,
            Err(err) => {
                warn!(session = %ticket.session, error = %err, "photo could not be attached");
                PhotoOutcome::Stale
            }
        }
    }

    /// Decode every upload independently and attach each as it completes.
    /// Completion order is not selection order.
    pub async fn attach_uploads(
        &self,
        id: &SessionId,
        uploads: Vec<PhotoUpload>,
    ) -> Result<Vec<PhotoOutcome>, WizardError> {
        let ticket = self.ticket(id)?;

        let mut decodes = JoinSet::new();
        for upload in uploads {
            decodes.spawn(decode_photo(upload));
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = decodes.join_next().await {
            let decoded = joined.unwrap_or_else(|err| {
                warn!(error = %err, "photo decode task failed");
                None
            });
            outcomes.push(self.apply_photo(&ticket, decoded));
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Area, Condominium, MAX_PHOTOS_PER_AREA};
    use crate::wizard::photos::tests::png_bytes;

    fn wizard() -> InspectionWizard {
        let condo = Condominium {
            id: RecordId::from("condo-1"),
            name: "Solar".to_string(),
            address: "Rua 2".to_string(),
            tower: None,
            notes: None,
            areas: vec![Area::new("Portaria"), Area::new("Garagem")],
        };
        InspectionWizard::start(&condo).expect("wizard starts")
    }

    #[test]
    fn late_decode_after_discard_is_ignored() {
        let sessions = WizardSessions::default();
        let id = sessions.open(wizard());
        let ticket = sessions.ticket(&id).expect("slot available");
        assert!(sessions.discard(&id));

        let outcome =
            sessions.apply_photo(&ticket, Some("data:image/png;base64,AA".to_string()));
        assert_eq!(outcome, PhotoOutcome::Stale);
    }

    #[test]
    fn ticket_from_a_finished_run_misses_the_next_run() {
        let sessions = WizardSessions::default();
        let first = sessions.open(wizard());
        let ticket = sessions.ticket(&first).expect("slot available");
        sessions.advance(&first, "Mikael", Utc::now()).expect("step");
        sessions.advance(&first, "Mikael", Utc::now()).expect("finished");

        let second = sessions.open(wizard());
        assert_ne!(first, second);
        let outcome =
            sessions.apply_photo(&ticket, Some("data:image/png;base64,AA".to_string()));
        assert_eq!(outcome, PhotoOutcome::Stale);
        let view = sessions.view(&second).expect("second run open");
        assert_eq!(view.photo_count, 0);
    }

    #[test]
    fn late_decode_lands_on_the_requesting_step() {
        let sessions = WizardSessions::default();
        let id = sessions.open(wizard());
        let ticket = sessions.ticket(&id).expect("slot available");
        sessions.advance(&id, "Mikael", Utc::now()).expect("advances");

        let outcome = sessions.apply_photo(&ticket, Some("photo".to_string()));
        assert_eq!(outcome, PhotoOutcome::Attached);
        sessions
            .with_wizard(&id, |wizard| {
                assert_eq!(wizard.areas()[0].photos.len(), 1);
                assert!(wizard.areas()[1].photos.is_empty());
            })
            .expect("session open");
    }

    #[test]
    fn concurrent_decodes_never_exceed_the_cap() {
        let sessions = WizardSessions::default();
        let id = sessions.open(wizard());
        for index in 0..MAX_PHOTOS_PER_AREA - 1 {
            sessions
                .with_wizard(&id, |wizard| wizard.add_photo(format!("p{index}")))
                .expect("session open")
                .expect("under cap");
        }

        let first = sessions.ticket(&id).expect("one slot left");
        let second = sessions.ticket(&id).expect("one slot left");
        assert_eq!(
            sessions.apply_photo(&first, Some("a".to_string())),
            PhotoOutcome::Attached
        );
        assert_eq!(
            sessions.apply_photo(&second, Some("b".to_string())),
            PhotoOutcome::LimitReached
        );
        let count = sessions
            .with_wizard(&id, |wizard| wizard.current().photos.len())
            .expect("session open");
        assert_eq!(count, MAX_PHOTOS_PER_AREA);
        assert!(matches!(
            sessions.ticket(&id),
            Err(WizardError::PhotoLimitReached)
        ));
    }

    #[test]
    fn finishing_closes_the_session() {
        let sessions = WizardSessions::default();
        let id = sessions.open(wizard());
        assert!(matches!(
            sessions.advance(&id, "Mikael", Utc::now()),
            Ok(SessionAdvance::Step(_))
        ));
        let finished = sessions
            .advance(&id, "Mikael", Utc::now())
            .expect("finishes");
        match finished {
            SessionAdvance::Finished(inspection) => assert_eq!(inspection.areas.len(), 2),
            SessionAdvance::Step(_) => panic!("expected the inspection to finish"),
        }
        assert!(sessions.is_empty());
        assert!(matches!(
            sessions.view(&id),
            Err(WizardError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn uploads_attach_readable_images_only() {
        let sessions = WizardSessions::default();
        let id = sessions.open(wizard());
        let uploads = vec![
            PhotoUpload::new("a.png", png_bytes(3, 3)),
            PhotoUpload::new("broken.jpg", b"not an image".to_vec()),
            PhotoUpload::new("b.png", png_bytes(5, 2)),
        ];

        let outcomes = sessions
            .attach_uploads(&id, uploads)
            .await
            .expect("session open");
        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes
                .iter()
                .filter(|outcome| **outcome == PhotoOutcome::Attached)
                .count(),
            2
        );
        assert_eq!(
            outcomes
                .iter()
                .filter(|outcome| **outcome == PhotoOutcome::Unreadable)
                .count(),
            1
        );
        let view = sessions.view(&id).expect("session open");
        assert_eq!(view.photo_count, 2);
    }
}
