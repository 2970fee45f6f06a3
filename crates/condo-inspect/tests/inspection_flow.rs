//! Guided inspection from wizard start to the archive.

use std::io::Cursor;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};

use condo_inspect::app::InspectionApp;
use condo_inspect::domain::{Area, InspectionStatus, MAX_PHOTOS_PER_AREA};
use condo_inspect::registry::CondominiumDraft;
use condo_inspect::store::MemoryStore;
use condo_inspect::wizard::{
    PhotoOutcome, PhotoUpload, SessionAdvance, WizardAdvance, WizardSessions,
};

fn png(width: u32, height: u32) -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(width, height, Rgb([10u8, 120, 60]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut out, ImageOutputFormat::Png)
        .expect("encode png");
    out.into_inner()
}

fn app_with_condo() -> (InspectionApp, condo_inspect::domain::Condominium) {
    let mut app = InspectionApp::load(Arc::new(MemoryStore::default()), "Mikael");
    let mut draft = CondominiumDraft::new("Edifício Central", "Rua 7");
    draft.areas = vec![
        Area::new("Portaria"),
        Area::new("Garagem"),
        Area::new("Piscina"),
    ];
    let condo = app.create_condominium(draft).expect("created");
    (app, condo)
}

#[test]
fn wizard_walks_areas_in_order_and_archives_frozen_snapshot() {
    let (mut app, condo) = app_with_condo();
    let mut wizard = app.start_inspection(&condo.id).expect("wizard starts");
    assert_eq!(wizard.step_count(), 3);
    assert!(wizard
        .areas()
        .iter()
        .all(|area| area.status == InspectionStatus::Conforme));
    assert_eq!(wizard.progress().primary_action, "Próximo Item");

    let mut visited = Vec::new();
    let inspection = loop {
        visited.push(wizard.current().area_name.clone());
        if wizard.current().area_name == "Garagem" {
            wizard.set_status(InspectionStatus::NaoConforme);
            wizard.set_notes("Infiltração no teto");
        }
        match wizard.next("Mikael", Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap()) {
            WizardAdvance::Continue(next) => wizard = next,
            WizardAdvance::Finished(inspection) => break inspection,
        }
    };
    assert_eq!(visited, ["Portaria", "Garagem", "Piscina"]);

    let id = app.record_inspection(inspection).expect("archived").id.clone();
    assert_eq!(app.archive().all()[0].id, id);

    let mut rename = app.edit_draft(&condo.id).expect("draft");
    rename.name = "Condomínio Renomeado".to_string();
    rename.areas[1].name = "Estacionamento".to_string();
    app.update_condominium(&condo.id, rename).expect("renamed");

    let archived = app.inspection(&id).expect("archived inspection");
    assert_eq!(archived.condominium_name, "Edifício Central");
    assert_eq!(archived.areas.len(), 3);
    assert_eq!(archived.areas[1].area_name, "Garagem");
    assert_eq!(archived.areas[1].notes, "Infiltração no teto");
    assert_eq!(archived.non_conforming_count(), 1);
    assert_eq!(archived.date_label(), "01/04/2025");
}

#[test]
fn photo_cap_and_removal_shift() {
    let (app, condo) = app_with_condo();
    let mut wizard = app.start_inspection(&condo.id).expect("wizard starts");
    for index in 0..MAX_PHOTOS_PER_AREA {
        wizard.add_photo(format!("photo-{index}")).expect("under cap");
    }
    assert!(!wizard.can_add_photo());
    assert!(wizard.add_photo("seventh".to_string()).is_err());
    assert_eq!(wizard.current().photos.len(), MAX_PHOTOS_PER_AREA);

    assert_eq!(wizard.remove_photo(1).as_deref(), Some("photo-1"));
    assert_eq!(wizard.current().photos.len(), MAX_PHOTOS_PER_AREA - 1);
    assert_eq!(wizard.current().photos[1], "photo-2");
    assert!(wizard.remove_photo(42).is_none());
}

#[tokio::test]
async fn session_uploads_respect_the_cap_under_concurrency() {
    let (mut app, condo) = app_with_condo();
    let sessions = WizardSessions::default();
    let session = sessions.open(app.start_inspection(&condo.id).expect("wizard starts"));

    let uploads = (0..MAX_PHOTOS_PER_AREA + 2)
        .map(|index| PhotoUpload::new(format!("p{index}.png"), png(4 + index as u32, 4)))
        .collect();
    let outcomes = sessions
        .attach_uploads(&session, uploads)
        .await
        .expect("session open");
    let attached = outcomes
        .iter()
        .filter(|outcome| **outcome == PhotoOutcome::Attached)
        .count();
    let refused = outcomes
        .iter()
        .filter(|outcome| **outcome == PhotoOutcome::LimitReached)
        .count();
    assert_eq!(attached, MAX_PHOTOS_PER_AREA);
    assert_eq!(refused, 2);

    let view = sessions.view(&session).expect("session open");
    assert_eq!(view.photo_count, MAX_PHOTOS_PER_AREA);
    assert!(!view.can_add_photo);
    assert!(view
        .area
        .photos
        .iter()
        .all(|photo| photo.starts_with("data:image/png;base64,")));

    let finished = loop {
        match sessions
            .advance(&session, app.inspector(), Utc::now())
            .expect("session open")
        {
            SessionAdvance::Step(_) => continue,
            SessionAdvance::Finished(inspection) => break inspection,
        }
    };
    assert!(sessions.is_empty());
    let archived = app.record_inspection(finished).expect("archived");
    assert_eq!(archived.areas[0].photos.len(), MAX_PHOTOS_PER_AREA);
}
