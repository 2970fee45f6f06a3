//! Condominium registration and persistence through the public facade.

use std::sync::Arc;

use condo_inspect::app::{CommandError, InspectionApp};
use condo_inspect::domain::{Condominium, RecordId};
use condo_inspect::registry::{CondominiumDraft, DEFAULT_AREAS};
use condo_inspect::store::{
    load_collection, FileStore, KeyValueStore, CONDOMINIUMS_KEY, INSPECTIONS_KEY,
};

fn file_app(dir: &tempfile::TempDir) -> InspectionApp {
    InspectionApp::load(Arc::new(FileStore::new(dir.path())), "Mikael")
}

#[test]
fn empty_area_list_receives_default_catalog_and_survives_deletions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = file_app(&dir);

    let draft = CondominiumDraft {
        name: "Edifício X".to_string(),
        address: "Rua 1".to_string(),
        ..CondominiumDraft::default()
    };
    let created = app.create_condominium(draft).expect("created");
    assert_eq!(created.areas.len(), DEFAULT_AREAS.len());

    let mut ids: Vec<_> = created.areas.iter().map(|area| area.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 14);

    let survivor = created.areas[13].clone();
    let mut edit = app.edit_draft(&created.id).expect("draft for edit");
    for area in &created.areas[..13] {
        assert!(edit.remove_area(&area.id));
    }
    let updated = app
        .update_condominium(&created.id, edit)
        .expect("update keeps remaining area");
    assert_eq!(updated.areas, vec![survivor.clone()]);

    let reloaded = file_app(&dir);
    let stored = reloaded.condominium(&created.id).expect("persisted");
    assert_eq!(stored.areas.len(), 1);
    assert_eq!(stored.areas[0].id, survivor.id);
    assert_eq!(stored.areas[0].name, survivor.name);
}

#[test]
fn rejected_creation_leaves_disk_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = file_app(&dir);

    let err = app
        .create_condominium(CondominiumDraft::new("Solar", "   "))
        .expect_err("address required");
    assert!(matches!(err, CommandError::Registry(_)));
    assert!(app.registry().is_empty());
    assert!(!FileStore::new(dir.path()).path_for(CONDOMINIUMS_KEY).exists());
}

#[test]
fn collections_round_trip_deep_equal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = file_app(&dir);
    let mut draft = CondominiumDraft::new("Residencial Aurora", "Av. Brasil, 100");
    draft.tower = Some("Bloco C".to_string());
    draft.notes = Some("Síndico: Ana".to_string());
    draft.add_area("Terraço");
    app.create_condominium(draft).expect("created");
    app.create_condominium(CondominiumDraft::new("Solar", "Rua 2"))
        .expect("created");

    let store = FileStore::new(dir.path());
    let loaded: Vec<Condominium> = load_collection(&store, CONDOMINIUMS_KEY);
    assert_eq!(loaded, app.registry().all());
    assert_eq!(loaded[0].tower.as_deref(), Some("Bloco C"));
    assert_eq!(loaded[0].areas.len(), 1);
}

#[test]
fn corrupt_collection_starts_empty_and_is_preserved() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::new(dir.path());
    store
        .save(INSPECTIONS_KEY, "{not json")
        .expect("seed corrupt blob");

    let app = file_app(&dir);
    assert!(app.archive().is_empty());

    let preserved = std::fs::read_dir(dir.path())
        .expect("list data dir")
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with("ms_supervision_inspections.unreadable-")
        })
        .count();
    assert_eq!(preserved, 1);
}

#[test]
fn deleting_unknown_condominium_reports_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = file_app(&dir);
    assert!(matches!(
        app.delete_condominium(&RecordId::from("missing")),
        Err(CommandError::NotFound { .. })
    ));
}
