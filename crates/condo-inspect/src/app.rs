//! Application state: both collections plus the store they persist to.
//!
//! Every successful command persists the collection it touched before
//! returning. Failed validation leaves memory and disk untouched, and a
//! failed save rolls the in-memory change back.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::archive::{InspectionArchive, InspectionSummary};
use crate::domain::{Condominium, Inspection, RecordId};
use crate::registry::{CondominiumDraft, CondominiumRegistry, CondominiumSummary, RegistryError};
use crate::store::{
    load_collection, save_collection, KeyValueStore, StoreError, CONDOMINIUMS_KEY, INSPECTIONS_KEY,
};
use crate::wizard::{InspectionWizard, WizardError};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{what} '{id}' not found")]
    NotFound {
        what: &'static str,
        id: String,
        back: &'static str,
    },
}

impl CommandError {
    fn condominium_missing(id: &RecordId) -> Self {
        Self::NotFound {
            what: "condominium",
            id: id.to_string(),
            back: "/condos",
        }
    }

    fn inspection_missing(id: &RecordId) -> Self {
        Self::NotFound {
            what: "inspection",
            id: id.to_string(),
            back: "/history",
        }
    }
}

/// Landing view: greeting, collection counts and where to go next.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub greeting: String,
    pub inspector: String,
    pub condominium_count: usize,
    pub inspection_count: usize,
    pub non_conforming_last: Option<usize>,
    pub links: DashboardLinks,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardLinks {
    pub condominiums: &'static str,
    pub new_condominium: &'static str,
    pub history: &'static str,
}

#[derive(Debug)]
pub struct InspectionApp {
    store: Arc<dyn KeyValueStore>,
    registry: CondominiumRegistry,
    archive: InspectionArchive,
    inspector: String,
}

impl InspectionApp {
    /// Hydrate both collections from `store`. Missing or unreadable
    /// collections start empty.
    pub fn load(store: Arc<dyn KeyValueStore>, inspector: impl Into<String>) -> Self {
        let condominiums: Vec<Condominium> = load_collection(store.as_ref(), CONDOMINIUMS_KEY);
        let inspections: Vec<Inspection> = load_collection(store.as_ref(), INSPECTIONS_KEY);
        info!(
            condominiums = condominiums.len(),
            inspections = inspections.len(),
            "application state loaded"
        );
        Self {
            store,
            registry: CondominiumRegistry::new(condominiums),
            archive: InspectionArchive::new(inspections),
            inspector: inspector.into(),
        }
    }

    pub fn registry(&self) -> &CondominiumRegistry {
        &self.registry
    }

    pub fn archive(&self) -> &InspectionArchive {
        &self.archive
    }

    pub fn inspector(&self) -> &str {
        &self.inspector
    }

    pub fn dashboard(&self) -> DashboardView {
        DashboardView {
            greeting: format!("Olá, {}", self.inspector),
            inspector: self.inspector.clone(),
            condominium_count: self.registry.len(),
            inspection_count: self.archive.len(),
            non_conforming_last: self
                .archive
                .all()
                .first()
                .map(Inspection::non_conforming_count),
            links: DashboardLinks {
                condominiums: "/condos",
                new_condominium: "/condos/new",
                history: "/history",
            },
        }
    }

    pub fn condominium_summaries(&self) -> Vec<CondominiumSummary> {
        self.registry.summaries()
    }

    pub fn condominium(&self, id: &RecordId) -> Result<&Condominium, CommandError> {
        self.registry
            .get(id)
            .ok_or_else(|| CommandError::condominium_missing(id))
    }

    /// Prefilled form for editing an existing record.
    pub fn edit_draft(&self, id: &RecordId) -> Result<CondominiumDraft, CommandError> {
        self.condominium(id).map(CondominiumDraft::from_condominium)
    }

    pub fn create_condominium(
        &mut self,
        draft: CondominiumDraft,
    ) -> Result<Condominium, CommandError> {
        let previous = self.registry.clone();
        let created = self.registry.create(draft)?.clone();
        self.commit_condominiums(previous)?;
        Ok(created)
    }

    pub fn update_condominium(
        &mut self,
        id: &RecordId,
        draft: CondominiumDraft,
    ) -> Result<Condominium, CommandError> {
        let previous = self.registry.clone();
        if !self.registry.update(id, draft)? {
            return Err(CommandError::condominium_missing(id));
        }
        self.commit_condominiums(previous)?;
        self.condominium(id).cloned()
    }

    pub fn delete_condominium(&mut self, id: &RecordId) -> Result<Condominium, CommandError> {
        let previous = self.registry.clone();
        let removed = self
            .registry
            .delete(id)
            .ok_or_else(|| CommandError::condominium_missing(id))?;
        self.commit_condominiums(previous)?;
        Ok(removed)
    }

    pub fn start_inspection(&self, condo_id: &RecordId) -> Result<InspectionWizard, CommandError> {
        let condo = self.condominium(condo_id)?;
        Ok(InspectionWizard::start(condo)?)
    }

    /// Archive a finished inspection as the most recent entry.
    pub fn record_inspection(&mut self, inspection: Inspection) -> Result<&Inspection, CommandError> {
        info!(
            id = %inspection.id,
            condominium = %inspection.condominium_name,
            areas = inspection.areas.len(),
            non_conforming = inspection.non_conforming_count(),
            "inspection archived"
        );
        self.archive.prepend(inspection);
        if let Err(err) = save_collection(self.store.as_ref(), INSPECTIONS_KEY, self.archive.all())
        {
            warn!(error = %err, "inspection archive not saved; entry withdrawn");
            self.archive.withdraw_first();
            return Err(err.into());
        }
        Ok(&self.archive.all()[0])
    }

    pub fn inspection_summaries(&self, filter: &str) -> Vec<InspectionSummary> {
        self.archive.summaries(filter)
    }

    pub fn inspection(&self, id: &RecordId) -> Result<&Inspection, CommandError> {
        self.archive
            .get(id)
            .ok_or_else(|| CommandError::inspection_missing(id))
    }

    /// Save the registry, or restore `previous` when the write fails.
    fn commit_condominiums(&mut self, previous: CondominiumRegistry) -> Result<(), StoreError> {
        match save_collection(self.store.as_ref(), CONDOMINIUMS_KEY, self.registry.all()) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(error = %err, "condominiums not saved; change rolled back");
                self.registry = previous;
                Err(err)
            }
        }
    }
}
