use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Area, Condominium, RecordId};

/// Common building zones offered when a condominium is registered without areas.
pub const DEFAULT_AREAS: [&str; 14] = [
    "Portaria",
    "Hall de entrada",
    "Elevadores",
    "Escadas",
    "Garagem",
    "Área gourmet",
    "Salão de festas",
    "Piscina",
    "Casa de máquinas",
    "Casa de bombas",
    "Área externa",
    "Lixeiras",
    "Corredores",
    "Banheiros comuns",
];

pub fn default_areas() -> Vec<Area> {
    DEFAULT_AREAS.iter().map(|name| Area::new(*name)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{} required", missing_fields_label(.missing))]
    MissingFields { missing: Vec<&'static str> },
}

fn missing_fields_label(missing: &[&'static str]) -> String {
    match missing {
        [single] => format!("{single} is"),
        many => format!("{} are", many.join(" and ")),
    }
}

/// Editable form state for creating or updating a condominium.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CondominiumDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tower: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

impl CondominiumDraft {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            ..Self::default()
        }
    }

    /// Blank form for a new registration, pre-filled with the default catalog.
    pub fn seeded() -> Self {
        Self {
            areas: default_areas(),
            ..Self::default()
        }
    }

    pub fn from_condominium(condo: &Condominium) -> Self {
        Self {
            name: condo.name.clone(),
            address: condo.address.clone(),
            tower: condo.tower.clone(),
            notes: condo.notes.clone(),
            areas: condo.areas.clone(),
        }
    }

    /// Append a free-text area. Blank names are ignored.
    pub fn add_area(&mut self, name: &str) -> Option<&Area> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.areas.push(Area::new(trimmed));
        self.areas.last()
    }

    pub fn remove_area(&mut self, id: &RecordId) -> bool {
        let before = self.areas.len();
        self.areas.retain(|area| &area.id != id);
        self.areas.len() != before
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.address.trim().is_empty() {
            missing.push("address");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::MissingFields { missing })
        }
    }

    fn into_condominium(self, id: RecordId) -> Condominium {
        Condominium {
            id,
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            tower: non_blank(self.tower),
            notes: non_blank(self.notes),
            areas: self.areas,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Row shown in the condominium list.
#[derive(Debug, Clone, Serialize)]
pub struct CondominiumSummary {
    pub id: RecordId,
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tower: Option<String>,
    pub area_count: usize,
}

/// Ordered condominium collection. Order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct CondominiumRegistry {
    condominiums: Vec<Condominium>,
}

impl CondominiumRegistry {
    pub fn new(condominiums: Vec<Condominium>) -> Self {
        Self { condominiums }
    }

    pub fn all(&self) -> &[Condominium] {
        &self.condominiums
    }

    pub fn len(&self) -> usize {
        self.condominiums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.condominiums.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Condominium> {
        self.condominiums.iter().find(|condo| &condo.id == id)
    }

    /// Register a new condominium. A draft without areas receives the default
    /// catalog, each entry with its own identity.
    pub fn create(&mut self, mut draft: CondominiumDraft) -> Result<&Condominium, RegistryError> {
        draft.validate()?;
        if draft.areas.is_empty() {
            draft.areas = default_areas();
        }

        let condo = draft.into_condominium(RecordId::random());
        info!(id = %condo.id, areas = condo.areas.len(), "condominium registered");
        self.condominiums.push(condo);
        Ok(&self.condominiums[self.condominiums.len() - 1])
    }

    /// Replace the record with the given identity. Returns `false` when the
    /// identity is unknown, leaving the collection untouched.
    pub fn update(&mut self, id: &RecordId, draft: CondominiumDraft) -> Result<bool, RegistryError> {
        draft.validate()?;
        match self.condominiums.iter_mut().find(|condo| &condo.id == id) {
            Some(slot) => {
                *slot = draft.into_condominium(id.clone());
                info!(%id, "condominium updated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove by identity. Past inspections keep their own snapshot of the name.
    pub fn delete(&mut self, id: &RecordId) -> Option<Condominium> {
        let index = self.condominiums.iter().position(|condo| &condo.id == id)?;
        let removed = self.condominiums.remove(index);
        info!(%id, "condominium removed");
        Some(removed)
    }

    pub fn summaries(&self) -> Vec<CondominiumSummary> {
        self.condominiums
            .iter()
            .map(|condo| CondominiumSummary {
                id: condo.id.clone(),
                name: condo.name.clone(),
                address: condo.address.clone(),
                tower: condo.tower.clone(),
                area_count: condo.areas.len(),
            })
            .collect()
    }
}
