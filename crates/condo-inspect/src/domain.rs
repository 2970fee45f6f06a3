use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Upper bound on photos attached to a single area during one inspection.
pub const MAX_PHOTOS_PER_AREA: usize = 6;

/// Opaque random identity shared by areas, condominiums and inspections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InspectionStatus {
    #[default]
    #[serde(rename = "Conforme")]
    Conforme,
    #[serde(rename = "Não Conforme")]
    NaoConforme,
}

impl InspectionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Conforme => "Conforme",
            Self::NaoConforme => "Não Conforme",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "conforme" | "c" | "ok" => Some(Self::Conforme),
            "não conforme" | "nao conforme" | "nao_conforme" | "n" | "nc" => {
                Some(Self::NaoConforme)
            }
            _ => None,
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named location within a condominium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: RecordId,
    pub name: String,
}

impl Area {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::random(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condominium {
    pub id: RecordId,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tower: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

/// Outcome recorded for one area. Names are copied at wizard start so later
/// edits to the condominium never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaInspection {
    pub area_id: RecordId,
    pub area_name: String,
    pub status: InspectionStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl AreaInspection {
    pub fn from_area(area: &Area) -> Self {
        Self {
            area_id: area.id.clone(),
            area_name: area.name.clone(),
            status: InspectionStatus::Conforme,
            notes: String::new(),
            photos: Vec::new(),
        }
    }

    pub fn is_non_conforming(&self) -> bool {
        self.status == InspectionStatus::NaoConforme
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: RecordId,
    pub condominium_id: RecordId,
    pub condominium_name: String,
    pub date: DateTime<Utc>,
    pub inspector: String,
    pub areas: Vec<AreaInspection>,
}

impl Inspection {
    pub fn non_conforming_count(&self) -> usize {
        self.areas
            .iter()
            .filter(|area| area.is_non_conforming())
            .count()
    }

    /// Calendar day of the inspection as seen in `zone`.
    pub fn date_in<Tz: TimeZone>(&self, zone: &Tz) -> NaiveDate {
        self.date.with_timezone(zone).date_naive()
    }

    /// Calendar day in the host's local time zone.
    pub fn local_date(&self) -> NaiveDate {
        self.date_in(&Local)
    }

    /// Local calendar date in the `dd/mm/yyyy` form used across reports and lists.
    pub fn date_label(&self) -> String {
        self.local_date().format("%d/%m/%Y").to_string()
    }
}
