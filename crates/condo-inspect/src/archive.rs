use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Inspection, RecordId};

/// Row shown in the history list.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionSummary {
    pub id: RecordId,
    pub condominium_name: String,
    pub date: DateTime<Utc>,
    pub date_label: String,
    pub area_count: usize,
    pub non_conforming: usize,
}

impl InspectionSummary {
    fn from_inspection(inspection: &Inspection) -> Self {
        Self {
            id: inspection.id.clone(),
            condominium_name: inspection.condominium_name.clone(),
            date: inspection.date,
            date_label: inspection.date_label(),
            area_count: inspection.areas.len(),
            non_conforming: inspection.non_conforming_count(),
        }
    }
}

/// Completed inspections, most recent first.
#[derive(Debug, Clone, Default)]
pub struct InspectionArchive {
    inspections: Vec<Inspection>,
}

impl InspectionArchive {
    pub fn new(inspections: Vec<Inspection>) -> Self {
        Self { inspections }
    }

    pub fn all(&self) -> &[Inspection] {
        &self.inspections
    }

    pub fn len(&self) -> usize {
        self.inspections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inspections.is_empty()
    }

    pub(crate) fn prepend(&mut self, inspection: Inspection) {
        self.inspections.insert(0, inspection);
    }

    pub(crate) fn withdraw_first(&mut self) -> Option<Inspection> {
        (!self.inspections.is_empty()).then(|| self.inspections.remove(0))
    }

    /// Case-insensitive substring match on the condominium name, stored order kept.
    pub fn list(&self, filter: &str) -> Vec<&Inspection> {
        let needle = filter.trim().to_lowercase();
        self.inspections
            .iter()
            .filter(|inspection| {
                needle.is_empty() || inspection.condominium_name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn summaries(&self, filter: &str) -> Vec<InspectionSummary> {
        self.list(filter)
            .into_iter()
            .map(InspectionSummary::from_inspection)
            .collect()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Inspection> {
        self.inspections.iter().find(|inspection| &inspection.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Area, AreaInspection, InspectionStatus};
    use chrono::{Duration, TimeZone};

    fn inspection(name: &str, days_ago: i64, failing: usize) -> Inspection {
        let areas = (0..3)
            .map(|index| {
                let mut area = AreaInspection::from_area(&Area::new(format!("Área {index}")));
                if index < failing {
                    area.status = InspectionStatus::NaoConforme;
                }
                area
            })
            .collect();
        Inspection {
            id: RecordId::random(),
            condominium_id: RecordId::random(),
            condominium_name: name.to_string(),
            date: Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap() - Duration::days(days_ago),
            inspector: "Mikael".to_string(),
            areas,
        }
    }

    fn archive() -> InspectionArchive {
        let mut archive = InspectionArchive::default();
        archive.prepend(inspection("Residencial Solar", 10, 0));
        archive.prepend(inspection("Edifício Central Park", 5, 2));
        archive.prepend(inspection("Solar das Flores", 1, 1));
        archive
    }

    #[test]
    fn prepend_keeps_most_recent_first() {
        let archive = archive();
        let names: Vec<_> = archive
            .all()
            .iter()
            .map(|inspection| inspection.condominium_name.as_str())
            .collect();
        assert_eq!(
            names,
            ["Solar das Flores", "Edifício Central Park", "Residencial Solar"]
        );
    }

    #[test]
    fn filter_is_case_insensitive_and_order_preserving() {
        let archive = archive();
        let matches: Vec<_> = archive
            .list("SOLAR")
            .into_iter()
            .map(|inspection| inspection.condominium_name.as_str())
            .collect();
        assert_eq!(matches, ["Solar das Flores", "Residencial Solar"]);
        assert_eq!(archive.list("").len(), 3);
    }

    #[test]
    fn unmatched_filter_is_empty_not_an_error() {
        assert!(archive().list("Torre Inexistente").is_empty());
    }

    #[test]
    fn summaries_carry_severity_count() {
        let summaries = archive().summaries("central");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].non_conforming, 2);
        assert_eq!(summaries[0].area_count, 3);
        assert_eq!(summaries[0].date_label, "25/06/2025");
    }

    #[test]
    fn get_misses_without_failing() {
        let archive = archive();
        let first = archive.all()[0].id.clone();
        assert!(archive.get(&first).is_some());
        assert!(archive.get(&RecordId::from("nope")).is_none());
    }
}
