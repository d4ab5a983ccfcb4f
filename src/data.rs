use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context};

use crate::models::Institution;

const BUNDLED_DATASET: &str = include_str!("../data/institutions.json");

/// Immutable, ordered set of institution records for one session.
#[derive(Debug, Clone)]
pub struct InstitutionStore {
    records: Vec<Institution>,
}

impl InstitutionStore {
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_json(BUNDLED_DATASET).context("bundled dataset is invalid")
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("dataset {} is invalid", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let records: Vec<Institution> =
            serde_json::from_str(raw).context("failed to parse institution records")?;
        Self::from_records(records)
    }

    pub fn from_records(records: Vec<Institution>) -> anyhow::Result<Self> {
        validate(&records)?;
        tracing::debug!(count = records.len(), "institution store loaded");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Institution] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Institution> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

fn validate(records: &[Institution]) -> anyhow::Result<()> {
    let mut seen = HashSet::new();

    for record in records {
        if !seen.insert(record.id.as_str()) {
            bail!("duplicate institution id {:?}", record.id);
        }

        if let Some(coordinates) = &record.coordinates {
            if !coordinates.is_valid() {
                bail!(
                    "institution {:?} has invalid coordinates ({}, {})",
                    record.id,
                    coordinates.lat,
                    coordinates.lng
                );
            }
        }

        let split =
            u64::from(record.undergraduate_enrollment) + u64::from(record.graduate_enrollment);
        if split > u64::from(record.total_enrollment) {
            bail!(
                "institution {:?} reports {} undergraduate + graduate students but {} total",
                record.id,
                split,
                record.total_enrollment
            );
        }

        if let Some(budget) = record.wac_budget {
            if !budget.is_finite() || budget < 0.0 {
                bail!("institution {:?} has invalid WAC budget {}", record.id, budget);
            }
        }
    }

    Ok(())
}
