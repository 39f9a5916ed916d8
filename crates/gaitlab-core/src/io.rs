//! CSV entity source read once at startup.

use crate::entity::{Animal, EntityStore, StoreError, Trial, TrialStatus};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TrialRow {
    animal_id: u32,
    id: u32,
    name: String,
    date: String,
    #[serde(default)]
    duration: String,
    status: TrialStatus,
}

pub fn read_animals(path: &Path) -> Result<Vec<Animal>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening animals {}", path.display()))?;
    let mut animals = Vec::new();
    for (idx, row) in reader.deserialize::<Animal>().enumerate() {
        let animal = row.with_context(|| format!("parsing animal row {}", idx + 1))?;
        animals.push(animal);
    }
    Ok(animals)
}

pub fn read_trials(path: &Path) -> Result<BTreeMap<u32, Vec<Trial>>> {
    // Durations such as " N/A " keep their padding.
    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .from_path(path)
        .with_context(|| format!("opening trials {}", path.display()))?;
    let mut trials: BTreeMap<u32, Vec<Trial>> = BTreeMap::new();
    for (idx, row) in reader.deserialize::<TrialRow>().enumerate() {
        let row = row.with_context(|| format!("parsing trial row {}", idx + 1))?;
        trials.entry(row.animal_id).or_default().push(Trial {
            id: row.id,
            name: row.name.trim().to_string(),
            date: row.date.trim().to_string(),
            duration: row.duration,
            status: row.status,
        });
    }
    Ok(trials)
}

/// New ids are `count + 1`, so loaded ids must be exactly `1..=count`.
fn check_ids(animals: &[Animal]) -> Result<(), StoreError> {
    let count = animals.len();
    let mut seen = vec![false; count];
    for animal in animals {
        let slot = (animal.id as usize)
            .checked_sub(1)
            .filter(|slot| *slot < count)
            .ok_or(StoreError::IdOutOfSequence {
                id: animal.id,
                count,
            })?;
        if std::mem::replace(&mut seen[slot], true) {
            return Err(StoreError::DuplicateId(animal.id));
        }
    }
    Ok(())
}

impl EntityStore {
    pub fn from_csv(animals_path: &Path, trials_path: &Path) -> Result<Self> {
        let animals = read_animals(animals_path)?;
        let trials = read_trials(trials_path)?;
        check_ids(&animals).with_context(|| format!("validating {}", animals_path.display()))?;
        for (animal_id, rows) in &trials {
            if !animals.iter().any(|animal| animal.id == *animal_id) {
                let trial_id = rows.first().map(|trial| trial.id).unwrap_or_default();
                return Err(StoreError::OrphanTrial {
                    animal_id: *animal_id,
                    trial_id,
                })
                .with_context(|| format!("validating {}", trials_path.display()));
            }
        }
        log::info!(
            "loaded {} animals and {} trials",
            animals.len(),
            trials.values().map(Vec::len).sum::<usize>()
        );
        Ok(EntityStore::with_records(animals, trials))
    }
}
