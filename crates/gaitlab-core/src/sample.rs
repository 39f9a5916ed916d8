//! Built-in cohort used when no entity files are configured.

use crate::entity::{Animal, AnimalStatus, EntityStore, Trial, TrialStatus};
use std::collections::BTreeMap;

const SAMPLE_ANIMALS: [(&str, &str, &str, &str, AnimalStatus); 5] = [
    ("Sheep 0001", "Woolliam", "6 yo", "150 lb", AnimalStatus::PreOp),
    ("Sheep 0002", "Baa-bara", "7 yo", "155 lb", AnimalStatus::PostOp),
    ("Sheep 0003", "Lamblet", "5 yo", "180 lb", AnimalStatus::PreOp),
    ("Sheep 0004", "Shearlock", "6 yo", "160 lb", AnimalStatus::Rest),
    ("Sheep 0005", "Muttonchop", "5 yo", "195 lb", AnimalStatus::Euthanized),
];

// (animal id, trial id, date, duration, status)
const SAMPLE_TRIALS: [(u32, u32, &str, &str, TrialStatus); 11] = [
    (1, 101, "2025-07-05", "30 min", TrialStatus::Completed),
    (1, 102, "2025-07-07", "45 min", TrialStatus::Analyzed),
    (1, 103, "2025-07-08", " N/A ", TrialStatus::Pending),
    (2, 201, "2024-07-06", "35 min", TrialStatus::Completed),
    (2, 202, "2024-07-08", " N/A ", TrialStatus::InProgress),
    (3, 301, "2024-07-04", "40 min", TrialStatus::Completed),
    (3, 302, "2024-07-07", "50 min", TrialStatus::Completed),
    (3, 303, "2024-07-08", " N/A ", TrialStatus::Pending),
    (4, 401, "2024-07-03", "30 min", TrialStatus::Completed),
    (5, 501, "2024-07-05", "45 min", TrialStatus::Completed),
    (5, 502, "2024-07-08", " N/A ", TrialStatus::InProgress),
];

const SAMPLE_TRIAL_NAME: &str = "Gait Trial";

impl EntityStore {
    pub fn sample() -> Self {
        let animals = SAMPLE_ANIMALS
            .iter()
            .enumerate()
            .map(|(idx, (name, species, age, weight, status))| Animal {
                id: idx as u32 + 1,
                name: (*name).into(),
                species: (*species).into(),
                age: (*age).into(),
                weight: (*weight).into(),
                status: *status,
            })
            .collect();
        let mut trials: BTreeMap<u32, Vec<Trial>> = BTreeMap::new();
        for (animal_id, id, date, duration, status) in SAMPLE_TRIALS {
            trials.entry(animal_id).or_default().push(Trial {
                id,
                name: SAMPLE_TRIAL_NAME.into(),
                date: date.into(),
                duration: duration.into(),
                status,
            });
        }
        EntityStore::with_records(animals, trials)
    }
}
