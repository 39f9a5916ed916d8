use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Welfare/surgical state of a research subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalStatus {
    Active,
    Rest,
    #[serde(rename = "Pre-OP")]
    PreOp,
    #[serde(rename = "Post-OP")]
    PostOp,
    Euthanized,
}

impl AnimalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AnimalStatus::Active => "Active",
            AnimalStatus::Rest => "Rest",
            AnimalStatus::PreOp => "Pre-OP",
            AnimalStatus::PostOp => "Post-OP",
            AnimalStatus::Euthanized => "Euthanized",
        }
    }

    /// Statuses offered by the add-animal form.
    pub fn selectable() -> [AnimalStatus; 2] {
        [AnimalStatus::Active, AnimalStatus::Rest]
    }
}

impl Default for AnimalStatus {
    fn default() -> Self {
        AnimalStatus::Active
    }
}

impl fmt::Display for AnimalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Analyzed,
}

impl TrialStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TrialStatus::Pending => "Pending",
            TrialStatus::InProgress => "In Progress",
            TrialStatus::Completed => "Completed",
            TrialStatus::Analyzed => "Analyzed",
        }
    }
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub id: u32,
    pub name: String,
    pub species: String,
    pub age: String,
    pub weight: String,
    pub status: AnimalStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub id: u32,
    pub name: String,
    pub date: String,
    pub duration: String,
    pub status: TrialStatus,
}

impl Trial {
    pub fn is_completed(&self) -> bool {
        self.status == TrialStatus::Completed
    }

    /// Parse the free-form duration column ("30 min", "90 s", "1 h").
    /// Placeholders such as " N/A " yield `None`.
    pub fn expected_duration(&self) -> Option<Duration> {
        let mut parts = self.duration.split_whitespace();
        let amount: f64 = parts.next()?.parse().ok()?;
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        let seconds = match parts.next().map(|unit| unit.to_ascii_lowercase()) {
            None => amount * 60.0,
            Some(unit) => match unit.as_str() {
                "s" | "sec" | "secs" | "second" | "seconds" => amount,
                "m" | "min" | "mins" | "minute" | "minutes" => amount * 60.0,
                "h" | "hr" | "hrs" | "hour" | "hours" => amount * 3600.0,
                _ => return None,
            },
        };
        Duration::try_from_secs_f64(seconds).ok()
    }
}

/// Unsaved contents of the add-animal form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalDraft {
    pub name: String,
    pub species: String,
    pub age: String,
    pub weight: String,
    #[serde(default)]
    pub status: AnimalStatus,
}

impl AnimalDraft {
    /// First required field left blank, in form order.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("species", &self.species),
            ("age", &self.age),
            ("weight", &self.weight),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }

    /// Drives the enabled state of the save action.
    pub fn is_valid(&self) -> bool {
        self.missing_field().is_none()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("required field `{0}` is empty")]
    MissingField(&'static str),
    #[error("trial {trial_id} references unknown animal {animal_id}")]
    OrphanTrial { animal_id: u32, trial_id: u32 },
    #[error("animal id {0} is already taken")]
    DuplicateId(u32),
    #[error("animal ids must run 1..={count}, found {id}")]
    IdOutOfSequence { id: u32, count: usize },
}

/// In-memory animals and their trials.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    animals: Vec<Animal>,
    trials: BTreeMap<u32, Vec<Trial>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(animals: Vec<Animal>, trials: BTreeMap<u32, Vec<Trial>>) -> Self {
        Self { animals, trials }
    }

    /// Validate `draft`, assign `id = count + 1` and append.
    ///
    /// Ids are only monotonic while a single writer owns the store.
    pub fn add_animal(&mut self, draft: AnimalDraft) -> Result<Animal, StoreError> {
        if let Some(field) = draft.missing_field() {
            return Err(StoreError::MissingField(field));
        }
        let id = self.animals.len() as u32 + 1;
        if self.animal(id).is_some() {
            return Err(StoreError::DuplicateId(id));
        }
        let animal = Animal {
            id,
            name: draft.name.trim().to_string(),
            species: draft.species.trim().to_string(),
            age: draft.age.trim().to_string(),
            weight: draft.weight.trim().to_string(),
            status: draft.status,
        };
        log::info!("registered animal {} ({})", animal.id, animal.name);
        self.animals.push(animal.clone());
        Ok(animal)
    }

    pub fn animals(&self) -> &[Animal] {
        &self.animals
    }

    pub fn animal(&self, id: u32) -> Option<&Animal> {
        self.animals.iter().find(|animal| animal.id == id)
    }

    pub fn trials_for(&self, animal_id: u32) -> &[Trial] {
        self.trials
            .get(&animal_id)
            .map(|trials| trials.as_slice())
            .unwrap_or(&[])
    }

    pub fn trial(&self, animal_id: u32, trial_id: u32) -> Option<&Trial> {
        self.trials_for(animal_id)
            .iter()
            .find(|trial| trial.id == trial_id)
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> AnimalDraft {
        AnimalDraft {
            name: name.into(),
            species: "Mus musculus".into(),
            age: "8 weeks".into(),
            weight: "25g".into(),
            status: AnimalStatus::Active,
        }
    }

    fn animal(id: u32, name: &str) -> Animal {
        let d = draft(name);
        Animal {
            id,
            name: d.name,
            species: d.species,
            age: d.age,
            weight: d.weight,
            status: d.status,
        }
    }

    #[test]
    fn add_animal_assigns_count_plus_one() {
        let mut store = EntityStore::sample();
        let animal = store.add_animal(draft("Mouse A1")).unwrap();
        assert_eq!(animal.id, 6);
        assert_eq!(store.len(), 6);
        assert_eq!(store.animal(6).map(|a| a.name.as_str()), Some("Mouse A1"));
    }

    #[test]
    fn add_animal_rejects_blank_fields() {
        let mut store = EntityStore::new();
        let mut incomplete = draft("Mouse A1");
        incomplete.weight = "   ".into();
        assert!(!incomplete.is_valid());
        assert_eq!(
            store.add_animal(incomplete),
            Err(StoreError::MissingField("weight"))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn add_animal_refuses_taken_id() {
        let mut store = EntityStore::with_records(
            vec![animal(1, "A"), animal(3, "C")],
            BTreeMap::new(),
        );
        assert_eq!(store.add_animal(draft("New")), Err(StoreError::DuplicateId(3)));
        assert_eq!(store.len(), 2);
        assert_eq!(store.animal(3).map(|a| a.name.as_str()), Some("C"));
    }

    #[test]
    fn trial_lookup_is_keyed_by_animal() {
        let store = EntityStore::sample();
        assert_eq!(store.trials_for(1).len(), 3);
        assert!(store.trial(1, 201).is_none());
        assert_eq!(
            store.trial(2, 202).map(|t| t.status),
            Some(TrialStatus::InProgress)
        );
        assert!(store.trials_for(42).is_empty());
    }

    #[test]
    fn parses_expected_durations() {
        let mut trial = Trial {
            id: 1,
            name: "Gait Trial".into(),
            date: "2025-07-05".into(),
            duration: "30 min".into(),
            status: TrialStatus::Pending,
        };
        assert_eq!(trial.expected_duration(), Some(Duration::from_secs(1800)));
        trial.duration = "90 seconds".into();
        assert_eq!(trial.expected_duration(), Some(Duration::from_secs(90)));
        trial.duration = " N/A ".into();
        assert_eq!(trial.expected_duration(), None);
        trial.duration = "1e20 h".into();
        assert_eq!(trial.expected_duration(), None);
    }

    #[test]
    fn status_labels_match_wire_names() {
        let json = serde_json::to_string(&AnimalStatus::PreOp).unwrap();
        assert_eq!(json, "\"Pre-OP\"");
        let status: TrialStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(status, TrialStatus::InProgress);
    }
}
