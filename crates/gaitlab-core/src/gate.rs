use crate::entity::{Animal, Trial};
use serde::Serialize;
use thiserror::Error;

pub const PARTICIPANT_ID: &str = "participantId";
pub const TRIAL_TYPE: &str = "trialType";
pub const CONDITIONS: &str = "conditions";
pub const MATERIALS: &str = "materials";

/// Required acknowledgements before a trial may start, in display order.
pub const TRIAL_START_FIELDS: [&str; 4] = [PARTICIPANT_ID, TRIAL_TYPE, CONDITIONS, MATERIALS];

const ENVIRONMENTAL_CONDITIONS: &str = "Quiet room, normal lighting";
const TRIAL_MATERIALS: &str = "Test apparatus, data sheets";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("`{0}` is not a required confirmation field")]
    UnknownField(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateField {
    pub key: String,
    pub touched: bool,
}

/// Checklist of fields the operator must individually acknowledge.
///
/// Values are never inspected; only the touch matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldConfirmationGate {
    fields: Vec<GateField>,
}

impl FieldConfirmationGate {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<GateField> = Vec::new();
        for key in required {
            let key = key.into();
            if fields.iter().all(|field| field.key != key) {
                fields.push(GateField {
                    key,
                    touched: false,
                });
            }
        }
        Self { fields }
    }

    pub fn trial_start() -> Self {
        Self::new(TRIAL_START_FIELDS)
    }

    pub fn touch(&mut self, key: &str) -> Result<(), GateError> {
        let field = self
            .fields
            .iter_mut()
            .find(|field| field.key == key)
            .ok_or_else(|| GateError::UnknownField(key.to_string()))?;
        field.touched = true;
        Ok(())
    }

    pub fn is_touched(&self, key: &str) -> bool {
        self.fields
            .iter()
            .any(|field| field.key == key && field.touched)
    }

    pub fn is_complete(&self) -> bool {
        self.fields.iter().all(|field| field.touched)
    }

    pub fn remaining_count(&self) -> usize {
        self.fields.iter().filter(|field| !field.touched).count()
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.touched = false;
        }
    }

    pub fn fields(&self) -> &[GateField] {
        &self.fields
    }

    /// Caption for the confirm action.
    pub fn confirm_label(&self) -> String {
        match self.remaining_count() {
            0 => "Start Trial".to_string(),
            n => format!("Touch {n} more fields"),
        }
    }
}

impl Default for FieldConfirmationGate {
    fn default() -> Self {
        Self::trial_start()
    }
}

/// One row of the confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
}

pub fn checklist(animal: &Animal, trial: &Trial) -> Vec<ChecklistItem> {
    vec![
        ChecklistItem {
            key: PARTICIPANT_ID,
            label: "Animal ID",
            value: animal.name.clone(),
        },
        ChecklistItem {
            key: TRIAL_TYPE,
            label: "Trial Type",
            value: trial.name.clone(),
        },
        ChecklistItem {
            key: CONDITIONS,
            label: "Environmental Conditions",
            value: ENVIRONMENTAL_CONDITIONS.into(),
        },
        ChecklistItem {
            key: MATERIALS,
            label: "Materials",
            value: TRIAL_MATERIALS.into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_only_after_every_field() {
        let mut gate = FieldConfirmationGate::trial_start();
        for (touched, key) in TRIAL_START_FIELDS.iter().enumerate() {
            assert!(!gate.is_complete(), "complete after {touched} touches");
            gate.touch(key).unwrap();
        }
        assert!(gate.is_complete());
        assert_eq!(gate.remaining_count(), 0);
    }

    #[test]
    fn proper_subsets_never_complete() {
        for mask in 0u8..15 {
            let mut gate = FieldConfirmationGate::trial_start();
            for (bit, key) in TRIAL_START_FIELDS.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    gate.touch(key).unwrap();
                }
            }
            assert!(!gate.is_complete(), "mask {mask:04b}");
        }
    }

    #[test]
    fn remaining_count_after_two_touches() {
        let mut gate = FieldConfirmationGate::trial_start();
        gate.touch(PARTICIPANT_ID).unwrap();
        gate.touch(MATERIALS).unwrap();
        gate.touch(MATERIALS).unwrap();
        assert_eq!(gate.remaining_count(), 2);
        assert_eq!(gate.confirm_label(), "Touch 2 more fields");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut gate = FieldConfirmationGate::trial_start();
        assert_eq!(
            gate.touch("consent"),
            Err(GateError::UnknownField("consent".into()))
        );
        assert_eq!(gate.remaining_count(), 4);
    }

    #[test]
    fn reset_clears_all_flags() {
        let mut gate = FieldConfirmationGate::trial_start();
        for key in TRIAL_START_FIELDS {
            gate.touch(key).unwrap();
        }
        gate.reset();
        assert!(gate.fields().iter().all(|field| !field.touched));
        assert_eq!(gate.remaining_count(), 4);
    }

    #[test]
    fn duplicate_keys_collapse() {
        let gate = FieldConfirmationGate::new(["a", "b", "a"]);
        assert_eq!(gate.fields().len(), 2);
    }
}
