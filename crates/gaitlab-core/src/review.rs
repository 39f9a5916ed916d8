//! Results shown on the review step and written by "Export Results".
//!
//! Gait samples are canned until the recorder feeds real measurements; the
//! summary figures are derived from them.

use crate::entity::{Animal, Trial};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ReviewTab {
    #[default]
    Overview,
    Performance,
    Analysis,
    Notes,
}

impl ReviewTab {
    pub fn title(&self) -> &'static str {
        match self {
            ReviewTab::Overview => "Overview",
            ReviewTab::Performance => "Performance",
            ReviewTab::Analysis => "Analysis",
            ReviewTab::Notes => "Notes",
        }
    }

    pub fn all() -> [ReviewTab; 4] {
        [
            ReviewTab::Overview,
            ReviewTab::Performance,
            ReviewTab::Analysis,
            ReviewTab::Notes,
        ]
    }

    pub fn next(self) -> Self {
        match self {
            ReviewTab::Overview => ReviewTab::Performance,
            ReviewTab::Performance => ReviewTab::Analysis,
            ReviewTab::Analysis => ReviewTab::Notes,
            ReviewTab::Notes => ReviewTab::Overview,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ReviewTab::Overview => ReviewTab::Notes,
            ReviewTab::Performance => ReviewTab::Overview,
            ReviewTab::Analysis => ReviewTab::Performance,
            ReviewTab::Notes => ReviewTab::Analysis,
        }
    }

    pub fn index(self) -> usize {
        match self {
            ReviewTab::Overview => 0,
            ReviewTab::Performance => 1,
            ReviewTab::Analysis => 2,
            ReviewTab::Notes => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GaitSample {
    pub time_s: u32,
    pub stride_length_cm: f64,
    pub velocity_mps: f64,
    pub cadence_spm: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LimbMetric {
    pub limb: String,
    pub symmetry_pct: f64,
    pub ground_contact_s: f64,
    pub swing_phase: f64,
    pub step_length_cm: f64,
}

/// Mean ± standard deviation of one gait parameter.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSpread {
    pub label: String,
    pub mean: f64,
    pub sd: f64,
    pub unit: String,
}

impl MetricSpread {
    pub fn display(&self) -> String {
        format!("{}{} ± {}", self.mean, self.unit, self.sd)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GaitSummary {
    pub duration_s: u32,
    pub total_strides: u32,
    pub avg_velocity_mps: f64,
    pub avg_stride_length_cm: f64,
    pub avg_cadence_spm: f64,
    pub symmetry_index_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub animal: Animal,
    pub trial: Trial,
    pub summary: GaitSummary,
    pub samples: Vec<GaitSample>,
    pub limbs: Vec<LimbMetric>,
    pub temporal: Vec<MetricSpread>,
    pub spatial: Vec<MetricSpread>,
    pub insights: Vec<Note>,
    pub notes: Vec<Note>,
}

const GAIT_SAMPLES: [(u32, f64, f64, f64); 10] = [
    (0, 42.0, 1.2, 105.0),
    (10, 44.0, 1.3, 108.0),
    (20, 46.0, 1.4, 110.0),
    (30, 48.0, 1.5, 112.0),
    (40, 50.0, 1.6, 115.0),
    (50, 52.0, 1.7, 118.0),
    (60, 54.0, 1.8, 120.0),
    (70, 56.0, 1.9, 122.0),
    (80, 58.0, 2.0, 125.0),
    (90, 60.0, 2.1, 128.0),
];

const LIMBS: [(&str, f64, f64, f64, f64); 4] = [
    ("Front Left", 92.0, 0.65, 0.35, 58.0),
    ("Front Right", 88.0, 0.68, 0.32, 56.0),
    ("Rear Left", 85.0, 0.72, 0.28, 54.0),
    ("Rear Right", 90.0, 0.70, 0.30, 57.0),
];

const TEMPORAL: [(&str, f64, f64, &str); 4] = [
    ("Stride Duration", 1.24, 0.08, "s"),
    ("Stance Phase", 68.5, 3.2, "%"),
    ("Swing Phase", 31.5, 2.8, "%"),
    ("Double Support", 12.8, 1.5, "%"),
];

const SPATIAL: [(&str, f64, f64, &str); 4] = [
    ("Stride Width", 12.4, 1.8, "cm"),
    ("Step Length Ratio", 0.94, 0.06, ""),
    ("Foot Angle", 8.2, 2.1, "°"),
    ("Base of Support", 11.8, 2.3, "cm"),
];

const TOTAL_STRIDES: u32 = 128;

const NOTES: [(&str, &str); 4] = [
    (
        "Veterinary Observations",
        "Subject demonstrates significant improvement in gait symmetry post-surgery. \
         Notable reduction in compensatory movements. Weight-bearing capacity has increased \
         substantially on affected limb. No signs of pain or discomfort during assessment.",
    ),
    (
        "Biomechanical Assessment",
        "Ground reaction forces show normalized loading patterns. Stride length progression \
         indicates increasing confidence in locomotion. Joint angles within normal physiological \
         ranges. Coordination between limbs improving steadily.",
    ),
    (
        "Treatment Recommendations",
        "Continue current physical therapy protocol. Increase exercise duration gradually. \
         Schedule follow-up gait analysis in 2 weeks. Consider introducing more complex terrain \
         for advanced rehabilitation training.",
    ),
    (
        "Recovery Status",
        "Week 6 Post-Surgery: Excellent progress. Functional mobility restored to 85% of \
         baseline. Pain management effective. Prognosis: Full recovery expected within 2-3 \
         additional weeks.",
    ),
];

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn spreads(rows: &[(&str, f64, f64, &str)]) -> Vec<MetricSpread> {
    rows.iter()
        .map(|(label, mean, sd, unit)| MetricSpread {
            label: (*label).into(),
            mean: *mean,
            sd: *sd,
            unit: (*unit).into(),
        })
        .collect()
}

impl ReviewReport {
    pub fn for_trial(animal: &Animal, trial: &Trial) -> Self {
        let samples: Vec<GaitSample> = GAIT_SAMPLES
            .iter()
            .map(|(time_s, stride, velocity, cadence)| GaitSample {
                time_s: *time_s,
                stride_length_cm: *stride,
                velocity_mps: *velocity,
                cadence_spm: *cadence,
            })
            .collect();
        let limbs: Vec<LimbMetric> = LIMBS
            .iter()
            .map(|(limb, symmetry, contact, swing, step)| LimbMetric {
                limb: (*limb).into(),
                symmetry_pct: *symmetry,
                ground_contact_s: *contact,
                swing_phase: *swing,
                step_length_cm: *step,
            })
            .collect();
        let summary = GaitSummary {
            duration_s: samples.last().map(|s| s.time_s).unwrap_or(0),
            total_strides: TOTAL_STRIDES,
            avg_velocity_mps: mean(samples.iter().map(|s| s.velocity_mps)),
            avg_stride_length_cm: mean(samples.iter().map(|s| s.stride_length_cm)),
            avg_cadence_spm: mean(samples.iter().map(|s| s.cadence_spm)),
            symmetry_index_pct: mean(limbs.iter().map(|l| l.symmetry_pct)),
        };
        let insights = vec![
            Note {
                heading: "Excellent Progress".into(),
                body: "Significant improvement in stride consistency and velocity".into(),
            },
            Note {
                heading: "Gait Stability".into(),
                body: "Increased ground contact time indicating better balance".into(),
            },
            Note {
                heading: "Limb Coordination".into(),
                body: format!(
                    "{:.0}% symmetry index shows good bilateral function",
                    summary.symmetry_index_pct
                ),
            },
        ];
        Self {
            animal: animal.clone(),
            trial: trial.clone(),
            summary,
            samples,
            limbs,
            temporal: spreads(&TEMPORAL),
            spatial: spreads(&SPATIAL),
            insights,
            notes: NOTES
                .iter()
                .map(|(heading, body)| Note {
                    heading: (*heading).into(),
                    body: (*body).into(),
                })
                .collect(),
        }
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)
            .with_context(|| format!("creating report {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .with_context(|| format!("writing report {}", path.display()))?;
        log::info!(
            "exported review of trial {} for {} to {}",
            self.trial.id,
            self.animal.name,
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityStore;
    use tempfile::tempdir;

    fn report() -> ReviewReport {
        let store = EntityStore::sample();
        ReviewReport::for_trial(store.animal(1).unwrap(), store.trial(1, 101).unwrap())
    }

    #[test]
    fn summary_is_derived_from_samples() {
        let summary = report().summary;
        assert_eq!(summary.duration_s, 90);
        assert!((summary.avg_velocity_mps - 1.65).abs() < 1e-9);
        assert!((summary.avg_stride_length_cm - 51.0).abs() < 1e-9);
        assert!((summary.avg_cadence_spm - 116.3).abs() < 1e-9);
        assert!((summary.symmetry_index_pct - 88.75).abs() < 1e-9);
    }

    #[test]
    fn export_writes_identity_and_metrics() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("review.json");
        report().export(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["animal"]["name"], "Sheep 0001");
        assert_eq!(json["trial"]["id"], 101);
        assert_eq!(json["limbs"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn tabs_cycle() {
        let mut tab = ReviewTab::default();
        for expected in ReviewTab::all().iter().skip(1) {
            tab = tab.next();
            assert_eq!(tab, *expected);
        }
        assert_eq!(tab.next(), ReviewTab::Overview);
        assert_eq!(ReviewTab::Overview.prev(), ReviewTab::Notes);
    }
}
