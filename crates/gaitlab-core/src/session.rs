use crate::entity::TrialStatus;
use crate::gate::{FieldConfirmationGate, GateError};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Step of the trial-control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrialStep {
    Ready,
    Confirmation,
    Running,
    Review,
}

impl TrialStep {
    pub fn title(&self) -> &'static str {
        match self {
            TrialStep::Ready => "Ready",
            TrialStep::Confirmation => "Confirm details",
            TrialStep::Running => "Running",
            TrialStep::Review => "Review",
        }
    }
}

/// Recorder state, independent of the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Stopped,
    Running,
    Paused,
    Completed,
}

impl RunStatus {
    fn toggled(self) -> Self {
        match self {
            RunStatus::Running => RunStatus::Paused,
            RunStatus::Stopped | RunStatus::Paused | RunStatus::Completed => RunStatus::Running,
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            RunStatus::Running => "Recording Data",
            RunStatus::Paused => "Trial Paused",
            RunStatus::Stopped => "Trial Stopped",
            RunStatus::Completed => "Trial Completed",
        }
    }

    /// Label of the toggle button for this state.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            RunStatus::Running => "Pause",
            RunStatus::Paused => "Resume",
            RunStatus::Stopped | RunStatus::Completed => "Start",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StartTrial,
    ReviewTrial,
    TouchField(String),
    ConfirmStart,
    Back,
    ToggleStatus,
    StopTrial,
    CompleteReview,
    Tick(Duration),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StartTrial => "start",
            SessionEvent::ReviewTrial => "review",
            SessionEvent::TouchField(_) => "touch",
            SessionEvent::ConfirmStart => "confirm",
            SessionEvent::Back => "back",
            SessionEvent::ToggleStatus => "toggle",
            SessionEvent::StopTrial => "stop",
            SessionEvent::CompleteReview => "complete",
            SessionEvent::Tick(_) => "tick",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The event has no edge out of the current step.
    NotAvailable(TrialStep),
    TrialAlreadyCompleted,
    TrialNotCompleted,
    GateIncomplete { remaining: usize },
    UnknownField(String),
    NotRecording,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored(IgnoreReason),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

/// One trial-control visit. Cycles Ready → … → Ready and never terminates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSession {
    step: TrialStep,
    run_status: RunStatus,
    gate: FieldConfirmationGate,
    elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub step: TrialStep,
    pub run_status: RunStatus,
    pub touched: BTreeMap<String, bool>,
    pub elapsed_secs: f64,
}

impl Default for TrialSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TrialSession {
    pub fn new() -> Self {
        Self::with_gate(FieldConfirmationGate::trial_start())
    }

    pub fn with_gate(gate: FieldConfirmationGate) -> Self {
        Self {
            step: TrialStep::Ready,
            run_status: RunStatus::Stopped,
            gate,
            elapsed: Duration::ZERO,
        }
    }

    pub fn step(&self) -> TrialStep {
        self.step
    }

    pub fn run_status(&self) -> RunStatus {
        self.run_status
    }

    pub fn gate(&self) -> &FieldConfirmationGate {
        &self.gate
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// True while a run is live (recording or paused); leaving would abandon it.
    pub fn is_live(&self) -> bool {
        self.step == TrialStep::Running
    }

    /// Fraction of the expected duration already recorded, clamped to 1.
    pub fn progress(&self, expected: Option<Duration>) -> Option<f64> {
        let expected = expected.filter(|d| !d.is_zero())?;
        Some((self.elapsed.as_secs_f64() / expected.as_secs_f64()).min(1.0))
    }

    /// Pure transition: the session after `event`, plus whether it applied.
    pub fn next(&self, event: &SessionEvent, trial: TrialStatus) -> (TrialSession, Transition) {
        let mut next = self.clone();
        let transition = next.apply(event, trial);
        (next, transition)
    }

    /// Apply `event` in place. Guard violations leave the session untouched.
    pub fn apply(&mut self, event: &SessionEvent, trial: TrialStatus) -> Transition {
        let transition = self.transition(event, trial);
        match &transition {
            Transition::Applied => debug!(
                "session {} -> {:?}/{:?}",
                event.name(),
                self.step,
                self.run_status
            ),
            Transition::Ignored(reason) => {
                debug!("session ignored {} in {:?}: {:?}", event.name(), self.step, reason)
            }
        }
        transition
    }

    fn transition(&mut self, event: &SessionEvent, trial: TrialStatus) -> Transition {
        let completed = trial == TrialStatus::Completed;
        match (self.step, event) {
            (TrialStep::Ready, SessionEvent::StartTrial) => {
                if completed {
                    return Transition::Ignored(IgnoreReason::TrialAlreadyCompleted);
                }
                self.step = TrialStep::Confirmation;
            }
            (TrialStep::Ready, SessionEvent::ReviewTrial) => {
                if !completed {
                    return Transition::Ignored(IgnoreReason::TrialNotCompleted);
                }
                self.step = TrialStep::Review;
            }
            (TrialStep::Confirmation, SessionEvent::TouchField(key)) => {
                if let Err(GateError::UnknownField(key)) = self.gate.touch(key) {
                    return Transition::Ignored(IgnoreReason::UnknownField(key));
                }
            }
            (TrialStep::Confirmation, SessionEvent::ConfirmStart) => {
                if !self.gate.is_complete() {
                    return Transition::Ignored(IgnoreReason::GateIncomplete {
                        remaining: self.gate.remaining_count(),
                    });
                }
                self.step = TrialStep::Running;
                self.run_status = RunStatus::Running;
            }
            (TrialStep::Confirmation, SessionEvent::Back) => {
                self.step = TrialStep::Ready;
                self.gate.reset();
            }
            (TrialStep::Running, SessionEvent::ToggleStatus) => {
                self.run_status = self.run_status.toggled();
            }
            (TrialStep::Running, SessionEvent::StopTrial) => {
                self.step = TrialStep::Review;
                self.run_status = RunStatus::Completed;
            }
            (TrialStep::Running, SessionEvent::Tick(dt)) => {
                if self.run_status != RunStatus::Running {
                    return Transition::Ignored(IgnoreReason::NotRecording);
                }
                self.elapsed = self.elapsed.saturating_add(*dt);
            }
            (TrialStep::Review, SessionEvent::CompleteReview) => {
                self.step = TrialStep::Ready;
                self.run_status = RunStatus::Stopped;
                self.gate.reset();
                self.elapsed = Duration::ZERO;
            }
            (step, _) => return Transition::Ignored(IgnoreReason::NotAvailable(step)),
        }
        Transition::Applied
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            step: self.step,
            run_status: self.run_status,
            touched: self
                .gate
                .fields()
                .iter()
                .map(|field| (field.key.clone(), field.touched))
                .collect(),
            elapsed_secs: self.elapsed.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::TRIAL_START_FIELDS;

    fn touch_all(session: &mut TrialSession) {
        for key in TRIAL_START_FIELDS {
            assert!(session
                .apply(&SessionEvent::TouchField(key.into()), TrialStatus::Pending)
                .is_applied());
        }
    }

    fn running_session() -> TrialSession {
        let mut session = TrialSession::new();
        session.apply(&SessionEvent::StartTrial, TrialStatus::Pending);
        touch_all(&mut session);
        session.apply(&SessionEvent::ConfirmStart, TrialStatus::Pending);
        assert_eq!(session.step(), TrialStep::Running);
        session
    }

    #[test]
    fn confirm_start_requires_complete_gate() {
        let mut session = TrialSession::new();
        assert!(session
            .apply(&SessionEvent::StartTrial, TrialStatus::Pending)
            .is_applied());
        assert_eq!(session.step(), TrialStep::Confirmation);

        session.apply(
            &SessionEvent::TouchField(TRIAL_START_FIELDS[0].into()),
            TrialStatus::Pending,
        );
        let rejected = session.apply(&SessionEvent::ConfirmStart, TrialStatus::Pending);
        assert_eq!(
            rejected,
            Transition::Ignored(IgnoreReason::GateIncomplete { remaining: 3 })
        );
        assert_eq!(session.step(), TrialStep::Confirmation);
        assert_eq!(session.run_status(), RunStatus::Stopped);

        touch_all(&mut session);
        assert!(session
            .apply(&SessionEvent::ConfirmStart, TrialStatus::Pending)
            .is_applied());
        assert_eq!(session.step(), TrialStep::Running);
        assert_eq!(session.run_status(), RunStatus::Running);
    }

    #[test]
    fn toggle_cycles_without_changing_step() {
        let mut session = running_session();
        session.apply(&SessionEvent::ToggleStatus, TrialStatus::Pending);
        assert_eq!(session.run_status(), RunStatus::Paused);
        assert_eq!(session.step(), TrialStep::Running);
        session.apply(&SessionEvent::ToggleStatus, TrialStatus::Pending);
        assert_eq!(session.run_status(), RunStatus::Running);
        assert_eq!(session.step(), TrialStep::Running);
    }

    #[test]
    fn stop_always_completes_into_review() {
        for pause_first in [false, true] {
            let mut session = running_session();
            if pause_first {
                session.apply(&SessionEvent::ToggleStatus, TrialStatus::Pending);
                assert_eq!(session.run_status(), RunStatus::Paused);
            }
            session.apply(&SessionEvent::StopTrial, TrialStatus::Pending);
            assert_eq!(session.step(), TrialStep::Review);
            assert_eq!(session.run_status(), RunStatus::Completed);
        }
    }

    #[test]
    fn complete_review_resets_session() {
        let mut session = running_session();
        session.apply(&SessionEvent::Tick(Duration::from_secs(5)), TrialStatus::Pending);
        session.apply(&SessionEvent::StopTrial, TrialStatus::Pending);
        session.apply(&SessionEvent::CompleteReview, TrialStatus::Pending);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.step, TrialStep::Ready);
        assert_eq!(snapshot.run_status, RunStatus::Stopped);
        assert!(snapshot.touched.values().all(|touched| !touched));
        assert_eq!(snapshot.touched.len(), 4);
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn completed_trials_go_straight_to_review() {
        let mut session = TrialSession::new();
        assert_eq!(
            session.apply(&SessionEvent::StartTrial, TrialStatus::Completed),
            Transition::Ignored(IgnoreReason::TrialAlreadyCompleted)
        );
        assert!(session
            .apply(&SessionEvent::ReviewTrial, TrialStatus::Completed)
            .is_applied());
        assert_eq!(session.step(), TrialStep::Review);
        assert_eq!(session.run_status(), RunStatus::Stopped);
    }

    #[test]
    fn review_requires_completed_trial() {
        let session = TrialSession::new();
        let (next, transition) = session.next(&SessionEvent::ReviewTrial, TrialStatus::Analyzed);
        assert_eq!(
            transition,
            Transition::Ignored(IgnoreReason::TrialNotCompleted)
        );
        assert_eq!(next, session);
    }

    #[test]
    fn back_from_confirmation_resets_gate() {
        let mut session = TrialSession::new();
        session.apply(&SessionEvent::StartTrial, TrialStatus::Pending);
        touch_all(&mut session);
        session.apply(&SessionEvent::Back, TrialStatus::Pending);
        assert_eq!(session.step(), TrialStep::Ready);
        assert_eq!(session.gate().remaining_count(), 4);
    }

    #[test]
    fn events_without_an_edge_are_ignored() {
        let session = running_session();
        for event in [
            SessionEvent::StartTrial,
            SessionEvent::ConfirmStart,
            SessionEvent::Back,
            SessionEvent::CompleteReview,
        ] {
            let (next, transition) = session.next(&event, TrialStatus::Pending);
            assert_eq!(
                transition,
                Transition::Ignored(IgnoreReason::NotAvailable(TrialStep::Running))
            );
            assert_eq!(next, session);
        }
    }

    #[test]
    fn ticks_accumulate_only_while_recording() {
        let mut session = running_session();
        session.apply(&SessionEvent::Tick(Duration::from_secs(60)), TrialStatus::Pending);
        session.apply(&SessionEvent::ToggleStatus, TrialStatus::Pending);
        let paused = session.apply(&SessionEvent::Tick(Duration::from_secs(60)), TrialStatus::Pending);
        assert_eq!(paused, Transition::Ignored(IgnoreReason::NotRecording));
        assert_eq!(session.elapsed(), Duration::from_secs(60));
        assert_eq!(
            session.progress(Some(Duration::from_secs(240))),
            Some(0.25)
        );
        assert_eq!(session.progress(None), None);
    }

    #[test]
    fn huge_ticks_saturate() {
        let mut session = running_session();
        let dt = Duration::from_secs(u64::MAX / 2 + 1);
        session.apply(&SessionEvent::Tick(dt), TrialStatus::Pending);
        let second = session.apply(&SessionEvent::Tick(dt), TrialStatus::Pending);
        assert_eq!(second, Transition::Applied);
        assert_eq!(session.elapsed(), Duration::MAX);
    }

    #[test]
    fn toggle_then_stop_observes_toggle_first() {
        let mut session = running_session();
        let events = [SessionEvent::ToggleStatus, SessionEvent::StopTrial];
        let outcomes: Vec<_> = events
            .iter()
            .map(|event| {
                session.apply(event, TrialStatus::Pending);
                session.run_status()
            })
            .collect();
        assert_eq!(outcomes, vec![RunStatus::Paused, RunStatus::Completed]);
    }
}
