use crate::entity::{AnimalDraft, EntityStore, StoreError};
use crate::navigation::{NavContext, Screen, SlideDirection, ViewStackController, ViewState};
use crate::session::{
    IgnoreReason, SessionEvent, SessionSnapshot, Transition, TrialSession, TrialStep,
};
use log::{debug, info};
use serde::Serialize;

/// Operator actions delivered by a host event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkbenchEvent {
    OpenAnimal(u32),
    OpenAddAnimal,
    SaveAnimal(AnimalDraft),
    OpenTrial(u32),
    Back,
    Session(SessionEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    UnknownAnimal(u32),
    UnknownTrial(u32),
    MissingContext(Screen),
    InvalidDraft(StoreError),
    /// Leaving trial control would abandon a running or paused trial.
    RunInProgress,
    NoSession,
    AtRoot,
    Session(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Refused(Refusal),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

impl From<Result<(), Refusal>> for Outcome {
    fn from(result: Result<(), Refusal>) -> Self {
        match result {
            Ok(()) => Outcome::Applied,
            Err(refusal) => Outcome::Refused(refusal),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkbenchSnapshot {
    pub view: ViewState,
    pub directions: Vec<(Screen, SlideDirection)>,
    pub session: Option<SessionSnapshot>,
}

/// Store, view stack and the session of the current trial-control visit.
pub struct Workbench {
    store: EntityStore,
    nav: ViewStackController,
    session: Option<TrialSession>,
}

impl Workbench {
    pub fn new(store: EntityStore) -> Self {
        Self {
            store,
            nav: ViewStackController::new(),
            session: None,
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn nav(&self) -> &ViewStackController {
        &self.nav
    }

    pub fn session(&self) -> Option<&TrialSession> {
        self.session.as_ref()
    }

    pub fn handle(&mut self, event: WorkbenchEvent) -> Outcome {
        let result = match event {
            WorkbenchEvent::OpenAnimal(id) => self.open_animal(id),
            WorkbenchEvent::OpenAddAnimal => self.navigate(Screen::AddAnimal, NavContext::none()),
            WorkbenchEvent::SaveAnimal(draft) => self.save_animal(draft),
            WorkbenchEvent::OpenTrial(id) => self.open_trial(id),
            WorkbenchEvent::Back => self.back(),
            WorkbenchEvent::Session(event) => self.session_event(event),
        };
        if let Err(refusal) = &result {
            debug!("workbench refused: {refusal:?}");
        }
        result.into()
    }

    fn guard_leave(&self) -> Result<(), Refusal> {
        match &self.session {
            Some(session) if session.is_live() => Err(Refusal::RunInProgress),
            _ => Ok(()),
        }
    }

    fn navigate(&mut self, screen: Screen, ctx: NavContext) -> Result<(), Refusal> {
        self.guard_leave()?;
        if !self.nav.navigate_to(screen, ctx) {
            return Err(Refusal::MissingContext(screen));
        }
        self.replace_session();
        Ok(())
    }

    // Every visit to trial control starts from a fresh session.
    fn replace_session(&mut self) {
        self.session = match self.nav.active_screen() {
            Screen::TrialControl => Some(TrialSession::new()),
            _ => None,
        };
    }

    fn open_animal(&mut self, id: u32) -> Result<(), Refusal> {
        let animal = self
            .store
            .animal(id)
            .cloned()
            .ok_or(Refusal::UnknownAnimal(id))?;
        self.navigate(Screen::AnimalDetail, NavContext::animal(animal))
    }

    fn open_trial(&mut self, id: u32) -> Result<(), Refusal> {
        let animal_id = self
            .nav
            .selected_animal()
            .map(|animal| animal.id)
            .ok_or(Refusal::MissingContext(Screen::TrialControl))?;
        let trial = self
            .store
            .trial(animal_id, id)
            .cloned()
            .ok_or(Refusal::UnknownTrial(id))?;
        self.navigate(Screen::TrialControl, NavContext::trial(trial))
    }

    fn save_animal(&mut self, draft: AnimalDraft) -> Result<(), Refusal> {
        if self.nav.active_screen() != Screen::AddAnimal {
            return Err(Refusal::MissingContext(Screen::AddAnimal));
        }
        let animal = self.store.add_animal(draft).map_err(Refusal::InvalidDraft)?;
        info!("saved animal {} and returned to list", animal.id);
        self.navigate(Screen::AnimalsList, NavContext::none())
    }

    fn back(&mut self) -> Result<(), Refusal> {
        if let Some(session) = &self.session {
            if session.step() == TrialStep::Review {
                return self.session_event(SessionEvent::CompleteReview);
            }
        }
        self.guard_leave()?;
        if !self.nav.back() {
            return Err(Refusal::AtRoot);
        }
        self.replace_session();
        Ok(())
    }

    fn session_event(&mut self, event: SessionEvent) -> Result<(), Refusal> {
        let status = self
            .nav
            .selected_trial()
            .map(|trial| trial.status)
            .ok_or(Refusal::NoSession)?;
        let session = self.session.as_mut().ok_or(Refusal::NoSession)?;
        match session.apply(&event, status) {
            Transition::Applied => Ok(()),
            Transition::Ignored(reason) => Err(Refusal::Session(reason)),
        }
    }

    pub fn snapshot(&self) -> WorkbenchSnapshot {
        WorkbenchSnapshot {
            view: self.nav.state().clone(),
            directions: self.nav.directions().to_vec(),
            session: self.session.as_ref().map(TrialSession::snapshot),
        }
    }
}
