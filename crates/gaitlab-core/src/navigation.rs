//! Stacked top-level screens and the slide direction of each one.

use crate::entity::{Animal, Trial};
use log::{debug, info};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Screen {
    AnimalsList,
    AddAnimal,
    AnimalDetail,
    TrialControl,
}

impl Screen {
    pub const ALL: [Screen; 4] = [
        Screen::AddAnimal,
        Screen::AnimalsList,
        Screen::AnimalDetail,
        Screen::TrialControl,
    ];

    /// Drill-down order. `AddAnimal` sits outside it as a sibling of the list.
    pub const STACK: [Screen; 3] = [
        Screen::AnimalsList,
        Screen::AnimalDetail,
        Screen::TrialControl,
    ];

    fn stack_index(self) -> Option<usize> {
        Self::STACK.iter().position(|screen| *screen == self)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::AnimalsList => "Animals",
            Screen::AddAnimal => "Add New Animal",
            Screen::AnimalDetail => "Animal",
            Screen::TrialControl => "Trial Control",
        }
    }
}

/// Where a screen sits relative to the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlideDirection {
    Active,
    Above,
    Below,
}

/// Entities handed along with a navigation request.
#[derive(Debug, Clone, Default)]
pub struct NavContext {
    pub animal: Option<Animal>,
    pub trial: Option<Trial>,
}

impl NavContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn animal(animal: Animal) -> Self {
        Self {
            animal: Some(animal),
            trial: None,
        }
    }

    pub fn trial(trial: Trial) -> Self {
        Self {
            animal: None,
            trial: Some(trial),
        }
    }

    pub fn with_trial(mut self, trial: Trial) -> Self {
        self.trial = Some(trial);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub active_screen: Screen,
    pub selected_animal: Option<Animal>,
    pub selected_trial: Option<Trial>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active_screen: Screen::AnimalsList,
            selected_animal: None,
            selected_trial: None,
        }
    }
}

impl ViewState {
    /// State after navigating to `screen`, or `None` when the context lacks
    /// an entity the screen needs.
    pub fn navigate(&self, screen: Screen, ctx: NavContext) -> Option<ViewState> {
        match screen {
            Screen::AnimalsList => Some(ViewState::default()),
            Screen::AddAnimal => {
                if self.active_screen != Screen::AnimalsList {
                    return None;
                }
                Some(ViewState {
                    active_screen: Screen::AddAnimal,
                    ..self.clone()
                })
            }
            Screen::AnimalDetail => Some(ViewState {
                active_screen: Screen::AnimalDetail,
                selected_animal: Some(ctx.animal?),
                selected_trial: None,
            }),
            Screen::TrialControl => {
                let trial = ctx.trial?;
                let animal = ctx.animal.or_else(|| self.selected_animal.clone())?;
                Some(ViewState {
                    active_screen: Screen::TrialControl,
                    selected_animal: Some(animal),
                    selected_trial: Some(trial),
                })
            }
        }
    }

    /// State after popping to the logical parent, `None` at the root.
    pub fn back(&self) -> Option<ViewState> {
        match self.active_screen {
            Screen::AnimalsList => None,
            Screen::AddAnimal => Some(ViewState {
                active_screen: Screen::AnimalsList,
                ..self.clone()
            }),
            Screen::AnimalDetail => Some(ViewState {
                active_screen: Screen::AnimalsList,
                selected_animal: None,
                selected_trial: None,
            }),
            Screen::TrialControl => Some(ViewState {
                active_screen: Screen::AnimalDetail,
                selected_animal: self.selected_animal.clone(),
                selected_trial: None,
            }),
        }
    }

    pub fn direction_of(&self, screen: Screen) -> SlideDirection {
        if screen == self.active_screen {
            return SlideDirection::Active;
        }
        match (screen.stack_index(), self.active_screen.stack_index()) {
            (Some(index), Some(active)) if index < active => SlideDirection::Above,
            // AddAnimal enters from the bottom; while it is active every other
            // screen waits below it too.
            _ => SlideDirection::Below,
        }
    }
}

/// Owner of the single [`ViewState`].
#[derive(Debug, Clone, Default)]
pub struct ViewStackController {
    state: ViewState,
}

impl ViewStackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigate_to(&mut self, screen: Screen, ctx: NavContext) -> bool {
        match self.state.navigate(screen, ctx) {
            Some(next) => {
                info!("navigate {:?} -> {:?}", self.state.active_screen, screen);
                self.state = next;
                true
            }
            None => {
                debug!(
                    "navigation to {:?} from {:?} lacks context",
                    screen, self.state.active_screen
                );
                false
            }
        }
    }

    pub fn back(&mut self) -> bool {
        match self.state.back() {
            Some(next) => {
                info!(
                    "back {:?} -> {:?}",
                    self.state.active_screen, next.active_screen
                );
                self.state = next;
                true
            }
            None => false,
        }
    }

    pub fn transition_direction(&self, screen: Screen) -> SlideDirection {
        self.state.direction_of(screen)
    }

    pub fn directions(&self) -> [(Screen, SlideDirection); 4] {
        Screen::ALL.map(|screen| (screen, self.transition_direction(screen)))
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn active_screen(&self) -> Screen {
        self.state.active_screen
    }

    pub fn selected_animal(&self) -> Option<&Animal> {
        self.state.selected_animal.as_ref()
    }

    pub fn selected_trial(&self) -> Option<&Trial> {
        self.state.selected_trial.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityStore;

    fn sheep() -> (Animal, Trial) {
        let store = EntityStore::sample();
        (
            store.animal(1).cloned().unwrap(),
            store.trial(1, 103).cloned().unwrap(),
        )
    }

    fn at_detail() -> ViewStackController {
        let (animal, _) = sheep();
        let mut nav = ViewStackController::new();
        assert!(nav.navigate_to(Screen::AnimalDetail, NavContext::animal(animal)));
        nav
    }

    #[test]
    fn navigate_then_back_restores_prior_state() {
        let (animal, trial) = sheep();
        let cases = [
            (ViewStackController::new(), Screen::AddAnimal, NavContext::none()),
            (
                ViewStackController::new(),
                Screen::AnimalDetail,
                NavContext::animal(animal.clone()),
            ),
            (at_detail(), Screen::TrialControl, NavContext::trial(trial)),
        ];
        for (mut nav, screen, ctx) in cases {
            let prior = nav.state().clone();
            assert!(nav.navigate_to(screen, ctx), "{screen:?}");
            assert!(nav.back());
            assert_eq!(*nav.state(), prior, "{screen:?}");
        }
    }

    #[test]
    fn back_from_trial_control_clears_trial_only() {
        let (animal, trial) = sheep();
        let mut nav = at_detail();
        nav.navigate_to(Screen::TrialControl, NavContext::trial(trial));
        nav.back();
        assert_eq!(nav.active_screen(), Screen::AnimalDetail);
        assert_eq!(nav.selected_animal(), Some(&animal));
        assert!(nav.selected_trial().is_none());
        nav.back();
        assert_eq!(nav.active_screen(), Screen::AnimalsList);
        assert!(nav.selected_animal().is_none());
        assert!(!nav.back());
    }

    #[test]
    fn missing_context_is_a_noop() {
        let (_, trial) = sheep();
        let mut nav = ViewStackController::new();
        assert!(!nav.navigate_to(Screen::AnimalDetail, NavContext::none()));
        assert!(!nav.navigate_to(Screen::TrialControl, NavContext::trial(trial)));
        assert_eq!(*nav.state(), ViewState::default());

        let mut nav = at_detail();
        assert!(!nav.navigate_to(Screen::TrialControl, NavContext::none()));
        assert!(!nav.navigate_to(Screen::AddAnimal, NavContext::none()));
        assert_eq!(nav.active_screen(), Screen::AnimalDetail);
    }

    #[test]
    fn exactly_one_active_direction_everywhere() {
        let (animal, trial) = sheep();
        let mut states = vec![ViewStackController::new()];
        let mut add = ViewStackController::new();
        add.navigate_to(Screen::AddAnimal, NavContext::none());
        states.push(add);
        states.push(at_detail());
        let mut control = ViewStackController::new();
        control.navigate_to(
            Screen::TrialControl,
            NavContext::animal(animal).with_trial(trial),
        );
        states.push(control);

        for nav in &states {
            let active: Vec<_> = nav
                .directions()
                .into_iter()
                .filter(|(_, dir)| *dir == SlideDirection::Active)
                .map(|(screen, _)| screen)
                .collect();
            assert_eq!(active, vec![nav.active_screen()]);
        }
    }

    #[test]
    fn directions_follow_stack_order() {
        let (_, trial) = sheep();
        let mut nav = at_detail();
        assert_eq!(
            nav.transition_direction(Screen::AnimalsList),
            SlideDirection::Above
        );
        assert_eq!(
            nav.transition_direction(Screen::TrialControl),
            SlideDirection::Below
        );
        assert_eq!(
            nav.transition_direction(Screen::AddAnimal),
            SlideDirection::Below
        );
        nav.navigate_to(Screen::TrialControl, NavContext::trial(trial));
        assert_eq!(
            nav.transition_direction(Screen::AnimalDetail),
            SlideDirection::Above
        );

        let mut add = ViewStackController::new();
        add.navigate_to(Screen::AddAnimal, NavContext::none());
        assert_eq!(
            add.transition_direction(Screen::AddAnimal),
            SlideDirection::Active
        );
        assert_eq!(
            add.transition_direction(Screen::AnimalsList),
            SlideDirection::Below
        );
    }
}
