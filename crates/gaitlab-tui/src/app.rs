use crate::input::TextField;
use anyhow::{anyhow, Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use gaitlab_core::{
    review::{ReviewReport, ReviewTab},
    AnimalDraft, AnimalStatus, IgnoreReason, Outcome, Refusal, RunStatus, Screen,
    SessionEvent, TrialStep, Workbench, WorkbenchEvent, TRIAL_START_FIELDS,
};
use gaitlab_device::{DeviceCommand, DeviceConfig, DeviceLink, DeviceRequest};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Tab {
    Lab,
    Device,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Lab => "Animals & trials",
            Tab::Device => "Device",
        }
    }

    pub fn all() -> [Tab; 2] {
        [Tab::Lab, Tab::Device]
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Lab => 0,
            Tab::Device => 1,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FormField {
    Name,
    Species,
    Age,
    Weight,
    Status,
}

impl FormField {
    pub fn all() -> [FormField; 5] {
        [
            FormField::Name,
            FormField::Species,
            FormField::Age,
            FormField::Weight,
            FormField::Status,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Species => "Species",
            FormField::Age => "Age",
            FormField::Weight => "Weight",
            FormField::Status => "Status",
        }
    }

    fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Species,
            FormField::Species => FormField::Age,
            FormField::Age => FormField::Weight,
            FormField::Weight => FormField::Status,
            FormField::Status => FormField::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Name => FormField::Status,
            FormField::Species => FormField::Name,
            FormField::Age => FormField::Species,
            FormField::Weight => FormField::Age,
            FormField::Status => FormField::Weight,
        }
    }
}

#[derive(Default)]
pub struct AnimalForm {
    pub name: TextField,
    pub species: TextField,
    pub age: TextField,
    pub weight: TextField,
    pub status: AnimalStatus,
    pub focus: Option<FormField>,
}

impl AnimalForm {
    fn fresh() -> Self {
        Self {
            focus: Some(FormField::Name),
            ..Self::default()
        }
    }

    pub fn draft(&self) -> AnimalDraft {
        AnimalDraft {
            name: self.name.value.clone(),
            species: self.species.value.clone(),
            age: self.age.value.clone(),
            weight: self.weight.value.clone(),
            status: self.status,
        }
    }

    pub fn field(&self, field: FormField) -> Option<&TextField> {
        match field {
            FormField::Name => Some(&self.name),
            FormField::Species => Some(&self.species),
            FormField::Age => Some(&self.age),
            FormField::Weight => Some(&self.weight),
            FormField::Status => None,
        }
    }

    fn field_mut(&mut self, field: FormField) -> Option<&mut TextField> {
        match field {
            FormField::Name => Some(&mut self.name),
            FormField::Species => Some(&mut self.species),
            FormField::Age => Some(&mut self.age),
            FormField::Weight => Some(&mut self.weight),
            FormField::Status => None,
        }
    }

    fn cycle_status(&mut self) {
        let options = AnimalStatus::selectable();
        let idx = options
            .iter()
            .position(|status| *status == self.status)
            .map(|idx| (idx + 1) % options.len())
            .unwrap_or(0);
        self.status = options[idx];
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DeviceField {
    Name,
    Fps,
    Endpoint,
}

impl DeviceField {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceField::Name => "Device name",
            DeviceField::Fps => "Stream FPS",
            DeviceField::Endpoint => "Camera endpoint",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            DeviceField::Name => Some(DeviceField::Fps),
            DeviceField::Fps => Some(DeviceField::Endpoint),
            DeviceField::Endpoint => None,
        }
    }
}

/// Edit buffers for the device config; reloaded whenever the panel's config changes.
#[derive(Default)]
pub struct DeviceForm {
    pub name: TextField,
    pub fps: TextField,
    pub endpoint: TextField,
    pub enabled: bool,
    pub focus: Option<DeviceField>,
    seen: DeviceConfig,
}

impl DeviceForm {
    fn load(&mut self, config: &DeviceConfig) {
        self.name.set(&config.name);
        self.fps
            .set(&config.stream_fps.map(|fps| fps.to_string()).unwrap_or_default());
        self.endpoint.set(&config.camera_endpoint);
        self.enabled = config.enabled;
        self.seen = config.clone();
    }

    pub fn field(&self, field: DeviceField) -> &TextField {
        match field {
            DeviceField::Name => &self.name,
            DeviceField::Fps => &self.fps,
            DeviceField::Endpoint => &self.endpoint,
        }
    }

    fn field_mut(&mut self, field: DeviceField) -> &mut TextField {
        match field {
            DeviceField::Name => &mut self.name,
            DeviceField::Fps => &mut self.fps,
            DeviceField::Endpoint => &mut self.endpoint,
        }
    }

    fn config(&self) -> Result<DeviceConfig> {
        let fps = self.fps.value.trim();
        let stream_fps = if fps.is_empty() {
            None
        } else {
            Some(
                fps.parse()
                    .with_context(|| format!("stream fps must be a whole number, got `{fps}`"))?,
            )
        };
        Ok(DeviceConfig {
            name: self.name.value.trim().to_string(),
            stream_fps,
            enabled: self.enabled,
            camera_endpoint: self.endpoint.value.trim().to_string(),
        })
    }
}

pub struct App {
    pub tab: Tab,
    pub workbench: Workbench,
    pub animal_cursor: usize,
    pub trial_cursor: usize,
    pub checklist_cursor: usize,
    pub form: AnimalForm,
    pub review_tab: ReviewTab,
    pub report: Option<ReviewReport>,
    pub device: DeviceLink,
    pub device_form: DeviceForm,
    pub status: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(workbench: Workbench, device: DeviceLink) -> Self {
        Self {
            tab: Tab::Lab,
            workbench,
            animal_cursor: 0,
            trial_cursor: 0,
            checklist_cursor: 0,
            form: AnimalForm::fresh(),
            review_tab: ReviewTab::default(),
            report: None,
            device,
            device_form: DeviceForm::default(),
            status: "1/2 switch tabs. ↑/↓ select, Enter opens, Esc goes back, q quits.".into(),
            should_quit: false,
        }
    }

    pub fn active_screen(&self) -> Screen {
        self.workbench.nav().active_screen()
    }

    fn is_editing(&self) -> bool {
        match self.tab {
            Tab::Lab => self.active_screen() == Screen::AddAnimal,
            Tab::Device => self.device_form.focus.is_some(),
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }
        if !self.is_editing() {
            match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return Ok(());
                }
                KeyCode::Char('1') => {
                    self.tab = Tab::Lab;
                    return Ok(());
                }
                KeyCode::Char('2') => {
                    self.tab = Tab::Device;
                    return Ok(());
                }
                _ => {}
            }
        }
        let result = match self.tab {
            Tab::Lab => self.on_lab_key(&key),
            Tab::Device => self.on_device_key(&key),
        };
        if let Err(err) = result {
            self.status = format!("Error: {err:#}");
        }
        Ok(())
    }

    /// Advance the recording clock and fold device updates.
    pub fn on_tick(&mut self, now: Instant, dt: Duration) {
        let recording = self
            .workbench
            .session()
            .is_some_and(|session| session.run_status() == RunStatus::Running);
        if recording {
            self.workbench
                .handle(WorkbenchEvent::Session(SessionEvent::Tick(dt)));
        }
        self.device.pump(now);
        if self.device_form.focus.is_none() && *self.device.config() != self.device_form.seen {
            let config = self.device.config().clone();
            self.device_form.load(&config);
        }
    }

    fn dispatch(&mut self, event: WorkbenchEvent) -> bool {
        match self.workbench.handle(event) {
            Outcome::Applied => {
                self.sync_view();
                true
            }
            Outcome::Refused(refusal) => {
                self.status = describe(&refusal);
                false
            }
        }
    }

    fn sync_view(&mut self) {
        let step = self.workbench.session().map(|session| session.step());
        match step {
            Some(TrialStep::Review) => {
                if self.report.is_none() {
                    let nav = self.workbench.nav();
                    if let (Some(animal), Some(trial)) = (nav.selected_animal(), nav.selected_trial())
                    {
                        self.report = Some(ReviewReport::for_trial(animal, trial));
                        self.review_tab = ReviewTab::default();
                    }
                }
            }
            _ => self.report = None,
        }
        if step != Some(TrialStep::Confirmation) {
            self.checklist_cursor = 0;
        }
        let animals = self.workbench.store().len();
        self.animal_cursor = self.animal_cursor.min(animals.saturating_sub(1));
    }

    fn on_lab_key(&mut self, key: &KeyEvent) -> Result<()> {
        match self.active_screen() {
            Screen::AnimalsList => self.on_list_key(key),
            Screen::AddAnimal => self.on_form_key(key),
            Screen::AnimalDetail => self.on_detail_key(key),
            Screen::TrialControl => self.on_trial_key(key)?,
        }
        Ok(())
    }

    fn on_list_key(&mut self, key: &KeyEvent) {
        let count = self.workbench.store().len();
        match key.code {
            KeyCode::Up => self.animal_cursor = self.animal_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.animal_cursor + 1 < count {
                    self.animal_cursor += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(animal) = self.workbench.store().animals().get(self.animal_cursor) {
                    let id = animal.id;
                    if self.dispatch(WorkbenchEvent::OpenAnimal(id)) {
                        self.trial_cursor = 0;
                    }
                }
            }
            KeyCode::Char('a') => {
                if self.dispatch(WorkbenchEvent::OpenAddAnimal) {
                    self.form = AnimalForm::fresh();
                }
            }
            _ => {}
        }
    }

    fn on_form_key(&mut self, key: &KeyEvent) {
        let focus = self.form.focus.unwrap_or(FormField::Name);
        match key.code {
            KeyCode::Esc => {
                self.dispatch(WorkbenchEvent::Back);
            }
            KeyCode::Tab | KeyCode::Down => self.form.focus = Some(focus.next()),
            KeyCode::BackTab | KeyCode::Up => self.form.focus = Some(focus.prev()),
            KeyCode::Enter => self.save_animal(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if focus == FormField::Status => {
                self.form.cycle_status()
            }
            _ => {
                if let Some(field) = self.form.field_mut(focus) {
                    field.handle_key(key);
                }
            }
        }
    }

    fn save_animal(&mut self) {
        let draft = self.form.draft();
        if let Some(field) = draft.missing_field() {
            self.status = format!("{field} is required");
            return;
        }
        let name = draft.name.trim().to_string();
        if self.dispatch(WorkbenchEvent::SaveAnimal(draft)) {
            self.animal_cursor = self.workbench.store().len().saturating_sub(1);
            self.form = AnimalForm::fresh();
            self.status = format!("Added {name}");
        }
    }

    fn on_detail_key(&mut self, key: &KeyEvent) {
        let Some(animal_id) = self.workbench.nav().selected_animal().map(|a| a.id) else {
            return;
        };
        let trials = self.workbench.store().trials_for(animal_id);
        match key.code {
            KeyCode::Up => self.trial_cursor = self.trial_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.trial_cursor + 1 < trials.len() {
                    self.trial_cursor += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(trial) = trials.get(self.trial_cursor) {
                    let id = trial.id;
                    self.dispatch(WorkbenchEvent::OpenTrial(id));
                }
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.dispatch(WorkbenchEvent::Back);
            }
            _ => {}
        }
    }

    fn on_trial_key(&mut self, key: &KeyEvent) -> Result<()> {
        let Some(step) = self.workbench.session().map(|session| session.step()) else {
            return Ok(());
        };
        let event = match (step, key.code) {
            (_, KeyCode::Esc) if step != TrialStep::Confirmation => WorkbenchEvent::Back,
            (TrialStep::Ready, KeyCode::Char('s')) => {
                WorkbenchEvent::Session(SessionEvent::StartTrial)
            }
            (TrialStep::Ready, KeyCode::Char('r')) => {
                WorkbenchEvent::Session(SessionEvent::ReviewTrial)
            }
            (TrialStep::Confirmation, KeyCode::Up) => {
                self.checklist_cursor = self.checklist_cursor.saturating_sub(1);
                return Ok(());
            }
            (TrialStep::Confirmation, KeyCode::Down) => {
                self.checklist_cursor = (self.checklist_cursor + 1).min(TRIAL_START_FIELDS.len() - 1);
                return Ok(());
            }
            (TrialStep::Confirmation, KeyCode::Char(' ')) => {
                let key = TRIAL_START_FIELDS[self.checklist_cursor];
                WorkbenchEvent::Session(SessionEvent::TouchField(key.to_string()))
            }
            (TrialStep::Confirmation, KeyCode::Enter) => {
                WorkbenchEvent::Session(SessionEvent::ConfirmStart)
            }
            (TrialStep::Confirmation, KeyCode::Esc) => WorkbenchEvent::Session(SessionEvent::Back),
            (TrialStep::Running, KeyCode::Char(' ')) => {
                WorkbenchEvent::Session(SessionEvent::ToggleStatus)
            }
            (TrialStep::Running, KeyCode::Char('s')) => {
                WorkbenchEvent::Session(SessionEvent::StopTrial)
            }
            (TrialStep::Review, KeyCode::Left) => {
                self.review_tab = self.review_tab.prev();
                return Ok(());
            }
            (TrialStep::Review, KeyCode::Right) => {
                self.review_tab = self.review_tab.next();
                return Ok(());
            }
            (TrialStep::Review, KeyCode::Char('e')) => return self.export_report(),
            (TrialStep::Review, KeyCode::Enter) => {
                WorkbenchEvent::Session(SessionEvent::CompleteReview)
            }
            _ => return Ok(()),
        };
        if self.dispatch(event) {
            if let Some(session) = self.workbench.session() {
                self.status = format!(
                    "{}: {}",
                    session.step().title(),
                    session.run_status().caption()
                );
            }
        }
        Ok(())
    }

    fn export_report(&mut self) -> Result<()> {
        let report = self
            .report
            .as_ref()
            .ok_or_else(|| anyhow!("no review to export"))?;
        let path = PathBuf::from(format!(
            "review-{}-{}.json",
            report.animal.id, report.trial.id
        ));
        report.export(&path)?;
        self.status = format!("Exported results to {}", path.display());
        Ok(())
    }

    fn on_device_key(&mut self, key: &KeyEvent) -> Result<()> {
        if let Some(focus) = self.device_form.focus {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.device_form.focus = None,
                KeyCode::Tab => self.device_form.focus = focus.next(),
                _ => {
                    self.device_form.field_mut(focus).handle_key(key);
                }
            }
            return Ok(());
        }
        let request = match key.code {
            KeyCode::Tab => {
                self.device_form.focus = Some(DeviceField::Name);
                return Ok(());
            }
            KeyCode::Char('e') => {
                self.device_form.enabled = !self.device_form.enabled;
                return Ok(());
            }
            KeyCode::Char('d') => {
                self.device.dismiss();
                return Ok(());
            }
            KeyCode::Char('r') => DeviceRequest::RefreshStatus,
            KeyCode::Char('l') => DeviceRequest::FetchLogs,
            KeyCode::Char('n') => {
                let name = self.device_form.name.value.trim().to_string();
                if name.is_empty() {
                    return Err(anyhow!("device name is required"));
                }
                DeviceRequest::Command(DeviceCommand::Rename { name })
            }
            KeyCode::Char('s') => {
                let config = self.device_form.config()?;
                *self.device.config_mut() = config.clone();
                DeviceRequest::Command(DeviceCommand::StartTrial(config))
            }
            KeyCode::Char('x') => DeviceRequest::Command(DeviceCommand::StopTrial),
            KeyCode::Char('f') => DeviceRequest::Command(DeviceCommand::ListFiles),
            KeyCode::Char('R') => DeviceRequest::Command(DeviceCommand::Restart),
            _ => return Ok(()),
        };
        if !self.device.request(request) {
            self.status = "Device busy; wait for the current request".into();
        }
        Ok(())
    }
}

fn describe(refusal: &Refusal) -> String {
    match refusal {
        Refusal::RunInProgress => "Stop the trial before leaving trial control".into(),
        Refusal::AtRoot => "Already at the animals list".into(),
        Refusal::InvalidDraft(err) => err.to_string(),
        Refusal::UnknownAnimal(id) => format!("Animal {id} not found"),
        Refusal::UnknownTrial(id) => format!("Trial {id} not found"),
        Refusal::Session(IgnoreReason::GateIncomplete { remaining }) => {
            format!("Touch {remaining} more fields")
        }
        Refusal::Session(IgnoreReason::TrialAlreadyCompleted) => {
            "Trial already completed; press r to review it".into()
        }
        Refusal::Session(IgnoreReason::TrialNotCompleted) => {
            "Only completed trials can be reviewed".into()
        }
        other => format!("Ignored: {other:?}"),
    }
}
