mod script;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use gaitlab_core::{
    checklist,
    review::ReviewReport,
    settings::{DeviceSettings, Settings},
    Animal, AnimalDraft, AnimalStatus, EntityStore, Outcome, Trial, Workbench, WorkbenchEvent,
    WorkbenchSnapshot,
};
use gaitlab_device::{DeviceApi, DeviceCommand, DeviceConfig, HttpDeviceClient};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gaitlab",
    version,
    about = "GaitLab: animal gait trial console tools"
)]
struct Cli {
    /// Settings file (defaults to ./gaitlab.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding animals.csv and trials.csv
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StatusArg {
    Active,
    Rest,
}

impl From<StatusArg> for AnimalStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => AnimalStatus::Active,
            StatusArg::Rest => AnimalStatus::Rest,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List animals as JSON
    Animals,
    /// List the trials of one animal as JSON
    Trials {
        #[arg(long)]
        animal: u32,
    },
    /// Validate a new animal and print the record it would be given
    AddAnimal {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        species: String,
        #[arg(long, default_value = "")]
        age: String,
        #[arg(long, default_value = "")]
        weight: String,
        #[arg(long, default_value = "active")]
        status: StatusArg,
    },
    /// Replay operator events and print the resulting console state
    Session {
        /// Open this animal before replaying
        #[arg(long)]
        animal: Option<u32>,
        /// Open this trial of the animal before replaying
        #[arg(long)]
        trial: Option<u32>,
        /// e.g. "start,touch:participantId,confirm,toggle,tick:5,stop,complete"
        #[arg(long, default_value = "")]
        events: String,
        /// Fail on the first refused event
        #[arg(long)]
        strict: bool,
    },
    /// Print the confirmation checklist for a trial
    Checklist {
        #[arg(long)]
        animal: u32,
        #[arg(long)]
        trial: u32,
    },
    /// Write the review report of a trial as JSON
    ReviewExport {
        #[arg(long)]
        animal: u32,
        #[arg(long)]
        trial: u32,
        #[arg(long)]
        out: PathBuf,
    },
    /// Talk to the capture device
    Device {
        #[arg(long)]
        base_url: Option<String>,
        #[command(subcommand)]
        action: DeviceAction,
    },
}

#[derive(Subcommand)]
enum DeviceAction {
    /// Print GET /status
    Status,
    /// Print GET /logs, one entry per line
    Logs,
    Rename {
        #[arg(long)]
        name: String,
    },
    /// Start a trial; unset options keep the device's current values
    StartTrial {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        fps: Option<u32>,
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        camera_endpoint: Option<String>,
    },
    StopTrial,
    Files,
    Restart,
}

#[derive(Serialize)]
struct RefusedEvent {
    event: String,
    reason: String,
}

#[derive(Serialize)]
struct SessionReport {
    snapshot: WorkbenchSnapshot,
    refused: Vec<RefusedEvent>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    let mut settings = Settings::discover(cli.config.as_deref()).context("loading settings")?;
    if let Some(dir) = &cli.data_dir {
        settings.data.animals = Some(dir.join("animals.csv"));
        settings.data.trials = Some(dir.join("trials.csv"));
    }

    match cli.command {
        Commands::Animals => {
            let store = settings.entity_store()?;
            println!("{}", serde_json::to_string(store.animals())?);
        }
        Commands::Trials { animal } => {
            let store = settings.entity_store()?;
            if store.animal(animal).is_none() {
                bail!("unknown animal {animal}");
            }
            println!("{}", serde_json::to_string(store.trials_for(animal))?);
        }
        Commands::AddAnimal {
            name,
            species,
            age,
            weight,
            status,
        } => {
            let draft = AnimalDraft {
                name,
                species,
                age,
                weight,
                status: status.into(),
            };
            add_animal(&settings, draft)?;
        }
        Commands::Session {
            animal,
            trial,
            events,
            strict,
        } => {
            let report = run_session(settings.entity_store()?, animal, trial, &events, strict)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Checklist { animal, trial } => {
            let store = settings.entity_store()?;
            let (animal, trial) = lookup(&store, animal, trial)?;
            println!("{}", serde_json::to_string(&checklist(animal, trial))?);
        }
        Commands::ReviewExport { animal, trial, out } => {
            let store = settings.entity_store()?;
            let (animal, trial) = lookup(&store, animal, trial)?;
            ReviewReport::for_trial(animal, trial).export(&out)?;
            println!("{}", out.display());
        }
        Commands::Device { base_url, action } => {
            let mut device = settings.device.clone();
            if let Some(url) = base_url {
                device.base_url = url;
            }
            run_device(&device, action)?;
        }
    }
    Ok(())
}

fn lookup(
    store: &EntityStore,
    animal_id: u32,
    trial_id: u32,
) -> Result<(&Animal, &Trial)> {
    let animal = store
        .animal(animal_id)
        .ok_or_else(|| anyhow!("unknown animal {animal_id}"))?;
    let trial = store
        .trial(animal_id, trial_id)
        .ok_or_else(|| anyhow!("animal {animal_id} has no trial {trial_id}"))?;
    Ok((animal, trial))
}

fn add_animal(settings: &Settings, draft: AnimalDraft) -> Result<()> {
    let mut store = settings.entity_store()?;
    let animal = store.add_animal(draft).context("animal not added")?;
    println!("{}", serde_json::to_string(&animal)?);
    Ok(())
}

fn run_session(
    store: EntityStore,
    animal: Option<u32>,
    trial: Option<u32>,
    events: &str,
    strict: bool,
) -> Result<SessionReport> {
    let mut script = Vec::new();
    if let Some(id) = animal {
        script.push(WorkbenchEvent::OpenAnimal(id));
    }
    if let Some(id) = trial {
        if animal.is_none() {
            bail!("--trial needs --animal");
        }
        script.push(WorkbenchEvent::OpenTrial(id));
    }
    script.extend(script::parse_script(events)?);

    info!("replaying {} events", script.len());
    let mut workbench = Workbench::new(store);
    let mut refused = Vec::new();
    for event in script {
        let label = format!("{event:?}");
        if let Outcome::Refused(refusal) = workbench.handle(event) {
            if strict {
                bail!("{label} refused: {refusal:?}");
            }
            refused.push(RefusedEvent {
                event: label,
                reason: format!("{refusal:?}"),
            });
        }
    }
    Ok(SessionReport {
        snapshot: workbench.snapshot(),
        refused,
    })
}

fn run_device(settings: &DeviceSettings, action: DeviceAction) -> Result<()> {
    let client = HttpDeviceClient::from_settings(settings);
    info!("device at {}", client.base_url());
    let command = match action {
        DeviceAction::Status => {
            let status = client
                .status()
                .with_context(|| format!("fetching status from {}", client.base_url()))?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            println!("uptime: {}", status.uptime());
            return Ok(());
        }
        DeviceAction::Logs => {
            let logs = client
                .logs()
                .with_context(|| format!("fetching logs from {}", client.base_url()))?;
            for entry in logs {
                println!("{}", entry.line());
            }
            return Ok(());
        }
        DeviceAction::Rename { name } => DeviceCommand::Rename { name },
        DeviceAction::StartTrial {
            name,
            fps,
            enabled,
            camera_endpoint,
        } => {
            let status = client
                .status()
                .with_context(|| format!("fetching status from {}", client.base_url()))?;
            let mut config = DeviceConfig::from_status(&status);
            if let Some(name) = name {
                config.name = name;
            }
            if fps.is_some() {
                config.stream_fps = fps;
            }
            if let Some(enabled) = enabled {
                config.enabled = enabled;
            }
            if let Some(endpoint) = camera_endpoint {
                config.camera_endpoint = endpoint;
            }
            DeviceCommand::StartTrial(config)
        }
        DeviceAction::StopTrial => DeviceCommand::StopTrial,
        DeviceAction::Files => DeviceCommand::ListFiles,
        DeviceAction::Restart => DeviceCommand::Restart,
    };
    let reply = client
        .send(&command)
        .with_context(|| format!("POST {}{}", client.base_url(), command.path()))?;
    println!("{}", command.success_message());
    if !reply.is_null() {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    }
    Ok(())
}
