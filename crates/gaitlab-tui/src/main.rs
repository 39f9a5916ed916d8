mod app;
mod input;
mod ui;

use std::{
    io::{self, Stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gaitlab_core::{settings::Settings, Workbench};
use gaitlab_device::{DeviceLink, DevicePanel, HttpDeviceClient};
use ratatui::{prelude::CrosstermBackend, Terminal};

#[derive(Parser)]
#[command(name = "gaitlab-tui", version, about = "GaitLab operator console")]
struct Args {
    /// Settings file (defaults to ./gaitlab.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::discover(args.config.as_deref()).context("loading settings")?;
    let store = settings.entity_store()?;
    let device = DeviceLink::spawn(
        HttpDeviceClient::from_settings(&settings.device),
        DevicePanel::from_settings(&settings.device),
        settings.device.poll_interval(),
    );
    let mut app = App::new(Workbench::new(store), device);

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut app);
    restore_terminal()?;
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(150);
    let mut last_tick = Instant::now();

    while !app.should_quit {
        terminal.draw(|f| ui::draw(f, app))?;
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key)?;
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            let now = Instant::now();
            app.on_tick(now, now - last_tick);
            last_tick = now;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("initializing terminal")
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}
