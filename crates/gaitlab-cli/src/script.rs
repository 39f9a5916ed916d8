//! Comma-separated event scripts for `gaitlab session`.

use anyhow::{anyhow, bail, Context, Result};
use gaitlab_core::{SessionEvent, WorkbenchEvent};
use std::time::Duration;

/// Parse `animal:1,trial:103,start,touch:participantId,...,tick:2.5`.
pub fn parse_script(script: &str) -> Result<Vec<WorkbenchEvent>> {
    script
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_event)
        .collect()
}

pub fn parse_event(token: &str) -> Result<WorkbenchEvent> {
    let (name, arg) = match token.split_once(':') {
        Some((name, arg)) => (name.trim(), Some(arg.trim())),
        None => (token, None),
    };
    let event = match (name, arg) {
        ("animal", Some(id)) => WorkbenchEvent::OpenAnimal(parse_id(id)?),
        ("trial", Some(id)) => WorkbenchEvent::OpenTrial(parse_id(id)?),
        ("add", None) => WorkbenchEvent::OpenAddAnimal,
        ("back", None) => WorkbenchEvent::Back,
        ("start", None) => WorkbenchEvent::Session(SessionEvent::StartTrial),
        ("review", None) => WorkbenchEvent::Session(SessionEvent::ReviewTrial),
        ("touch", Some(key)) => WorkbenchEvent::Session(SessionEvent::TouchField(key.into())),
        ("confirm", None) => WorkbenchEvent::Session(SessionEvent::ConfirmStart),
        ("cancel", None) => WorkbenchEvent::Session(SessionEvent::Back),
        ("toggle", None) => WorkbenchEvent::Session(SessionEvent::ToggleStatus),
        ("stop", None) => WorkbenchEvent::Session(SessionEvent::StopTrial),
        ("complete", None) => WorkbenchEvent::Session(SessionEvent::CompleteReview),
        ("tick", Some(secs)) => {
            let secs: f64 = secs
                .parse()
                .with_context(|| format!("tick expects seconds, got `{secs}`"))?;
            if !secs.is_finite() || secs < 0.0 {
                bail!("tick expects non-negative seconds, got `{secs}`");
            }
            let dt = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("tick of {secs} seconds is out of range"))?;
            WorkbenchEvent::Session(SessionEvent::Tick(dt))
        }
        _ => return Err(anyhow!("unrecognized event `{token}`")),
    };
    Ok(event)
}

fn parse_id(raw: &str) -> Result<u32> {
    raw.parse()
        .with_context(|| format!("expected a numeric id, got `{raw}`"))
}
