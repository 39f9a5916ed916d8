use crate::app::{App, DeviceField, FormField, Tab};
use crate::input::TextField;
use gaitlab_core::{
    checklist,
    review::{ReviewReport, ReviewTab},
    AnimalStatus, RunStatus, Screen, SlideDirection, TrialStatus, TrialStep,
};
use gaitlab_device::BannerKind;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Gauge, List, ListItem, ListState, Paragraph, Row, Sparkline, Table,
        Tabs, Wrap,
    },
    Frame,
};
use std::borrow::Cow;
use std::time::Duration;

pub fn draw(f: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());
    draw_tabs(f, layout[0], app);
    match app.tab {
        Tab::Lab => draw_lab(f, layout[1], app),
        Tab::Device => draw_device(f, layout[1], app),
    }
    draw_status(f, layout[2], app);
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Tab::all().iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL).title("GaitLab"));
    f.render_widget(tabs, area);
}

fn animal_status_color(status: AnimalStatus) -> Color {
    match status {
        AnimalStatus::Active => Color::Green,
        AnimalStatus::Rest => Color::Blue,
        AnimalStatus::PreOp => Color::Yellow,
        AnimalStatus::PostOp => Color::Magenta,
        AnimalStatus::Euthanized => Color::DarkGray,
    }
}

fn trial_status_color(status: TrialStatus) -> Color {
    match status {
        TrialStatus::Pending => Color::Yellow,
        TrialStatus::InProgress => Color::Cyan,
        TrialStatus::Completed => Color::Green,
        TrialStatus::Analyzed => Color::Blue,
    }
}

fn hint<'a>(text: impl Into<Cow<'a, str>>) -> Span<'a> {
    Span::styled(text, Style::default().fg(Color::DarkGray))
}

fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn draw_lab(f: &mut Frame, area: Rect, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    let stack: Vec<Span> = app
        .workbench
        .nav()
        .directions()
        .iter()
        .flat_map(|(screen, direction)| {
            let span = match direction {
                SlideDirection::Active => Span::styled(
                    format!("● {}", screen.title()),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                SlideDirection::Above => Span::raw(format!("▲ {}", screen.title())),
                SlideDirection::Below => hint(screen.title()),
            };
            [span, Span::raw("  ")]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(stack)), layout[0]);
    match app.active_screen() {
        Screen::AnimalsList => draw_animals_list(f, layout[1], app),
        Screen::AddAnimal => draw_add_animal(f, layout[1], app),
        Screen::AnimalDetail => draw_animal_detail(f, layout[1], app),
        Screen::TrialControl => draw_trial_control(f, layout[1], app),
    }
}

fn draw_animals_list(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .workbench
        .store()
        .animals()
        .iter()
        .map(|animal| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<14}", animal.name),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "{:<14}{:<10}{:<10}",
                    animal.species, animal.age, animal.weight
                )),
                Span::styled(
                    animal.status.label(),
                    Style::default().fg(animal_status_color(animal.status)),
                ),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Animals (Enter: open, a: add)"),
        )
        .highlight_style(Style::default().fg(Color::Yellow))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.animal_cursor));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_add_animal(f: &mut Frame, area: Rect, app: &App) {
    let mut constraints: Vec<Constraint> = FormField::all()
        .iter()
        .map(|_| Constraint::Length(3))
        .collect();
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    for (idx, field) in FormField::all().into_iter().enumerate() {
        let focused = app.form.focus == Some(field);
        match app.form.field(field) {
            Some(input) => render_input(f, rows[idx], field.label(), input, focused),
            None => {
                let options: Vec<Span> = AnimalStatus::selectable()
                    .into_iter()
                    .map(|status| {
                        let style = if status == app.form.status {
                            Style::default()
                                .fg(animal_status_color(status))
                                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                        } else {
                            Style::default()
                        };
                        Span::styled(format!(" {} ", status.label()), style)
                    })
                    .collect();
                let style = if focused {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(style)
                    .title(field.label());
                f.render_widget(Paragraph::new(Line::from(options)).block(block), rows[idx]);
            }
        }
    }
    let save = if app.form.draft().is_valid() {
        Span::styled("Enter: Save Animal", Style::default().fg(Color::Green))
    } else {
        hint("Save Animal (fill in every field)")
    };
    let lines = vec![
        Line::from(save),
        Line::from(hint("Tab/↑/↓: move between fields, Space: toggle status, Esc: cancel")),
    ];
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Add New Animal"));
    f.render_widget(paragraph, rows[FormField::all().len()]);
}

fn draw_animal_detail(f: &mut Frame, area: Rect, app: &App) {
    let Some(animal) = app.workbench.nav().selected_animal() else {
        return;
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);
    let info = vec![
        Line::from(format!("Species: {}", animal.species)),
        Line::from(format!("Age: {}", animal.age)),
        Line::from(format!("Weight: {}", animal.weight)),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(
                animal.status.label(),
                Style::default().fg(animal_status_color(animal.status)),
            ),
        ]),
        Line::from(hint("Enter: open trial, Esc: back to animals")),
    ];
    let info = Paragraph::new(info).block(
        Block::default()
            .borders(Borders::ALL)
            .title(animal.name.as_str()),
    );
    f.render_widget(info, layout[0]);

    let items: Vec<ListItem> = app
        .workbench
        .store()
        .trials_for(animal.id)
        .iter()
        .map(|trial| {
            ListItem::new(Line::from(vec![
                Span::raw(format!(
                    "{} #{:<6}{:<12}{:<9}",
                    trial.name, trial.id, trial.date, trial.duration
                )),
                Span::styled(
                    trial.status.label(),
                    Style::default().fg(trial_status_color(trial.status)),
                ),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Trials"))
        .highlight_style(Style::default().fg(Color::Yellow))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.trial_cursor));
    f.render_stateful_widget(list, layout[1], &mut state);
}

fn draw_trial_control(f: &mut Frame, area: Rect, app: &App) {
    let nav = app.workbench.nav();
    let (Some(animal), Some(trial), Some(session)) = (
        nav.selected_animal(),
        nav.selected_trial(),
        app.workbench.session(),
    ) else {
        return;
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);
    let header = vec![
        Line::from(format!(
            "{} · {} #{} · {} · {}",
            animal.name, trial.name, trial.id, trial.date, trial.duration
        )),
        Line::from(vec![
            Span::styled(
                trial.status.label(),
                Style::default().fg(trial_status_color(trial.status)),
            ),
            Span::raw(format!("  step: {}", session.step().title())),
        ]),
    ];
    f.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("Trial Control")),
        layout[0],
    );

    let body = layout[1];
    match session.step() {
        TrialStep::Ready => {
            let action = if trial.is_completed() {
                "r: Review Trial"
            } else {
                "s: Start Trial"
            };
            let lines = vec![
                Line::from("Ready to begin."),
                Line::from(""),
                Line::from(Span::styled(action, Style::default().fg(Color::Green))),
                Line::from(hint("Esc: back to animal")),
            ];
            f.render_widget(
                Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Ready")),
                body,
            );
        }
        TrialStep::Confirmation => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(3)])
                .split(body);
            let gate = session.gate();
            let items: Vec<ListItem> = checklist(animal, trial)
                .into_iter()
                .map(|item| {
                    let touched = gate.is_touched(item.key);
                    let mark = if touched { "[x]" } else { "[ ]" };
                    let style = if touched {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default()
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{mark} {:<26}", item.label), style),
                        Span::raw(item.value),
                    ]))
                })
                .collect();
            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Confirm trial details (Space: touch, Esc: cancel)"),
                )
                .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                .highlight_symbol("> ");
            let mut state = ListState::default().with_selected(Some(app.checklist_cursor));
            f.render_stateful_widget(list, rows[0], &mut state);
            let style = if gate.is_complete() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let confirm = Paragraph::new(Span::styled(
                format!("Enter: {}", gate.confirm_label()),
                style,
            ))
            .block(Block::default().borders(Borders::ALL));
            f.render_widget(confirm, rows[1]);
        }
        TrialStep::Running => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(6), Constraint::Length(3), Constraint::Min(0)])
                .split(body);
            let color = match session.run_status() {
                RunStatus::Running => Color::Green,
                RunStatus::Paused => Color::Yellow,
                RunStatus::Stopped | RunStatus::Completed => Color::DarkGray,
            };
            let lines = vec![
                Line::from(Span::styled(
                    session.run_status().caption(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("Elapsed {}", format_clock(session.elapsed()))),
                Line::from(""),
                Line::from(hint(format!(
                    "Space: {}, s: Stop Trial",
                    session.run_status().toggle_label()
                ))),
            ];
            f.render_widget(
                Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL).title("Recording")),
                rows[0],
            );
            if let Some(progress) = session.progress(trial.expected_duration()) {
                let gauge = Gauge::default()
                    .block(Block::default().borders(Borders::ALL).title("Progress"))
                    .gauge_style(Style::default().fg(color))
                    .ratio(progress)
                    .label(format!("{:.0}%", progress * 100.0));
                f.render_widget(gauge, rows[1]);
            }
        }
        TrialStep::Review => draw_review(f, body, app),
    }
}

fn draw_review(f: &mut Frame, area: Rect, app: &App) {
    let Some(report) = &app.report else {
        f.render_widget(Paragraph::new("No results"), area);
        return;
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);
    let titles: Vec<Line> = ReviewTab::all()
        .iter()
        .map(|t| Line::from(t.title()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.review_tab.index())
        .highlight_style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Trial Results (←/→, e: export, Enter: done)"),
        );
    f.render_widget(tabs, layout[0]);
    match app.review_tab {
        ReviewTab::Overview => draw_review_overview(f, layout[1], report),
        ReviewTab::Performance => draw_review_performance(f, layout[1], report),
        ReviewTab::Analysis => draw_review_analysis(f, layout[1], report),
        ReviewTab::Notes => {
            let mut lines = Vec::new();
            for note in &report.notes {
                lines.push(Line::from(Span::styled(
                    note.heading.as_str(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(note.body.as_str()));
                lines.push(Line::from(""));
            }
            let paragraph = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Notes"));
            f.render_widget(paragraph, layout[1]);
        }
    }
}

fn draw_review_overview(f: &mut Frame, area: Rect, report: &ReviewReport) {
    let summary = &report.summary;
    let mut lines = vec![
        Line::from(format!(
            "Duration {}s · {} strides",
            summary.duration_s, summary.total_strides
        )),
        Line::from(format!(
            "Avg velocity {:.2} m/s · stride {:.1} cm · cadence {:.0} steps/min",
            summary.avg_velocity_mps, summary.avg_stride_length_cm, summary.avg_cadence_spm
        )),
        Line::from(format!("Symmetry index {:.1}%", summary.symmetry_index_pct)),
        Line::from(""),
    ];
    for insight in &report.insights {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}: ", insight.heading),
                Style::default().fg(Color::Green),
            ),
            Span::raw(insight.body.as_str()),
        ]));
    }
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Overview"));
    f.render_widget(paragraph, area);
}

fn draw_review_performance(f: &mut Frame, area: Rect, report: &ReviewReport) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);
    let velocity: Vec<u64> = report
        .samples
        .iter()
        .map(|s| (s.velocity_mps * 100.0).round() as u64)
        .collect();
    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title("Velocity"))
        .style(Style::default().fg(Color::Cyan))
        .data(&velocity);
    f.render_widget(sparkline, layout[0]);
    let rows: Vec<Row> = report
        .samples
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(format!("{}s", s.time_s)),
                Cell::from(format!("{:.1}", s.stride_length_cm)),
                Cell::from(format!("{:.2}", s.velocity_mps)),
                Cell::from(format!("{:.0}", s.cadence_spm)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new(vec!["Time", "Stride cm", "Vel m/s", "Cadence"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Gait samples"));
    f.render_widget(table, layout[1]);
}

fn draw_review_analysis(f: &mut Frame, area: Rect, report: &ReviewReport) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let rows: Vec<Row> = report
        .limbs
        .iter()
        .map(|limb| {
            Row::new(vec![
                Cell::from(limb.limb.as_str()),
                Cell::from(format!("{:.0}%", limb.symmetry_pct)),
                Cell::from(format!("{:.2}s", limb.ground_contact_s)),
                Cell::from(format!("{:.2}", limb.swing_phase)),
                Cell::from(format!("{:.0}cm", limb.step_length_cm)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec!["Limb", "Symmetry", "Contact", "Swing", "Step"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Limb analysis"));
    f.render_widget(table, layout[0]);

    let mut lines = vec![Line::from(Span::styled(
        "Temporal",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.extend(
        report
            .temporal
            .iter()
            .map(|m| Line::from(format!("{}: {}", m.label, m.display()))),
    );
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Spatial",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.extend(
        report
            .spatial
            .iter()
            .map(|m| Line::from(format!("{}: {}", m.label, m.display()))),
    );
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Parameters"));
    f.render_widget(paragraph, layout[1]);
}

fn draw_device(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(columns[0]);

    let title = if app.device.is_loading() {
        "Device status (loading…)"
    } else {
        "Device status"
    };
    let status_lines = match app.device.status() {
        Some(status) => vec![
            Line::from(format!(
                "Device ID: {}",
                status.device_id.as_deref().unwrap_or("unknown")
            )),
            Line::from(format!("Name: {}", status.display_name())),
            Line::from(format!(
                "Stream FPS: {}",
                status
                    .stream_fps
                    .map(|fps| fps.to_string())
                    .unwrap_or_else(|| "-".into())
            )),
            Line::from(format!(
                "Enabled: {}",
                if status.enabled.unwrap_or(false) { "yes" } else { "no" }
            )),
            Line::from(format!(
                "Camera: {}",
                status.camera_endpoint.as_deref().unwrap_or("-")
            )),
            Line::from(format!("Uptime: {}", status.uptime())),
        ],
        None => vec![Line::from("Waiting for the first status…")],
    };
    f.render_widget(
        Paragraph::new(status_lines).block(Block::default().borders(Borders::ALL).title(title)),
        left[0],
    );

    for (idx, field) in [DeviceField::Name, DeviceField::Fps, DeviceField::Endpoint]
        .into_iter()
        .enumerate()
    {
        render_input(
            f,
            left[idx + 1],
            field.label(),
            app.device_form.field(field),
            app.device_form.focus == Some(field),
        );
    }
    let actions = vec![
        Line::from(format!(
            "Enabled: {} (e: toggle)",
            if app.device_form.enabled { "yes" } else { "no" }
        )),
        Line::from(hint("Tab: edit fields · r: refresh · l: logs · n: rename")),
        Line::from(hint("s: start trial · x: stop trial · f: files · R: restart")),
    ];
    f.render_widget(
        Paragraph::new(actions)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Actions")),
        left[4],
    );

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(columns[1]);
    if let Some(banner) = app.device.banner() {
        let color = match banner.kind {
            BannerKind::Error => Color::Red,
            BannerKind::Success => Color::Green,
        };
        let paragraph = Paragraph::new(Span::styled(
            banner.message.as_str(),
            Style::default().fg(color),
        ))
        .block(Block::default().borders(Borders::ALL).title("d: dismiss"));
        f.render_widget(paragraph, right[0]);
    }
    let logs: Vec<ListItem> = app
        .device
        .logs()
        .iter()
        .map(|entry| ListItem::new(entry.line()))
        .collect();
    f.render_widget(
        List::new(logs).block(Block::default().borders(Borders::ALL).title("Logs")),
        right[1],
    );
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let status = Paragraph::new(app.status.as_str())
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(status, area);
}

fn render_input(f: &mut Frame, area: Rect, label: &str, field: &TextField, focused: bool) {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(field.value.as_str())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(label));
    f.render_widget(paragraph, area);
    if focused {
        let cursor_x = area.x + 1 + field.cursor_column() as u16;
        let cursor_y = area.y + 1;
        f.set_cursor(cursor_x.min(area.right().saturating_sub(1)), cursor_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_secs(754)), "12:34");
    }
}
