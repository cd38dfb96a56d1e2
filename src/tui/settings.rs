use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};

use crate::parser::config::Config;
use crate::scene::palette::Palette;
use crate::tui::centered_rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    None,
    /// Only the palette changed.
    Recolored,
    /// Force parameters changed; the layout needs rebuilding.
    Relayout,
    Changed,
    Close,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPanelState {
    pub selected_row: usize,
}

const SETTINGS_ROW_COUNT: usize = 6;
const DISTANCE_STEP: f64 = 10.0;
const CHARGE_STEP: f64 = 10.0;
const RADIUS_STEP: f64 = 5.0;

pub fn handle_key(
    key: KeyEvent,
    state: &mut SettingsPanelState,
    config: &mut Config,
) -> SettingsEvent {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => SettingsEvent::Close,
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected_row = state.selected_row.saturating_sub(1);
            SettingsEvent::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected_row = (state.selected_row + 1).min(SETTINGS_ROW_COUNT - 1);
            SettingsEvent::None
        }
        KeyCode::Left | KeyCode::Char('h') => adjust(config, state.selected_row, -1),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
            adjust(config, state.selected_row, 1)
        }
        _ => SettingsEvent::None,
    }
}

pub fn draw(frame: &mut Frame, state: &SettingsPanelState, config: &Config) {
    let area = centered_rect(frame.area(), 56, 50);
    frame.render_widget(Clear, area);

    let title = Line::from(vec![
        Span::styled(
            "Setup",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("[Esc] close", Style::default().fg(Color::Gray)),
    ]);

    let selected = state.selected_row.min(SETTINGS_ROW_COUNT - 1);
    let mut lines = vec![
        value_row(selected == 0, "palette", config.palette.name().to_string()),
        value_row(
            selected == 1,
            "link distance",
            format!("{}", config.link_distance),
        ),
        value_row(selected == 2, "charge", format!("{}", config.charge)),
        value_row(
            selected == 3,
            "collide radius",
            format!("{}", config.collide_radius),
        ),
        toggle_row(selected == 4, "confirm remove", config.confirm_remove),
        toggle_row(selected == 5, "confirm clear", config.confirm_clear),
        Line::from(""),
        Line::from(Span::styled(
            "About this option",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    for text in selected_row_description(selected) {
        lines.push(Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "Use arrows/hjkl to change, Enter/Space to step forward.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Changes write to config immediately.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .padding(Padding::new(1, 1, 1, 0)),
    );
    frame.render_widget(panel, area);
}

fn row_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn value_row(selected: bool, key: &str, value: String) -> Line<'static> {
    let indicator = if selected { ">" } else { " " };
    let mut value_style = Style::default()
        .fg(Color::LightCyan)
        .add_modifier(Modifier::BOLD);
    if selected {
        value_style = value_style.bg(Color::DarkGray);
    }
    Line::from(vec![
        Span::styled(format!("{indicator} {key:<24}"), row_style(selected)),
        Span::styled(format!("< {value} >"), value_style),
    ])
}

fn toggle_row(selected: bool, key: &str, enabled: bool) -> Line<'static> {
    let indicator = if selected { ">" } else { " " };
    let value_text = if enabled { "[ON]" } else { "[OFF]" };
    let mut value_style = if enabled {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::LightRed)
    };
    value_style = value_style.add_modifier(Modifier::BOLD);
    if selected {
        value_style = value_style.bg(Color::DarkGray);
    }

    Line::from(vec![
        Span::styled(format!("{indicator} {key:<24}"), row_style(selected)),
        Span::styled(value_text, value_style),
    ])
}

fn selected_row_description(selected_row: usize) -> [&'static str; 2] {
    match selected_row {
        0 => [
            "Color ramp for node boxes. The root takes the",
            "darkest shade and deeper levels get lighter.",
        ],
        1 => [
            "Length the layout aims for between a node",
            "and its parent.",
        ],
        2 => [
            "How strongly every node pushes the others away.",
            "More negative spreads the map further.",
        ],
        3 => [
            "Minimum clearance kept around each node box.",
            "",
        ],
        4 => [
            "Ask before deleting a node. Its children always",
            "move up to the deleted node's parent.",
        ],
        5 => ["Ask before clearing the whole map.", ""],
        _ => ["", ""],
    }
}

fn step_palette(palette: Palette, delta: i32) -> Palette {
    if delta >= 0 {
        return palette.next();
    }
    let all = Palette::ALL;
    let idx = all.iter().position(|p| *p == palette).unwrap_or(0);
    all[(idx + all.len() - 1) % all.len()]
}

fn adjust(config: &mut Config, selected_row: usize, delta: i32) -> SettingsEvent {
    let d = f64::from(delta);
    match selected_row {
        0 => {
            config.palette = step_palette(config.palette, delta);
            SettingsEvent::Recolored
        }
        1 => {
            config.link_distance = (config.link_distance + d * DISTANCE_STEP).max(DISTANCE_STEP);
            SettingsEvent::Relayout
        }
        2 => {
            config.charge = (config.charge + d * CHARGE_STEP).min(0.0);
            SettingsEvent::Relayout
        }
        3 => {
            config.collide_radius = (config.collide_radius + d * RADIUS_STEP).max(0.0);
            SettingsEvent::Relayout
        }
        4 => {
            config.confirm_remove = !config.confirm_remove;
            SettingsEvent::Changed
        }
        5 => {
            config.confirm_clear = !config.confirm_clear;
            SettingsEvent::Changed
        }
        _ => SettingsEvent::None,
    }
}
