use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::graph::model::NodeId;
use crate::scene::palette::Rgb;
use crate::scene::reconciler::{NODE_HEIGHT, NODE_WIDTH, Scene};
use crate::scene::viewport::Viewport;
use crate::tui::centered_rect;

const LINK_COLOR: Color = Color::Gray;
/// Below this many columns per box the affordance glyphs are hidden.
const MIN_COLS_FOR_AFFORDANCES: i32 = 12;

#[derive(Debug)]
pub struct CanvasRenderData<'a> {
    pub scene: &'a Scene,
    pub viewport: Viewport,
    pub focused: Option<&'a NodeId>,
    pub dragging: Option<&'a NodeId>,
    pub focused_title: &'a str,
    pub focused_level: Option<u32>,
    /// Current layout energy, `None` once settled.
    pub layout_alpha: Option<f64>,
    pub mode_label: &'a str,
    pub hints: &'a str,
    pub message: Option<&'a str>,
    pub show_help: bool,
    pub demo: bool,
}

fn split(area: Rect) -> (Rect, Rect) {
    let [canvas_outer, status_area] =
        Layout::vertical([Constraint::Min(6), Constraint::Length(4)]).areas(area);
    (canvas_outer, status_area)
}

fn canvas_block(title: Line<'_>) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
}

/// Cells available to the diagram inside a frame of `area`.
pub fn canvas_area(area: Rect) -> Rect {
    let (outer, _) = split(area);
    canvas_block(Line::default()).inner(outer)
}

pub fn draw(frame: &mut Frame, data: &CanvasRenderData<'_>) {
    let (canvas_outer, status_area) = split(frame.area());

    let mut title_spans = vec![
        Span::styled("mindmap view", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled("[?] help", Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled("[q] quit", Style::default().fg(Color::DarkGray)),
    ];
    if data.demo {
        title_spans.push(Span::raw("  "));
        title_spans.push(Span::styled(
            "[DEMO]",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let block = canvas_block(Line::from(title_spans));
    let area = block.inner(canvas_outer);
    frame.render_widget(block, canvas_outer);

    draw_links(frame, area, data);
    draw_nodes(frame.buffer_mut(), area, data);

    let layout_state = match data.layout_alpha {
        Some(alpha) => format!("settling ({alpha:.3})"),
        None => "settled".to_string(),
    };
    let level = data
        .focused_level
        .map(|l| l.to_string())
        .unwrap_or_else(|| "-".to_string());
    let top_status = format!(
        "FOCUSED: {}   level: {}   nodes: {}  links: {}   layout: {}   palette: {}",
        data.focused_title,
        level,
        data.scene.nodes().len(),
        data.scene.links().len(),
        layout_state,
        data.scene.palette().name()
    );
    let mut hint_line = data.hints.to_string();
    if let Some(msg) = data.message {
        hint_line.push_str("   ");
        hint_line.push_str(msg);
    }
    let status = Paragraph::new(vec![
        Line::from(Span::styled(
            top_status,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            hint_line,
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Line::from(Span::styled(
                data.mode_label,
                Style::default().fg(Color::DarkGray),
            )))
            .padding(Padding::new(1, 1, 0, 0)),
    );
    frame.render_widget(status, status_area);

    if data.show_help {
        render_help_overlay(frame);
    }
}

fn draw_links(frame: &mut Frame, area: Rect, data: &CanvasRenderData<'_>) {
    let vp = data.viewport;
    let (w, h) = vp.world_size(area.width, area.height);
    let o = vp.origin;
    // Canvas y grows upward; world y grows downward.
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([o.x, o.x + w])
        .y_bounds([-(o.y + h), -o.y])
        .paint(|ctx| {
            for link in data.scene.links() {
                ctx.draw(&CanvasLine::new(
                    link.from.x,
                    -link.from.y,
                    link.to.x,
                    -link.to.y,
                    LINK_COLOR,
                ));
            }
        });
    frame.render_widget(canvas, area);
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

fn draw_nodes(buf: &mut Buffer, area: Rect, data: &CanvasRenderData<'_>) {
    let vp = data.viewport;
    let box_cols = (NODE_WIDTH / vp.units_per_col()).round().max(1.0) as i32;
    let box_rows = (NODE_HEIGHT / vp.units_per_row()).round().max(1.0) as i32;

    for el in data.scene.nodes() {
        let (c, r) = vp.to_screen(el.position);
        let (col, row) = (c.floor() as i32, r.floor() as i32);
        let fill = to_color(el.fill);
        let dragging = data.dragging == Some(&el.node);
        let focused = data.focused == Some(&el.node);

        let box_style = Style::default().bg(fill).fg(Color::White);
        for dy in 0..box_rows {
            for dx in 0..box_cols {
                put_str(buf, area, col + dx, row + dy, " ", box_style, col + box_cols);
            }
        }

        let mut label_style = box_style;
        if focused {
            label_style = label_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        if dragging {
            label_style = label_style.fg(Color::Yellow);
        }
        let (lc, lr) = vp.to_screen(el.label_origin());
        let label_row = (lr.floor() as i32).clamp(row, row + box_rows - 1);
        let show_affordances = box_cols >= MIN_COLS_FOR_AFFORDANCES;
        let label_end = if show_affordances {
            col + box_cols - el.affordances.len() as i32
        } else {
            col + box_cols
        };
        put_str(buf, area, lc.floor() as i32, label_row, &el.label, label_style, label_end);

        if show_affordances {
            let glyph_style = box_style.add_modifier(Modifier::BOLD);
            for affordance in &el.affordances {
                let at = el.position.offset(affordance.offset.x, affordance.offset.y);
                let (ac, ar) = vp.to_screen(at);
                put_str(
                    buf,
                    area,
                    ac.floor() as i32,
                    ar.floor() as i32,
                    &affordance.kind.glyph().to_string(),
                    glyph_style,
                    col + box_cols,
                );
            }
        }
    }
}

/// Write `text` starting at (`col`, `row`), clipped to `area` and to columns
/// before `end_col`.
fn put_str(
    buf: &mut Buffer,
    area: Rect,
    col: i32,
    row: i32,
    text: &str,
    style: Style,
    end_col: i32,
) {
    let top = i32::from(area.y);
    let bottom = i32::from(area.y + area.height);
    if row < top || row >= bottom {
        return;
    }
    let left = i32::from(area.x);
    let right = i32::from(area.x + area.width).min(end_col);
    let mut x = col;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0) as i32;
        if x + w > right {
            break;
        }
        if x >= left
            && let Some(cell) = buf.cell_mut((x as u16, row as u16))
        {
            cell.set_char(ch).set_style(style);
            if w == 2
                && let Some(next) = buf.cell_mut(((x + 1) as u16, row as u16))
            {
                next.set_symbol("").set_style(style);
            }
        }
        x += w;
    }
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(frame.area(), 72, 70);
    frame.render_widget(Clear, area);
    let help = Paragraph::new(vec![
        Line::from("NODES"),
        Line::from("  Tab focus next node      a add child      e edit label"),
        Line::from("  d delete (children move up to the parent)"),
        Line::from("  click + ✎ ✕ on a box for the same actions"),
        Line::from(""),
        Line::from("CANVAS"),
        Line::from("  drag a box to pin it while held, drag empty space to pan"),
        Line::from("  arrows pan   +/- or scroll zoom   0 recenter"),
        Line::from(""),
        Line::from("MAP"),
        Line::from("  C clear   x export PNG/SVG   p palette   s settings"),
        Line::from(""),
        Line::from("Esc/Backspace backs out one step."),
    ])
    .block(Block::default().title("Help").borders(Borders::ALL));
    frame.render_widget(help, area);
}
