use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use tracing::{debug, info, trace, warn};

use crate::diagram::Diagram;
use crate::export;
use crate::graph::model::{NodeId, Point};
use crate::layout::simulation::viewport_center;
use crate::logging::{self, LogTarget};
use crate::parser::config::{self, Config};
use crate::persistence::{FileStorage, LinkRecord, MapState, MemoryStorage, NodeRecord, Storage};
use crate::scene::reconciler::{AffordanceKind, Hit};
use crate::scene::viewport::{CELL_HEIGHT, CELL_WIDTH, Viewport, ZOOM_STEP};
use crate::tui::centered_rect;
use crate::tui::input::{self, Action, Direction};
use crate::tui::render::{self, CanvasRenderData};
use crate::tui::settings::{self, SettingsEvent, SettingsPanelState};
use crate::workspace;

const IDLE_POLL: Duration = Duration::from_millis(200);
const PAN_COLS: f64 = 6.0;
const PAN_ROWS: f64 = 2.0;
/// Canvas size assumed until the first frame is drawn.
const INITIAL_CANVAS: Rect = Rect {
    x: 1,
    y: 1,
    width: 78,
    height: 24,
};

#[derive(Debug, Clone)]
enum PendingTextKind {
    AddChild { parent: NodeId },
    EditContent { node: NodeId },
    ExportPath,
}

#[derive(Debug, Clone)]
struct PendingText {
    title: String,
    buffer: String,
    cursor: usize,
    kind: PendingTextKind,
}

#[derive(Debug, Clone)]
enum PendingConfirm {
    RemoveNode { node: NodeId },
    Clear,
}

/// What the held left mouse button is doing.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    /// `grab` is the pointer's offset from the node's top-left corner.
    DragNode { grab: Point },
    Pan { col: u16, row: u16 },
}

#[derive(Debug)]
pub struct AppState<S: Storage> {
    diagram: Diagram<S>,
    config: Config,
    config_path: Option<PathBuf>,
    root_dir: Option<PathBuf>,
    viewport: Viewport,
    canvas: Rect,
    focused: Option<NodeId>,
    hovered: Option<NodeId>,
    show_help: bool,
    show_settings: bool,
    settings_state: SettingsPanelState,
    status_message: Option<String>,
    pending_text: Option<PendingText>,
    pending_confirm: Option<PendingConfirm>,
    gesture: Option<Gesture>,
    demo: bool,
}

impl AppState<FileStorage> {
    pub fn load_workspace(open_settings: bool) -> Result<Self> {
        let root = workspace::find_root()?;
        let config_path = workspace::config_path(&root);
        let cfg = config::load(&config_path)?;
        logging::init(LogTarget::File(workspace::log_path(&root)), &cfg.log_level)?;

        let storage = FileStorage::new(workspace::map_path(&root));
        let (diagram, report) = Diagram::open(
            storage,
            cfg.layout(),
            cfg.palette,
            canvas_center(INITIAL_CANVAS),
        )?;
        info!(root = %root.display(), nodes = diagram.store().node_count(), "opened map");

        let mut app = Self::with_diagram(diagram, cfg, open_settings, false);
        app.config_path = Some(config_path);
        app.root_dir = Some(root);
        if !report.is_clean() {
            app.status_message = Some(format!(
                "repaired on load: dropped {} node(s), {} link(s)",
                report.dropped_nodes, report.dropped_links
            ));
        }
        Ok(app)
    }
}

impl AppState<MemoryStorage> {
    pub fn demo(open_settings: bool) -> Result<Self> {
        let cfg = Config::default();
        let (diagram, _) = Diagram::open(
            MemoryStorage::with_state(demo_map()),
            cfg.layout(),
            cfg.palette,
            canvas_center(INITIAL_CANVAS),
        )?;
        let mut app = Self::with_diagram(diagram, cfg, open_settings, true);
        app.status_message = Some("demo mode: changes are in-memory only".to_string());
        Ok(app)
    }
}

impl<S: Storage> AppState<S> {
    pub fn diagram(&self) -> &Diagram<S> {
        &self.diagram
    }

    pub fn root_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }

    fn with_diagram(diagram: Diagram<S>, config: Config, open_settings: bool, demo: bool) -> Self {
        let focused = Some(diagram.store().root().id().clone());
        Self {
            diagram,
            config,
            config_path: None,
            root_dir: None,
            viewport: Viewport::default(),
            canvas: INITIAL_CANVAS,
            focused,
            hovered: None,
            show_help: false,
            show_settings: open_settings,
            settings_state: SettingsPanelState::default(),
            status_message: None,
            pending_text: None,
            pending_confirm: None,
            gesture: None,
            demo,
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.set_canvas(render::canvas_area(frame.area()));

        let store = self.diagram.store();
        let shown = self
            .hovered
            .as_ref()
            .or(self.focused.as_ref())
            .and_then(|id| store.node(id));
        let focused_title = shown.map(|n| n.content()).unwrap_or("—");
        let focused_level = shown.map(|n| n.level());
        let simulation = self.diagram.simulation();
        let layout_alpha = simulation.is_active().then(|| simulation.alpha());
        let hints = self.hints();

        let data = CanvasRenderData {
            scene: self.diagram.scene(),
            viewport: self.viewport,
            focused: self.focused.as_ref(),
            dragging: self.diagram.dragging(),
            focused_title,
            focused_level,
            layout_alpha,
            mode_label: self.mode_label(),
            hints: &hints,
            message: self.status_message.as_deref(),
            show_help: self.show_help,
            demo: self.demo,
        };
        render::draw(frame, &data);

        if self.show_settings {
            settings::draw(frame, &self.settings_state, &self.config);
        }
        if let Some(prompt) = &self.pending_text {
            draw_text_prompt(frame, prompt);
        } else if let Some(confirm) = &self.pending_confirm {
            self.draw_confirm_prompt(frame, confirm);
        }
    }

    fn draw_confirm_prompt(&self, frame: &mut Frame, confirm: &PendingConfirm) {
        let area = centered_rect(frame.area(), 56, 22);
        frame.render_widget(Clear, area);
        let (text, detail) = match confirm {
            PendingConfirm::RemoveNode { node } => {
                let content = self
                    .diagram
                    .store()
                    .node(node)
                    .map(|n| n.content().to_string())
                    .unwrap_or_default();
                let children = self.diagram.store().children_of(node).count();
                (
                    format!("Remove '{content}'?"),
                    match children {
                        0 => String::new(),
                        1 => "Its child moves up to its parent.".to_string(),
                        n => format!("Its {n} children move up to its parent."),
                    },
                )
            }
            PendingConfirm::Clear => (
                "Clear the whole map?".to_string(),
                "Only a fresh root will remain.".to_string(),
            ),
        };
        let paragraph = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("  ", Style::default()),
                Span::styled(text, Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("  {detail}"),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("  ", Style::default()),
                Span::styled(
                    "[y/Enter]",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    "[n/Esc/Backspace]",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" no", Style::default().fg(Color::DarkGray)),
            ]),
        ])
        .block(
            Block::default()
                .title(" confirm ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(paragraph, area);
    }

    fn mode_label(&self) -> &'static str {
        if self.show_settings {
            "Settings"
        } else if self.pending_text.is_some() {
            "Editing"
        } else if self.pending_confirm.is_some() {
            "Confirming"
        } else if matches!(self.gesture, Some(Gesture::DragNode { .. })) {
            "Dragging"
        } else if matches!(self.gesture, Some(Gesture::Pan { .. })) {
            "Panning"
        } else {
            "Normal"
        }
    }

    fn hints(&self) -> String {
        if self.show_settings {
            return "[j/k or arrows] select  [h/l or Enter] change  [Esc/Backspace] close"
                .to_string();
        }
        if self.pending_text.is_some() {
            return "type text, [Backspace] delete, [Enter] apply, [Esc] cancel".to_string();
        }
        if self.pending_confirm.is_some() {
            return "[y] confirm  [n/Esc/Backspace] cancel".to_string();
        }
        "[Tab] focus  [a] add  [e] edit  [d] delete  [x] export  [p] palette  [s] setup  [q] quit"
            .to_string()
    }

    fn is_animating(&self) -> bool {
        self.diagram.simulation().is_active()
    }

    fn tick(&mut self) {
        if let Some(tick) = self.diagram.tick() {
            trace!(index = tick.index, alpha = tick.alpha, moved = tick.moved, "tick");
        }
    }

    /// Track the canvas size; a new size moves the layout's center with it.
    fn set_canvas(&mut self, area: Rect) {
        if area == self.canvas {
            return;
        }
        debug!(width = area.width, height = area.height, "canvas resized");
        self.canvas = area;
        self.diagram.set_center(canvas_center(area));
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        self.status_message = None;

        if self.show_settings {
            let event = settings::handle_key(key, &mut self.settings_state, &mut self.config);
            match event {
                SettingsEvent::Recolored => {
                    self.diagram.set_palette(self.config.palette);
                    self.persist_config();
                }
                SettingsEvent::Relayout => {
                    self.diagram.set_layout(self.config.layout());
                    self.persist_config();
                }
                SettingsEvent::Changed => self.persist_config(),
                SettingsEvent::Close => self.show_settings = false,
                SettingsEvent::None => {}
            }
            return Ok(false);
        }

        if self.pending_confirm.is_some() {
            return self.handle_confirm_key(key);
        }

        let text_mode = self.pending_text.is_some();
        let action = input::action_for_key(key, text_mode);
        if text_mode {
            return self.handle_text_action(action);
        }

        match action {
            Action::Quit => return Ok(true),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::Cancel => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.hovered = None;
                }
            }
            Action::NextNode => self.cycle_focus(),
            Action::AddChild => {
                let parent = self.focused_or_root();
                self.start_add_child_prompt(parent);
            }
            Action::EditNode => {
                let node = self.focused_or_root();
                self.start_edit_prompt(node);
            }
            Action::DeleteNode => {
                if let Some(node) = self.focused.clone() {
                    self.request_remove(node);
                }
            }
            Action::ClearMap => {
                if self.config.confirm_clear {
                    self.pending_confirm = Some(PendingConfirm::Clear);
                } else {
                    self.clear_map();
                }
            }
            Action::Export => self.start_export_prompt(),
            Action::CyclePalette => {
                self.config.palette = self.config.palette.next();
                self.diagram.set_palette(self.config.palette);
                self.persist_config();
                if self.status_message.is_none() {
                    self.status_message =
                        Some(format!("palette: {}", self.config.palette.name()));
                }
            }
            Action::OpenSettings => self.show_settings = true,
            Action::Pan(direction) => {
                let (dc, dr) = match direction {
                    Direction::Up => (0.0, -PAN_ROWS),
                    Direction::Down => (0.0, PAN_ROWS),
                    Direction::Left => (-PAN_COLS, 0.0),
                    Direction::Right => (PAN_COLS, 0.0),
                };
                self.viewport.pan_cells(dc, dr);
            }
            Action::ZoomIn => self.zoom_at_middle(ZOOM_STEP),
            Action::ZoomOut => self.zoom_at_middle(1.0 / ZOOM_STEP),
            Action::Recenter => self.recenter(),
            Action::SubmitText
            | Action::Backspace
            | Action::CursorLeft
            | Action::CursorRight
            | Action::InputChar(_)
            | Action::Noop => {}
        }
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(confirm) = self.pending_confirm.take() {
                    match confirm {
                        PendingConfirm::RemoveNode { node } => self.remove_node(&node),
                        PendingConfirm::Clear => self.clear_map(),
                    }
                }
            }
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.pending_confirm = None;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_text_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::SubmitText => {
                if let Some(prompt) = self.pending_text.take() {
                    self.apply_text_prompt(prompt);
                }
            }
            Action::Cancel => self.pending_text = None,
            Action::Backspace => {
                if let Some(prompt) = &mut self.pending_text
                    && prompt.cursor > 0
                {
                    let from = byte_index_for_cursor(&prompt.buffer, prompt.cursor - 1);
                    let to = byte_index_for_cursor(&prompt.buffer, prompt.cursor);
                    prompt.buffer.replace_range(from..to, "");
                    prompt.cursor -= 1;
                }
            }
            Action::InputChar(c) => {
                if let Some(prompt) = &mut self.pending_text {
                    let at = byte_index_for_cursor(&prompt.buffer, prompt.cursor);
                    prompt.buffer.insert(at, c);
                    prompt.cursor += 1;
                }
            }
            Action::CursorLeft => {
                if let Some(prompt) = &mut self.pending_text {
                    prompt.cursor = prompt.cursor.saturating_sub(1);
                }
            }
            Action::CursorRight => {
                if let Some(prompt) = &mut self.pending_text {
                    let max = prompt.buffer.chars().count();
                    prompt.cursor = (prompt.cursor + 1).min(max);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn apply_text_prompt(&mut self, prompt: PendingText) {
        match prompt.kind {
            PendingTextKind::AddChild { parent } => {
                // Blank content adds nothing and says nothing.
                if let Some(child) = self.diagram.add_child(&parent, &prompt.buffer) {
                    self.focused = Some(child);
                    self.status_message = Some("node added".to_string());
                }
            }
            PendingTextKind::EditContent { node } => {
                if self.diagram.edit_content(&node, &prompt.buffer) {
                    self.status_message = Some("node updated".to_string());
                }
            }
            PendingTextKind::ExportPath => {
                let raw = prompt.buffer.trim();
                if raw.is_empty() {
                    return;
                }
                let path = self.resolve_path(Path::new(raw));
                self.status_message = Some(match export::export(self.diagram.scene(), &path) {
                    Ok(format) => format!("exported {} to {}", format.name(), path.display()),
                    Err(err) => format!("export failed: {err:#}"),
                });
                return;
            }
        }
        self.report_save_error();
    }

    fn start_add_child_prompt(&mut self, parent: NodeId) {
        let Some(node) = self.diagram.store().node(&parent) else {
            return;
        };
        self.pending_text = Some(PendingText {
            title: format!("New child of '{}':", node.content()),
            buffer: String::new(),
            cursor: 0,
            kind: PendingTextKind::AddChild { parent },
        });
    }

    fn start_edit_prompt(&mut self, id: NodeId) {
        let Some(node) = self.diagram.store().node(&id) else {
            return;
        };
        let content = node.content().to_string();
        self.pending_text = Some(PendingText {
            title: "Edit node content:".to_string(),
            cursor: content.chars().count(),
            buffer: content,
            kind: PendingTextKind::EditContent { node: id },
        });
    }

    fn start_export_prompt(&mut self) {
        let default = match &self.root_dir {
            Some(root) => workspace::default_export_path(root),
            None => PathBuf::from("mindmap.png"),
        };
        let buffer = default.display().to_string();
        self.pending_text = Some(PendingText {
            title: "Export to (.png or .svg):".to_string(),
            cursor: buffer.chars().count(),
            buffer,
            kind: PendingTextKind::ExportPath,
        });
    }

    fn request_remove(&mut self, node: NodeId) {
        let is_root = self
            .diagram
            .store()
            .node(&node)
            .is_some_and(|n| n.is_root());
        if self.config.confirm_remove && !is_root {
            self.pending_confirm = Some(PendingConfirm::RemoveNode { node });
        } else {
            self.remove_node(&node);
        }
    }

    fn remove_node(&mut self, node: &NodeId) {
        match self.diagram.remove_node(node) {
            Ok(removal) => {
                if self.focused.as_ref() == Some(node) {
                    self.focused = Some(removal.new_parent.clone());
                }
                if self.hovered.as_ref() == Some(node) {
                    self.hovered = None;
                }
                if matches!(self.gesture, Some(Gesture::DragNode { .. })) {
                    self.end_gesture();
                }
                self.status_message = Some(match removal.reparented.len() {
                    0 => format!("removed '{}'", removal.removed.content()),
                    n => format!(
                        "removed '{}'; {n} child node(s) moved up",
                        removal.removed.content()
                    ),
                });
                self.report_save_error();
            }
            Err(err) => {
                warn!(node = %node, error = %err, "remove rejected");
                self.status_message = Some(err.to_string());
            }
        }
    }

    fn clear_map(&mut self) {
        self.diagram.clear();
        self.focused = Some(self.diagram.store().root().id().clone());
        self.hovered = None;
        self.gesture = None;
        self.status_message = Some("map cleared".to_string());
        self.report_save_error();
    }

    fn report_save_error(&mut self) {
        if let Some(err) = self.diagram.last_save_error() {
            self.status_message = Some(format!("save failed: {err}"));
        }
    }

    fn focused_or_root(&self) -> NodeId {
        self.focused
            .clone()
            .filter(|id| self.diagram.store().contains(id))
            .unwrap_or_else(|| self.diagram.store().root().id().clone())
    }

    fn cycle_focus(&mut self) {
        let nodes = self.diagram.store().nodes();
        if nodes.is_empty() {
            return;
        }
        let next = self
            .focused
            .as_ref()
            .and_then(|id| nodes.iter().position(|n| n.id() == id))
            .map(|idx| (idx + 1) % nodes.len())
            .unwrap_or(0);
        self.focused = Some(nodes[next].id().clone());
    }

    fn zoom_at_middle(&mut self, factor: f64) {
        let col = f64::from(self.canvas.width) / 2.0;
        let row = f64::from(self.canvas.height) / 2.0;
        self.viewport.zoom_at(factor, col, row);
    }

    /// Back to zoom 1 with the whole map centered.
    fn recenter(&mut self) {
        self.viewport = Viewport::default();
        if let Some((min, max)) = self.diagram.scene().bounds() {
            let middle = Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
            self.viewport
                .center_on(middle, self.canvas.width, self.canvas.height);
        }
    }

    /// Canvas-relative cell for a terminal position, if it is on the canvas.
    fn canvas_cell(&self, column: u16, row: u16) -> Option<(u16, u16)> {
        let c = self.canvas;
        let inside = column >= c.x && column < c.x + c.width && row >= c.y && row < c.y + c.height;
        inside.then(|| (column - c.x, row - c.y))
    }

    fn world_at(&self, col: u16, row: u16) -> Point {
        self.viewport
            .to_world(f64::from(col) + 0.5, f64::from(row) + 0.5)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        // A release always ends the gesture, even if a modal opened mid-drag.
        if mouse.kind == MouseEventKind::Up(MouseButton::Left) {
            self.end_gesture();
            return;
        }
        if self.show_settings || self.pending_text.is_some() || self.pending_confirm.is_some() {
            return;
        }
        let cell = self.canvas_cell(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some((col, row)) = cell else {
                    return;
                };
                self.status_message = None;
                let at = self.world_at(col, row);
                match self.diagram.scene().hit_test(at) {
                    Some(Hit::Affordance(node, kind)) => {
                        self.focused = Some(node.clone());
                        match kind {
                            AffordanceKind::AddChild => self.start_add_child_prompt(node),
                            AffordanceKind::Edit => self.start_edit_prompt(node),
                            AffordanceKind::Delete => self.request_remove(node),
                        }
                    }
                    Some(Hit::Node(node)) => {
                        let Some(origin) = self.diagram.store().node(&node).map(|n| n.position())
                        else {
                            return;
                        };
                        if self.diagram.drag_start(&node) {
                            self.gesture = Some(Gesture::DragNode {
                                grab: Point::new(at.x - origin.x, at.y - origin.y),
                            });
                        }
                        self.focused = Some(node);
                    }
                    None => self.gesture = Some(Gesture::Pan { col, row }),
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let c = self.canvas;
                let col = mouse.column.saturating_sub(c.x);
                let row = mouse.row.saturating_sub(c.y);
                match self.gesture {
                    Some(Gesture::DragNode { grab }) => {
                        let at = self.world_at(col, row);
                        self.diagram
                            .drag_move(Point::new(at.x - grab.x, at.y - grab.y));
                    }
                    Some(Gesture::Pan {
                        col: last_col,
                        row: last_row,
                    }) => {
                        self.viewport.pan_cells(
                            f64::from(last_col) - f64::from(col),
                            f64::from(last_row) - f64::from(row),
                        );
                        self.gesture = Some(Gesture::Pan { col, row });
                    }
                    None => {}
                }
            }
            MouseEventKind::Moved => {
                self.hovered = cell.and_then(|(col, row)| {
                    match self.diagram.scene().hit_test(self.world_at(col, row))? {
                        Hit::Node(id) | Hit::Affordance(id, _) => Some(id),
                    }
                });
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let Some((col, row)) = cell else {
                    return;
                };
                let factor = if mouse.kind == MouseEventKind::ScrollUp {
                    ZOOM_STEP
                } else {
                    1.0 / ZOOM_STEP
                };
                self.viewport
                    .zoom_at(factor, f64::from(col) + 0.5, f64::from(row) + 0.5);
            }
            _ => {}
        }
    }

    fn end_gesture(&mut self) {
        if let Some(Gesture::DragNode { .. }) = self.gesture.take() {
            self.diagram.drag_end();
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.root_dir {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn persist_config(&mut self) {
        if self.demo {
            return;
        }
        if let Some(path) = &self.config_path
            && let Err(err) = config::save(path, &self.config)
        {
            warn!(error = %err, "failed to save config");
            self.status_message = Some(format!("config not saved: {err:#}"));
        }
    }
}

/// Layout center for a canvas of `area`'s size at zoom 1.
fn canvas_center(area: Rect) -> Point {
    viewport_center(
        f64::from(area.width) * CELL_WIDTH,
        f64::from(area.height) * CELL_HEIGHT,
    )
}

/// Runs the canvas until the user quits and hands the final state back.
pub fn run_app<S: Storage>(mut app: AppState<S>) -> Result<AppState<S>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let frame = Duration::from_millis(app.config.frame_ms);
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| app.draw(f))?;
        let timeout = if app.is_animating() {
            frame.saturating_sub(last_tick.elapsed())
        } else {
            IDLE_POLL
        };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if matches!(key.kind, KeyEventKind::Release | KeyEventKind::Repeat) {
                        continue;
                    }
                    if app.handle_key(key)? {
                        break;
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }
        if last_tick.elapsed() >= frame {
            app.tick();
            last_tick = Instant::now();
        }
    }

    info!("closing canvas");
    Ok(app)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableMouseCapture, LeaveAlternateScreen);
    }
}

fn draw_text_prompt(frame: &mut Frame, prompt: &PendingText) {
    let area = centered_rect(frame.area(), 70, 28);
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            prompt.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        line_with_cursor(
            &prompt.buffer,
            prompt.cursor,
            Style::default().fg(Color::White),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        ),
        Line::from(""),
        Line::from(Span::styled(
            "Backspace deletes char. Enter applies, Esc cancels.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(Block::default().title("Input").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn line_with_cursor(text: &str, cursor: usize, text_style: Style, caret_style: Style) -> Line<'static> {
    let split = byte_index_for_cursor(text, cursor.min(text.chars().count()));
    let (left, right) = text.split_at(split);
    let mut spans = Vec::new();
    if !left.is_empty() {
        spans.push(Span::styled(left.to_string(), text_style));
    }
    spans.push(Span::styled("▌", caret_style));
    if !right.is_empty() {
        spans.push(Span::styled(right.to_string(), text_style));
    }
    Line::from(spans)
}

fn byte_index_for_cursor(text: &str, cursor: usize) -> usize {
    text.char_indices()
        .nth(cursor)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

fn demo_map() -> MapState {
    let entries: [(&str, &str, Option<&str>); 9] = [
        ("demo-root", "Mind map", None),
        ("demo-tree", "Tree store", Some("demo-root")),
        ("demo-layout", "Force layout", Some("demo-root")),
        ("demo-scene", "Scene", Some("demo-root")),
        ("demo-ids", "Stable ids", Some("demo-tree")),
        ("demo-levels", "Levels", Some("demo-tree")),
        ("demo-charge", "Charge", Some("demo-layout")),
        ("demo-collide", "Collide", Some("demo-layout")),
        ("demo-palette", "Palette", Some("demo-scene")),
    ];
    let level_of = |mut parent: Option<&str>| {
        let mut level = 0;
        while let Some(p) = parent {
            level += 1;
            parent = entries.iter().find(|(id, _, _)| *id == p).and_then(|e| e.2);
        }
        level
    };

    let mut state = MapState::default();
    for (id, content, parent) in entries {
        state.nodes.push(NodeRecord {
            id: NodeId::from(id),
            content: content.to_string(),
            level: level_of(parent),
            x: None,
            y: None,
        });
        if let Some(parent) = parent {
            state.links.push(LinkRecord {
                source: NodeId::from(parent),
                target: NodeId::from(id),
            });
        }
    }
    state
}
