//! Terminal mind-map outliner
//!
//! A crossterm + ratatui front end for `mindmap-core`: the document is shown as an indented
//! outline, normal-mode keys go through the Vim-style key sequence parser, `:` opens a command
//! line, and insert mode edits the selected node's text.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p mindmap-tui -- plan.json
//! ```
//!
//! A missing file starts from a small sample map and is created on save.
//!
//! # Logging
//!
//! The terminal belongs to the UI, so logs go to a file:
//!
//! ```bash
//! MINDMAP_LOG=/tmp/mindmap.log MINDMAP_LOG_FILTER=mindmap_core=trace cargo run -p mindmap-tui -- plan.json
//! ```
//!
//! # Keys
//!
//! - h/j/k/l or arrows: move (with counts, e.g. `3j`)
//! - dd yy p za zz u U o a i A ?: built-in commands
//! - `:`: command line (Tab completes, Enter runs, Esc cancels)
//! - Insert mode: type, Backspace, Left/Right, Enter or Esc to finish
//! - Ctrl+S: save
//! - Ctrl+Q: quit

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use mindmap_core::{
    CommandRegistry, CommandResult, CursorPlacement, EditorHandlers, EditorSession, KeyOutcome,
    KeySequence, MindMap, Mode, Node, execute_line, register_builtin_commands,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::{
    env, fs,
    io::{self, stdout},
    path::PathBuf,
    process,
    sync::Mutex,
    time::Duration,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use unicode_segmentation::UnicodeSegmentation;

const LOG_PATH_VAR: &str = "MINDMAP_LOG";
const LOG_FILTER_VAR: &str = "MINDMAP_LOG_FILTER";
const DEFAULT_LOG_FILTER: &str = "mindmap_core=debug,mindmap_tui=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    /// Keys go to the key sequence parser.
    Normal,
    /// Typing a `:` command.
    CommandLine,
    /// Editing node text.
    Insert,
}

/// One visible outline row.
struct OutlineRow {
    id: String,
    depth: usize,
    text: String,
    has_children: bool,
    collapsed: bool,
    has_note: bool,
}

fn outline_rows(roots: &[Node]) -> Vec<OutlineRow> {
    fn walk(nodes: &[Node], depth: usize, rows: &mut Vec<OutlineRow>) {
        for node in nodes {
            rows.push(OutlineRow {
                id: node.id.clone(),
                depth,
                text: node.text.clone(),
                has_children: node.has_children(),
                collapsed: node.collapsed,
                has_note: node.note.is_some(),
            });
            if !node.collapsed {
                walk(&node.children, depth + 1, rows);
            }
        }
    }

    let mut rows = Vec::new();
    walk(roots, 0, &mut rows);
    rows
}

fn sample_map() -> MindMap {
    let roots = vec![
        Node::new("root", "Mind map")
            .with_child(
                Node::new("keys", "Keys")
                    .at(200.0, 0.0)
                    .with_child(Node::new("keys-move", "h j k l to move").at(400.0, 0.0))
                    .with_child(Node::new("keys-edit", "i / A to edit").at(400.0, 60.0)),
            )
            .with_child(
                Node::new("cmds", "Commands")
                    .at(200.0, 180.0)
                    .with_child(Node::new("cmds-help", ":help lists them").at(400.0, 180.0)),
            ),
    ];
    // Sample ids are unique; fall back to an empty map rather than panic.
    MindMap::new(roots).unwrap_or_default()
}

/// Application state
struct App {
    session: EditorSession,
    registry: CommandRegistry,
    keys: KeySequence,
    file_path: PathBuf,
    should_quit: bool,
    /// Quit requested with unsaved changes.
    confirm_quit: bool,
    status_message: String,
    /// Multi-line command output (help, palette), shown until the next key.
    output: Option<String>,
    input_mode: InputMode,
    command_buffer: String,
    edit_buffer: String,
    /// Byte offset into `edit_buffer`, always on a grapheme boundary.
    edit_cursor: usize,
    scroll_top: usize,
}

impl App {
    fn new(file_path: PathBuf) -> io::Result<Self> {
        let map = if file_path.exists() {
            let content = fs::read_to_string(&file_path)?;
            serde_json::from_str::<MindMap>(&content)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?
        } else {
            sample_map()
        };
        info!(path = %file_path.display(), nodes = map.len(), "document loaded");

        let mut session = EditorSession::from_map(map);
        session.subscribe(|change| {
            debug!(
                change = ?change.change_type,
                version = change.new_version,
                "session changed"
            );
        });

        let mut registry = CommandRegistry::new();
        for err in register_builtin_commands(&mut registry) {
            warn!(error = %err, "built-in command skipped");
        }

        let first_root = session.map().roots().first().map(|root| root.id.clone());
        if let Some(id) = first_root {
            if let Err(err) = session.select_node(Some(id.as_str())) {
                warn!(node = %id, error = %err, "initial selection failed");
            }
        }

        Ok(Self {
            session,
            registry,
            keys: KeySequence::default(),
            file_path,
            should_quit: false,
            confirm_quit: false,
            status_message: String::new(),
            output: None,
            input_mode: InputMode::Normal,
            command_buffer: String::new(),
            edit_buffer: String::new(),
            edit_cursor: 0,
            scroll_top: 0,
        })
    }

    fn save_file(&mut self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self.session.map())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(&self.file_path, json)?;
        self.session.mark_saved();
        info!(path = %self.file_path.display(), "document saved");
        Ok(())
    }

    fn run_line(&mut self, line: &str) {
        let result = execute_line(&self.registry, &mut self.session, line);
        self.show_result(line, result);
        self.sync_insert_mode();
    }

    fn show_result(&mut self, line: &str, result: CommandResult) {
        match (result.success, result.message, result.error) {
            (true, Some(message), _) if message.contains('\n') => {
                self.status_message.clear();
                self.output = Some(message);
            }
            (true, Some(message), _) => self.status_message = message,
            (true, None, _) => self.status_message.clear(),
            (false, _, error) => {
                self.status_message = format!("{line}: {}", error.unwrap_or_default());
            }
        }
    }

    /// Enter text editing if the last command started an edit.
    fn sync_insert_mode(&mut self) {
        if self.session.mode() != Mode::Insert {
            return;
        }
        let Some(editing) = self.session.editing().cloned() else {
            return;
        };
        self.edit_buffer = self
            .session
            .map()
            .find(&editing.node_id)
            .map(|node| node.text.clone())
            .unwrap_or_default();
        self.edit_cursor = match editing.cursor {
            CursorPlacement::Start => 0,
            CursorPlacement::End => self.edit_buffer.len(),
        };
        self.input_mode = InputMode::Insert;
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.output = None;

        if self.confirm_quit {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => match self.save_file() {
                    Ok(()) => self.should_quit = true,
                    Err(err) => {
                        self.status_message = format!("Save failed: {err}");
                        self.confirm_quit = false;
                    }
                },
                KeyCode::Char('n') | KeyCode::Char('N') => self.should_quit = true,
                KeyCode::Esc => {
                    self.confirm_quit = false;
                    self.status_message.clear();
                }
                _ => {}
            }
            return;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
                match self.save_file() {
                    Ok(()) => {
                        self.status_message = format!("Saved {}", self.file_path.display());
                    }
                    Err(err) => self.status_message = format!("Save failed: {err}"),
                }
                return;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
                if self.session.is_modified() {
                    self.confirm_quit = true;
                    self.status_message = "Unsaved changes. Save before quitting? (y/n/Esc)".into();
                } else {
                    self.should_quit = true;
                }
                return;
            }
            _ => {}
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::CommandLine => self.handle_command_line_key(key),
            InputMode::Insert => self.handle_insert_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let line = match key.code {
            KeyCode::Left => Some("left".to_string()),
            KeyCode::Right => Some("right".to_string()),
            KeyCode::Up => Some("up".to_string()),
            KeyCode::Down => Some("down".to_string()),
            KeyCode::Enter => Some("append".to_string()),
            KeyCode::Esc => {
                self.keys.reset();
                self.status_message.clear();
                None
            }
            KeyCode::Char(ch) => match self.keys.push(ch) {
                KeyOutcome::Pending => None,
                KeyOutcome::Command(line) => Some(line),
                KeyOutcome::CommandLine => {
                    self.input_mode = InputMode::CommandLine;
                    self.command_buffer.clear();
                    None
                }
                KeyOutcome::Unbound(keys) => {
                    self.status_message = format!("Unbound keys: {keys}");
                    None
                }
            },
            _ => None,
        };

        if let Some(line) = line {
            self.keys.reset();
            self.run_line(&line);
        }
    }

    fn handle_command_line_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.command_buffer.clear();
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                let line = std::mem::take(&mut self.command_buffer);
                if !line.trim().is_empty() {
                    self.run_line(&line);
                }
            }
            KeyCode::Tab => {
                if let Some(completed) = self.registry.complete(&self.command_buffer) {
                    self.command_buffer = completed;
                }
            }
            KeyCode::Backspace => {
                if self.command_buffer.pop().is_none() {
                    self.input_mode = InputMode::Normal;
                }
            }
            KeyCode::Char(ch) => self.command_buffer.push(ch),
            _ => {}
        }
    }

    fn handle_insert_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                let text = std::mem::take(&mut self.edit_buffer);
                if let Err(err) = self.session.finish_edit(Some(text)) {
                    self.status_message = err.to_string();
                }
                self.edit_cursor = 0;
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                if let Some(start) = self.previous_boundary() {
                    self.edit_buffer.replace_range(start..self.edit_cursor, "");
                    self.edit_cursor = start;
                }
            }
            KeyCode::Delete => {
                if let Some(end) = self.next_boundary() {
                    self.edit_buffer.replace_range(self.edit_cursor..end, "");
                }
            }
            KeyCode::Left => {
                if let Some(start) = self.previous_boundary() {
                    self.edit_cursor = start;
                }
            }
            KeyCode::Right => {
                if let Some(end) = self.next_boundary() {
                    self.edit_cursor = end;
                }
            }
            KeyCode::Home => self.edit_cursor = 0,
            KeyCode::End => self.edit_cursor = self.edit_buffer.len(),
            KeyCode::Char(ch) => {
                self.edit_buffer.insert(self.edit_cursor, ch);
                self.edit_cursor += ch.len_utf8();
            }
            _ => {}
        }
    }

    fn previous_boundary(&self) -> Option<usize> {
        self.edit_buffer[..self.edit_cursor]
            .grapheme_indices(true)
            .next_back()
            .map(|(index, _)| index)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.edit_buffer[self.edit_cursor..]
            .graphemes(true)
            .next()
            .map(|grapheme| self.edit_cursor + grapheme.len())
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // outline
                Constraint::Length(1), // status line
                Constraint::Length(1), // command line / shortcuts
            ])
            .split(frame.area());

        self.render_outline(frame, chunks[0]);
        self.render_status_line(frame, chunks[1]);
        self.render_bottom_line(frame, chunks[2]);
        if let Some(output) = &self.output {
            render_output(frame, chunks[0], output);
        }
    }

    fn render_outline(&mut self, frame: &mut Frame, area: Rect) {
        let rows = outline_rows(self.session.map().roots());
        let height = area.height.saturating_sub(2) as usize;
        let selected = self.session.selected().map(str::to_string);
        let selected_row = rows
            .iter()
            .position(|row| Some(&row.id) == selected.as_ref());

        if let Some(row) = selected_row {
            if row < self.scroll_top {
                self.scroll_top = row;
            } else if height > 0 && row >= self.scroll_top + height {
                self.scroll_top = row + 1 - height;
            }
        }

        let mut cursor = None;
        let lines: Vec<Line> = rows
            .iter()
            .enumerate()
            .skip(self.scroll_top)
            .take(height)
            .map(|(index, row)| {
                let marker = match (row.has_children, row.collapsed) {
                    (false, _) => "  ",
                    (true, true) => "▸ ",
                    (true, false) => "▾ ",
                };
                let indent = "  ".repeat(row.depth);
                let is_selected = Some(index) == selected_row;
                let editing = is_selected && self.input_mode == InputMode::Insert;
                let text = if editing {
                    self.edit_buffer.clone()
                } else {
                    row.text.clone()
                };

                let prefix = Span::raw(format!("{indent}{marker}"));
                if editing {
                    let before = Span::raw(self.edit_buffer[..self.edit_cursor].to_string());
                    cursor = Some((
                        area.x + 1 + (prefix.width() + before.width()) as u16,
                        area.y + 1 + (index - self.scroll_top) as u16,
                    ));
                }

                let style = if is_selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let mut spans = vec![prefix, Span::styled(text, style)];
                if row.has_note {
                    spans.push(Span::styled(" ✎", Style::default().fg(Color::Yellow)));
                }
                Line::from(spans)
            })
            .collect();

        let title = format!(" {} ", self.file_path.display());
        let outline = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(outline, area);

        if let Some(position) = cursor {
            frame.set_cursor_position(position);
        }
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let mode = match self.input_mode {
            InputMode::CommandLine => "COMMAND",
            InputMode::Insert => "INSERT",
            InputMode::Normal => "NORMAL",
        };
        let modified = if self.session.is_modified() { " [+]" } else { "" };
        let pending = self.keys.pending();

        let status_text = if !self.status_message.is_empty() {
            format!(" {mode} | {}", self.status_message)
        } else {
            format!(
                " {mode}{modified} | nodes:{} | version:{} {pending}",
                self.session.map().len(),
                self.session.version()
            )
        };

        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, area);
    }

    fn render_bottom_line(&self, frame: &mut Frame, area: Rect) {
        if self.input_mode == InputMode::CommandLine {
            let prompt = format!(":{}", self.command_buffer);
            let width = Span::raw(prompt.as_str()).width() as u16;
            frame.render_widget(Paragraph::new(prompt.as_str()), area);
            frame.set_cursor_position((area.x + width, area.y));
            return;
        }

        let shortcuts = if self.confirm_quit {
            "Y:save and quit  N:quit without saving  Esc:cancel"
        } else {
            "hjkl:move  dd:delete  o/a:add  i/A:edit  za:fold  u/U:undo/redo  ::command  ?:help  Ctrl-S:save  Ctrl-Q:quit"
        };
        let shortcuts_line =
            Paragraph::new(shortcuts).style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_widget(shortcuts_line, area);
    }
}

fn render_output(frame: &mut Frame, area: Rect, output: &str) {
    let height = (output.lines().count() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + 2,
        y: area.y + area.height.saturating_sub(height),
        width: area.width.saturating_sub(4),
        height,
    };
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(output)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" output ")),
        popup,
    );
}

fn init_logging() -> io::Result<()> {
    let Ok(path) = env::var(LOG_PATH_VAR) else {
        return Ok(());
    };
    let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env(LOG_FILTER_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <map.json>", args[0]);
        eprintln!("\nExample:");
        eprintln!("  {} plan.json", args[0]);
        process::exit(1);
    }

    init_logging()?;
    let mut app = App::new(PathBuf::from(&args[1]))?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key_event(key);
            }
        }
    }

    Ok(())
}
