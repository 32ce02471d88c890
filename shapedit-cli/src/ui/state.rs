//! Editor state and key handling, kept free of terminal I/O.
//!
//! [`EditorState::handle_key`] turns a key press into a [`Command`] given a
//! [`Context`] snapshot of the session; the editor loop executes it.

use std::path::PathBuf;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use shapedit::session::Action;
use shapedit::store::{AttributeType, FeatureId, MassOperation};
use shapedit::style::{Colormap, Rgb, ZoneStyle};
use shapedit::view::PAN_STEP;

/// Zoom factor applied by `+` and (inverted) by `-`.
pub const ZOOM_STEP: f64 = 1.25;

/// Transparency change applied by `<` and `>`.
pub const OPACITY_STEP: u8 = 10;

/// Rows moved by PageUp/PageDown.
pub const PAGE_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Table,
    Map,
}

/// What a prompt's text will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Open,
    Export,
    ExportImage,
    Filter,
    EditCell { id: FeatureId, column: usize },
    AddColumn,
    MassUpdate { column: usize },
    ZoneStyle,
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Open => "Open shapefile",
            PromptKind::Export => "Export shapefile to",
            PromptKind::ExportImage => "Save map image to",
            PromptKind::Filter => "Filter (text or column:text)",
            PromptKind::EditCell { .. } => "New value",
            PromptKind::AddColumn => "New column: name type [default]",
            PromptKind::MassUpdate { .. } => "Mass update: add|subtract|multiply|divide value",
            PromptKind::ZoneStyle => "Zone style: zone #rrggbb [opacity] (no colour resets)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Prompt(Prompt),
    /// Modal message; any key dismisses it.
    Dialog { title: String, message: String },
    /// Quit requested with unsaved edits.
    ConfirmQuit,
}

/// What the editor loop should do after a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    None,
    /// Apply and report in the status line (errors open a dialog).
    Dispatch(Action),
    /// Apply and show the result in a dialog.
    Show(Action),
    Quit,
}

/// Session facts needed to interpret keys.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Ids of the rows passing the filter, in display order.
    pub row_ids: Vec<FeatureId>,
    pub columns: Vec<String>,
    pub path: Option<PathBuf>,
    pub filter: String,
    pub colormap: Colormap,
    pub transparency: u8,
    pub modified: bool,
    /// Display text of the selected cell.
    pub cell_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditorState {
    pub focus: Focus,
    pub mode: Mode,
    pub selected_row: usize,
    pub selected_column: usize,
    /// Last informational message for the status line.
    pub status: String,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            focus: Focus::Table,
            mode: Mode::Normal,
            selected_row: 0,
            selected_column: 0,
            status: "Tab switches panes, ? shows help".to_string(),
        }
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the selection inside the visible table.
    pub fn clamp_selection(&mut self, rows: usize, columns: usize) {
        self.selected_row = self.selected_row.min(rows.saturating_sub(1));
        self.selected_column = self.selected_column.min(columns.saturating_sub(1));
    }

    pub fn show_dialog(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.mode = Mode::Dialog {
            title: title.into(),
            message: message.into(),
        };
    }

    pub fn handle_key(&mut self, key: KeyEvent, ctx: &Context) -> Command {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Command::Quit;
        }
        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.normal_key(key, ctx),
            Mode::Dialog { .. } => Command::None,
            Mode::ConfirmQuit => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') => Command::Quit,
                _ => {
                    self.status = "Quit cancelled".to_string();
                    Command::None
                }
            },
            Mode::Prompt(prompt) => self.prompt_key(prompt, key, ctx),
        }
    }

    fn selected_id(&self, ctx: &Context) -> Option<FeatureId> {
        ctx.row_ids.get(self.selected_row).copied()
    }

    fn selected_column_name<'a>(&self, ctx: &'a Context) -> Option<&'a str> {
        ctx.columns.get(self.selected_column).map(String::as_str)
    }

    fn open_prompt(&mut self, kind: PromptKind, input: impl Into<String>) -> Command {
        self.mode = Mode::Prompt(Prompt {
            kind,
            input: input.into(),
        });
        Command::None
    }

    fn normal_key(&mut self, key: KeyEvent, ctx: &Context) -> Command {
        match key.code {
            KeyCode::Char('q') => {
                if ctx.modified {
                    self.mode = Mode::ConfirmQuit;
                    Command::None
                } else {
                    Command::Quit
                }
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Table => Focus::Map,
                    Focus::Map => Focus::Table,
                };
                Command::None
            }
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                self.arrow(key.code, ctx)
            }
            KeyCode::PageUp => {
                self.selected_row = self.selected_row.saturating_sub(PAGE_ROWS);
                Command::None
            }
            KeyCode::PageDown => {
                self.selected_row =
                    (self.selected_row + PAGE_ROWS).min(ctx.row_ids.len().saturating_sub(1));
                Command::None
            }
            KeyCode::Char('[') => {
                self.selected_column = self.selected_column.saturating_sub(1);
                Command::None
            }
            KeyCode::Char(']') => {
                if self.selected_column + 1 < ctx.columns.len() {
                    self.selected_column += 1;
                }
                Command::None
            }
            KeyCode::Char('+') | KeyCode::Char('=') => Command::Dispatch(Action::Zoom(ZOOM_STEP)),
            KeyCode::Char('-') => Command::Dispatch(Action::Zoom(1.0 / ZOOM_STEP)),
            KeyCode::Char('0') => Command::Dispatch(Action::ResetView),
            KeyCode::Char('/') => self.open_prompt(PromptKind::Filter, ctx.filter.clone()),
            KeyCode::Esc => Command::Dispatch(Action::ClearFilter),
            KeyCode::Char('e') | KeyCode::Enter => {
                match (self.selected_id(ctx), self.selected_column_name(ctx)) {
                    (Some(id), Some(_)) => self.open_prompt(
                        PromptKind::EditCell {
                            id,
                            column: self.selected_column,
                        },
                        ctx.cell_text.clone().unwrap_or_default(),
                    ),
                    _ => Command::None,
                }
            }
            KeyCode::Char('a') => Command::Dispatch(Action::AddRow {
                template: self.selected_id(ctx),
            }),
            KeyCode::Char('d') => match self.selected_id(ctx) {
                Some(id) => Command::Dispatch(Action::DeleteRow(id)),
                None => Command::None,
            },
            KeyCode::Char('c') => self.open_prompt(PromptKind::AddColumn, ""),
            KeyCode::Char('k') => match self.selected_column_name(ctx) {
                Some(name) => Command::Dispatch(Action::DeleteColumn(name.to_string())),
                None => Command::None,
            },
            KeyCode::Char('x') => match self.selected_column_name(ctx) {
                Some(_) => self.open_prompt(
                    PromptKind::MassUpdate {
                        column: self.selected_column,
                    },
                    "",
                ),
                None => Command::None,
            },
            KeyCode::Char('o') => self.open_prompt(PromptKind::Open, ""),
            KeyCode::Char('s') => self.open_prompt(
                PromptKind::Export,
                ctx.path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            KeyCode::Char('p') => self.open_prompt(
                PromptKind::ExportImage,
                ctx.path
                    .as_ref()
                    .map(|p| p.with_extension("png").display().to_string())
                    .unwrap_or_else(|| "map.png".to_string()),
            ),
            KeyCode::Char('m') => Command::Dispatch(Action::SetColormap(ctx.colormap.next())),
            KeyCode::Char('n') => match self.selected_column_name(ctx) {
                Some(name) => Command::Dispatch(Action::SetColorColumn(Some(name.to_string()))),
                None => Command::None,
            },
            KeyCode::Char('N') => Command::Dispatch(Action::SetColorColumn(None)),
            KeyCode::Char('<') => Command::Dispatch(Action::SetTransparency(
                ctx.transparency.saturating_sub(OPACITY_STEP),
            )),
            KeyCode::Char('>') => Command::Dispatch(Action::SetTransparency(
                ctx.transparency.saturating_add(OPACITY_STEP).min(100),
            )),
            KeyCode::Char('z') => self.open_prompt(PromptKind::ZoneStyle, ""),
            KeyCode::Char('b') => Command::Dispatch(Action::RefreshBasemap),
            KeyCode::Char('i') => Command::Show(Action::ShowStatistics),
            KeyCode::Char('?') => {
                self.show_dialog("Keys", HELP);
                Command::None
            }
            KeyCode::Char('v') => Command::Show(Action::About),
            _ => Command::None,
        }
    }

    fn arrow(&mut self, code: KeyCode, ctx: &Context) -> Command {
        if self.focus == Focus::Map {
            let (dx, dy) = match code {
                KeyCode::Left => (-PAN_STEP, 0.0),
                KeyCode::Right => (PAN_STEP, 0.0),
                KeyCode::Up => (0.0, PAN_STEP),
                _ => (0.0, -PAN_STEP),
            };
            return Command::Dispatch(Action::Pan { dx, dy });
        }
        match code {
            KeyCode::Up => self.selected_row = self.selected_row.saturating_sub(1),
            KeyCode::Down => {
                if self.selected_row + 1 < ctx.row_ids.len() {
                    self.selected_row += 1;
                }
            }
            KeyCode::Left => self.selected_column = self.selected_column.saturating_sub(1),
            _ => {
                if self.selected_column + 1 < ctx.columns.len() {
                    self.selected_column += 1;
                }
            }
        }
        Command::None
    }

    fn prompt_key(&mut self, mut prompt: Prompt, key: KeyEvent, ctx: &Context) -> Command {
        match key.code {
            KeyCode::Esc => Command::None,
            KeyCode::Enter => match submit(&prompt, ctx) {
                Ok(command) => command,
                Err(message) => {
                    self.show_dialog("Invalid input", message);
                    Command::None
                }
            },
            KeyCode::Backspace => {
                prompt.input.pop();
                self.mode = Mode::Prompt(prompt);
                Command::None
            }
            KeyCode::Char(c) => {
                prompt.input.push(c);
                self.mode = Mode::Prompt(prompt);
                Command::None
            }
            _ => {
                self.mode = Mode::Prompt(prompt);
                Command::None
            }
        }
    }
}

/// Turns submitted prompt text into a command.
fn submit(prompt: &Prompt, ctx: &Context) -> Result<Command, String> {
    let input = prompt.input.trim();
    let column_name = |index: usize| {
        ctx.columns
            .get(index)
            .cloned()
            .ok_or_else(|| "The selected column no longer exists".to_string())
    };
    let path = || {
        if input.is_empty() {
            Err("A file path is required".to_string())
        } else {
            Ok(PathBuf::from(input))
        }
    };

    let action = match prompt.kind {
        PromptKind::Open => Action::Open(path()?),
        PromptKind::Export => Action::Export(path()?),
        PromptKind::ExportImage => Action::ExportImage(path()?),
        PromptKind::Filter if input.is_empty() => Action::ClearFilter,
        PromptKind::Filter => Action::SetFilter(input.to_string()),
        PromptKind::EditCell { id, column } => Action::EditCell {
            id,
            column: column_name(column)?,
            // Text cells keep their spacing.
            text: prompt.input.clone(),
        },
        PromptKind::AddColumn => {
            let mut parts = input.splitn(3, char::is_whitespace);
            let name = parts.next().filter(|s| !s.is_empty()).ok_or("A column name is required")?;
            let label = parts.next().unwrap_or("text");
            let kind = AttributeType::from_label(label).ok_or_else(|| {
                format!(
                    "Unknown type '{}' (text, number, float, double, currency, integer, logical or date)",
                    label
                )
            })?;
            Action::AddColumn {
                name: name.to_string(),
                kind,
                default: parts.next().unwrap_or("").trim().to_string(),
            }
        }
        PromptKind::MassUpdate { column } => {
            let mut parts = input.split_whitespace();
            let operation = parts
                .next()
                .ok_or("An operation is required")
                .and_then(|op| MassOperation::from_str(op).map_err(|_| "Unknown operation"))
                .map_err(|e| e.to_string())?;
            let operand = parts
                .next()
                .and_then(|v| v.parse::<f64>().ok())
                .ok_or("A numeric value is required")?;
            Action::MassUpdate {
                columns: vec![column_name(column)?],
                operation,
                operand,
            }
        }
        PromptKind::ZoneStyle => {
            let mut parts = input.split_whitespace();
            let zone = parts.next().ok_or("A zone value is required")?.to_string();
            let style = match parts.next() {
                None => None,
                Some(color) => {
                    let color = Rgb::from_str(color).map_err(|e| e.to_string())?;
                    let opacity = match parts.next() {
                        Some(v) => v
                            .parse::<u8>()
                            .map_err(|_| format!("'{}' is not an opacity percent", v))?,
                        None => 100,
                    };
                    Some(ZoneStyle { color, opacity })
                }
            };
            Action::SetZoneStyle { zone, style }
        }
    };
    Ok(Command::Dispatch(action))
}

pub const HELP: &str = "\
Tab        switch between table and map
Arrows     move selection (table) or pan (map)
+ - 0      zoom in, zoom out, reset view
/  Esc     filter rows, clear filter
e  Enter   edit cell
a  d       add row (copies geometry), delete row
c  k       add column, delete selected column
x          mass update selected column
[  ]       previous / next column
n  N       colour by selected column, single colour
m          next colormap
<  >       less / more opacity
z          zone colour override
b          reload basemap
o  s  p    open, export shapefile, save map image
i  v       statistics, about
q          quit";
