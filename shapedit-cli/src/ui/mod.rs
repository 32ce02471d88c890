//! Interactive terminal editor.
//!
//! The map pane shows the session canvas; the table pane shows the filtered
//! attribute rows. Keys become session actions via [`state::EditorState`].

mod map;
mod render;
mod state;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, text::Line, Terminal};
use shapedit::session::{Action, Notice};
use shapedit::style::{ColorScale, Rgb};
use shapedit::table::AttributeTableView;
use tracing::{debug, warn};

use crate::runner::EditorSession;
use render::{Panes, Screen};
use state::{Command, Context, EditorState};

/// Event poll interval; also how often finished basemaps are picked up.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Legend entries shown under the map.
const LEGEND_ENTRIES: usize = 8;

/// Half-block lines for one canvas render at one pane size.
struct MapCells {
    render_count: u64,
    size: (u16, u16),
    lines: Vec<Line<'static>>,
}

pub struct Editor {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    session: EditorSession,
    state: EditorState,
    map: Option<MapCells>,
    restored: bool,
}

impl Editor {
    /// Takes over the terminal.
    pub fn new(session: EditorSession) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            session,
            state: EditorState::new(),
            map: None,
            restored: false,
        })
    }

    /// Restore terminal to normal state.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Runs until the user quits.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            if let Some(notice) = self.session.poll_basemap() {
                self.report(notice);
            }

            let ctx = self.context();
            self.draw(&ctx)?;

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match self.state.handle_key(key, &ctx) {
                Command::None => {}
                Command::Quit => return Ok(()),
                Command::Dispatch(action) => {
                    let opens = matches!(action, Action::Open(_));
                    let notice = self.session.handle(action);
                    if opens && !notice.is_error() {
                        self.state.selected_row = 0;
                        self.state.selected_column = 0;
                    }
                    self.report(notice);
                }
                Command::Show(action) => {
                    let title = match action {
                        Action::ShowStatistics => "Statistics",
                        _ => "About",
                    };
                    match self.session.handle(action) {
                        Notice::Info(message) => self.state.show_dialog(title, message),
                        notice => self.report(notice),
                    }
                }
            }
        }
    }

    fn report(&mut self, notice: Notice) {
        match notice {
            Notice::Info(message) => {
                debug!(message = %message, "Status");
                self.state.status = message;
            }
            Notice::Error { title, message } => {
                warn!(title, message = %message, "Action failed");
                self.state.status = format!("{} ({})", title, message);
                self.state.show_dialog(title, message);
            }
        }
    }

    /// Snapshot of the session for key handling.
    fn context(&mut self) -> Context {
        let row_ids: Vec<_> = self
            .session
            .rows()
            .map(|rows| rows.map(|row| row.id).collect())
            .unwrap_or_default();
        let columns: Vec<String> = self
            .session
            .collection()
            .map(|c| {
                AttributeTableView::columns(c)
                    .into_iter()
                    .map(|(name, _)| name)
                    .collect()
            })
            .unwrap_or_default();
        self.state.clamp_selection(row_ids.len(), columns.len());

        let cell_text = self.session.rows().and_then(|mut rows| {
            rows.nth(self.state.selected_row)
                .and_then(|row| row.cells.get(self.state.selected_column).map(|v| v.to_string()))
        });
        let style = self.session.style().cloned().unwrap_or_default();

        Context {
            row_ids,
            columns,
            path: self.session.path().map(|p| p.to_path_buf()),
            filter: self
                .session
                .table()
                .map(|t| t.filter().to_string())
                .unwrap_or_default(),
            colormap: style.colormap,
            transparency: style.transparency,
            modified: self.session.is_modified(),
            cell_text,
        }
    }

    /// Resamples the canvas when it or the pane changed.
    fn refresh_map(&mut self, pane: Rect) {
        let size = (pane.width, pane.height);
        if self.session.render().is_err() {
            self.map = None;
            return;
        }
        let render_count = self.session.render_count();
        if let Some(cells) = &self.map {
            if cells.render_count == render_count && cells.size == size {
                return;
            }
        }
        // Cached by the session, so this does not re-render.
        let Ok(pixmap) = self.session.render() else {
            return;
        };
        let lines = map::half_blocks(pixmap.data(), pixmap.width(), pixmap.height(), size.0, size.1);
        self.map = Some(MapCells {
            render_count,
            size,
            lines,
        });
    }

    fn draw(&mut self, ctx: &Context) -> io::Result<()> {
        let size = self.terminal.size()?;
        let panes = Panes::new(Rect::new(0, 0, size.width, size.height));
        self.refresh_map(panes.map_inner());

        // Table window that keeps the selection visible.
        let visible = panes.table.height.saturating_sub(3) as usize;
        let offset = self
            .state
            .selected_row
            .saturating_sub(visible.saturating_sub(1));
        let rows: Vec<(String, Vec<String>)> = self
            .session
            .rows()
            .map(|rows| {
                rows.skip(offset)
                    .take(visible)
                    .map(|row| {
                        (
                            row.id.to_string(),
                            row.cells.iter().map(|v| v.to_string()).collect(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let headers = self
            .session
            .collection()
            .map(AttributeTableView::columns)
            .unwrap_or_default();
        let legend: Vec<(String, Rgb)> = match (self.session.collection(), self.session.style()) {
            (Some(collection), Some(style)) => {
                ColorScale::new(collection, style).legend(LEGEND_ENTRIES)
            }
            _ => Vec::new(),
        };

        let title = ctx
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no file)".to_string());
        let mut details = format!(
            "{} features  zoom {}%  {}",
            self.session.collection().map(|c| c.len()).unwrap_or(0),
            self.session.view().zoom_percent(),
            self.session.basemap_status()
        );
        if ctx.modified {
            details.push_str("  [modified]");
        }

        let empty = Vec::new();
        let screen = Screen {
            title,
            details,
            map: self.map.as_ref().map(|m| &m.lines).unwrap_or(&empty),
            legend: &legend,
            headers: &headers,
            rows: &rows,
            selected: (!ctx.row_ids.is_empty()).then(|| self.state.selected_row - offset),
            total_rows: ctx.row_ids.len(),
            state: &self.state,
        };

        self.terminal
            .draw(|frame| render::draw(frame, &panes, &screen))?;
        Ok(())
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
