//! Screen layout and widgets for the editor.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use shapedit::style::Rgb;

use super::state::{EditorState, Focus, Mode};

/// Screen areas, computed from the terminal size so the map can be sampled
/// for its pane before drawing.
#[derive(Debug, Clone, Copy)]
pub struct Panes {
    pub header: Rect,
    pub map: Rect,
    pub legend: Rect,
    pub table: Rect,
    pub status: Rect,
}

impl Panes {
    pub fn new(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(6),    // Map and table
                Constraint::Length(3), // Status
            ])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        let map_column = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(body[0]);
        Self {
            header: rows[0],
            map: map_column[0],
            legend: map_column[1],
            table: body[1],
            status: rows[2],
        }
    }

    /// Cells available for the map inside its border.
    pub fn map_inner(&self) -> Rect {
        inner_rect(self.map, 1, 1)
    }
}

/// Everything drawn in one frame.
pub struct Screen<'a> {
    pub title: String,
    pub details: String,
    pub map: &'a [Line<'static>],
    pub legend: &'a [(String, Rgb)],
    pub headers: &'a [(String, String)],
    /// Visible window of rows: id label and cell texts.
    pub rows: &'a [(String, Vec<String>)],
    /// Index in `rows` of the selected row.
    pub selected: Option<usize>,
    pub total_rows: usize,
    pub state: &'a EditorState,
}

fn inner_rect(area: Rect, margin_x: u16, margin_y: u16) -> Rect {
    Rect {
        x: area.x + margin_x,
        y: area.y + margin_y,
        width: area.width.saturating_sub(margin_x * 2),
        height: area.height.saturating_sub(margin_y * 2),
    }
}

fn pane_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(Color::Blue),
        ))
}

pub fn draw(frame: &mut Frame, panes: &Panes, screen: &Screen) {
    render_header(frame, panes.header, screen);
    render_map(frame, panes, screen);
    render_table(frame, panes.table, screen);
    render_status(frame, panes.status, screen.state);

    match &screen.state.mode {
        Mode::Dialog { title, message } => render_dialog(frame, frame.area(), title, message),
        Mode::ConfirmQuit => render_dialog(
            frame,
            frame.area(),
            "Unsaved changes",
            "Quit without saving? Press y to quit, any other key to stay.",
        ),
        _ => {}
    }
}

fn render_header(frame: &mut Frame, area: Rect, screen: &Screen) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let line = Line::from(vec![
        Span::styled(
            "shapedit ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(screen.title.clone(), Style::default().fg(Color::White)),
        Span::styled(
            format!("  {}", screen.details),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_map(frame: &mut Frame, panes: &Panes, screen: &Screen) {
    let focused = screen.state.focus == Focus::Map;
    frame.render_widget(pane_block("Map", focused), panes.map);

    let inner = panes.map_inner();
    if screen.map.is_empty() {
        let text = Paragraph::new(Line::from(Span::styled(
            "No shapefile loaded (press o to open one)",
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(text, inner);
    } else {
        // Centre the letterboxed canvas.
        let width = screen.map[0].spans.len() as u16;
        let height = screen.map.len() as u16;
        let area = Rect {
            x: inner.x + inner.width.saturating_sub(width) / 2,
            y: inner.y + inner.height.saturating_sub(height) / 2,
            width: width.min(inner.width),
            height: height.min(inner.height),
        };
        frame.render_widget(Paragraph::new(screen.map.to_vec()), area);
    }

    let mut spans = Vec::new();
    for (label, Rgb([r, g, b])) in screen.legend {
        spans.push(Span::styled(
            "\u{25A0} ",
            Style::default().fg(Color::Rgb(*r, *g, *b)),
        ));
        spans.push(Span::styled(
            format!("{}  ", label),
            Style::default().fg(Color::Gray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), panes.legend);
}

fn render_table(frame: &mut Frame, area: Rect, screen: &Screen) {
    let focused = screen.state.focus == Focus::Table;
    let title = format!("Attributes {}/{}", screen.rows.len().min(screen.total_rows), screen.total_rows);
    let block = pane_block(&title, focused);

    let column_style = |index: usize| {
        if index == screen.state.selected_column {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let mut lines = Vec::with_capacity(screen.rows.len() + 1);
    let mut header = vec![Span::styled(
        format!("{:>5} ", "#"),
        Style::default().fg(Color::DarkGray),
    )];
    for (index, (name, kind)) in screen.headers.iter().enumerate() {
        header.push(Span::styled(
            format!("{} ", cell(&format!("{}:{}", name, kind))),
            column_style(index).add_modifier(Modifier::UNDERLINED),
        ));
    }
    lines.push(Line::from(header));

    for (position, (id, cells)) in screen.rows.iter().enumerate() {
        let selected = screen.selected == Some(position);
        let mut spans = vec![Span::styled(
            format!("{:>5} ", id),
            Style::default().fg(Color::DarkGray),
        )];
        for (index, text) in cells.iter().enumerate() {
            let mut style = if selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            if selected && index == screen.state.selected_column {
                style = style.fg(Color::Black).bg(Color::Yellow);
            }
            spans.push(Span::styled(format!("{} ", cell(text)), style));
        }
        lines.push(Line::from(spans));
    }

    // Keep the selected column in view.
    let scroll_x = column_offset(screen.state.selected_column, area.width.saturating_sub(8));
    frame.render_widget(Paragraph::new(lines).block(block).scroll((0, scroll_x)), area);
}

const CELL_WIDTH: usize = 14;

fn cell(text: &str) -> String {
    let count = text.chars().count();
    if count > CELL_WIDTH {
        let cut: String = text.chars().take(CELL_WIDTH - 1).collect();
        format!("{}\u{2026}", cut)
    } else {
        format!("{:<width$}", text, width = CELL_WIDTH)
    }
}

fn column_offset(column: usize, visible: u16) -> u16 {
    let right = (column + 1) * (CELL_WIDTH + 1);
    right.saturating_sub(visible as usize) as u16
}

fn render_status(frame: &mut Frame, area: Rect, state: &EditorState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let line = match &state.mode {
        Mode::Prompt(prompt) => Line::from(vec![
            Span::styled(
                format!("{}: ", prompt.kind.label()),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(prompt.input.clone(), Style::default().fg(Color::White)),
            Span::styled("\u{2588}", Style::default().fg(Color::Gray)),
        ]),
        _ => Line::from(vec![
            Span::styled(state.status.clone(), Style::default().fg(Color::White)),
            Span::styled(
                "   ? keys  q quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    };
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_dialog(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let lines = message.lines().count() as u16;
    let width = 70u16.min(area.width);
    let height = (lines + 4).min(area.height);
    let dialog = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    let mut text: Vec<Line> = message.lines().map(|l| Line::from(l.to_string())).collect();
    text.push(Line::from(Span::styled(
        "press any key",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Clear, dialog);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        dialog,
    );
}
