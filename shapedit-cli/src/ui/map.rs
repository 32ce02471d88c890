//! Map canvas to terminal cells.
//!
//! Each cell shows two vertically stacked pixels with the upper half block:
//! foreground is the top pixel, background the bottom one.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

const UPPER_HALF: &str = "\u{2580}";

/// Fits a `width` x `height` canvas into `cols` x `rows` cells, keeping the
/// aspect ratio. Returns the used cell size.
pub fn fit(width: u32, height: u32, cols: u16, rows: u16) -> (u16, u16) {
    if width == 0 || height == 0 || cols == 0 || rows == 0 {
        return (0, 0);
    }
    // A cell is roughly one pixel wide and two pixels tall.
    let scale = f64::min(
        cols as f64 / width as f64,
        (rows as f64 * 2.0) / height as f64,
    );
    let used_cols = ((width as f64 * scale).round() as u16).clamp(1, cols);
    let used_rows = ((height as f64 * scale / 2.0).round() as u16).clamp(1, rows);
    (used_cols, used_rows)
}

/// Samples RGBA bytes (row-major, opaque) into half-block lines.
pub fn half_blocks(rgba: &[u8], width: u32, height: u32, cols: u16, rows: u16) -> Vec<Line<'static>> {
    let (used_cols, used_rows) = fit(width, height, cols, rows);
    if used_cols == 0 || rgba.len() < (width as usize * height as usize * 4) {
        return Vec::new();
    }

    let sample = |x: u16, y: u32| -> Color {
        let px = ((x as u64 * width as u64) / used_cols as u64).min(width as u64 - 1) as usize;
        let py = (y as u64 * height as u64 / (used_rows as u64 * 2)).min(height as u64 - 1) as usize;
        let i = (py * width as usize + px) * 4;
        Color::Rgb(rgba[i], rgba[i + 1], rgba[i + 2])
    };

    (0..used_rows)
        .map(|row| {
            let spans: Vec<Span<'static>> = (0..used_cols)
                .map(|col| {
                    let top = sample(col, row as u32 * 2);
                    let bottom = sample(col, row as u32 * 2 + 1);
                    Span::styled(UPPER_HALF, Style::default().fg(top).bg(bottom))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}
