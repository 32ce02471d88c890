//! `shapedit table`: prints the attribute table as aligned text.

use std::path::Path;

use shapedit::session::Action;
use shapedit::table::{AttributeTableView, TableRow};

use crate::commands::common::open_batch;
use crate::error::CliError;

/// Cells wider than this are cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 24;

pub fn run(
    file: &Path,
    filter: Option<&str>,
    limit: Option<usize>,
    verbose: bool,
) -> Result<(), CliError> {
    let (_runner, mut session) = open_batch(file, "table", verbose)?;
    if let Some(filter) = filter {
        session.dispatch(Action::SetFilter(filter.to_string()))?;
    }
    let (Some(collection), Some(rows)) = (session.collection(), session.rows()) else {
        return Ok(());
    };

    let headers: Vec<String> = std::iter::once("#".to_string())
        .chain(
            AttributeTableView::columns(collection)
                .into_iter()
                .map(|(name, _)| name),
        )
        .collect();
    let total = rows.clone().count();
    let body: Vec<Vec<String>> = rows
        .take(limit.unwrap_or(usize::MAX))
        .map(|row| row_cells(&row))
        .collect();

    print!("{}", format_table(&headers, &body));
    if body.len() < total {
        println!("... {} more rows", total - body.len());
    }
    println!("{} of {} rows", total, collection.len());
    Ok(())
}

fn row_cells(row: &TableRow<'_>) -> Vec<String> {
    std::iter::once(row.id.0.to_string())
        .chain(row.texts().map(|t| truncate(&t, MAX_CELL_WIDTH)))
        .collect()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(&rule));
    for row in rows {
        out.push_str(&line(row));
    }
    out
}
