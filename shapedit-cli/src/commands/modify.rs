//! Single-edit commands. Each opens the file, applies one action through
//! the session and writes the result with `Export`.

use std::path::Path;

use shapedit::session::Action;
use shapedit::store::{FeatureId, MassOperation};

use crate::commands::common::{open_batch, ColumnType, EditTarget};
use crate::error::CliError;
use crate::runner::EditorSession;

pub fn set(
    target: &EditTarget,
    row: u64,
    column: &str,
    value: &str,
    verbose: bool,
) -> Result<(), CliError> {
    apply(
        target,
        "set",
        verbose,
        Action::EditCell {
            id: FeatureId(row),
            column: column.to_string(),
            text: value.to_string(),
        },
    )
}

pub fn mass_update(
    target: &EditTarget,
    columns: Vec<String>,
    operation: MassOperation,
    operand: f64,
    verbose: bool,
) -> Result<(), CliError> {
    apply(
        target,
        "mass-update",
        verbose,
        Action::MassUpdate {
            columns,
            operation,
            operand,
        },
    )
}

pub fn add_column(
    target: &EditTarget,
    name: &str,
    kind: ColumnType,
    default: &str,
    verbose: bool,
) -> Result<(), CliError> {
    apply(
        target,
        "add-column",
        verbose,
        Action::AddColumn {
            name: name.to_string(),
            kind: kind.into(),
            default: default.to_string(),
        },
    )
}

pub fn drop_column(target: &EditTarget, name: &str, verbose: bool) -> Result<(), CliError> {
    apply(
        target,
        "drop-column",
        verbose,
        Action::DeleteColumn(name.to_string()),
    )
}

pub fn delete_row(target: &EditTarget, row: u64, verbose: bool) -> Result<(), CliError> {
    apply(target, "delete-row", verbose, Action::DeleteRow(FeatureId(row)))
}

pub fn export(file: &Path, dest: &Path, verbose: bool) -> Result<(), CliError> {
    let (_runner, mut session) = open_batch(file, "export", verbose)?;
    save(&mut session, dest)
}

fn apply(target: &EditTarget, command: &str, verbose: bool, action: Action) -> Result<(), CliError> {
    let (_runner, mut session) = open_batch(&target.file, command, verbose)?;
    let outcome = session.dispatch(action)?;
    println!("{}", outcome);
    save(&mut session, target.destination())
}

fn save(session: &mut EditorSession, dest: &Path) -> Result<(), CliError> {
    let outcome = session.dispatch(Action::Export(dest.to_path_buf()))?;
    println!("{}", outcome);
    Ok(())
}
