//! `shapedit edit`: the interactive terminal editor.

use std::path::Path;

use shapedit::logging::LogTarget;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui::Editor;

pub fn run(file: &Path) -> Result<(), CliError> {
    let runner = CliRunner::new(LogTarget::File)?;
    runner.log_startup("edit");

    let mut session = runner.session(None, true)?;
    runner.open(&mut session, file)?;

    let mut editor = Editor::new(session).map_err(CliError::Terminal)?;
    let result = editor.run();
    editor.restore().map_err(CliError::Terminal)?;
    info!("Editor closed");
    result.map_err(CliError::Terminal)
}
