//! `shapedit info`: summary statistics.

use std::path::Path;

use crate::commands::common::open_batch;
use crate::error::CliError;

pub fn run(file: &Path, verbose: bool) -> Result<(), CliError> {
    let (_runner, session) = open_batch(file, "info", verbose)?;
    let Some(collection) = session.collection() else {
        return Ok(());
    };

    println!("{}", file.display());
    println!();
    println!("{}", collection.statistics());
    println!();
    println!("Columns:");
    for field in collection.schema().fields() {
        println!("  {:<10}  {}", field.name, field.kind);
    }
    Ok(())
}
