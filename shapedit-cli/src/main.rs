//! Shapedit CLI - Command-line interface
//!
//! `shapedit edit` opens the interactive terminal editor; the other
//! subcommands run one operation on a shapefile and exit.

mod commands;
mod error;
mod runner;
mod ui;

use clap::{Parser, Subcommand};

use commands::common::EditTarget;
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "shapedit")]
#[command(version = shapedit::VERSION)]
#[command(about = "View, edit and export shapefiles over satellite basemaps", long_about = None)]
struct Cli {
    /// Also print log output to stderr (batch commands only)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive editor
    Edit {
        /// Shapefile to open (.shp; .dbf and .prj are found alongside)
        file: std::path::PathBuf,
    },

    /// Show feature count, bounds, CRS and area statistics
    Info {
        file: std::path::PathBuf,
    },

    /// Print the attribute table
    Table {
        file: std::path::PathBuf,

        /// Row filter: text matches any column, column:text matches one
        #[arg(long)]
        filter: Option<String>,

        /// Print at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Set one attribute cell
    Set {
        #[command(flatten)]
        target: EditTarget,

        /// Row number (feature id as shown by `table`)
        #[arg(long)]
        row: u64,

        #[arg(long)]
        column: String,

        /// New value; an empty string stores null
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },

    /// Apply arithmetic to every value of numeric columns
    MassUpdate {
        #[command(flatten)]
        target: EditTarget,

        /// Columns to update, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// add, subtract, multiply or divide
        #[arg(long)]
        op: shapedit::store::MassOperation,

        #[arg(long, allow_hyphen_values = true)]
        value: f64,
    },

    /// Add an attribute column
    AddColumn {
        #[command(flatten)]
        target: EditTarget,

        /// Column name (at most 10 ASCII characters)
        #[arg(long)]
        name: String,

        #[arg(long = "type", value_enum, default_value = "text")]
        kind: commands::common::ColumnType,

        /// Value for every existing row
        #[arg(long, default_value = "")]
        default: String,
    },

    /// Remove an attribute column
    DropColumn {
        #[command(flatten)]
        target: EditTarget,

        #[arg(long)]
        name: String,
    },

    /// Delete a feature
    DeleteRow {
        #[command(flatten)]
        target: EditTarget,

        #[arg(long)]
        row: u64,
    },

    /// Render the map to a PNG image
    Render(commands::render::RenderArgs),

    /// Save a copy of a shapefile (and its companions) under a new name
    Export {
        file: std::path::PathBuf,
        dest: std::path::PathBuf,
    },

    /// Manage ~/.shapedit/config.ini
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let verbose = cli.verbose;
    match cli.command {
        Commands::Edit { file } => commands::edit::run(&file),
        Commands::Info { file } => commands::info::run(&file, verbose),
        Commands::Table {
            file,
            filter,
            limit,
        } => commands::table::run(&file, filter.as_deref(), limit, verbose),
        Commands::Set {
            target,
            row,
            column,
            value,
        } => commands::modify::set(&target, row, &column, &value, verbose),
        Commands::MassUpdate {
            target,
            columns,
            op,
            value,
        } => commands::modify::mass_update(&target, columns, op, value, verbose),
        Commands::AddColumn {
            target,
            name,
            kind,
            default,
        } => commands::modify::add_column(&target, &name, kind, &default, verbose),
        Commands::DropColumn { target, name } => {
            commands::modify::drop_column(&target, &name, verbose)
        }
        Commands::DeleteRow { target, row } => commands::modify::delete_row(&target, row, verbose),
        Commands::Render(args) => commands::render::run(args, verbose),
        Commands::Export { file, dest } => commands::modify::export(&file, &dest, verbose),
        Commands::Config { command } => commands::config::run(command),
    }
}
