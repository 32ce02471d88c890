//! Configuration management CLI commands.

use clap::Subcommand;
use shapedit::config::{config_file_path, format_size, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective settings (file values over defaults)
    Show,

    /// Write a commented config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init { force } => run_init(force),
    }
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load_from(&path)?;

    println!("Configuration Settings");
    println!("======================");
    if !path.exists() {
        println!("(no file at {}, showing defaults)", path.display());
    }
    println!();
    println!("[basemap]");
    println!(
        "  provider = {} ({})",
        config.basemap.provider,
        config.basemap.provider.name()
    );
    println!("  enabled = {}", config.basemap.enabled);
    println!("  timeout = {}", config.basemap.timeout);
    println!();
    println!("[cache]");
    println!("  memory_size = {}", format_size(config.cache.memory_size));
    println!();
    println!("[render]");
    println!("  width = {}", config.render.width);
    println!("  height = {}", config.render.height);
    println!("  colormap = {}", config.render.colormap);
    println!("  opacity = {}", config.render.opacity);
    println!();
    println!("[logging]");
    println!("  file = {}", config.logging.file.display());
    Ok(())
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}
