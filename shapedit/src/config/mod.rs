//! User configuration stored in `~/.shapedit/config.ini`.
//!
//! A missing file yields the defaults; every key is optional and unknown
//! keys are ignored. Settings structs live in [`settings`], constants in
//! [`defaults`], parsing in `parser` and serialization in `writer`.
//!
//! ```
//! use shapedit::config::{parse_size, ConfigFile};
//!
//! let config = ConfigFile::default();
//! assert!(config.basemap.enabled);
//! assert_eq!(parse_size("256MB").unwrap(), 256 * 1024 * 1024);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{BasemapSettings, CacheSettings, ConfigFile, LoggingSettings, RenderSettings};
pub use size::{format_size, parse_size, SizeParseError};
