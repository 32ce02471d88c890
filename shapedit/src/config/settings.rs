//! Settings structs, one per `[section]` of the INI file.

use std::path::PathBuf;

use crate::provider::ProviderKind;
use crate::style::Colormap;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub basemap: BasemapSettings,
    pub cache: CacheSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
}

/// `[basemap]`: where imagery comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct BasemapSettings {
    pub provider: ProviderKind,
    /// When false no tiles are ever requested.
    pub enabled: bool,
    /// HTTP timeout in seconds.
    pub timeout: u64,
}

/// `[cache]`: in-memory tile cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Byte budget for cached tiles.
    pub memory_size: usize,
}

/// `[render]`: canvas size and initial style.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub colormap: Colormap,
    /// Fill opacity percent, 0..=100.
    pub opacity: u8,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}
