//! Default values for every configuration key.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::cache::DEFAULT_CACHE_SIZE;
use crate::provider::{ProviderKind, DEFAULT_TIMEOUT_SECS};
use crate::style::{Colormap, DEFAULT_OPACITY};

pub const DEFAULT_BASEMAP_ENABLED: bool = true;
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = DEFAULT_CACHE_SIZE;
pub const DEFAULT_RENDER_WIDTH: u32 = 1024;
pub const DEFAULT_RENDER_HEIGHT: u32 = 768;
pub const DEFAULT_LOG_FILE_NAME: &str = "shapedit.log";

/// Default log file: `~/.shapedit/shapedit.log`.
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE_NAME)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            basemap: BasemapSettings {
                provider: ProviderKind::default(),
                enabled: DEFAULT_BASEMAP_ENABLED,
                timeout: DEFAULT_TIMEOUT_SECS,
            },
            cache: CacheSettings {
                memory_size: DEFAULT_MEMORY_CACHE_SIZE,
            },
            render: RenderSettings {
                width: DEFAULT_RENDER_WIDTH,
                height: DEFAULT_RENDER_HEIGHT,
                colormap: Colormap::default(),
                opacity: DEFAULT_OPACITY,
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
