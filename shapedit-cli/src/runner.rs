//! CLI runner for common setup.
//!
//! Loads the config file, initializes logging, owns the tokio runtime used
//! by the basemap loader and builds editing sessions.

use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::info;

use shapedit::basemap::{Basemap, BasemapLoader};
use shapedit::cache::TileCache;
use shapedit::config::ConfigFile;
use shapedit::logging::{init_logging, LogTarget, LoggingGuard};
use shapedit::provider::{AsyncProviderFactory, AsyncProviderType};
use shapedit::render::Renderer;
use shapedit::session::{Action, Session};

use crate::error::CliError;

pub type EditorSession = Session<AsyncProviderType>;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    runtime: Runtime,
}

impl CliRunner {
    /// Loads config and initializes logging.
    ///
    /// The interactive editor must log to the file only since it owns the
    /// terminal.
    pub fn new(target: LogTarget) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.file, target)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("shapedit-basemap")
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            runtime,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Shapedit v{}", shapedit::VERSION);
        info!("Shapedit CLI: {} command", command);
    }

    /// Builds a session with the configured canvas size and basemap.
    pub fn session(&self, size: Option<(u32, u32)>, basemap: bool) -> Result<EditorSession, CliError> {
        let (width, height) = size.unwrap_or((self.config.render.width, self.config.render.height));
        let renderer = Renderer::new(width, height)?;

        let loader = if basemap && self.config.basemap.enabled {
            let factory = AsyncProviderFactory::with_timeout(self.config.basemap.timeout)
                .map_err(|e| CliError::Runtime(e.to_string()))?;
            let provider = factory.create(self.config.basemap.provider);
            let cache = Arc::new(TileCache::new(self.config.cache.memory_size));
            info!(
                provider = self.config.basemap.provider.name(),
                cache = self.config.cache.memory_size,
                "Basemap enabled"
            );
            Some(BasemapLoader::new(
                Basemap::new(provider, cache),
                self.runtime.handle().clone(),
            ))
        } else {
            info!("Basemap disabled");
            None
        };

        Ok(Session::new(renderer, loader))
    }

    /// Opens `path` and applies the configured initial style.
    pub fn open(&self, session: &mut EditorSession, path: &Path) -> Result<(), CliError> {
        session.dispatch(Action::Open(path.to_path_buf()))?;
        session.dispatch(Action::SetColormap(self.config.render.colormap))?;
        session.dispatch(Action::SetTransparency(self.config.render.opacity))?;
        Ok(())
    }
}
