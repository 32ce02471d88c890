//! Shapedit - shapefile attribute editing over satellite basemaps
//!
//! The library holds everything except the terminal front end:
//!
//! - [`store`]: load, edit and save shapefiles (`.shp/.shx/.dbf/.prj`)
//! - [`provider`], [`cache`], [`basemap`]: Web Mercator imagery tiles
//! - [`style`], [`render`]: colour features and rasterise the map canvas
//! - [`table`], [`view`]: attribute table filtering and map navigation
//! - [`session`]: one open document driven by [`session::Action`]s
//!
//! ```ignore
//! use shapedit::render::Renderer;
//! use shapedit::session::{Action, Session};
//!
//! let mut session = Session::new(Renderer::new(800, 600)?, loader);
//! session.dispatch(Action::Open("fields.shp".into()))?;
//! session.dispatch(Action::SetFilter("zone:3".into()))?;
//! let canvas = session.render()?;
//! ```

pub mod basemap;
pub mod cache;
pub mod config;
pub mod coord;
pub mod error;
pub mod logging;
pub mod provider;
pub mod render;
pub mod session;
pub mod store;
pub mod style;
pub mod table;
pub mod view;

pub use error::ShapeditError;

/// Version of the library and CLI, from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
