//! Basemap tile providers.
//!
//! Each provider turns a Web Mercator tile coordinate into a URL and fetches
//! it through an [`AsyncHttpClient`]. Select one at runtime with
//! [`AsyncProviderFactory`]:
//!
//! ```ignore
//! use shapedit::provider::{AsyncProviderFactory, ProviderKind};
//!
//! let factory = AsyncProviderFactory::with_timeout(10)?;
//! let provider = factory.create(ProviderKind::ArcGis);
//! ```

mod arcgis;
mod factory;
mod go2;
mod http;
mod osm;
mod types;

pub use arcgis::ArcGisProvider;
pub use factory::{AsyncProviderFactory, AsyncProviderType, ProviderKind};
pub use go2::Go2Provider;
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use osm::OsmProvider;
pub use types::{AsyncProvider, ProviderError};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
