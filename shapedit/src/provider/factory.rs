//! Provider selection and enum dispatch.
//!
//! [`ProviderKind`] is what configuration files and the CLI name;
//! [`AsyncProviderFactory`] turns it into a concrete [`AsyncProviderType`].
//! Enum dispatch keeps `AsyncProvider` usable without boxing its futures.

use std::fmt;
use std::str::FromStr;

use super::arcgis::ArcGisProvider;
use super::go2::Go2Provider;
use super::http::AsyncReqwestClient;
use super::osm::OsmProvider;
use super::types::{AsyncProvider, ProviderError};

/// Basemap tile source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// Esri World Imagery. No key required.
    #[default]
    ArcGis,
    /// Google satellite tiles from the public GO2 servers.
    Go2,
    /// OpenStreetMap street tiles.
    Osm,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::ArcGis, ProviderKind::Go2, ProviderKind::Osm];

    /// Returns the provider name for this configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ArcGis => "ArcGIS World Imagery",
            Self::Go2 => "Google GO2",
            Self::Osm => "OpenStreetMap",
        }
    }

    /// Identifier used in `config.ini` and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArcGis => "arcgis",
            Self::Go2 => "go2",
            Self::Osm => "osm",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arcgis" | "esri" => Ok(Self::ArcGis),
            "go2" | "google" => Ok(Self::Go2),
            "osm" | "openstreetmap" => Ok(Self::Osm),
            other => Err(format!(
                "unknown provider '{}' (expected arcgis, go2 or osm)",
                other
            )),
        }
    }
}

/// Concrete async provider chosen at runtime.
pub enum AsyncProviderType {
    ArcGis(ArcGisProvider<AsyncReqwestClient>),
    Go2(Go2Provider<AsyncReqwestClient>),
    Osm(OsmProvider<AsyncReqwestClient>),
}

impl AsyncProvider for AsyncProviderType {
    async fn download_tile(&self, row: u32, col: u32, zoom: u8) -> Result<Vec<u8>, ProviderError> {
        match self {
            Self::ArcGis(p) => p.download_tile(row, col, zoom).await,
            Self::Go2(p) => p.download_tile(row, col, zoom).await,
            Self::Osm(p) => p.download_tile(row, col, zoom).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::ArcGis(p) => p.name(),
            Self::Go2(p) => p.name(),
            Self::Osm(p) => p.name(),
        }
    }

    fn min_zoom(&self) -> u8 {
        match self {
            Self::ArcGis(p) => p.min_zoom(),
            Self::Go2(p) => p.min_zoom(),
            Self::Osm(p) => p.min_zoom(),
        }
    }

    fn max_zoom(&self) -> u8 {
        match self {
            Self::ArcGis(p) => p.max_zoom(),
            Self::Go2(p) => p.max_zoom(),
            Self::Osm(p) => p.max_zoom(),
        }
    }
}

/// Creates [`AsyncProviderType`] instances sharing one HTTP client.
pub struct AsyncProviderFactory {
    http_client: AsyncReqwestClient,
}

impl AsyncProviderFactory {
    pub fn new(http_client: AsyncReqwestClient) -> Self {
        Self { http_client }
    }

    /// Builds a factory whose client uses `timeout_secs`.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        Ok(Self::new(AsyncReqwestClient::with_timeout(timeout_secs)?))
    }

    pub fn create(&self, kind: ProviderKind) -> AsyncProviderType {
        let client = self.http_client.clone();
        match kind {
            ProviderKind::ArcGis => AsyncProviderType::ArcGis(ArcGisProvider::new(client)),
            ProviderKind::Go2 => AsyncProviderType::Go2(Go2Provider::new(client)),
            ProviderKind::Osm => AsyncProviderType::Osm(OsmProvider::new(client)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("arcgis".parse::<ProviderKind>(), Ok(ProviderKind::ArcGis));
        assert_eq!("Esri".parse::<ProviderKind>(), Ok(ProviderKind::ArcGis));
        assert_eq!("google".parse::<ProviderKind>(), Ok(ProviderKind::Go2));
        assert_eq!(" OSM ".parse::<ProviderKind>(), Ok(ProviderKind::Osm));
        assert!("bing".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_round_trips_through_str() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_default_is_arcgis() {
        assert_eq!(ProviderKind::default(), ProviderKind::ArcGis);
    }

    #[test]
    fn test_factory_creates_matching_provider() {
        let factory = AsyncProviderFactory::with_timeout(5).unwrap();
        for kind in ProviderKind::ALL {
            let provider = factory.create(kind);
            assert_eq!(provider.name(), kind.name());
        }
    }
}
