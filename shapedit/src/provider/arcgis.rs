//! Esri ArcGIS World Imagery provider.
//!
//! Public satellite basemap, no key required.
//!
//! # URL Pattern
//!
//! `https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}`
//!
//! Note the row-before-column order.

use crate::provider::types::check_tile;
use crate::provider::{AsyncHttpClient, AsyncProvider, ProviderError};

const BASE_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile";

/// Esri World Imagery satellite tiles.
pub struct ArcGisProvider<C: AsyncHttpClient> {
    http_client: C,
}

impl<C: AsyncHttpClient> ArcGisProvider<C> {
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    fn build_url(row: u32, col: u32, zoom: u8) -> String {
        format!("{}/{}/{}/{}", BASE_URL, zoom, row, col)
    }
}

impl<C: AsyncHttpClient> AsyncProvider for ArcGisProvider<C> {
    async fn download_tile(&self, row: u32, col: u32, zoom: u8) -> Result<Vec<u8>, ProviderError> {
        check_tile(self, row, col, zoom)?;
        self.http_client.get(&Self::build_url(row, col, zoom)).await
    }

    fn name(&self) -> &str {
        "ArcGIS World Imagery"
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        19
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    #[tokio::test]
    async fn test_url_is_zoom_row_col() {
        let client = MockAsyncHttpClient::new(Ok(vec![1]));
        let provider = ArcGisProvider::new(client.clone());

        provider.download_tile(3, 7, 4).await.unwrap();
        assert_eq!(
            client.last_url().unwrap(),
            format!("{}/4/3/7", BASE_URL)
        );
    }

    #[tokio::test]
    async fn test_rejects_tile_outside_grid() {
        let client = MockAsyncHttpClient::new(Ok(vec![1]));
        let provider = ArcGisProvider::new(client.clone());

        let result = provider.download_tile(4, 0, 2).await;
        assert_eq!(
            result,
            Err(ProviderError::UnsupportedCoordinates {
                row: 4,
                col: 0,
                zoom: 2
            })
        );
        assert!(client.last_url().is_none());
    }

    #[test]
    fn test_zoom_range() {
        let provider = ArcGisProvider::new(MockAsyncHttpClient::new(Ok(Vec::new())));
        assert!(provider.supports_zoom(0));
        assert!(provider.supports_zoom(19));
        assert!(!provider.supports_zoom(20));
    }
}
