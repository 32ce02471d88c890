//! Google Maps GO2 satellite imagery provider.
//!
//! Uses Google's public tile servers without requiring an API key.
//!
//! # URL Pattern
//!
//! `http://mt{0,1,2,3}.google.com/vt/lyrs=s&x={x}&y={y}&z={zoom}`
//!
//! - `mt{0-3}` - Load balancing across 4 tile servers
//! - `lyrs=s` - Satellite imagery layer
//!
//! This endpoint is not an official API and may have usage limits.

use crate::provider::types::check_tile;
use crate::provider::{AsyncHttpClient, AsyncProvider, ProviderError};
use std::sync::atomic::{AtomicU8, Ordering};

/// Google GO2 satellite tiles, rotating between mt0..mt3.
pub struct Go2Provider<C: AsyncHttpClient> {
    http_client: C,
    /// Counter for round-robin server selection (0-3)
    server_counter: AtomicU8,
}

impl<C: AsyncHttpClient> Go2Provider<C> {
    pub fn new(http_client: C) -> Self {
        Self {
            http_client,
            server_counter: AtomicU8::new(0),
        }
    }

    fn next_server(&self) -> u8 {
        self.server_counter.fetch_add(1, Ordering::Relaxed) % 4
    }

    fn build_url(&self, row: u32, col: u32, zoom: u8) -> String {
        let server = self.next_server();
        format!(
            "http://mt{}.google.com/vt/lyrs=s&x={}&y={}&z={}",
            server, col, row, zoom
        )
    }
}

impl<C: AsyncHttpClient> AsyncProvider for Go2Provider<C> {
    async fn download_tile(&self, row: u32, col: u32, zoom: u8) -> Result<Vec<u8>, ProviderError> {
        check_tile(self, row, col, zoom)?;
        let url = self.build_url(row, col, zoom);
        self.http_client.get(&url).await
    }

    fn name(&self) -> &str {
        "Google GO2"
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        22
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    #[test]
    fn test_round_robin_servers() {
        let provider = Go2Provider::new(MockAsyncHttpClient::new(Ok(Vec::new())));
        let hosts: Vec<String> = (0..5).map(|_| provider.build_url(1, 2, 3)).collect();
        assert!(hosts[0].starts_with("http://mt0."));
        assert!(hosts[3].starts_with("http://mt3."));
        assert!(hosts[4].starts_with("http://mt0."));
        assert!(hosts[0].ends_with("x=2&y=1&z=3"));
    }

    #[tokio::test]
    async fn test_download_uses_xyz_order() {
        let client = MockAsyncHttpClient::new(Ok(vec![0xFF, 0xD8]));
        let provider = Go2Provider::new(client.clone());

        let bytes = provider.download_tile(5, 9, 4).await.unwrap();
        assert_eq!(bytes, vec![0xFF, 0xD8]);
        assert!(client.last_url().unwrap().ends_with("x=9&y=5&z=4"));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_zoom() {
        let provider = Go2Provider::new(MockAsyncHttpClient::new(Ok(Vec::new())));
        let result = provider.download_tile(0, 0, 23).await;
        assert_eq!(result, Err(ProviderError::UnsupportedZoom(23)));
    }
}
