//! OpenStreetMap standard tile layer.
//!
//! `https://tile.openstreetmap.org/{z}/{x}/{y}.png`
//!
//! Street map rather than imagery; useful where satellite providers are
//! blocked. The tile usage policy requires an identifying User-Agent, which
//! [`AsyncReqwestClient`](crate::provider::AsyncReqwestClient) sets.

use crate::provider::types::check_tile;
use crate::provider::{AsyncHttpClient, AsyncProvider, ProviderError};

pub struct OsmProvider<C: AsyncHttpClient> {
    http_client: C,
}

impl<C: AsyncHttpClient> OsmProvider<C> {
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    fn build_url(row: u32, col: u32, zoom: u8) -> String {
        format!("https://tile.openstreetmap.org/{}/{}/{}.png", zoom, col, row)
    }
}

impl<C: AsyncHttpClient> AsyncProvider for OsmProvider<C> {
    async fn download_tile(&self, row: u32, col: u32, zoom: u8) -> Result<Vec<u8>, ProviderError> {
        check_tile(self, row, col, zoom)?;
        self.http_client.get(&Self::build_url(row, col, zoom)).await
    }

    fn name(&self) -> &str {
        "OpenStreetMap"
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        19
    }
}
