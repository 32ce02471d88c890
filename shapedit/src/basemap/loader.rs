//! Background basemap fetching tagged by view revision.
//!
//! The interface thread calls [`BasemapLoader::request`] whenever the view
//! changes and [`BasemapLoader::poll`] on every tick. Only a reply for the
//! current view revision is ever handed back; a new request aborts the task
//! serving the previous one.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{Basemap, BasemapImage};
use crate::coord::Bounds;
use crate::error::NetworkError;
use crate::provider::AsyncProvider;

/// Result of one background fetch.
#[derive(Debug)]
pub struct BasemapReply {
    pub revision: u64,
    pub result: Result<BasemapImage, NetworkError>,
}

struct InFlight {
    revision: u64,
    task: JoinHandle<()>,
}

pub struct BasemapLoader<P: AsyncProvider + 'static> {
    basemap: Arc<Basemap<P>>,
    handle: Handle,
    tx: mpsc::UnboundedSender<BasemapReply>,
    rx: mpsc::UnboundedReceiver<BasemapReply>,
    in_flight: Option<InFlight>,
}

impl<P: AsyncProvider + 'static> BasemapLoader<P> {
    /// Creates a loader spawning onto `handle`.
    pub fn new(basemap: Basemap<P>, handle: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            basemap: Arc::new(basemap),
            handle,
            tx,
            rx,
            in_flight: None,
        }
    }

    pub fn basemap(&self) -> &Basemap<P> {
        &self.basemap
    }

    /// Starts fetching imagery for `extent` (Web Mercator) on behalf of view
    /// `revision`, aborting any earlier request.
    pub fn request(&mut self, revision: u64, extent: Bounds, width: u32, height: u32) {
        self.cancel();

        let basemap = Arc::clone(&self.basemap);
        let tx = self.tx.clone();
        let task = self.handle.spawn(async move {
            let result = basemap.fetch_tiles(&extent, width, height).await;
            // The receiver lives as long as the loader.
            let _ = tx.send(BasemapReply { revision, result });
        });
        debug!(revision, "Basemap request started");
        self.in_flight = Some(InFlight { revision, task });
    }

    /// Aborts the in-flight request, if any.
    pub fn cancel(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            if !previous.task.is_finished() {
                debug!(revision = previous.revision, "Aborting superseded basemap request");
            }
            previous.task.abort();
        }
    }

    /// Returns the newest finished reply for `current_revision`, discarding
    /// replies for any other revision.
    pub fn poll(&mut self, current_revision: u64) -> Option<BasemapReply> {
        let mut latest = None;
        while let Ok(reply) = self.rx.try_recv() {
            if reply.revision == current_revision {
                latest = Some(reply);
            } else {
                trace!(
                    revision = reply.revision,
                    current_revision,
                    "Discarding stale basemap reply"
                );
            }
        }
        if latest.is_some() {
            self.in_flight = None;
        }
        latest
    }

    /// Waits for the reply to `revision`. Used by batch rendering.
    pub async fn wait(&mut self, revision: u64) -> Option<BasemapReply> {
        while let Some(reply) = self.rx.recv().await {
            if reply.revision == revision {
                self.in_flight = None;
                return Some(reply);
            }
        }
        None
    }
}

impl<P: AsyncProvider + 'static> Drop for BasemapLoader<P> {
    fn drop(&mut self) {
        self.cancel();
    }
}
