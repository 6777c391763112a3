//! Topology file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::BrokerConfig;

/// A watcher that monitors the topology file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<BrokerConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated topology updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<BrokerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// Files that fail to load or validate are logged and skipped; the receiver
    /// only ever sees valid configurations.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    handle_event(&path, &event, &tx);
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Topology watcher started");
        Ok(watcher)
    }
}

/// Reload the file for a modify or create event and forward it if valid.
///
/// Returns whether a configuration was sent.
fn handle_event(
    path: &Path,
    event: &Event,
    tx: &mpsc::UnboundedSender<BrokerConfig>,
) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    tracing::info!(path = ?path, "Topology file changed, reloading");
    match load_config(path) {
        Ok(new_config) => tx.send(new_config).is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Rejected topology reload, keeping current bindings");
            false
        }
    }
}
