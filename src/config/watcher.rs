//! Hot reload of the gate configuration file.
//!
//! The parent directory is watched rather than the file itself: editors that
//! save by writing a temporary file and renaming it would otherwise detach
//! the watch after the first save.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GateConfig;

/// Forwards every valid, changed version of one configuration file.
pub struct ConfigWatcher {
    path: PathBuf,
    current: GateConfig,
    updates: mpsc::UnboundedSender<GateConfig>,
}

impl ConfigWatcher {
    /// `current` is the configuration already in use; identical reloads are dropped.
    pub fn new(path: &Path, current: GateConfig) -> (Self, mpsc::UnboundedReceiver<GateConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            current,
            updates,
        };
        (watcher, rx)
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let path = self.path.clone();
        let updates = self.updates;
        let last = Mutex::new(self.current);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    return;
                }
                let touches_config = event
                    .paths
                    .iter()
                    .any(|changed| changed.file_name() == file_name.as_deref());
                if !touches_config {
                    return;
                }

                let config = match load_config(&path) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::error!(
                            path = %path.display(),
                            error = %e,
                            "Config reload rejected, keeping current configuration"
                        );
                        return;
                    }
                };
                let Ok(mut last) = last.lock() else {
                    return;
                };
                if *last == config {
                    tracing::debug!("Config file touched without changes");
                    return;
                }
                *last = config.clone();
                tracing::info!(path = %path.display(), "Config change detected");
                let _ = updates.send(config);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn forwards_changed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(&path, "[admission]\nmax_players = 10\n").unwrap();
        let initial = load_config(&path).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path, initial);
        let _watcher = watcher.run().unwrap();

        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"[admission]\nmax_players = 20\n").unwrap();
        file.sync_all().unwrap();
        drop(file);

        // Truncation can surface as an intermediate (default) version first.
        let found = tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(update) = updates.recv().await {
                if update.admission.max_players == 20 {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap();
        assert!(found);
    }
}
