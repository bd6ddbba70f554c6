use crate::acme::{AcmeStore, ExportSummary, StoreVersion};
use crate::utils::errors::Result;
use crate::utils::paths::{file_exists, watch_dir_for};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long startup waits between checks for a missing ACME file
pub const FILE_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Re-exports certificates every time the ACME file changes.
///
/// Both the parent directory and the file itself are watched. The directory
/// catches replace-by-rename writes; the file catches in-place writes made
/// through a symlink or a single-file bind mount, which never show up as
/// directory entries.
pub struct StoreWatcher {
    acme_file: PathBuf,
    output_dir: PathBuf,
    version: StoreVersion,
    // Resolved ACME file, some backends report events against it
    target: Option<PathBuf>,
    events: UnboundedReceiver<notify::Result<Event>>,
    // Dropping the watcher unregisters it and closes `events`
    watcher: RecommendedWatcher,
}

impl StoreWatcher {
    /// Create the notification source and register the ACME file with it
    pub fn register(acme_file: &Path, output_dir: &Path, version: StoreVersion) -> Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_dir_for(acme_file), RecursiveMode::NonRecursive)?;
        watcher.watch(acme_file, RecursiveMode::NonRecursive)?;

        info!("Watching {} for changes", acme_file.display());

        Ok(Self {
            acme_file: acme_file.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            version,
            target: fs::canonicalize(acme_file).ok(),
            events,
            watcher,
        })
    }

    /// Reload the ACME file from disk and export it
    pub fn regenerate(&self) -> Result<ExportSummary> {
        let store = AcmeStore::load_from_file(self.version, &self.acme_file)?;
        store.export(&self.output_dir)
    }

    /// Whether `event` is a change to the watched file
    pub fn is_relevant(&self, event: &Event) -> bool {
        let is_change = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
        );
        is_change && self.names_acme_file(event)
    }

    fn names_acme_file(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path.file_name() == self.acme_file.file_name()
                || self.target.as_deref() == Some(path.as_path())
        })
    }

    /// Whether the inode behind the ACME file may have been swapped out
    fn is_replacement(&self, event: &Event) -> bool {
        let swaps_inode = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
        );
        swaps_inode && self.names_acme_file(event)
    }

    /// Consume notifications until `token` is cancelled.
    ///
    /// Failed passes and watcher errors are logged; they never end the loop.
    pub async fn run(mut self, token: CancellationToken) {
        loop {
            let received = tokio::select! {
                _ = token.cancelled() => {
                    info!("Stopped watching {}", self.acme_file.display());
                    break;
                }
                received = self.events.recv() => received,
            };

            match received {
                Some(Ok(event)) => self.handle_event(&event),
                Some(Err(e)) => error!("Error processing watcher event: {}", e),
                None => {
                    warn!("Watcher channel closed for {}", self.acme_file.display());
                    break;
                }
            }
        }
    }

    fn handle_event(&mut self, event: &Event) {
        if !self.note_event(event) {
            debug!(kind = ?event.kind, paths = ?event.paths, "Ignoring watcher event");
            return;
        }

        // One write shows up on both registrations; a single pass covers them all
        self.drain_pending();

        info!(kind = ?event.kind, "{} changed, exporting certificates", self.acme_file.display());
        match self.regenerate() {
            Ok(summary) => info!(
                "Exported {} certificate(s), {} file(s) written",
                summary.certificates,
                summary.files.len()
            ),
            Err(e) => warn!("Error regenerating certificates: {}", e),
        }
    }

    /// Follow a replaced inode and report whether the file content may have changed
    fn note_event(&mut self, event: &Event) -> bool {
        let replaced = self.is_replacement(event);
        if replaced {
            self.rewatch();
        }
        self.is_relevant(event) || (replaced && file_exists(&self.acme_file))
    }

    fn drain_pending(&mut self) {
        while let Ok(received) = self.events.try_recv() {
            match received {
                Ok(event) => {
                    self.note_event(&event);
                }
                Err(e) => error!("Error processing watcher event: {}", e),
            }
        }
    }

    fn rewatch(&mut self) {
        self.target = fs::canonicalize(&self.acme_file).ok();
        if !file_exists(&self.acme_file) {
            return;
        }
        if let Err(e) = self.watcher.watch(&self.acme_file, RecursiveMode::NonRecursive) {
            debug!("Could not re-register {}: {}", self.acme_file.display(), e);
        }
    }
}

/// Block until `path` exists, checking every `interval`
pub async fn wait_for_file(path: &Path, interval: Duration) {
    while !file_exists(path) {
        info!("{} does not exist!", path.display());
        tokio::time::sleep(interval).await;
    }
    info!("{} found!", path.display());
}
