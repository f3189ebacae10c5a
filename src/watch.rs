//! Directory watching with coalesced rescans.
//!
//! The watch loop runs one organization pass at startup and then one pass per
//! burst of change notifications. Notifications are funnelled through a
//! capacity-1 channel: while a pass is running at most one follow-up pass can
//! be pending, and every further notification folds into it.

use crate::config::OrganizerConfig;
use crate::file_organizer::organize;
use crate::journal::JOURNAL_FILE_NAME;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Errors that stop the watcher from starting.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to watch {}: {source}", .path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Where the watch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Waiting for a change notification.
    Idle,
    /// Running an organization pass.
    Scanning,
    /// Cancelled; the subscription is being released.
    Stopped,
}

/// Sending half of the rescan channel, handed to the notification callback.
#[derive(Debug, Clone)]
pub struct RescanTrigger {
    tx: mpsc::Sender<()>,
}

impl RescanTrigger {
    /// Requests a rescan without blocking.
    ///
    /// Returns false when a rescan is already pending, in which case this
    /// request is folded into it.
    pub fn request(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Creates the coalescing rescan channel.
pub fn rescan_channel() -> (RescanTrigger, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(1);
    (RescanTrigger { tx }, rx)
}

/// A live, non-recursive subscription to change notifications for one directory.
///
/// Dropping it releases the subscription.
pub struct DirectoryWatcher {
    watcher: RecommendedWatcher,
    root: PathBuf,
}

impl DirectoryWatcher {
    /// Subscribes to `root`, forwarding relevant notifications to `trigger`.
    pub fn subscribe(root: &Path, trigger: RescanTrigger) -> Result<Self, WatchError> {
        let subscribe_error = |source| WatchError::Subscribe {
            path: root.to_path_buf(),
            source,
        };

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) if triggers_rescan(&event) => {
                if trigger.request() {
                    debug!("Rescan requested by {:?}", event.kind);
                } else {
                    debug!("Rescan already pending, coalesced {:?}", event.kind);
                }
            }
            Ok(_) => {}
            Err(e) => error!("Watch error: {}", e),
        };

        let mut watcher = RecommendedWatcher::new(handler, Config::default()).map_err(subscribe_error)?;
        watcher
            .watch(root, RecursiveMode::NonRecursive)
            .map_err(subscribe_error)?;
        info!("Watching directory: {}", root.display());

        Ok(Self {
            watcher,
            root: root.to_path_buf(),
        })
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        if let Err(e) = self.watcher.unwatch(&self.root) {
            debug!("Unwatch of {} failed: {}", self.root.display(), e);
        }
        info!("Stopped watching directory: {}", self.root.display());
    }
}

/// Returns true if a notification should cause a rescan.
///
/// Only creations and modifications of non-directory paths count. A file
/// being renamed away, removals, access events and writes to the move journal
/// are ignored.
pub fn triggers_rescan(event: &Event) -> bool {
    let relevant_kind = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };

    relevant_kind
        && event.paths.iter().any(|path| {
            !path.is_dir() && path.file_name().is_none_or(|name| name != JOURNAL_FILE_NAME)
        })
}

/// Drives the watch state machine until `shutdown` resolves or every
/// [`RescanTrigger`] is dropped. Returns the number of passes run.
///
/// `scan` runs once immediately and then once per received request. It is
/// awaited to completion before the next request or the shutdown signal is
/// looked at, so passes never overlap and a pass in flight always finishes.
pub async fn drive<S, F, Fut>(mut requests: mpsc::Receiver<()>, shutdown: S, mut scan: F) -> usize
where
    S: Future<Output = ()>,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut passes = 0;
    let mut state = WatchState::Scanning;

    loop {
        if state == WatchState::Scanning {
            scan().await;
            passes += 1;
            state = WatchState::Idle;
        }

        tokio::select! {
            biased;
            () = &mut shutdown => state = WatchState::Stopped,
            request = requests.recv() => match request {
                Some(()) => state = WatchState::Scanning,
                None => {
                    warn!("Change notifications ended");
                    state = WatchState::Stopped;
                }
            },
        }
        debug!(?state, passes, "Watch loop transition");

        if state == WatchState::Stopped {
            return passes;
        }
    }
}

/// Watches `root` until Ctrl-C is pressed.
///
/// # Errors
///
/// Fails only if the subscription cannot be established. A missing root
/// during a later pass is logged and watching continues.
pub async fn watch_directory(root: &Path, config: Arc<OrganizerConfig>) -> Result<usize, WatchError> {
    watch_until(root, config, ctrl_c()).await
}

/// Watches `root` until `shutdown` resolves.
pub async fn watch_until<S>(
    root: &Path,
    config: Arc<OrganizerConfig>,
    shutdown: S,
) -> Result<usize, WatchError>
where
    S: Future<Output = ()>,
{
    let (trigger, requests) = rescan_channel();
    let watcher = DirectoryWatcher::subscribe(root, trigger)?;

    let passes = drive(requests, shutdown, || run_pass(root.to_path_buf(), Arc::clone(&config))).await;

    drop(watcher);
    Ok(passes)
}

async fn run_pass(root: PathBuf, config: Arc<OrganizerConfig>) {
    match tokio::task::spawn_blocking(move || organize(&root, &config)).await {
        Ok(Ok(result)) => debug!(
            moved = result.moved_count(),
            entries = result.entries().len(),
            "Pass finished"
        ),
        Ok(Err(e)) => error!("{}", e),
        Err(e) => error!("Organization pass panicked: {}", e),
    }
}

/// Resolves on the first Ctrl-C.
///
/// The listener is installed right away on its own task so an interrupt that
/// arrives during the first pass is not lost.
fn ctrl_c() -> impl Future<Output = ()> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping after the current pass");
                let _ = tx.send(());
            }
            Err(e) => {
                error!("Unable to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });
    async move {
        let _ = rx.await;
    }
}
