//! Stop-file watcher: lets a user end a long fit from another terminal.
//!
//! Creating the watched file cancels the run; the fit then finishes the step
//! in progress and reports what it has so far.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;

use crate::error::AppError;
use crate::fit::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Background thread polling for the stop file. Stops polling on drop.
#[derive(Debug)]
pub struct StopFileWatcher {
    done: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StopFileWatcher {
    pub fn spawn(path: &Path, token: CancellationToken) -> Result<Self, AppError> {
        Self::spawn_with_interval(path, token, POLL_INTERVAL)
    }

    fn spawn_with_interval(path: &Path, token: CancellationToken, interval: Duration) -> Result<Self, AppError> {
        if path.exists() {
            return Err(AppError::new(
                2,
                format!(
                    "Stop file '{}' already exists; remove it before starting a fit.",
                    path.display()
                ),
            ));
        }

        let done = Arc::new(AtomicBool::new(false));
        let path: PathBuf = path.to_path_buf();
        let thread_done = Arc::clone(&done);
        let handle = thread::Builder::new()
            .name("stop-file-watcher".to_string())
            .spawn(move || {
                while !thread_done.load(Ordering::Acquire) {
                    if path.exists() {
                        warn!("Stop file '{}' found, cancelling the fit", path.display());
                        token.cancel();
                        break;
                    }
                    thread::sleep(interval);
                }
            })
            .map_err(|e| AppError::new(4, format!("Failed to start the stop-file watcher: {e}")))?;

        Ok(Self {
            done,
            handle: Some(handle),
        })
    }
}

impl Drop for StopFileWatcher {
    fn drop(&mut self) {
        self.done.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
