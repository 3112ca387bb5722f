use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tessera_types::models::{Design, SaveStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::designs::DesignRepository;
use crate::error::Result;

/// Debounced writer for one design.
///
/// `Idle -> Saving -> Saved | Error`, and back to `Idle` on the next schedule.
/// Every schedule restarts the timer; only the snapshot from the last schedule
/// of a burst is written. A generation counter, checked under the state lock
/// when the timer fires, is what makes cancellation race-free: a timer whose
/// generation is stale returns without writing.
///
/// Store writes are serialized by a per-manager write lock. The timer takes
/// its snapshot only once it holds that lock, so a `force_save` either runs
/// first (and the timer finds its generation stale) or waits for the
/// in-flight write and lands after it.
#[derive(Clone)]
pub struct AutoSaveManager {
    inner: Arc<Shared>,
}

struct Shared {
    designs: Arc<DesignRepository>,
    debounce: Duration,
    write_lock: Mutex<()>,
    state: Mutex<SaveState>,
    status_tx: watch::Sender<SaveStatus>,
}

struct SaveState {
    status: SaveStatus,
    last_save_time: Option<DateTime<Utc>>,
    last_error: Option<String>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    pending: Option<Design>,
}

impl AutoSaveManager {
    pub fn new(designs: Arc<DesignRepository>, debounce: Duration) -> Self {
        let (status_tx, _) = watch::channel(SaveStatus::Idle);
        Self {
            inner: Arc::new(Shared {
                designs,
                debounce,
                write_lock: Mutex::new(()),
                state: Mutex::new(SaveState {
                    status: SaveStatus::Idle,
                    last_save_time: None,
                    last_error: None,
                    generation: 0,
                    timer: None,
                    pending: None,
                }),
                status_tx,
            }),
        }
    }

    /// Records `design` as the snapshot to write and restarts the debounce
    /// timer. Must be called inside a tokio runtime.
    pub fn schedule_auto_save(&self, design: Design) {
        let mut state = self.inner.lock();
        let generation = self.inner.cancel_timer(&mut state);

        state.pending = Some(design);
        if matches!(state.status, SaveStatus::Saved | SaveStatus::Error) {
            self.inner.set_status(&mut state, SaveStatus::Idle);
        }

        let shared = self.inner.clone();
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(shared.debounce).await;
            // Aborting the timer past this point leaves the blocking write running.
            let write = tokio::task::spawn_blocking(move || shared.fire(generation));
            if let Err(e) = write.await {
                warn!("Auto-save task failed: {}", e);
            }
        }));
    }

    /// Writes `design` now, dropping any pending timer. The outcome is both
    /// recorded in the status and returned. Blocks while a debounced write
    /// is in flight.
    pub fn force_save(&self, design: &Design) -> Result<Design> {
        let _write = self.inner.write_guard();
        self.inner.write_now(design)
    }

    /// Writes the pending snapshot immediately, if there is one. Waits for
    /// an in-flight debounced write first.
    pub fn flush_pending(&self) -> Result<Option<Design>> {
        let _write = self.inner.write_guard();
        let pending = self.inner.lock().pending.clone();
        match pending {
            Some(design) => self.inner.write_now(&design).map(Some),
            None => Ok(None),
        }
    }

    /// Drops a pending timer without writing.
    pub fn cancel_pending_save(&self) {
        let mut state = self.inner.lock();
        self.inner.cancel_timer(&mut state);
        state.pending = None;
        self.inner.set_status(&mut state, SaveStatus::Idle);
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.lock().status
    }

    pub fn last_save_time(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_save_time
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    pub fn has_pending(&self) -> bool {
        self.inner.lock().pending.is_some()
    }

    /// True when the last write succeeded and nothing is waiting to be written.
    pub fn is_settled(&self) -> bool {
        let state = self.inner.lock();
        state.status == SaveStatus::Saved && state.pending.is_none() && state.timer.is_none()
    }

    /// Status changes, starting from the current status.
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status_tx.subscribe()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SaveState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Held across every store write. Always taken before the state lock.
    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Invalidates any armed timer. Returns the new generation.
    fn cancel_timer(&self, state: &mut SaveState) -> u64 {
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation
    }

    fn set_status(&self, state: &mut SaveState, status: SaveStatus) {
        state.status = status;
        self.status_tx.send_replace(status);
    }

    /// Caller holds the write lock.
    fn write_now(&self, design: &Design) -> Result<Design> {
        {
            let mut state = self.lock();
            self.cancel_timer(&mut state);
            state.pending = None;
            self.set_status(&mut state, SaveStatus::Saving);
        }

        let result = self.designs.save_design(design);
        self.finish(result.as_ref().map(|_| ()).map_err(ToString::to_string));
        result
    }

    fn fire(&self, generation: u64) {
        let _write = self.write_guard();
        let snapshot = {
            let mut state = self.lock();
            if state.generation != generation {
                return;
            }
            // Detach: from here on nothing may abort this write.
            state.timer = None;
            let Some(snapshot) = state.pending.take() else {
                return;
            };
            self.set_status(&mut state, SaveStatus::Saving);
            snapshot
        };

        debug!("Auto-saving design {}", snapshot.id);
        let result = self.designs.save_design(&snapshot);
        self.finish(result.map(|_| ()).map_err(|e| e.to_string()));
    }

    fn finish(&self, result: std::result::Result<(), String>) {
        let mut state = self.lock();
        match result {
            Ok(()) => {
                state.last_save_time = Some(Utc::now());
                state.last_error = None;
                self.set_status(&mut state, SaveStatus::Saved);
            }
            Err(message) => {
                warn!("Auto-save failed: {}", message);
                state.last_error = Some(message);
                self.set_status(&mut state, SaveStatus::Error);
            }
        }
    }
}
