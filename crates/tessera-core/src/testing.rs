//! Fixtures shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use chrono::Utc;
use tessera_db::{Database, RecordStore};
use tessera_types::models::{DEFAULT_BACKGROUND_COLOR, Design};
use uuid::Uuid;

pub fn memory_store() -> Arc<dyn RecordStore> {
    Arc::new(Database::open_in_memory().expect("in-memory database"))
}

pub fn sample_design(user_id: Uuid, theme_id: Uuid) -> Design {
    let now = Utc::now();
    Design {
        id: Uuid::new_v4(),
        user_id,
        username: format!("user-{}", &user_id.to_string()[..8]),
        theme_id,
        background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
        assets: vec![],
        created_at: now,
        updated_at: now,
        submitted: false,
        submitted_at: None,
        vote_count: 0,
        next_z_index: 0,
    }
}

/// Wraps a real store, counting design writes and optionally failing or
/// holding them.
pub struct InstrumentedStore {
    inner: Database,
    design_writes: AtomicUsize,
    fail_writes: AtomicBool,
    fail_design_writes: AtomicBool,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

/// Handle for a design write held by [`InstrumentedStore::hold_next_design_write`].
pub struct HeldWrite {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl HeldWrite {
    /// Blocks until the held write has reached the store.
    pub fn wait_entered(&self) {
        self.entered.recv().expect("held write never started");
    }

    pub fn release(self) {
        let _ = self.release.send(());
    }
}

impl InstrumentedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Database::open_in_memory().expect("in-memory database"),
            design_writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            fail_design_writes: AtomicBool::new(false),
            gate: Mutex::new(None),
        })
    }

    pub fn design_writes(&self) -> usize {
        self.design_writes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fails only writes to `design:` records.
    pub fn fail_design_writes(&self, fail: bool) {
        self.fail_design_writes.store(fail, Ordering::SeqCst);
    }

    /// The next design write blocks inside the store until released.
    pub fn hold_next_design_write(&self) -> HeldWrite {
        let (entered_tx, entered) = mpsc::channel();
        let (release, release_rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some((entered_tx, release_rx));
        HeldWrite { entered, release }
    }

    fn check_write(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("store unavailable"));
        }
        if key.starts_with("design:") {
            if self.fail_design_writes.load(Ordering::SeqCst) {
                return Err(anyhow!("design records unavailable"));
            }
            let gate = self.gate.lock().unwrap().take();
            if let Some((entered, release)) = gate {
                let _ = entered.send(());
                let _ = release.recv();
            }
            self.design_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl RecordStore for InstrumentedStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_write(key)?;
        self.inner.set(key, value)
    }

    fn del(&self, key: &str) -> Result<bool> {
        self.check_write(key)?;
        self.inner.del(key)
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>>,
    ) -> Result<Option<String>> {
        self.check_write(key)?;
        self.inner.update(key, apply)
    }

    fn set_add(&self, key: &str, members: &[&str]) -> Result<usize> {
        self.check_write(key)?;
        self.inner.set_add(key, members)
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>> {
        self.inner.set_members(key)
    }

    fn ranked_add(&self, key: &str, entries: &[(&str, i64)]) -> Result<usize> {
        self.check_write(key)?;
        self.inner.ranked_add(key, entries)
    }

    fn ranked_increment(&self, key: &str, delta: i64, member: &str) -> Result<i64> {
        self.check_write(key)?;
        self.inner.ranked_increment(key, delta, member)
    }

    fn ranked_range_desc(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        self.inner.ranked_range_desc(key, start, stop)
    }

    fn ranked_rank_desc(&self, key: &str, member: &str) -> Result<Option<usize>> {
        self.inner.ranked_rank_desc(key, member)
    }

    fn ranked_score(&self, key: &str, member: &str) -> Result<Option<i64>> {
        self.inner.ranked_score(key, member)
    }
}
