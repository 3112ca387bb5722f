use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tessera_core::Result;
use tessera_core::autosave::AutoSaveManager;
use tessera_core::design_manager::{Canvas, DesignManager};
use tessera_core::designs::{DesignRepository, carry_ledger_fields};
use tessera_core::identity::CurrentUser;
use tessera_core::TesseraError;
use tessera_types::api::SaveStatusResponse;
use tessera_types::models::Design;
use tracing::{debug, warn};
use uuid::Uuid;

/// Designs currently being edited, shared by all requests.
///
/// Edits go to an in-memory copy and are persisted by that design's
/// debounced saver. Reads prefer the working copy, with the vote and
/// submission fields taken from the store since those never change here.
/// Copies whose saver has settled are dropped by [`Workspace::evict_idle`].
///
/// Lock order is `manager` then `savers`.
pub struct Workspace {
    designs: Arc<DesignRepository>,
    debounce: Duration,
    manager: Mutex<DesignManager>,
    savers: Mutex<HashMap<Uuid, AutoSaveManager>>,
}

impl Workspace {
    pub fn new(designs: Arc<DesignRepository>, canvas: Canvas, debounce: Duration) -> Self {
        Self {
            designs,
            debounce,
            manager: Mutex::new(DesignManager::new(canvas)),
            savers: Mutex::new(HashMap::new()),
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.manager().canvas()
    }

    /// Starts a design and writes it right away so it shows up in listings.
    pub fn create(&self, user: &CurrentUser, theme_id: Uuid) -> Result<Design> {
        let design = self
            .manager()
            .create_design(user.id, theme_id, &user.username)
            .clone();
        self.saver(design.id).force_save(&design)
    }

    /// Applies one edit for the owner and schedules a save. Only the owner's
    /// edits open a stored design.
    pub fn edit<F>(&self, user: &CurrentUser, design_id: Uuid, apply: F) -> Result<Design>
    where
        F: FnOnce(&mut DesignManager) -> Result<Design>,
    {
        let edited = {
            let mut manager = self.manager();
            let working_owner = manager.get_design(design_id).map(|working| working.user_id);
            let owner = match working_owner {
                Some(owner) => owner,
                None => {
                    let stored = self.designs.require_design(design_id)?;
                    if stored.user_id != user.id {
                        return Err(TesseraError::NotOwner);
                    }
                    manager.open_design(stored).user_id
                }
            };
            if owner != user.id {
                return Err(TesseraError::NotOwner);
            }
            let edited = apply(&mut manager)?;

            // Scheduled under the manager lock so eviction never sees the
            // edit without its pending snapshot.
            self.saver(design_id).schedule_auto_save(edited.clone());
            edited
        };

        self.overlay(edited)
    }

    /// The freshest view of a design.
    pub fn current(&self, design_id: Uuid) -> Result<Design> {
        let working = self.manager().get_design(design_id).cloned();
        match working {
            Some(working) => self.overlay(working),
            None => self.designs.require_design(design_id),
        }
    }

    /// The owner's working copy if one is open, otherwise the stored record.
    pub fn current_for_owner(&self, user: &CurrentUser, design_id: Uuid) -> Result<Design> {
        let design = self.current(design_id)?;
        if design.user_id != user.id {
            return Err(TesseraError::NotOwner);
        }
        Ok(design)
    }

    /// Writes the working copy now. Designs with no working copy are already
    /// persisted and are returned as stored.
    pub fn flush(&self, user: &CurrentUser, design_id: Uuid) -> Result<Design> {
        let design = self.current_for_owner(user, design_id)?;
        let working = self.manager().get_design(design_id).cloned();
        match working {
            Some(working) => self.saver(design_id).force_save(&working),
            None => Ok(design),
        }
    }

    /// Persists any pending edit and drops the working copy.
    pub fn close(&self, user: &CurrentUser, design_id: Uuid) -> Result<Design> {
        let design = self.flush(user, design_id)?;
        self.manager().close_design(design_id);
        self.savers_lock().remove(&design_id);
        debug!("Closed design {}", design_id);
        Ok(design)
    }

    pub fn status(&self, design_id: Uuid) -> SaveStatusResponse {
        let saver = self.savers_lock().get(&design_id).cloned();
        match saver {
            Some(saver) => SaveStatusResponse {
                design_id,
                status: saver.status(),
                last_save_time: saver.last_save_time(),
                last_error: saver.last_error(),
            },
            None => SaveStatusResponse {
                design_id,
                status: tessera_types::models::SaveStatus::Idle,
                last_save_time: None,
                last_error: None,
            },
        }
    }

    /// Drops the pending save of a design, keeping the working copy.
    pub fn cancel(&self, user: &CurrentUser, design_id: Uuid) -> Result<()> {
        self.current_for_owner(user, design_id)?;
        if let Some(saver) = self.savers_lock().get(&design_id) {
            saver.cancel_pending_save();
        }
        Ok(())
    }

    /// Writes every pending snapshot. Used on shutdown.
    pub fn flush_all(&self) -> usize {
        let savers: Vec<(Uuid, AutoSaveManager)> = self
            .savers_lock()
            .iter()
            .map(|(id, saver)| (*id, saver.clone()))
            .collect();

        let mut flushed = 0;
        for (id, saver) in savers {
            match saver.flush_pending() {
                Ok(Some(_)) => flushed += 1,
                Ok(None) => {}
                Err(e) => warn!("Failed to flush design {}: {}", id, e),
            }
        }
        flushed
    }

    /// Drops working copies whose last save succeeded with nothing pending.
    /// Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let mut manager = self.manager();
        let mut savers = self.savers_lock();

        let settled: Vec<Uuid> = savers
            .iter()
            .filter(|(_, saver)| saver.is_settled())
            .map(|(id, _)| *id)
            .collect();
        for id in &settled {
            manager.close_design(*id);
            savers.remove(id);
        }

        if !settled.is_empty() {
            debug!("Evicted {} idle designs", settled.len());
        }
        settled.len()
    }

    pub fn open_count(&self) -> usize {
        self.manager().open_count()
    }

    fn overlay(&self, mut working: Design) -> Result<Design> {
        if let Some(stored) = self.designs.load_design(working.id)? {
            carry_ledger_fields(&mut working, &stored);
        }
        Ok(working)
    }

    fn saver(&self, design_id: Uuid) -> AutoSaveManager {
        self.savers_lock()
            .entry(design_id)
            .or_insert_with(|| AutoSaveManager::new(self.designs.clone(), self.debounce))
            .clone()
    }

    fn manager(&self) -> MutexGuard<'_, DesignManager> {
        self.manager.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn savers_lock(&self) -> MutexGuard<'_, HashMap<Uuid, AutoSaveManager>> {
        self.savers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
