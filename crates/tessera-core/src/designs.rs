use std::sync::Arc;

use chrono::Utc;
use tessera_db::{RecordStore, keys};
use tessera_types::models::Design;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreContext, TesseraError, decode_record};

const MAX_PAGE_SIZE: usize = 100;

/// Durable home of design records and the indices around them.
pub struct DesignRepository {
    store: Arc<dyn RecordStore>,
}

impl DesignRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Writes the design's structure. Fields owned by the vote ledger and the
    /// submission flow (`vote_count`, `submitted`, `submitted_at`) keep their
    /// stored values, so a stale working copy cannot roll them back.
    /// Returns what was stored.
    pub fn save_design(&self, design: &Design) -> Result<Design> {
        let key = keys::design(design.id);
        let mut stored = None;

        self.store
            .update(&key, &mut |current| {
                let mut next = design.clone();
                if let Some(raw) = current {
                    let existing: Design = serde_json::from_str(&raw)?;
                    carry_ledger_fields(&mut next, &existing);
                }
                let raw = serde_json::to_string(&next)?;
                stored = Some(next);
                Ok(Some(raw))
            })
            .store_context(format!("failed to save design {}", design.id))?;

        self.store
            .set_add(&keys::user_designs(design.user_id), &[&design.id.to_string()])
            .store_context("failed to index design for its owner")?;

        debug!("Saved design {}", design.id);
        stored.ok_or(TesseraError::DesignNotFound(design.id))
    }

    pub fn load_design(&self, id: Uuid) -> Result<Option<Design>> {
        let key = keys::design(id);
        let raw = self
            .store
            .get(&key)
            .store_context(format!("failed to load design {}", id))?;
        raw.map(|raw| decode_record(&key, &raw)).transpose()
    }

    pub fn require_design(&self, id: Uuid) -> Result<Design> {
        self.load_design(id)?.ok_or(TesseraError::DesignNotFound(id))
    }

    /// All designs owned by a user, most recently edited first.
    pub fn get_user_designs(&self, user_id: Uuid) -> Result<Vec<Design>> {
        let ids = self
            .store
            .set_members(&keys::user_designs(user_id))
            .store_context("failed to list user designs")?;

        let mut designs = self.load_many(&ids)?;
        designs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(designs)
    }

    /// Atomically adds `delta` to the stored vote count.
    pub fn adjust_vote_count(&self, id: Uuid, delta: i64) -> Result<Design> {
        let mut updated = None;

        self.store
            .update(&keys::design(id), &mut |current| {
                let Some(raw) = current else {
                    return Ok(None);
                };
                let mut design: Design = serde_json::from_str(&raw)?;
                design.vote_count += delta;
                let raw = serde_json::to_string(&design)?;
                updated = Some(design);
                Ok(Some(raw))
            })
            .store_context(format!("failed to update vote count of design {}", id))?;

        updated.ok_or(TesseraError::DesignNotFound(id))
    }

    pub fn submitted_design_id(&self, user_id: Uuid, theme_id: Uuid) -> Result<Option<Uuid>> {
        let key = keys::submission_marker(user_id, theme_id);
        let raw = self
            .store
            .get(&key)
            .store_context("failed to check submission status")?;
        raw.map(|raw| {
            raw.parse::<Uuid>()
                .map_err(anyhow::Error::from)
                .store_context(format!("corrupt record at {}", key))
        })
        .transpose()
    }

    pub fn has_user_submitted(&self, user_id: Uuid, theme_id: Uuid) -> Result<bool> {
        Ok(self.submitted_design_id(user_id, theme_id)?.is_some())
    }

    /// Atomically reserves the user's one submission slot for this theme.
    pub(crate) fn claim_submission(&self, design: &Design) -> Result<SubmissionClaim> {
        let id = design.id.to_string();
        let mut claim = SubmissionClaim::Taken;
        self.store
            .update(&keys::submission_marker(design.user_id, design.theme_id), &mut |current| {
                claim = match current.as_deref() {
                    None => SubmissionClaim::Fresh,
                    Some(holder) if holder == id => SubmissionClaim::Held,
                    Some(_) => SubmissionClaim::Taken,
                };
                Ok((claim == SubmissionClaim::Fresh).then(|| id.clone()))
            })
            .store_context("failed to claim submission")?;
        Ok(claim)
    }

    /// Gives back a slot taken by a [`SubmissionClaim::Fresh`] claim whose
    /// submission did not go through.
    pub(crate) fn release_submission(&self, design: &Design) -> Result<()> {
        self.store
            .del(&keys::submission_marker(design.user_id, design.theme_id))
            .store_context("failed to release submission")?;
        Ok(())
    }

    /// Records the submission indices for a design already marked submitted.
    pub(crate) fn record_submission(&self, design: &Design) -> Result<()> {
        let id = design.id.to_string();
        self.store
            .set_add(&keys::theme_submissions(design.theme_id), &[&id])
            .store_context("failed to index submission")?;
        self.store
            .set(&keys::submission_marker(design.user_id, design.theme_id), &id)
            .store_context("failed to mark submission")?;
        Ok(())
    }

    /// Marks the design submitted in its stored record. Returns the stored
    /// design, and whether this call is what first marked it.
    pub(crate) fn mark_submitted(&self, design: &Design) -> Result<(Design, bool)> {
        let mut next = design.clone();
        next.submitted = true;
        next.submitted_at.get_or_insert_with(Utc::now);

        let key = keys::design(design.id);
        let mut stored = None;
        let mut first = true;
        self.store
            .update(&key, &mut |current| {
                let mut candidate = next.clone();
                first = true;
                if let Some(raw) = current {
                    let existing: Design = serde_json::from_str(&raw)?;
                    first = !existing.submitted;
                    candidate.vote_count = existing.vote_count;
                    candidate.submitted_at = existing.submitted_at.or(candidate.submitted_at);
                }
                let raw = serde_json::to_string(&candidate)?;
                stored = Some(candidate);
                Ok(Some(raw))
            })
            .store_context(format!("failed to submit design {}", design.id))?;

        self.store
            .set_add(&keys::user_designs(design.user_id), &[&design.id.to_string()])
            .store_context("failed to index design for its owner")?;

        let stored = stored.ok_or(TesseraError::DesignNotFound(design.id))?;
        Ok((stored, first))
    }

    /// Submitted designs for a theme, newest submission first.
    /// Returns the requested page and the total number of submissions.
    pub fn get_submitted_designs(
        &self,
        theme_id: Uuid,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<Design>, usize)> {
        let ids = self
            .store
            .set_members(&keys::theme_submissions(theme_id))
            .store_context("failed to list submissions")?;

        let mut designs: Vec<Design> = self
            .load_many(&ids)?
            .into_iter()
            .filter(|design| design.submitted)
            .collect();
        designs.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then(b.updated_at.cmp(&a.updated_at))
                .then(a.id.cmp(&b.id))
        });

        let total = designs.len();
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        let page = designs
            .into_iter()
            .skip(page.saturating_mul(per_page))
            .take(per_page)
            .collect();
        Ok((page, total))
    }

    /// Loads each id, skipping ids whose record is gone.
    pub(crate) fn load_many(&self, ids: &[String]) -> Result<Vec<Design>> {
        let mut designs = Vec::with_capacity(ids.len());
        for raw_id in ids {
            let Ok(id) = raw_id.parse::<Uuid>() else {
                debug!("Skipping malformed design id {:?}", raw_id);
                continue;
            };
            if let Some(design) = self.load_design(id)? {
                designs.push(design);
            }
        }
        Ok(designs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmissionClaim {
    /// The slot was free and now holds this design.
    Fresh,
    /// This design already held the slot.
    Held,
    /// Another design holds the slot.
    Taken,
}

/// Copies the fields a structural write must not overwrite.
pub fn carry_ledger_fields(working: &mut Design, stored: &Design) {
    working.vote_count = stored.vote_count;
    working.submitted = working.submitted || stored.submitted;
    working.submitted_at = stored.submitted_at.or(working.submitted_at);
}
