use std::sync::Arc;

use tessera_db::{RecordStore, keys};
use tessera_types::models::{Design, VoteType};
use tracing::{debug, info};
use uuid::Uuid;

use crate::designs::DesignRepository;
use crate::error::{Result, StoreContext, TesseraError};
use crate::identity::{IdentityProvider, require_actor};
use crate::leaderboard::LeaderboardIndex;

/// The vote ledger: one vote per (voter, design), reflected in the design's
/// `vote_count` and, once submitted, in its leaderboard score.
///
/// Every operation returns the delta it applied to the count.
pub struct VotingService {
    store: Arc<dyn RecordStore>,
    designs: Arc<DesignRepository>,
    leaderboard: Arc<LeaderboardIndex>,
}

impl VotingService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        designs: Arc<DesignRepository>,
        leaderboard: Arc<LeaderboardIndex>,
    ) -> Self {
        Self {
            store,
            designs,
            leaderboard,
        }
    }

    pub fn cast_vote(
        &self,
        identity: &dyn IdentityProvider,
        voter_id: Uuid,
        design_id: Uuid,
        vote_type: VoteType,
    ) -> Result<i64> {
        let design = self.check_voter(identity, voter_id, design_id)?;

        let mut existed = false;
        self.store
            .update(&keys::vote(design_id, voter_id), &mut |current| {
                existed = current.is_some();
                Ok((!existed).then(|| vote_type.as_str().to_string()))
            })
            .store_context("failed to record vote")?;
        if existed {
            return Err(TesseraError::AlreadyVoted);
        }

        let delta = vote_type.weight();
        self.apply(&design, delta)?;
        info!("User {} cast {} on design {}", voter_id, vote_type.as_str(), design_id);
        Ok(delta)
    }

    /// Replaces an existing vote. Upvote to downvote applies -2; the same type
    /// applies 0.
    pub fn change_vote(
        &self,
        identity: &dyn IdentityProvider,
        voter_id: Uuid,
        design_id: Uuid,
        new_type: VoteType,
    ) -> Result<i64> {
        let design = self.check_voter(identity, voter_id, design_id)?;

        let key = keys::vote(design_id, voter_id);
        let mut prior = None;
        self.store
            .update(&key, &mut |current| {
                let Some(raw) = current else {
                    return Ok(None);
                };
                prior = Some(parse_vote(&raw)?);
                Ok(Some(new_type.as_str().to_string()))
            })
            .store_context("failed to change vote")?;
        let prior = prior.ok_or(TesseraError::NoExistingVote)?;

        let delta = new_type.weight() - prior.weight();
        self.apply(&design, delta)?;
        debug!("User {} changed vote on design {} by {}", voter_id, design_id, delta);
        Ok(delta)
    }

    /// Withdraws a vote. Withdrawing when there is none is a no-op.
    pub fn remove_vote(
        &self,
        identity: &dyn IdentityProvider,
        voter_id: Uuid,
        design_id: Uuid,
    ) -> Result<i64> {
        let design = self.check_voter(identity, voter_id, design_id)?;

        let key = keys::vote(design_id, voter_id);
        let Some(prior) = self.get_user_vote(voter_id, design_id)? else {
            return Ok(0);
        };
        // A concurrent removal may have won; only the caller that deletes reverses.
        if !self.store.del(&key).store_context("failed to remove vote")? {
            return Ok(0);
        }

        let delta = -prior.weight();
        self.apply(&design, delta)?;
        debug!("User {} withdrew vote on design {}", voter_id, design_id);
        Ok(delta)
    }

    pub fn get_user_vote(&self, voter_id: Uuid, design_id: Uuid) -> Result<Option<VoteType>> {
        let raw = self
            .store
            .get(&keys::vote(design_id, voter_id))
            .store_context("failed to read vote")?;
        raw.map(|raw| parse_vote(&raw).store_context("failed to read vote"))
            .transpose()
    }

    fn check_voter(
        &self,
        identity: &dyn IdentityProvider,
        voter_id: Uuid,
        design_id: Uuid,
    ) -> Result<Design> {
        require_actor(identity, voter_id)?;
        let design = self.designs.require_design(design_id)?;
        if design.user_id == voter_id {
            return Err(TesseraError::SelfVoteForbidden);
        }
        Ok(design)
    }

    /// Count first, then leaderboard. Designs that were never submitted have
    /// no leaderboard entry; submission enters them with the count so far.
    fn apply(&self, design: &Design, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let updated = self.designs.adjust_vote_count(design.id, delta)?;
        if updated.submitted {
            self.leaderboard.update_vote_count(design.id, delta)?;
        }
        Ok(())
    }
}

fn parse_vote(raw: &str) -> anyhow::Result<VoteType> {
    VoteType::parse(raw).ok_or_else(|| anyhow::anyhow!("unknown vote type {:?}", raw))
}
