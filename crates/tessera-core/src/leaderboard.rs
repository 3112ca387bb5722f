use std::sync::Arc;

use tessera_db::{RecordStore, keys};
use tessera_types::models::{Design, LeaderboardEntry};
use tracing::debug;
use uuid::Uuid;

use crate::designs::DesignRepository;
use crate::error::{Result, StoreContext};

/// Per-theme ranking of design ids by score.
///
/// The score is a second copy of `vote_count`, kept in a ranked set so reads
/// never scan a theme's designs. The two copies are written by separate calls
/// and can briefly disagree.
pub struct LeaderboardIndex {
    store: Arc<dyn RecordStore>,
    designs: Arc<DesignRepository>,
}

impl LeaderboardIndex {
    pub fn new(store: Arc<dyn RecordStore>, designs: Arc<DesignRepository>) -> Self {
        Self { store, designs }
    }

    /// Adds `delta` to the design's entry under its theme. An absent entry
    /// starts at `delta`. Returns the new score.
    pub fn update_vote_count(&self, design_id: Uuid, delta: i64) -> Result<i64> {
        let design = self.designs.require_design(design_id)?;
        let score = self
            .store
            .ranked_increment(&keys::leaderboard(design.theme_id), delta, &design_id.to_string())
            .store_context(format!("failed to update leaderboard for design {}", design_id))?;

        debug!("Design {} now scores {}", design_id, score);
        Ok(score)
    }

    /// Enters a newly submitted design, adding the votes it collected before
    /// submission. Votes cast after the stored record was marked submitted
    /// increment the same entry themselves, so this must run once per design
    /// with the `vote_count` read when it was marked.
    pub fn index_submission(&self, design: &Design) -> Result<()> {
        self.store
            .ranked_increment(
                &keys::leaderboard(design.theme_id),
                design.vote_count,
                &design.id.to_string(),
            )
            .store_context(format!("failed to index design {} on leaderboard", design.id))?;
        Ok(())
    }

    pub fn get_top_designs(&self, theme_id: Uuid, limit: usize) -> Result<Vec<Design>> {
        if limit == 0 {
            return Ok(vec![]);
        }
        let stop = isize::try_from(limit - 1).unwrap_or(isize::MAX);
        let ids = self
            .store
            .ranked_range_desc(&keys::leaderboard(theme_id), 0, stop)
            .store_context("failed to read leaderboard")?;
        self.designs.load_many(&ids)
    }

    /// 1-based rank of the user's submitted design, or -1 if they have none.
    pub fn get_user_rank(&self, user_id: Uuid, theme_id: Uuid) -> Result<i64> {
        let Some(design_id) = self.designs.submitted_design_id(user_id, theme_id)? else {
            return Ok(-1);
        };
        let rank = self
            .store
            .ranked_rank_desc(&keys::leaderboard(theme_id), &design_id.to_string())
            .store_context("failed to read leaderboard rank")?;
        Ok(rank.map_or(-1, |rank| rank as i64 + 1))
    }

    /// The whole ranking with contiguous ranks starting at 1.
    pub fn get_leaderboard_by_theme(&self, theme_id: Uuid) -> Result<Vec<LeaderboardEntry>> {
        let key = keys::leaderboard(theme_id);
        let ids = self
            .store
            .ranked_range_desc(&key, 0, -1)
            .store_context("failed to read leaderboard")?;

        let mut entries = Vec::with_capacity(ids.len());
        for design in self.designs.load_many(&ids)? {
            let score = self
                .store
                .ranked_score(&key, &design.id.to_string())
                .store_context("failed to read leaderboard score")?
                .unwrap_or(design.vote_count);

            entries.push(LeaderboardEntry {
                rank: entries.len() + 1,
                username: design.username.clone(),
                vote_count: score,
                design,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{memory_store, sample_design};

    fn setup() -> (Arc<DesignRepository>, LeaderboardIndex) {
        let store = memory_store();
        let designs = Arc::new(DesignRepository::new(store.clone()));
        let index = LeaderboardIndex::new(store, designs.clone());
        (designs, index)
    }

    fn submitted(designs: &DesignRepository, index: &LeaderboardIndex, theme_id: Uuid, score: i64) -> Design {
        let design = sample_design(Uuid::new_v4(), theme_id);
        designs.save_design(&design).unwrap();
        designs.adjust_vote_count(design.id, score).unwrap();
        let (design, _) = designs.mark_submitted(&design).unwrap();
        designs.record_submission(&design).unwrap();
        index.index_submission(&design).unwrap();
        design
    }

    #[test]
    fn ranks_follow_descending_scores() {
        let (designs, index) = setup();
        let theme = Uuid::new_v4();
        let entered: Vec<Design> = [42, 15, 28, 7, -3]
            .into_iter()
            .map(|score| submitted(&designs, &index, theme, score))
            .collect();

        let board = index.get_leaderboard_by_theme(theme).unwrap();
        let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
        let scores: Vec<i64> = board.iter().map(|e| e.vote_count).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert_eq!(scores, vec![42, 28, 15, 7, -3]);

        assert_eq!(index.get_user_rank(entered[0].user_id, theme).unwrap(), 1);
        assert_eq!(index.get_user_rank(entered[2].user_id, theme).unwrap(), 2);
        assert_eq!(index.get_user_rank(entered[4].user_id, theme).unwrap(), 5);
    }

    #[test]
    fn top_designs_respect_limit() {
        let (designs, index) = setup();
        let theme = Uuid::new_v4();
        for score in [3, 9, 1] {
            submitted(&designs, &index, theme, score);
        }

        let top: Vec<i64> = index
            .get_top_designs(theme, 2)
            .unwrap()
            .iter()
            .map(|d| d.vote_count)
            .collect();
        assert_eq!(top, vec![9, 3]);
        assert!(index.get_top_designs(theme, 0).unwrap().is_empty());
        assert_eq!(index.get_top_designs(theme, 50).unwrap().len(), 3);
    }

    #[test]
    fn unknown_theme_is_empty() {
        let (_, index) = setup();
        let theme = Uuid::new_v4();
        assert!(index.get_top_designs(theme, 10).unwrap().is_empty());
        assert!(index.get_leaderboard_by_theme(theme).unwrap().is_empty());
    }

    #[test]
    fn user_without_submission_has_no_rank() {
        let (_, index) = setup();
        assert_eq!(index.get_user_rank(Uuid::new_v4(), Uuid::new_v4()).unwrap(), -1);
    }

    #[test]
    fn increments_create_then_move_entries() {
        let (designs, index) = setup();
        let theme = Uuid::new_v4();
        let design = sample_design(Uuid::new_v4(), theme);
        designs.save_design(&design).unwrap();

        assert_eq!(index.update_vote_count(design.id, -1).unwrap(), -1);
        assert_eq!(index.update_vote_count(design.id, 3).unwrap(), 2);
        assert_eq!(index.get_leaderboard_by_theme(theme).unwrap()[0].vote_count, 2);
    }

    #[test]
    fn ties_keep_entry_order() {
        let (designs, index) = setup();
        let theme = Uuid::new_v4();
        let first = submitted(&designs, &index, theme, 5);
        let second = submitted(&designs, &index, theme, 5);

        let board = index.get_leaderboard_by_theme(theme).unwrap();
        assert_eq!(board[0].design.id, first.id);
        assert_eq!(board[1].design.id, second.id);
    }

    #[test]
    fn scoring_a_missing_design_fails() {
        let (_, index) = setup();
        assert!(matches!(
            index.update_vote_count(Uuid::new_v4(), 1),
            Err(crate::TesseraError::DesignNotFound(_))
        ));
    }
}
