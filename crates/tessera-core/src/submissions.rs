use std::sync::Arc;

use chrono::Utc;
use tessera_types::models::Design;
use tracing::{info, warn};
use uuid::Uuid;

use crate::designs::{DesignRepository, SubmissionClaim};
use crate::error::{Result, TesseraError};
use crate::identity::IdentityProvider;
use crate::leaderboard::LeaderboardIndex;
use crate::themes::ThemeManager;

/// Enters designs into the active theme's contest. One design per user per theme.
pub struct SubmissionService {
    designs: Arc<DesignRepository>,
    themes: Arc<ThemeManager>,
    leaderboard: Arc<LeaderboardIndex>,
}

impl SubmissionService {
    pub fn new(
        designs: Arc<DesignRepository>,
        themes: Arc<ThemeManager>,
        leaderboard: Arc<LeaderboardIndex>,
    ) -> Self {
        Self {
            designs,
            themes,
            leaderboard,
        }
    }

    /// Submits `design` for its theme. Re-submitting the same design refreshes
    /// it in place; a second, different design is rejected. Submission does not
    /// freeze the design.
    ///
    /// If marking the stored record fails, a slot this call claimed is given
    /// back so the user may submit again.
    pub fn submit_design(&self, identity: &dyn IdentityProvider, design: &Design) -> Result<Design> {
        let user = identity.require_auth()?;
        if design.user_id != user.id {
            return Err(TesseraError::NotOwner);
        }
        self.ensure_open(design.theme_id)?;

        let claim = self.designs.claim_submission(design)?;
        if claim == SubmissionClaim::Taken {
            return Err(TesseraError::AlreadySubmitted);
        }

        let (stored, first) = match self.designs.mark_submitted(design) {
            Ok(marked) => marked,
            Err(e) => {
                if claim == SubmissionClaim::Fresh {
                    if let Err(release) = self.designs.release_submission(design) {
                        warn!("Could not release submission slot of design {}: {}", design.id, release);
                    }
                }
                return Err(e);
            }
        };
        self.designs.record_submission(&stored)?;
        if first {
            self.leaderboard.index_submission(&stored)?;
        }

        info!("User {} submitted design {} for theme {}", user.username, stored.id, stored.theme_id);
        Ok(stored)
    }

    pub fn has_user_submitted(&self, user_id: Uuid, theme_id: Uuid) -> Result<bool> {
        self.designs.has_user_submitted(user_id, theme_id)
    }

    /// Only the active theme, before its end, takes submissions.
    fn ensure_open(&self, theme_id: Uuid) -> Result<()> {
        let open = self
            .themes
            .get_current_theme()?
            .is_some_and(|theme| theme.id == theme_id && theme.active && Utc::now() < theme.end_time);
        if open {
            Ok(())
        } else {
            Err(TesseraError::ThemeClosed(theme_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Anonymous, CurrentUser};
    use crate::testing::{InstrumentedStore, memory_store, sample_design};
    use crate::themes::THEME_PRESETS;
    use crate::voting::VotingService;
    use chrono::Duration;
    use tessera_db::RecordStore;
    use tessera_types::models::{Theme, VoteType};

    struct Fixture {
        designs: Arc<DesignRepository>,
        themes: Arc<ThemeManager>,
        leaderboard: Arc<LeaderboardIndex>,
        voting: VotingService,
        submissions: SubmissionService,
        theme: Theme,
    }

    fn fixture() -> Fixture {
        fixture_on(memory_store())
    }

    fn fixture_on(store: Arc<dyn RecordStore>) -> Fixture {
        let designs = Arc::new(DesignRepository::new(store.clone()));
        let themes = Arc::new(ThemeManager::new(store.clone(), Duration::days(7)));
        let leaderboard = Arc::new(LeaderboardIndex::new(store.clone(), designs.clone()));
        let voting = VotingService::new(store, designs.clone(), leaderboard.clone());
        let submissions = SubmissionService::new(designs.clone(), themes.clone(), leaderboard.clone());
        let theme = themes.initialize_default_theme().unwrap().unwrap();
        Fixture {
            designs,
            themes,
            leaderboard,
            voting,
            submissions,
            theme,
        }
    }

    fn voter() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "voter".into(),
        }
    }

    impl Fixture {
        fn score(&self, design_id: Uuid) -> Option<i64> {
            self.leaderboard
                .get_leaderboard_by_theme(self.theme.id)
                .unwrap()
                .into_iter()
                .find(|entry| entry.design.id == design_id)
                .map(|entry| entry.vote_count)
        }
    }

    fn owner_of(design: &Design) -> CurrentUser {
        CurrentUser {
            id: design.user_id,
            username: design.username.clone(),
        }
    }

    #[test]
    fn submission_is_recorded_everywhere() {
        let f = fixture();
        let design = sample_design(Uuid::new_v4(), f.theme.id);
        f.designs.save_design(&design).unwrap();

        let stored = f.submissions.submit_design(&owner_of(&design), &design).unwrap();
        assert!(stored.submitted);
        assert!(stored.submitted_at.is_some());
        assert!(f.submissions.has_user_submitted(design.user_id, f.theme.id).unwrap());

        let (page, total) = f.designs.get_submitted_designs(f.theme.id, 0, 20).unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].id, design.id);
        assert_eq!(f.leaderboard.get_user_rank(design.user_id, f.theme.id).unwrap(), 1);
    }

    #[test]
    fn resubmitting_same_design_updates_in_place() {
        let f = fixture();
        let mut design = sample_design(Uuid::new_v4(), f.theme.id);
        let owner = owner_of(&design);
        let first = f.submissions.submit_design(&owner, &design).unwrap();

        design.background_color = "#112233".into();
        let second = f.submissions.submit_design(&owner, &design).unwrap();

        assert_eq!(second.background_color, "#112233");
        assert_eq!(second.submitted_at, first.submitted_at);
        assert_eq!(f.designs.get_submitted_designs(f.theme.id, 0, 20).unwrap().1, 1);
    }

    #[test]
    fn vote_between_mark_and_index_is_kept_on_the_board() {
        let f = fixture();
        let design = sample_design(Uuid::new_v4(), f.theme.id);
        f.designs.save_design(&design).unwrap();

        assert_eq!(f.designs.claim_submission(&design).unwrap(), SubmissionClaim::Fresh);
        let (stored, first) = f.designs.mark_submitted(&design).unwrap();
        assert!(first);
        f.designs.record_submission(&stored).unwrap();

        let a = voter();
        f.voting.cast_vote(&a, a.id, design.id, VoteType::Upvote).unwrap();
        f.leaderboard.index_submission(&stored).unwrap();

        assert_eq!(f.designs.require_design(design.id).unwrap().vote_count, 1);
        assert_eq!(f.score(design.id), Some(1));
    }

    #[test]
    fn votes_before_submission_are_carried_once() {
        let f = fixture();
        let design = sample_design(Uuid::new_v4(), f.theme.id);
        let owner = owner_of(&design);
        f.designs.save_design(&design).unwrap();

        let (a, b) = (voter(), voter());
        f.voting.cast_vote(&a, a.id, design.id, VoteType::Upvote).unwrap();
        f.voting.cast_vote(&b, b.id, design.id, VoteType::Upvote).unwrap();
        assert_eq!(f.score(design.id), None);

        f.submissions.submit_design(&owner, &design).unwrap();
        assert_eq!(f.score(design.id), Some(2));

        let c = voter();
        f.voting.cast_vote(&c, c.id, design.id, VoteType::Downvote).unwrap();
        f.submissions.submit_design(&owner, &design).unwrap();
        assert_eq!(f.score(design.id), Some(1));
        assert_eq!(f.designs.require_design(design.id).unwrap().vote_count, 1);
    }

    #[test]
    fn failed_mark_gives_the_slot_back() {
        let store = InstrumentedStore::new();
        let f = fixture_on(store.clone());
        let design = sample_design(Uuid::new_v4(), f.theme.id);
        let owner = owner_of(&design);

        store.fail_design_writes(true);
        assert!(matches!(
            f.submissions.submit_design(&owner, &design),
            Err(TesseraError::StoreOperationFailed { .. })
        ));
        assert!(!f.submissions.has_user_submitted(design.user_id, f.theme.id).unwrap());

        // a different design is not locked out by the failed attempt
        store.fail_design_writes(false);
        let other = sample_design(design.user_id, f.theme.id);
        let stored = f.submissions.submit_design(&owner, &other).unwrap();
        assert!(stored.submitted);
        assert_eq!(
            f.designs.submitted_design_id(design.user_id, f.theme.id).unwrap(),
            Some(other.id)
        );
    }

    #[test]
    fn failed_resubmission_keeps_the_existing_slot() {
        let store = InstrumentedStore::new();
        let f = fixture_on(store.clone());
        let design = sample_design(Uuid::new_v4(), f.theme.id);
        let owner = owner_of(&design);
        f.submissions.submit_design(&owner, &design).unwrap();

        store.fail_design_writes(true);
        assert!(f.submissions.submit_design(&owner, &design).is_err());
        assert!(f.submissions.has_user_submitted(design.user_id, f.theme.id).unwrap());
    }

    #[test]
    fn second_design_for_same_theme_is_rejected() {
        let f = fixture();
        let user = Uuid::new_v4();
        let first = sample_design(user, f.theme.id);
        let other = sample_design(user, f.theme.id);
        let owner = owner_of(&first);

        f.submissions.submit_design(&owner, &first).unwrap();
        assert!(matches!(
            f.submissions.submit_design(&owner, &other),
            Err(TesseraError::AlreadySubmitted)
        ));
        assert!(!f.designs.load_design(other.id).unwrap().is_some_and(|d| d.submitted));
    }

    #[test]
    fn only_owner_may_submit() {
        let f = fixture();
        let design = sample_design(Uuid::new_v4(), f.theme.id);
        let stranger = CurrentUser {
            id: Uuid::new_v4(),
            username: "mallory".into(),
        };
        assert!(matches!(
            f.submissions.submit_design(&stranger, &design),
            Err(TesseraError::NotOwner)
        ));
        assert!(matches!(
            f.submissions.submit_design(&Anonymous, &design),
            Err(TesseraError::AuthenticationRequired)
        ));
        assert!(!f.submissions.has_user_submitted(design.user_id, f.theme.id).unwrap());
    }

    #[test]
    fn past_themes_are_closed() {
        let f = fixture();
        let design = sample_design(Uuid::new_v4(), f.theme.id);
        let next = f.themes.theme_from_preset(&THEME_PRESETS[1], Utc::now());
        f.themes.schedule_next_theme(next).unwrap();

        assert!(matches!(
            f.submissions.submit_design(&owner_of(&design), &design),
            Err(TesseraError::ThemeClosed(id)) if id == f.theme.id
        ));
    }
}
