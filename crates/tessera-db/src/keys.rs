//! Key layout of the record store. These strings are the on-disk schema:
//! renaming one orphans every record written under the old name.

use uuid::Uuid;

pub const CURRENT_THEME: &str = "theme:current";
pub const ALL_THEMES: &str = "themes";

pub fn design(id: Uuid) -> String {
    format!("design:{}", id)
}

pub fn user_designs(user_id: Uuid) -> String {
    format!("user:{}:designs", user_id)
}

pub fn theme(id: Uuid) -> String {
    format!("theme:{}", id)
}

pub fn theme_submissions(theme_id: Uuid) -> String {
    format!("theme:{}:submissions", theme_id)
}

/// Holds the id of the design a user submitted for a theme.
pub fn submission_marker(user_id: Uuid, theme_id: Uuid) -> String {
    format!("submission:{}:{}", user_id, theme_id)
}

pub fn leaderboard(theme_id: Uuid) -> String {
    format!("leaderboard:{}", theme_id)
}

pub fn vote(design_id: Uuid, voter_id: Uuid) -> String {
    format!("vote:{}:{}", design_id, voter_id)
}

pub fn account(username: &str) -> String {
    format!("account:{}", username.to_lowercase())
}
