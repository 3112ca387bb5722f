use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Background applied to freshly created designs.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#F5F0E6";

/// One catalog element positioned on a design's canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedAsset {
    /// Stable identity; list indices shift on removal, this does not.
    pub id: Uuid,
    pub asset_id: String,
    pub x: i32,
    pub y: i32,
    /// Always one of 0, 90, 180, 270.
    pub rotation: u16,
    pub z_index: i64,
}

/// A user's arrangement for a theme, in progress or submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub theme_id: Uuid,
    pub background_color: String,
    pub assets: Vec<PlacedAsset>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted: bool,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Upvotes minus downvotes.
    pub vote_count: i64,
    /// Next paint-order value handed out by placement. Never reused.
    #[serde(default)]
    pub next_z_index: i64,
}

/// A time-boxed challenge. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    /// Contribution of this vote to a design's score.
    pub fn weight(self) -> i64 {
        match self {
            Self::Upvote => 1,
            Self::Downvote => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "upvote" => Some(Self::Upvote),
            "downvote" => Some(Self::Downvote),
            _ => None,
        }
    }
}

/// Derived ranking row, recomputed on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub design: Design,
    pub username: String,
    pub vote_count: i64,
}

/// Catalog entry a design can place. Display metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub category: String,
    pub width: u32,
    pub height: u32,
    pub image_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}
