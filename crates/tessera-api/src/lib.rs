//! HTTP surface of the contest: accounts, the editing working set, voting,
//! leaderboards, themes and the asset catalog.

pub mod assets;
pub mod auth;
pub mod designs;
pub mod error;
pub mod leaderboard;
pub mod middleware;
pub mod routes;
pub mod themes;
pub mod votes;
pub mod workspace;
