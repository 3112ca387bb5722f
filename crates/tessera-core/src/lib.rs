//! Contest engine: design editing, debounced persistence, the vote ledger,
//! per-theme leaderboards and theme rotation, all on top of a `RecordStore`.

pub mod assets;
pub mod autosave;
pub mod color;
pub mod design_manager;
pub mod designs;
pub mod error;
pub mod identity;
pub mod leaderboard;
pub mod submissions;
pub mod themes;
pub mod voting;

pub use error::{Result, TesseraError};

#[cfg(test)]
pub(crate) mod testing;
