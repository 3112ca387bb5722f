use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

/// Every failure a contest operation can report. Messages are shown to users
/// as-is, so they say what to do rather than what broke.
#[derive(Debug, Error)]
pub enum TesseraError {
    #[error("please log in to continue")]
    AuthenticationRequired,

    #[error("cannot act on behalf of another user")]
    CannotActForAnotherUser,

    #[error("only the owner can change this design")]
    NotOwner,

    #[error("cannot vote on your own design")]
    SelfVoteForbidden,

    #[error("design {0} not found")]
    DesignNotFound(Uuid),

    #[error("asset index {index} is out of range for a design with {len} assets")]
    InvalidAssetIndex { index: usize, len: usize },

    #[error("invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("already submitted a design for this theme")]
    AlreadySubmitted,

    #[error("already voted on this design, change the vote instead")]
    AlreadyVoted,

    #[error("no vote to change on this design")]
    NoExistingVote,

    #[error("theme {0} not found")]
    ThemeNotFound(Uuid),

    #[error("theme {0} is not accepting submissions")]
    ThemeClosed(Uuid),

    #[error("a theme must end after it starts")]
    InvalidThemeWindow,

    #[error("{context}: {source}")]
    StoreOperationFailed {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, TesseraError>;

/// Attaches the purpose of a store call to its failure.
pub(crate) trait StoreContext<T> {
    fn store_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> StoreContext<T> for anyhow::Result<T> {
    fn store_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| TesseraError::StoreOperationFailed {
            context: context.into(),
            source,
        })
    }
}

pub(crate) fn encode_record<T: Serialize>(key: &str, value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(anyhow::Error::from)
        .store_context(format!("failed to encode {}", key))
}

pub(crate) fn decode_record<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(anyhow::Error::from)
        .store_context(format!("corrupt record at {}", key))
}
