//! Domain error types.

/// A rejected candidate record. The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Top-level error type for tradebook.
#[derive(Debug, thiserror::Error)]
pub enum TradebookError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{phase} allows only one trade per position")]
    TradeLimit { phase: String },

    #[error("{collection} record {id} already exists")]
    DuplicateRecord { collection: String, id: String },

    #[error("{collection} record {id} not found")]
    NotFound { collection: String, id: String },

    #[error("corrupt {collection} record {id}: {reason}")]
    CorruptRecord {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradebookError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        TradebookError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// True for errors raised by the storage engine rather than by a rule check.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            TradebookError::DuplicateRecord { .. }
                | TradebookError::NotFound { .. }
                | TradebookError::CorruptRecord { .. }
                | TradebookError::Database { .. }
                | TradebookError::DatabaseQuery { .. }
        )
    }
}

impl From<&TradebookError> for std::process::ExitCode {
    fn from(err: &TradebookError) -> Self {
        let code: u8 = match err {
            TradebookError::Io(_) => 1,
            TradebookError::ConfigParse { .. }
            | TradebookError::ConfigMissing { .. }
            | TradebookError::ConfigInvalid { .. } => 2,
            TradebookError::Database { .. }
            | TradebookError::DatabaseQuery { .. }
            | TradebookError::DuplicateRecord { .. }
            | TradebookError::CorruptRecord { .. } => 3,
            TradebookError::Validation(_) => 4,
            TradebookError::TradeLimit { .. } => 5,
            TradebookError::NotFound { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
