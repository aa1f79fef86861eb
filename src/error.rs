use thiserror::Error;

/// Classification of a failure, independent of how many layers of context wrap it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    DuplicateKey,
    NotFound,
    Backend,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::DuplicateKey => "duplicate_key",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Backend => "backend",
        }
    }
}

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("an item with id {0} already exists")]
    DuplicateKey(i64),

    #[error("item with id {0} does not exist")]
    NotFound(i64),

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<InventoryError>,
    },
}

impl InventoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            InventoryError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            InventoryError::NotFound(_) => ErrorKind::NotFound,
            InventoryError::Database { .. }
            | InventoryError::Config(_)
            | InventoryError::Io(_)
            | InventoryError::Toml(_) => ErrorKind::Backend,
            InventoryError::Context { source, .. } => source.kind(),
        }
    }

    /// Wraps the error with a short description of the operation that failed.
    pub fn context(self, context: impl Into<String>) -> Self {
        InventoryError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context wrappers stripped.
    pub fn root(&self) -> &InventoryError {
        match self {
            InventoryError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn database(message: impl Into<String>) -> Self {
        InventoryError::Database {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;
