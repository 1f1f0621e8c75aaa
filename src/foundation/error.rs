use std::path::PathBuf;

pub type FamshotResult<T> = Result<T, FamshotError>;

#[derive(thiserror::Error, Debug)]
pub enum FamshotError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("host error: {0}")]
    Host(String),

    #[error("placement error: {0}")]
    Placement(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("no component files found in source directory '{}'", .0.display())]
    NoComponents(PathBuf),

    #[error("unknown image format '{0}'")]
    UnknownFormat(String),

    #[error("artifact name '{0}' is not a valid file name")]
    InvalidName(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FamshotError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    pub fn placement(msg: impl Into<String>) -> Self {
        Self::Placement(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Errors that abort a whole run instead of a single component or variant.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NoComponents(_) | Self::UnknownFormat(_)
        )
    }
}
