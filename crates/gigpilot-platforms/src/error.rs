use thiserror::Error;

/// Errors that can occur within the platform subsystem.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform id is not present in the registry. Connecting to an
    /// unlisted platform is a caller bug, not a runtime condition.
    #[error("Unknown platform: {id}")]
    UnknownPlatform { id: String },
}

pub type Result<T> = std::result::Result<T, PlatformError>;
