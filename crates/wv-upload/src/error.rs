use thiserror::Error;

/// Message used when the proxy rejects an upload without saying why.
pub const FALLBACK_MESSAGE: &str = "IPFS upload failed";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The proxy answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("upload transport error: {0}")]
    Transport(String),

    /// A success status without a usable content id.
    #[error("malformed upload response: {0}")]
    MalformedResponse(String),

    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("file {0} is empty")]
    EmptyFile(String),
}

impl UploadError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type UploadResult<T> = Result<T, UploadError>;
