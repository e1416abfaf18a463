use thiserror::Error;
use wv_ledger::LedgerError;
use wv_types::{SubmissionId, TypeError};
use wv_upload::UploadError;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("authentication required: {0}")]
    Authentication(String),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("submission {0} not found")]
    NotFound(SubmissionId),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<LedgerError> for SdkError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unauthenticated => {
                Self::Authentication("connect a wallet with an authorized account".into())
            }
            LedgerError::NotFound(id) => Self::NotFound(id),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<TypeError> for SdkError {
    fn from(err: TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_fold_into_taxonomy() {
        assert!(matches!(
            SdkError::from(LedgerError::Unauthenticated),
            SdkError::Authentication(_)
        ));
        assert!(matches!(
            SdkError::from(LedgerError::NotFound(SubmissionId(4))),
            SdkError::NotFound(SubmissionId(4))
        ));
        assert!(matches!(
            SdkError::from(LedgerError::Reverted("already approved".into())),
            SdkError::Network(msg) if msg.contains("already approved")
        ));
        assert!(matches!(
            SdkError::from(LedgerError::Rejected("User denied".into())),
            SdkError::Network(_)
        ));
    }

    #[test]
    fn upload_error_keeps_proxy_text() {
        let err = SdkError::from(UploadError::Rejected {
            status: 500,
            message: "pinning failed".into(),
        });
        assert_eq!(err.to_string(), "upload failed: pinning failed");
    }

    #[test]
    fn type_errors_are_validation() {
        assert!(matches!(
            SdkError::from(TypeError::EmptyCid),
            SdkError::Validation(_)
        ));
    }
}
