use thiserror::Error;
use wv_rpc::RpcError;

/// EIP-1193 provider error codes this crate reacts to.
pub mod codes {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const METHOD_NOT_FOUND: i64 = -32601;
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WalletError {
    #[error("no wallet provider available")]
    Unavailable,

    #[error("wallet granted no accounts")]
    NoAccounts,

    #[error("{message}")]
    Provider { code: i64, message: String },

    #[error("wallet transport error: {0}")]
    Transport(String),

    #[error("malformed wallet response: {0}")]
    Malformed(String),
}

impl WalletError {
    pub fn provider(code: i64, message: impl Into<String>) -> Self {
        Self::Provider {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Provider { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The wallet does not know the requested chain and needs it registered.
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code() == Some(codes::UNRECOGNIZED_CHAIN)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code() == Some(codes::USER_REJECTED)
    }
}

impl From<RpcError> for WalletError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Remote { code, message, .. } => Self::Provider { code, message },
            RpcError::Malformed(msg) => Self::Malformed(msg),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<wv_types::TypeError> for WalletError {
    fn from(err: wv_types::TypeError) -> Self {
        Self::Malformed(err.to_string())
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
