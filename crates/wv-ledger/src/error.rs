use wv_rpc::codec::decode_data;
use wv_rpc::RpcError;
use wv_types::{SubmissionId, TxHash};
use wv_wallet::{codes, WalletError};

use crate::abi::decode_revert_reason;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("no signing identity available")]
    Unauthenticated,

    #[error("submission {0} not found")]
    NotFound(SubmissionId),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("ledger unreachable: {0}")]
    Unreachable(String),

    #[error("ledger rpc error: {0}")]
    Rpc(String),

    #[error("malformed ledger data: {0}")]
    Decode(String),

    #[error("no receipt for {hash} after {attempts} polls")]
    ReceiptTimeout { hash: TxHash, attempts: u32 },

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("ledger state lock poisoned")]
    LockPoisoned,
}

impl From<RpcError> for LedgerError {
    fn from(err: RpcError) -> Self {
        if err.is_revert() {
            let reason = match &err {
                RpcError::Remote { data, message, .. } => data
                    .as_ref()
                    .and_then(|d| d.as_str())
                    .and_then(|d| decode_data(d).ok())
                    .and_then(|bytes| decode_revert_reason(&bytes))
                    .unwrap_or_else(|| message.clone()),
                other => other.to_string(),
            };
            return Self::Reverted(reason);
        }
        match err {
            RpcError::Transport(msg) => Self::Unreachable(msg),
            RpcError::Http { status, body } => Self::Unreachable(format!("HTTP {status}: {body}")),
            RpcError::Malformed(msg) => Self::Decode(msg),
            remote @ RpcError::Remote { .. } => Self::Rpc(remote.to_string()),
        }
    }
}

impl From<WalletError> for LedgerError {
    fn from(err: WalletError) -> Self {
        match err.code() {
            Some(codes::UNAUTHORIZED) => Self::Unauthenticated,
            Some(codes::USER_REJECTED) => Self::Rejected(err.to_string()),
            _ => match err {
                WalletError::Unavailable | WalletError::NoAccounts => Self::Unauthenticated,
                other => Self::Wallet(other.to_string()),
            },
        }
    }
}

impl From<wv_types::TypeError> for LedgerError {
    fn from(err: wv_types::TypeError) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn revert_reason_is_decoded_from_data() {
        // Error(string) with "Already approved"
        let data = format!(
            "0x08c379a0{}{}{}",
            format!("{:064x}", 32),
            format!("{:064x}", 16),
            format!("{:0<64}", hex_of("Already approved"))
        );
        let err = RpcError::Remote {
            code: 3,
            message: "execution reverted: Already approved".into(),
            data: Some(json!(data)),
        };
        assert_eq!(
            LedgerError::from(err),
            LedgerError::Reverted("Already approved".into())
        );
    }

    #[test]
    fn revert_without_data_keeps_message() {
        let err = RpcError::Remote {
            code: -32000,
            message: "execution reverted".into(),
            data: None,
        };
        assert_eq!(
            LedgerError::from(err),
            LedgerError::Reverted("execution reverted".into())
        );
    }

    #[test]
    fn transport_failure_is_unreachable() {
        let err = RpcError::Transport("connection refused".into());
        assert!(matches!(LedgerError::from(err), LedgerError::Unreachable(_)));
    }

    #[test]
    fn wallet_codes_map_to_ledger_errors() {
        assert_eq!(
            LedgerError::from(WalletError::provider(codes::UNAUTHORIZED, "nope")),
            LedgerError::Unauthenticated
        );
        assert!(matches!(
            LedgerError::from(WalletError::provider(codes::USER_REJECTED, "User denied")),
            LedgerError::Rejected(_)
        ));
        assert_eq!(
            LedgerError::from(WalletError::NoAccounts),
            LedgerError::Unauthenticated
        );
    }

    fn hex_of(s: &str) -> String {
        s.bytes().map(|b| format!("{b:02x}")).collect()
    }
}
