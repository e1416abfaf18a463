use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wv_ledger::ReceiptPolling;
use wv_types::Address;
use wv_wallet::ChainParams;

use crate::error::{SdkError, SdkResult};
use crate::links::LinkBuilder;

pub const ENV_RPC_URL: &str = "WV_RPC_URL";
pub const ENV_CONTRACT_ADDRESS: &str = "WV_CONTRACT_ADDRESS";
pub const ENV_UPLOAD_URL: &str = "WV_UPLOAD_URL";
pub const ENV_SIGNER_URL: &str = "WV_SIGNER_URL";

/// Client configuration. Every field has a Polygon Amoy default, so an empty
/// file is a valid configuration apart from the contract address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Public endpoint used for reads and receipt polling.
    pub rpc_url: String,
    pub contract_address: Option<Address>,
    /// Upload proxy that pins files to IPFS.
    pub upload_url: String,
    /// JSON-RPC endpoint of the wallet that signs writes.
    pub signer_url: String,
    pub gateway_url: String,
    pub explorer_url: String,
    pub chain: ChainParams,
    pub polling: ReceiptPolling,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://rpc-amoy.polygon.technology".into(),
            contract_address: None,
            upload_url: "http://localhost:3000/api/upload".into(),
            signer_url: "http://127.0.0.1:8545".into(),
            gateway_url: LinkBuilder::DEFAULT_GATEWAY.into(),
            explorer_url: LinkBuilder::DEFAULT_EXPLORER.into(),
            chain: ChainParams::polygon_amoy(),
            polling: ReceiptPolling::default(),
        }
    }
}

impl ClientConfig {
    /// Load config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loading config");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> SdkResult<Self> {
        toml::from_str(content).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SdkResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Overlay `WV_*` environment variables.
    pub fn apply_env(self) -> SdkResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; blank values are ignored.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> SdkResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(address) = get(ENV_CONTRACT_ADDRESS) {
            let parsed = address
                .parse()
                .map_err(|e| SdkError::Config(format!("{ENV_CONTRACT_ADDRESS}: {e}")))?;
            self.contract_address = Some(parsed);
        }
        if let Some(url) = get(ENV_UPLOAD_URL) {
            self.upload_url = url;
        }
        if let Some(url) = get(ENV_SIGNER_URL) {
            self.signer_url = url;
        }
        Ok(self)
    }

    /// The contract address; reads and writes are impossible without it.
    pub fn require_contract(&self) -> SdkResult<Address> {
        self.contract_address
            .and_then(Address::non_zero)
            .ok_or_else(|| {
                SdkError::Config(format!(
                    "contract address not set (config `contract_address` or {ENV_CONTRACT_ADDRESS})"
                ))
            })
    }

    pub fn links(&self) -> LinkBuilder {
        LinkBuilder::new(&self.gateway_url, &self.explorer_url)
    }
}
