use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use wv_types::ChainId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to register a network it does not know yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl ChainParams {
    /// Polygon Amoy testnet, where the verification contract is deployed.
    pub fn polygon_amoy() -> Self {
        Self {
            chain_id: ChainId::POLYGON_AMOY,
            chain_name: "Polygon Amoy Testnet".into(),
            native_currency: NativeCurrency {
                name: "MATIC".into(),
                symbol: "MATIC".into(),
                decimals: 18,
            },
            rpc_urls: vec!["https://rpc-amoy.polygon.technology".into()],
            block_explorer_urls: vec!["https://amoy.polygonscan.com".into()],
        }
    }

    /// Parameter object for `wallet_addEthereumChain` (EIP-3085).
    pub fn to_wallet_params(&self) -> Value {
        json!({
            "chainId": self.chain_id.to_hex(),
            "chainName": self.chain_name,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.block_explorer_urls,
        })
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::polygon_amoy()
    }
}
