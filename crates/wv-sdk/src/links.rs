use wv_types::{Cid, TxHash};

/// Builds public links for content ids and transaction hashes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkBuilder {
    gateway_url: String,
    explorer_url: String,
}

impl LinkBuilder {
    pub const DEFAULT_GATEWAY: &'static str = "https://gateway.pinata.cloud";
    pub const DEFAULT_EXPLORER: &'static str = "https://amoy.polygonscan.com";

    /// Trailing slashes on either base are ignored.
    pub fn new(gateway_url: &str, explorer_url: &str) -> Self {
        Self {
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            explorer_url: explorer_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{gateway}/ipfs/{cid}`
    pub fn content_url(&self, cid: &str) -> String {
        format!("{}/ipfs/{cid}", self.gateway_url)
    }

    /// `{explorer}/tx/{tx}`
    pub fn receipt_url(&self, tx: &str) -> String {
        format!("{}/tx/{tx}", self.explorer_url)
    }

    pub fn cid_url(&self, cid: &Cid) -> String {
        self.content_url(cid.as_str())
    }

    pub fn tx_url(&self, hash: &TxHash) -> String {
        self.receipt_url(&hash.to_hex())
    }
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GATEWAY, Self::DEFAULT_EXPLORER)
    }
}

/// Gateway link for `cid` on the default gateway.
pub fn build_content_url(cid: &str) -> String {
    LinkBuilder::default().content_url(cid)
}

/// Explorer link for `tx` on the default explorer.
pub fn build_receipt_url(tx: &str) -> String {
    LinkBuilder::default().receipt_url(tx)
}
