use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use wv_rpc::codec::{decode_data, encode_data, expect_str};
use wv_rpc::{HttpTransport, RpcTransport};
use wv_types::{Address, Cid, Submission, SubmissionId, TxHash};
use wv_wallet::{TransactionRequest, WalletProvider};

use crate::abi;
use crate::error::{LedgerError, LedgerResult};
use crate::records::{LedgerEvent, RawReceipt, TxReceipt};
use crate::traits::{LedgerReader, LedgerWriter};

/// How long to wait for a sent transaction to be mined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptPolling {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl ReceiptPolling {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            max_attempts: 150,
        }
    }
}

/// Read access to the deployed contract through `eth_call`.
pub struct RpcLedger<T = HttpTransport> {
    transport: Arc<T>,
    contract: Address,
}

impl<T> Clone for RpcLedger<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            contract: self.contract,
        }
    }
}

impl RpcLedger<HttpTransport> {
    pub fn connect(url: &str, contract: Address) -> LedgerResult<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(url)?), contract))
    }
}

impl<T: RpcTransport> RpcLedger<T> {
    pub fn new(transport: Arc<T>, contract: Address) -> Self {
        Self {
            transport,
            contract,
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    async fn call(&self, data: Vec<u8>) -> LedgerResult<Vec<u8>> {
        let params = json!([
            { "to": self.contract.to_hex(), "data": encode_data(&data) },
            "latest"
        ]);
        let result = self.transport.request("eth_call", params).await?;
        Ok(decode_data(expect_str(&result, "eth_call result")?)?)
    }

    /// The receipt of `hash`, or `None` while it is still pending.
    pub async fn receipt(&self, hash: &TxHash) -> LedgerResult<Option<RawReceipt>> {
        let result = self
            .transport
            .request("eth_getTransactionReceipt", json!([hash.to_hex()]))
            .await?;
        match result {
            Value::Null => Ok(None),
            value => RawReceipt::from_json(&value).map(Some),
        }
    }

    /// Poll until `hash` is mined; a reverted transaction is an error.
    pub async fn wait_for_receipt(
        &self,
        hash: &TxHash,
        polling: ReceiptPolling,
    ) -> LedgerResult<RawReceipt> {
        for attempt in 1..=polling.max_attempts {
            if let Some(receipt) = self.receipt(hash).await? {
                if !receipt.succeeded {
                    warn!(tx = %hash.short(), "transaction reverted");
                    return Err(LedgerError::Reverted(format!(
                        "transaction {hash} failed on chain"
                    )));
                }
                debug!(
                    tx = %hash.short(),
                    attempt,
                    block = receipt.block_number,
                    "transaction mined"
                );
                return Ok(receipt);
            }
            if attempt < polling.max_attempts {
                tokio::time::sleep(polling.interval()).await;
            }
        }
        Err(LedgerError::ReceiptTimeout {
            hash: *hash,
            attempts: polling.max_attempts,
        })
    }
}

#[async_trait]
impl<T: RpcTransport> LedgerReader for RpcLedger<T> {
    async fn get_submission(&self, id: SubmissionId) -> LedgerResult<Submission> {
        let data = self.call(abi::encode_get_submission(id)).await?;
        abi::decode_submission(id, &data)
    }

    async fn submission_count(&self) -> LedgerResult<u64> {
        let data = self.call(abi::encode_get_submission_count()).await?;
        abi::decode_count(&data)
    }
}

/// Writes signed by an injected wallet, confirmed through the read endpoint.
pub struct WalletWriter<T = HttpTransport> {
    ledger: RpcLedger<T>,
    wallet: Arc<dyn WalletProvider>,
    polling: ReceiptPolling,
}

impl<T: RpcTransport> WalletWriter<T> {
    pub fn new(ledger: RpcLedger<T>, wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            ledger,
            wallet,
            polling: ReceiptPolling::default(),
        }
    }

    pub fn with_polling(mut self, polling: ReceiptPolling) -> Self {
        self.polling = polling;
        self
    }

    pub fn ledger(&self) -> &RpcLedger<T> {
        &self.ledger
    }

    async fn send(&self, data: Vec<u8>) -> LedgerResult<(TxHash, RawReceipt)> {
        let from = self.signer().await?;
        let request = TransactionRequest {
            from,
            to: self.ledger.contract(),
            data,
        };
        let hash = self.wallet.send_transaction(&request).await?;
        info!(tx = %hash.short(), from = %from.short(), "transaction sent");
        let receipt = self.ledger.wait_for_receipt(&hash, self.polling).await?;
        Ok((hash, receipt))
    }
}

#[async_trait]
impl<T: RpcTransport> LedgerWriter for WalletWriter<T> {
    async fn signer(&self) -> LedgerResult<Address> {
        self.wallet
            .accounts()
            .await?
            .into_iter()
            .next()
            .and_then(Address::non_zero)
            .ok_or(LedgerError::Unauthenticated)
    }

    async fn submit_work(&self, title: &str, cid: &Cid) -> LedgerResult<TxReceipt> {
        let (tx_hash, receipt) = self.send(abi::encode_submit_work(title, cid)).await?;
        let submission_id = receipt
            .events_from(&self.ledger.contract())?
            .into_iter()
            .find_map(|event| match event {
                LedgerEvent::WorkSubmitted { id, .. } => Some(id),
                LedgerEvent::WorkApproved { .. } => None,
            })
            .ok_or_else(|| LedgerError::Decode("receipt has no WorkSubmitted event".into()))?;
        Ok(TxReceipt {
            tx_hash,
            submission_id,
            block_number: receipt.block_number,
        })
    }

    async fn approve_work(&self, id: SubmissionId) -> LedgerResult<TxReceipt> {
        let (tx_hash, receipt) = self.send(abi::encode_approve_work(id)).await?;
        Ok(TxReceipt {
            tx_hash,
            submission_id: id,
            block_number: receipt.block_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use wv_rpc::{RpcError, RpcResult};
    use wv_types::ChainId;
    use wv_wallet::MemoryWallet;

    use super::*;
    use crate::memory::InMemoryLedger;

    fn contract() -> Address {
        Address::from_raw([0xc0; 20])
    }

    fn student() -> Address {
        Address::from_raw([0x51; 20])
    }

    /// A node backed by [`InMemoryLedger`] that mines the wallet's sent
    /// transactions when their receipt is first asked for.
    struct FakeNode {
        ledger: InMemoryLedger,
        wallet: Arc<MemoryWallet>,
        pending_polls: AtomicU32,
        mined: Mutex<HashMap<TxHash, Value>>,
    }

    impl FakeNode {
        fn new(wallet: Arc<MemoryWallet>) -> Arc<Self> {
            Arc::new(Self {
                ledger: InMemoryLedger::new(),
                wallet,
                pending_polls: AtomicU32::new(0),
                mined: Mutex::new(HashMap::new()),
            })
        }

        async fn eth_call(&self, params: &Value) -> RpcResult<Value> {
            let data = decode_data(expect_str(&params[0]["data"], "data")?)?;
            let (selector, args) = data.split_at(4);
            let output = if selector == abi::selector(abi::signatures::GET_SUBMISSION_COUNT) {
                let count = self.ledger.submission_count().await.unwrap();
                abi::uint_word(count).to_vec()
            } else if selector == abi::selector(abi::signatures::GET_SUBMISSION) {
                let id = SubmissionId(abi::word_to_uint(args[..32].try_into().unwrap()).unwrap());
                match self.ledger.get_submission(id).await {
                    Ok(record) => abi::encode_submission_return(&record),
                    Err(_) => {
                        return Err(RpcError::Remote {
                            code: 3,
                            message: "execution reverted: Invalid submission ID".into(),
                            data: None,
                        })
                    }
                }
            } else {
                return Err(RpcError::Remote {
                    code: -32000,
                    message: "unknown selector".into(),
                    data: None,
                });
            };
            Ok(json!(encode_data(&output)))
        }

        fn mine(&self, hash: TxHash) -> Value {
            let index = u64::from_be_bytes(hash.as_bytes()[24..].try_into().unwrap()) as usize;
            let tx = self.wallet.sent_transactions()[index - 1].clone();
            assert_eq!(tx.to, contract());
            let (selector, args) = tx.data.split_at(4);

            let (outcome, log) = if selector == abi::selector(abi::signatures::SUBMIT_WORK) {
                let (title, cid) = abi::decode_submitted_payload(args).unwrap();
                let outcome = self
                    .ledger
                    .submit_as(tx.from, &title, &Cid::new(cid.clone()).unwrap());
                let log = outcome.as_ref().ok().map(|r| {
                    json!({
                        "address": contract().to_hex(),
                        "topics": [
                            encode_data(&abi::event_topic(abi::signatures::WORK_SUBMITTED)),
                            encode_data(&abi::uint_word(r.submission_id.value())),
                            encode_data(&abi::address_word(&tx.from)),
                        ],
                        "data": encode_data(&abi::encode_submitted_payload(&title, &cid)),
                    })
                });
                (outcome, log)
            } else {
                let id = SubmissionId(abi::word_to_uint(args[..32].try_into().unwrap()).unwrap());
                let outcome = self.ledger.approve_as(tx.from, id);
                let log = outcome.as_ref().ok().map(|_| {
                    json!({
                        "address": contract().to_hex(),
                        "topics": [
                            encode_data(&abi::event_topic(abi::signatures::WORK_APPROVED)),
                            encode_data(&abi::uint_word(id.value())),
                            encode_data(&abi::address_word(&tx.from)),
                        ],
                        "data": "0x",
                    })
                });
                (outcome, log)
            };

            let status = if outcome.is_ok() { "0x1" } else { "0x0" };
            json!({
                "transactionHash": hash.to_hex(),
                "blockNumber": format!("0x{:x}", index + 100),
                "status": status,
                "logs": log.into_iter().collect::<Vec<_>>(),
            })
        }
    }

    #[async_trait]
    impl RpcTransport for FakeNode {
        async fn request(&self, method: &str, params: Value) -> RpcResult<Value> {
            match method {
                "eth_call" => self.eth_call(&params).await,
                "eth_getTransactionReceipt" => {
                    if self
                        .pending_polls
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok()
                    {
                        return Ok(Value::Null);
                    }
                    let hash = TxHash::from_hex(expect_str(&params[0], "hash")?).unwrap();
                    let mut mined = self.mined.lock().unwrap();
                    if !mined.contains_key(&hash) {
                        let receipt = self.mine(hash);
                        mined.insert(hash, receipt);
                    }
                    Ok(mined[&hash].clone())
                }
                other => Err(RpcError::Remote {
                    code: -32601,
                    message: format!("method {other} not found"),
                    data: None,
                }),
            }
        }
    }

    fn fast() -> ReceiptPolling {
        ReceiptPolling {
            interval_ms: 0,
            max_attempts: 5,
        }
    }

    fn setup(
        accounts: Vec<Address>,
    ) -> (Arc<FakeNode>, RpcLedger<FakeNode>, WalletWriter<FakeNode>) {
        let wallet = MemoryWallet::new(ChainId::POLYGON_AMOY)
            .with_accounts(accounts)
            .pre_authorized()
            .into_shared();
        let node = FakeNode::new(Arc::clone(&wallet));
        let ledger = RpcLedger::new(Arc::clone(&node), contract());
        let writer = WalletWriter::new(ledger.clone(), wallet).with_polling(fast());
        (node, ledger, writer)
    }

    #[tokio::test]
    async fn submit_is_confirmed_and_readable() {
        let (node, ledger, writer) = setup(vec![student()]);
        node.pending_polls.store(2, Ordering::SeqCst);

        let cid = Cid::new("QmTestCID1").unwrap();
        let receipt = writer
            .submit_work("Frontend for Todo App", &cid)
            .await
            .unwrap();
        assert_eq!(receipt.submission_id, SubmissionId(0));
        assert_eq!(receipt.tx_hash.as_bytes()[0], 0xfe);
        assert_eq!(receipt.block_number, 101);

        assert_eq!(ledger.submission_count().await.unwrap(), 1);
        let record = ledger.get_submission(SubmissionId(0)).await.unwrap();
        assert_eq!(record.student, student());
        assert_eq!(record.title, "Frontend for Todo App");
        assert_eq!(record.cid, cid);
        assert!(!record.approved);
        assert_eq!(record.mentor(), None);
    }

    #[tokio::test]
    async fn approval_round_trip() {
        let (_node, ledger, writer) = setup(vec![student()]);
        writer
            .submit_work("Essay", &Cid::new("QmEssay").unwrap())
            .await
            .unwrap();

        let receipt = writer.approve_work(SubmissionId(0)).await.unwrap();
        assert_eq!(receipt.submission_id, SubmissionId(0));

        let record = ledger.get_submission(SubmissionId(0)).await.unwrap();
        assert!(record.approved);
        assert_eq!(record.mentor(), Some(student()));
        assert!(record.approved_at > record.submitted_at);
    }

    #[tokio::test]
    async fn failed_receipt_is_a_revert() {
        let (_node, ledger, writer) = setup(vec![student()]);
        writer
            .submit_work("Essay", &Cid::new("QmEssay").unwrap())
            .await
            .unwrap();
        writer.approve_work(SubmissionId(0)).await.unwrap();
        let before = ledger.get_submission(SubmissionId(0)).await.unwrap();

        let err = writer.approve_work(SubmissionId(0)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Reverted(_)));
        assert_eq!(ledger.get_submission(SubmissionId(0)).await.unwrap(), before);
    }

    #[tokio::test]
    async fn out_of_range_read_surfaces_the_revert() {
        let (_node, ledger, _writer) = setup(vec![student()]);
        let err = ledger.get_submission(SubmissionId(7)).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::Reverted("execution reverted: Invalid submission ID".into())
        );
    }

    #[tokio::test]
    async fn unmined_transaction_times_out() {
        let (node, _ledger, writer) = setup(vec![student()]);
        node.pending_polls.store(u32::MAX, Ordering::SeqCst);

        let err = writer
            .submit_work("Essay", &Cid::new("QmEssay").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ReceiptTimeout { attempts: 5, .. }));
    }

    #[tokio::test]
    async fn no_account_means_unauthenticated() {
        let (node, _ledger, writer) = setup(vec![]);
        assert_eq!(writer.signer().await.unwrap_err(), LedgerError::Unauthenticated);
        assert_eq!(
            writer
                .submit_work("Essay", &Cid::new("QmEssay").unwrap())
                .await
                .unwrap_err(),
            LedgerError::Unauthenticated
        );
        assert!(node.wallet.sent_transactions().is_empty());
    }

    #[test]
    fn polling_defaults() {
        let polling = ReceiptPolling::default();
        assert_eq!(polling.interval(), Duration::from_secs(2));
        assert_eq!(polling.max_attempts, 150);
    }
}
