use serde::{Deserialize, Serialize};
use serde_json::Value;
use wv_rpc::codec::{decode_data, decode_quantity, expect_str};
use wv_types::{Address, SubmissionId, TxHash};

use crate::abi::{self, signatures};
use crate::error::{LedgerError, LedgerResult};

/// Outcome of a confirmed write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    /// The submission created or approved by the transaction.
    pub submission_id: SubmissionId,
    pub block_number: u64,
}

/// Events the contract emits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    WorkSubmitted {
        id: SubmissionId,
        student: Address,
        title: String,
        cid: String,
    },
    WorkApproved {
        id: SubmissionId,
        mentor: Address,
    },
}

impl LedgerEvent {
    pub fn submission_id(&self) -> SubmissionId {
        match self {
            Self::WorkSubmitted { id, .. } | Self::WorkApproved { id, .. } => *id,
        }
    }

    /// Decode a log entry; `Ok(None)` for logs of other events.
    pub fn from_log(log: &LogEntry) -> LedgerResult<Option<Self>> {
        let Some(topic0) = log.topics.first() else {
            return Ok(None);
        };
        if *topic0 == abi::event_topic(signatures::WORK_SUBMITTED) {
            let (title, cid) = abi::decode_submitted_payload(&log.data)?;
            return Ok(Some(Self::WorkSubmitted {
                id: SubmissionId(abi::word_to_uint(log.topic(1)?)?),
                student: abi::word_to_address(log.topic(2)?)?,
                title,
                cid,
            }));
        }
        if *topic0 == abi::event_topic(signatures::WORK_APPROVED) {
            return Ok(Some(Self::WorkApproved {
                id: SubmissionId(abi::word_to_uint(log.topic(1)?)?),
                mentor: abi::word_to_address(log.topic(2)?)?,
            }));
        }
        Ok(None)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
}

impl LogEntry {
    fn topic(&self, index: usize) -> LedgerResult<&[u8; 32]> {
        self.topics
            .get(index)
            .ok_or_else(|| LedgerError::Decode(format!("log lacks topic {index}")))
    }

    fn from_json(value: &Value) -> LedgerResult<Self> {
        let address = Address::from_hex(expect_str(&value["address"], "log address")?)?;
        let topics = value["topics"]
            .as_array()
            .ok_or_else(|| LedgerError::Decode("log topics missing".into()))?
            .iter()
            .map(|t| -> LedgerResult<[u8; 32]> {
                let bytes = decode_data(expect_str(t, "log topic")?)?;
                bytes
                    .try_into()
                    .map_err(|_| LedgerError::Decode("topic is not 32 bytes".into()))
            })
            .collect::<LedgerResult<Vec<_>>>()?;
        let data = decode_data(expect_str(&value["data"], "log data")?)?;
        Ok(Self {
            address,
            topics,
            data,
        })
    }
}

/// The fields of `eth_getTransactionReceipt` this client reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub succeeded: bool,
    pub logs: Vec<LogEntry>,
}

impl RawReceipt {
    pub fn from_json(value: &Value) -> LedgerResult<Self> {
        let tx_hash = TxHash::from_hex(expect_str(&value["transactionHash"], "transactionHash")?)?;
        let block_number = decode_quantity(expect_str(&value["blockNumber"], "blockNumber")?)?;
        let succeeded = decode_quantity(expect_str(&value["status"], "status")?)? == 1;
        let logs = match value["logs"].as_array() {
            Some(items) => items
                .iter()
                .map(LogEntry::from_json)
                .collect::<LedgerResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            tx_hash,
            block_number,
            succeeded,
            logs,
        })
    }

    /// Contract events emitted by `contract`, skipping unrelated logs.
    pub fn events_from(&self, contract: &Address) -> LedgerResult<Vec<LedgerEvent>> {
        let mut events = Vec::new();
        for log in self.logs.iter().filter(|l| l.address == *contract) {
            if let Some(event) = LedgerEvent::from_log(log)? {
                events.push(event);
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wv_rpc::codec::encode_data;

    fn contract() -> Address {
        Address::from_raw([0xcc; 20])
    }

    fn submitted_log(id: u64, student: Address) -> Value {
        json!({
            "address": contract().to_hex(),
            "topics": [
                encode_data(&abi::event_topic(signatures::WORK_SUBMITTED)),
                encode_data(&abi::uint_word(id)),
                encode_data(&abi::address_word(&student)),
            ],
            "data": encode_data(&abi::encode_submitted_payload(
                "Frontend for Todo App",
                "QmTestCID1"
            )),
        })
    }

    #[test]
    fn receipt_with_submitted_event() {
        let student = Address::from_raw([0x5a; 20]);
        let receipt = json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "status": "0x1",
            "logs": [submitted_log(4, student)],
        });
        let parsed = RawReceipt::from_json(&receipt).unwrap();
        assert!(parsed.succeeded);
        assert_eq!(parsed.block_number, 16);

        let events = parsed.events_from(&contract()).unwrap();
        assert_eq!(
            events,
            vec![LedgerEvent::WorkSubmitted {
                id: SubmissionId(4),
                student,
                title: "Frontend for Todo App".into(),
                cid: "QmTestCID1".into(),
            }]
        );
        assert!(parsed
            .events_from(&Address::from_raw([1; 20]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn approved_event_decodes() {
        let mentor = Address::from_raw([0x3e; 20]);
        let log = LogEntry {
            address: contract(),
            topics: vec![
                abi::event_topic(signatures::WORK_APPROVED),
                abi::uint_word(9),
                abi::address_word(&mentor),
            ],
            data: vec![],
        };
        let event = LedgerEvent::from_log(&log).unwrap().unwrap();
        assert_eq!(
            event,
            LedgerEvent::WorkApproved {
                id: SubmissionId(9),
                mentor
            }
        );
        assert_eq!(event.submission_id(), SubmissionId(9));
    }

    #[test]
    fn failed_receipt_status() {
        let receipt = json!({
            "transactionHash": format!("0x{}", "22".repeat(32)),
            "blockNumber": "0x1",
            "status": "0x0",
            "logs": [],
        });
        assert!(!RawReceipt::from_json(&receipt).unwrap().succeeded);
    }

    #[test]
    fn unrelated_log_is_skipped() {
        let log = LogEntry {
            address: contract(),
            topics: vec![[7; 32]],
            data: vec![],
        };
        assert_eq!(LedgerEvent::from_log(&log).unwrap(), None);
    }
}
