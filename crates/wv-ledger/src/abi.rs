//! ABI codec for the work verification contract.
//!
//! Only the four functions and two events the client uses are covered.
//! Layout follows the Solidity ABI: 32-byte big-endian words, dynamic
//! values referenced by byte offsets from the start of their tuple.

use sha3::{Digest, Keccak256};
use wv_types::{Address, Cid, Submission, SubmissionId, Timestamp};

use crate::error::{LedgerError, LedgerResult};

pub mod signatures {
    pub const SUBMIT_WORK: &str = "submitWork(string,string)";
    pub const APPROVE_WORK: &str = "approveWork(uint256)";
    pub const GET_SUBMISSION: &str = "getSubmission(uint256)";
    pub const GET_SUBMISSION_COUNT: &str = "getSubmissionCount()";
    pub const WORK_SUBMITTED: &str = "WorkSubmitted(uint256,address,string,string)";
    pub const WORK_APPROVED: &str = "WorkApproved(uint256,address)";
}

const WORD: usize = 32;

/// Selector of `Error(string)`, the standard revert payload.
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// First four bytes of the Keccak-256 of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Topic 0 of an event: the full Keccak-256 of its signature.
pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

pub fn uint_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn call(signature: &str, args: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len());
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(args);
    data
}

/// Head/tail encoding of a tuple made only of strings.
fn encode_strings(values: &[&str]) -> Vec<u8> {
    let head_len = WORD * values.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for value in values {
        head.extend_from_slice(&uint_word((head_len + tail.len()) as u64));
        push_string(&mut tail, value);
    }
    head.extend_from_slice(&tail);
    head
}

/// Length word followed by the bytes, zero-padded to a word boundary.
fn push_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&uint_word(value.len() as u64));
    out.extend_from_slice(value.as_bytes());
    let rem = value.len() % WORD;
    if rem != 0 {
        out.resize(out.len() + WORD - rem, 0);
    }
}

pub fn encode_submit_work(title: &str, cid: &Cid) -> Vec<u8> {
    call(signatures::SUBMIT_WORK, &encode_strings(&[title, cid.as_str()]))
}

pub fn encode_approve_work(id: SubmissionId) -> Vec<u8> {
    call(signatures::APPROVE_WORK, &uint_word(id.value()))
}

pub fn encode_get_submission(id: SubmissionId) -> Vec<u8> {
    call(signatures::GET_SUBMISSION, &uint_word(id.value()))
}

pub fn encode_get_submission_count() -> Vec<u8> {
    call(signatures::GET_SUBMISSION_COUNT, &[])
}

/// Decode the `getSubmission` return tuple
/// `(address,string,string,address,bool,uint256,uint256)`.
pub fn decode_submission(id: SubmissionId, data: &[u8]) -> LedgerResult<Submission> {
    if data.is_empty() {
        return Err(LedgerError::Decode(
            "empty return data; is the contract address correct?".into(),
        ));
    }
    let r = Reader::new(data);
    Ok(Submission {
        id,
        student: r.address(0)?,
        title: r.string(WORD)?,
        cid: Cid::from_ledger(r.string(2 * WORD)?),
        mentor: r.address(3 * WORD)?,
        approved: r.boolean(4 * WORD)?,
        submitted_at: Timestamp::from_secs(r.uint(5 * WORD)?),
        approved_at: Timestamp::from_secs(r.uint(6 * WORD)?),
    })
}

/// Decode a single `uint256` return value.
pub fn decode_count(data: &[u8]) -> LedgerResult<u64> {
    if data.is_empty() {
        return Err(LedgerError::Decode(
            "empty return data; is the contract address correct?".into(),
        ));
    }
    Reader::new(data).uint(0)
}

/// Non-indexed part of `WorkSubmitted`: `(string title, string cid)`.
pub fn decode_submitted_payload(data: &[u8]) -> LedgerResult<(String, String)> {
    let r = Reader::new(data);
    Ok((r.string(0)?, r.string(WORD)?))
}

/// Reason string of an `Error(string)` revert payload.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 || data[..4] != ERROR_SELECTOR {
        return None;
    }
    Reader::new(&data[4..]).string(0).ok()
}

pub fn word_to_uint(word: &[u8; 32]) -> LedgerResult<u64> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(LedgerError::Decode("uint256 value exceeds u64".into()));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}

pub fn word_to_address(word: &[u8; 32]) -> LedgerResult<Address> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(LedgerError::Decode("address word has dirty high bytes".into()));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address::from_raw(bytes))
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn slice(&self, offset: usize, len: usize) -> LedgerResult<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| {
                LedgerError::Decode(format!(
                    "read of {len} bytes at {offset} overruns {} bytes of return data",
                    self.data.len()
                ))
            })
    }

    fn word(&self, offset: usize) -> LedgerResult<&'a [u8; 32]> {
        let bytes = self.slice(offset, WORD)?;
        bytes
            .try_into()
            .map_err(|_| LedgerError::Decode("short word".into()))
    }

    fn uint(&self, offset: usize) -> LedgerResult<u64> {
        word_to_uint(self.word(offset)?)
    }

    fn usize_at(&self, offset: usize) -> LedgerResult<usize> {
        usize::try_from(self.uint(offset)?)
            .map_err(|_| LedgerError::Decode("offset exceeds platform width".into()))
    }

    fn address(&self, offset: usize) -> LedgerResult<Address> {
        word_to_address(self.word(offset)?)
    }

    fn boolean(&self, offset: usize) -> LedgerResult<bool> {
        match self.uint(offset)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(LedgerError::Decode(format!("invalid bool word {other}"))),
        }
    }

    /// String whose offset is stored in the head word at `head`.
    fn string(&self, head: usize) -> LedgerResult<String> {
        let start = self.usize_at(head)?;
        let len = self.usize_at(start)?;
        let bytes = self.slice(start + WORD, len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| LedgerError::Decode(format!("string is not UTF-8: {e}")))
    }
}

/// Encode a `getSubmission` return tuple, as a node would.
#[cfg(test)]
pub(crate) fn encode_submission_return(s: &Submission) -> Vec<u8> {
    let head_len = 7 * WORD;
    let mut tail = Vec::new();
    let title_offset = head_len;
    push_string(&mut tail, &s.title);
    let cid_offset = head_len + tail.len();
    push_string(&mut tail, s.cid.as_str());

    let mut out = Vec::new();
    out.extend_from_slice(&address_word(&s.student));
    out.extend_from_slice(&uint_word(title_offset as u64));
    out.extend_from_slice(&uint_word(cid_offset as u64));
    out.extend_from_slice(&address_word(&s.mentor));
    out.extend_from_slice(&uint_word(s.approved as u64));
    out.extend_from_slice(&uint_word(s.submitted_at.as_secs()));
    out.extend_from_slice(&uint_word(s.approved_at.as_secs()));
    out.extend_from_slice(&tail);
    out
}

/// Encode the non-indexed `WorkSubmitted` payload, as a node would log it.
#[cfg(test)]
pub(crate) fn encode_submitted_payload(title: &str, cid: &str) -> Vec<u8> {
    encode_strings(&[title, cid])
}
