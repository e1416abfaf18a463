use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content identifier returned by the pinning service.
///
/// Opaque to this system: the value is stored exactly as given, and only
/// blank input is rejected on the way in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cid(String);

impl Cid {
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TypeError::EmptyCid);
        }
        Ok(Self(value))
    }

    /// A value read back from the ledger, taken as stored.
    ///
    /// The contract accepts any string, so records written by other clients
    /// may carry an empty or padded identifier.
    pub fn from_ledger(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading `len` characters followed by an ellipsis.
    pub fn short(&self, len: usize) -> String {
        if self.0.chars().count() <= len {
            return self.0.clone();
        }
        let head: String = self.0.chars().take(len).collect();
        format!("{head}...")
    }
}

impl TryFrom<String> for Cid {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cid> for String {
    fn from(cid: Cid) -> Self {
        cid.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
