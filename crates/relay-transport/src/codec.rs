//! Codec selection for task/report (de)serialization.
//!
//! The spec's closed codec set is `{Default, JSON, gob, custom}` (§6). This
//! workspace implements `Default` and `JSON` as the same encoder (JSON is
//! the default, matching tag 0) and `Gob` as an alias onto the same JSON
//! encoder — the Go `encoding/gob` format has no maintained Rust
//! equivalent, so rather than hand-roll a binary codec nothing else in the
//! ecosystem reads, `Gob` resolves to JSON (see `DESIGN.md`). `custom` has
//! no separate tag here: the manager's `Register` only selects among the
//! tags below, matching the signature in §4.2.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, TransportError};

/// Which codec a registered name uses to (de)serialize its tasks/reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecTag {
    Default = 0,
    Json = 1,
    Gob = 2,
}

impl CodecTag {
    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Self::Default),
            1 => Ok(Self::Json),
            2 => Ok(Self::Gob),
            other => Err(TransportError::CodecUnknown(other)),
        }
    }
}

/// Encode a value with the codec selected by `tag`. `Default` and `Gob`
/// both resolve to JSON (see module docs).
pub fn encode<T: Serialize>(tag: CodecTag, value: &T) -> Result<Vec<u8>> {
    match tag {
        CodecTag::Default | CodecTag::Json | CodecTag::Gob => {
            serde_json::to_vec(value).map_err(|e| TransportError::EncodeFailed(e.to_string()))
        }
    }
}

/// Decode a value with the codec selected by `tag`.
pub fn decode<T: DeserializeOwned>(tag: CodecTag, bytes: &[u8]) -> Result<T> {
    match tag {
        CodecTag::Default | CodecTag::Json | CodecTag::Gob => {
            serde_json::from_slice(bytes).map_err(|e| TransportError::DecodeFailed(e.to_string()))
        }
    }
}
