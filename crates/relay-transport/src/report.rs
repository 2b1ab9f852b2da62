use serde::{Deserialize, Serialize};

use crate::status::Status;
use crate::task::Meta;

/// `{Code, Msg}` — the wire shape of a report's error, §6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportError {
    #[serde(rename = "Code")]
    pub code: i64,
    #[serde(rename = "Msg")]
    pub msg: String,
}

/// `{ID, Name}` — the wire header shared by every report, §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
}

/// `{S, E, R}` — status, optional error, optional result, §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "S")]
    pub status: Status,
    #[serde(rename = "E", skip_serializing_if = "Option::is_none", default)]
    pub err: Option<ReportError>,
    #[serde(rename = "R", skip_serializing_if = "Option::is_none", default)]
    pub result: Option<serde_json::Value>,
}

/// A status update for a task, identified by the same (name, id) as its
/// originating [`crate::task::Task`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "H")]
    pub header: Header,
    #[serde(rename = "P")]
    pub payload: Payload,
}

impl Report {
    pub fn new(name: impl Into<String>, id: impl Into<String>, status: Status) -> Self {
        Self {
            header: Header {
                id: id.into(),
                name: name.into(),
            },
            payload: Payload {
                status,
                err: None,
                result: None,
            },
        }
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.payload.result = Some(result);
        self
    }

    pub fn with_error(mut self, code: i64, msg: impl Into<String>) -> Self {
        self.payload.err = Some(ReportError {
            code,
            msg: msg.into(),
        });
        self
    }

    pub fn status(&self) -> Status {
        self.payload.status
    }

    pub fn err(&self) -> Option<&ReportError> {
        self.payload.err.as_ref()
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        self.payload.result.as_ref()
    }
}

impl Meta for Report {
    fn name(&self) -> &str {
        &self.header.name
    }

    fn id(&self) -> &str {
        &self.header.id
    }
}

/// Lightweight (name, id) pair — what [`ReportEnvelope`] carries alongside
/// an already-encoded body so the backend can route without decoding (§3).
#[derive(Debug, Clone)]
pub struct EnvelopeMeta {
    pub name: String,
    pub id: String,
}

impl Meta for EnvelopeMeta {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl From<&Report> for EnvelopeMeta {
    fn from(report: &Report) -> Self {
        Self {
            name: report.name().to_string(),
            id: report.id().to_string(),
        }
    }
}

/// A (meta, encoded-body) pair — the wire unit the local backend transports.
/// Decoding happens at the consumer, not at the intermediary (§3).
#[derive(Debug, Clone)]
pub struct ReportEnvelope {
    pub meta: EnvelopeMeta,
    pub body: Vec<u8>,
}
