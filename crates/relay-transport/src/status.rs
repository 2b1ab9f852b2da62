use serde_repr::{Deserialize_repr, Serialize_repr};

/// A report's status, drawn from the closed set in §3 of the spec.
///
/// `#[repr(i16)]` matches the wire format's `S: status-int16` field
/// (§6) exactly, so the JSON codec needs no manual int↔enum mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i16)]
pub enum Status {
    Sent = 0,
    Progress = 1,
    Success = 2,
    Fail = 3,
}

impl Status {
    /// A terminal status ends a task's report sequence (§3, §4.3: "exactly
    /// one terminal (Success or Fail)").
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Fail)
    }
}

/// Status of a [`crate::receipt::TaskReceipt`] — distinct from [`Status`],
/// which describes worker progress rather than dispatch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Ok,
    WorkerNotFound,
    Nok,
}
