use crate::status::ReceiptStatus;

/// Acknowledgement the mapper emits for every task it consumes (§3) —
/// distinct from a [`crate::report::Report`], which tracks a task's
/// execution progress rather than its dispatch outcome.
#[derive(Debug, Clone)]
pub struct TaskReceipt {
    pub id: String,
    pub status: ReceiptStatus,
    /// Error description when `status` is `Nok`; unset otherwise.
    pub payload: Option<String>,
}

impl TaskReceipt {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ReceiptStatus::Ok,
            payload: None,
        }
    }

    pub fn worker_not_found(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ReceiptStatus::WorkerNotFound,
            payload: None,
        }
    }

    pub fn nok(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ReceiptStatus::Nok,
            payload: Some(reason.into()),
        }
    }
}
