use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identity shared by [`Task`] and [`crate::report::Report`]: a worker-pool
/// name plus an id unique within that name (§3: "identity = (name, id)").
pub trait Meta: Send + Sync {
    fn name(&self) -> &str;
    fn id(&self) -> &str;
}

/// A named unit of work with a unique id and an opaque argument payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    name: String,
    id: String,
    /// Opaque argument payload — opaque to the fabric; workers interpret it.
    pub arg: serde_json::Value,
    /// Free-form metadata carried alongside the argument.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Task {
    pub fn new(name: impl Into<String>, id: impl Into<String>, arg: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            arg,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Meta for Task {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        &self.id
    }
}
