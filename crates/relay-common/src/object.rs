//! The uniform `Object` surface every component in the fabric exposes, plus
//! the `Event` type carried on its aggregated event streams.
//!
//! Mirrors dingo's `common.Object` interface and its `ObjT` bit-flag set
//! (`examples/original_source/object.go`): a bitmask over the roles an
//! object can fulfill, a lifecycle (`expect`/`events`/`close`), and an event
//! record that can originate from any of those roles.

use bitflags::bitflags;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

bitflags! {
    /// Roles an `Object` can declare itself as fulfilling.
    ///
    /// Combinable bit flags, matching dingo's `ObjT` struct of `1 << n`
    /// constants. `ALL` is used by listeners that want events from every
    /// origin regardless of role.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectKind: u16 {
        const REPORTER       = 1 << 0;
        const STORE          = 1 << 1;
        const PRODUCER       = 1 << 2;
        const CONSUMER       = 1 << 3;
        const MAPPER         = 1 << 4;
        const WORKER         = 1 << 5;
        const BRIDGE         = 1 << 6;
        const NAMED_CONSUMER = 1 << 7;
        const ALL = Self::REPORTER.bits()
            | Self::STORE.bits()
            | Self::PRODUCER.bits()
            | Self::CONSUMER.bits()
            | Self::MAPPER.bits()
            | Self::WORKER.bits()
            | Self::BRIDGE.bits()
            | Self::NAMED_CONSUMER.bits();
    }
}

/// Severity of an `Event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

/// Payload carried by an `Event`: either a plain message or a stringified
/// error (events cross task boundaries, so the original error type is not
/// preserved — callers needing it should also emit a `tracing` span).
#[derive(Debug, Clone)]
pub enum EventPayload {
    Message(String),
    Error(String),
}

/// A single occurrence raised by some component, aggregated on its `Events()`
/// stream for the façade (or a test) to observe.
#[derive(Debug, Clone)]
pub struct Event {
    pub origin: ObjectKind,
    pub level: Level,
    pub payload: EventPayload,
}

impl Event {
    pub fn info(origin: ObjectKind, message: impl Into<String>) -> Self {
        Self {
            origin,
            level: Level::Info,
            payload: EventPayload::Message(message.into()),
        }
    }

    pub fn warning(origin: ObjectKind, message: impl Into<String>) -> Self {
        Self {
            origin,
            level: Level::Warning,
            payload: EventPayload::Message(message.into()),
        }
    }

    pub fn from_error(origin: ObjectKind, err: &dyn std::error::Error) -> Self {
        Self {
            origin,
            level: Level::Error,
            payload: EventPayload::Error(err.to_string()),
        }
    }
}

/// The contract every fabric component exposes (§6 of the spec): declare the
/// roles it fulfills, hand back its aggregated event stream(s), and release
/// its resources on `close`.
#[async_trait::async_trait]
pub trait Object: Send + Sync {
    /// Declare which roles this object fulfills; fails if `kinds` contains a
    /// bit this object does not provide.
    fn expect(&self, kinds: ObjectKind) -> Result<()>;

    /// Aggregated event stream(s) for this object. Each call takes the
    /// receiving end of an internal channel — callable at most once per
    /// stream; a second take panics, matching the "aggregated, not
    /// broadcast" nature of the underlying `mpsc` channel.
    fn events(&self) -> Vec<mpsc::Receiver<Event>>;

    /// Release all resources. After this returns, no further events or
    /// channel sends originate from this object.
    async fn close(&self) -> Result<()>;
}

/// Helper an object's `expect` implementation delegates to: succeed iff
/// `requested` is a subset of `provided`.
pub fn expect_subset(provided: ObjectKind, requested: ObjectKind) -> Result<()> {
    if provided.contains(requested) {
        Ok(())
    } else {
        Err(Error::UnsupportedKind(requested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_every_named_kind() {
        assert!(ObjectKind::ALL.contains(ObjectKind::REPORTER));
        assert!(ObjectKind::ALL.contains(ObjectKind::WORKER));
        assert!(ObjectKind::ALL.contains(ObjectKind::NAMED_CONSUMER));
    }

    #[test]
    fn expect_subset_accepts_matching_bits() {
        let provided = ObjectKind::REPORTER | ObjectKind::STORE;
        assert!(expect_subset(provided, ObjectKind::REPORTER).is_ok());
        assert!(expect_subset(provided, provided).is_ok());
    }

    #[test]
    fn expect_subset_rejects_missing_bits() {
        let provided = ObjectKind::REPORTER;
        let err = expect_subset(provided, ObjectKind::MAPPER).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKind(ObjectKind::MAPPER)));
    }

    #[test]
    fn event_from_error_stringifies() {
        let err = Error::ClosedDuringOperation;
        let event = Event::from_error(ObjectKind::STORE, &err);
        match event.payload {
            EventPayload::Error(msg) => assert_eq!(msg, "channel closed during operation"),
            _ => panic!("expected error payload"),
        }
    }
}
