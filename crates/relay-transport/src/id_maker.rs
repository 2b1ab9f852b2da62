//! Id generators. Grounded on `examples/original_source/transport/id_maker.go`:
//! a single-method interface, pre-bound at tag 0 to a UUIDv4 generator, with
//! room for callers to register their own (e.g. a monotonic sequence) under
//! higher tags.

use uuid::Uuid;

/// An id generator. Implementations must be safe under concurrent
/// invocation (§4.2's ordering guarantee) — `Send + Sync` enforces this at
/// the type level.
pub trait IdMaker: Send + Sync + std::fmt::Debug {
    fn new_id(&self) -> String;
}

/// Default id maker (tag 0): a fresh UUIDv4 per call.
#[derive(Debug, Default)]
pub struct UuidMaker;

impl IdMaker for UuidMaker {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Reserved tag for the pre-bound [`UuidMaker`] (§6: "Default=0 (UUIDv4)").
pub const DEFAULT_ID_TAG: u32 = 0;
