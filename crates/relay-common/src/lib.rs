//! Scoped-lifecycle primitives and the `Object`/`Event` contract shared by
//! every component of the dispatch fabric.
//!
//! See `examples/original_source/object.go` for the interface this crate's
//! `Object` trait and `ObjectKind` bitmask are grounded on, and
//! `backend_local.go` / `mapper.go` for the routine-group usage patterns
//! [`RoutineGroup`] and [`HetroRoutineGroup`] generalize.

mod error;
mod hetro_routines;
mod object;
mod routines;

pub use error::{Error, Result};
pub use hetro_routines::HetroRoutineGroup;
pub use object::{expect_subset, Event, EventPayload, Level, Object, ObjectKind};
pub use routines::RoutineGroup;
