//! `relay-core`: the in-process dispatch and report-correlation fabric that
//! routes named tasks from producers to worker pools and carries their
//! progress reports back to the originating callers.
//!
//! This crate wires together [`relay_common`]'s routine supervisors and
//! `Object` contract with [`relay_transport`]'s wire types and registry to
//! implement the three components described in
//! `examples/original_source/`'s `mapper.go` and `backend_local.go`: the
//! [`mapper::Mapper`], the [`worker::WorkerPool`], and the
//! [`backend::LocalBackend`].

mod backend;
mod config;
mod error;
mod mapper;
mod worker;

pub use backend::LocalBackend;
pub use config::{LocalConfig, RelayConfig};
pub use error::{CoreError, Result};
pub use mapper::Mapper;
pub use worker::{ProgressSink, TaskFailure, TaskFn, TaskOutcome, WorkerPool};

pub use relay_common::{Event, EventPayload, Level, Object, ObjectKind};
pub use relay_transport::{
    CodecTag, EnvelopeMeta, Header, IdMaker, Meta, Payload, Report, ReportEnvelope, ReportError,
    ReceiptStatus, Status, Task, TaskReceipt, TransportManager, UuidMaker,
};
