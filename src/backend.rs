//! Local backend (§4.5): the in-memory Reporter + Store rendezvous that
//! buffers reports by (name, id) until a poller claims them.
//!
//! Grounded directly on `examples/original_source/backend_local.go`:
//! the `to` channel simulating the wire, `reporters`/`stores` routine
//! groups, `toCheck`/`unSent` state, and the constructor spawning
//! `_store_routine_` immediately so late subscription (§8 S2) works from
//! the moment the backend exists.
//!
//! `storeLock` guards `toCheck` and `unSent` jointly in the original — here
//! that's `tokio::sync::Mutex<BackendState>` rather than `std::sync::Mutex`:
//! the store routine holds the guard across the bounded send to a
//! subscriber channel (§9's documented accepted bound — "the store routine
//! *will* block under lock; this is an accepted bound"), and an `.await`
//! while holding a `std::sync::MutexGuard` does not compile. `tokio::sync::Mutex`
//! is the async-aware equivalent of the same single mutex, not a different
//! concurrency strategy.

use std::collections::HashMap;
use std::sync::Arc;

use relay_common::{Event, HetroRoutineGroup, Object, ObjectKind, RoutineGroup};
use relay_transport::{Meta, ReportEnvelope};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

/// Per-subscriber channel buffer: the spec's finite report sequence is
/// `Sent, [Progress...], terminal` — at most 4 in the common case (§9).
const PENDING_CHANNEL_CAPACITY: usize = 10;
const TO_CHANNEL_CAPACITY: usize = 10;

#[derive(Debug, Default)]
struct BackendState {
    pending: HashMap<String, HashMap<String, mpsc::Sender<Vec<u8>>>>,
    unclaimed: Vec<ReportEnvelope>,
}

/// The local in-memory broker: simultaneously a Reporter (`report`) and a
/// Store (`poll`/`done`). Constructed behind an `Arc` because its store
/// routine, spawned inside `new`, needs to reach back into `self` for the
/// lifetime of the backend — the same self-referential shape
/// `NewLocalBackend` achieves in Go by closing over `me` in a method value.
#[derive(Debug)]
pub struct LocalBackend {
    to_tx: mpsc::Sender<ReportEnvelope>,
    reporters: HetroRoutineGroup,
    stores: RoutineGroup,
    state: AsyncMutex<BackendState>,
    bypass: bool,
}

impl LocalBackend {
    /// `bypass` implements §6's `Local.Bypass(bool)`: when `true`, `report`
    /// writes straight into the store state instead of round-tripping
    /// through the `to` channel and the store routine — skipping the
    /// simulated in-memory network hop (§4.5).
    pub fn new(bypass: bool) -> Arc<Self> {
        let (to_tx, to_rx) = mpsc::channel(TO_CHANNEL_CAPACITY);
        let backend = Arc::new(Self {
            to_tx,
            reporters: HetroRoutineGroup::new(),
            stores: RoutineGroup::new(),
            state: AsyncMutex::new(BackendState::default()),
            bypass,
        });

        let store_backend = Arc::clone(&backend);
        backend.stores.spawn(move |quit, _events| async move {
            store_routine(store_backend, to_rx, quit).await;
        });

        backend
    }

    /// Register a reporter routine forwarding `reports` into the backend.
    /// Returns an id for later individual shutdown via the heterogeneous
    /// group (§4.1, §4.5's `Report(reportsIn) -> (id, err)`).
    pub fn report(self: &Arc<Self>, mut reports: mpsc::Receiver<ReportEnvelope>) -> u64 {
        let backend = Arc::clone(self);
        self.reporters.spawn(move |quit, _events| async move {
            loop {
                tokio::select! {
                    _ = quit.cancelled() => break,
                    maybe = reports.recv() => match maybe {
                        Some(env) => {
                            if backend.bypass {
                                backend.store(env).await;
                            } else {
                                let _ = backend.to_tx.send(env).await;
                            }
                        }
                        None => break,
                    },
                }
            }
        })
    }

    /// No-op extension point mirroring `backend_local.go`'s `ReporterHook`,
    /// which unconditionally returns `nil` — a place for a caller to hook a
    /// reporter's lifecycle (e.g. a tracing span) without it gating
    /// `report`'s behavior.
    pub fn reporter_hook(&self, _event_id: i32, _payload: &str) -> relay_common::Result<()> {
        Ok(())
    }

    /// Subscribe to (name, id). Returns `None` if a subscriber is already
    /// registered for this key without an intervening [`Self::done`] — the
    /// nil-channel collision behavior §4.5/§9 documents and preserves for
    /// compatibility rather than the alternative `AlreadySubscribed` error
    /// (see `DESIGN.md` for the rationale).
    pub async fn poll(&self, meta: &dyn Meta) -> Option<mpsc::Receiver<Vec<u8>>> {
        let name = meta.name().to_string();
        let id = meta.id().to_string();
        let mut state = self.state.lock().await;

        if state
            .pending
            .get(&name)
            .map(|ids| ids.contains_key(&id))
            .unwrap_or(false)
        {
            return None;
        }

        let (tx, rx) = mpsc::channel(PENDING_CHANNEL_CAPACITY);
        state
            .pending
            .entry(name.clone())
            .or_default()
            .insert(id.clone(), tx.clone());

        // Pull every already-unclaimed envelope for (name, id) out in one
        // pass. `Vec::retain` keeps the surviving elements' relative order,
        // which is exactly what `backend_local.go`'s reverse-scan-and-prepend
        // dance achieves by hand for a slice it can't otherwise mutate safely
        // while iterating — the idiomatic Rust equivalent needs no such
        // trick.
        let mut to_send = Vec::new();
        state.unclaimed.retain(|env| {
            if env.meta.name == name && env.meta.id == id {
                to_send.push(env.clone());
                false
            } else {
                true
            }
        });

        for env in to_send {
            let _ = tx.send(env.body).await;
        }

        Some(rx)
    }

    /// Unsubscribe (name, id): removes the pending entry and purges any
    /// residual `unclaimed` entries for the same key.
    pub async fn done(&self, meta: &dyn Meta) {
        let name = meta.name();
        let id = meta.id();
        let mut state = self.state.lock().await;

        if let Some(ids) = state.pending.get_mut(name) {
            ids.remove(id);
        }
        state
            .unclaimed
            .retain(|env| !(env.meta.name == name && env.meta.id == id));
    }

    /// Deliver one envelope: to its pending subscriber if one exists,
    /// otherwise append to `unclaimed` (§3: "either routed to exactly one
    /// pending-index channel or appended to the unclaimed buffer — never
    /// both, never neither").
    async fn store(&self, env: ReportEnvelope) {
        let mut state = self.state.lock().await;
        let tx = state
            .pending
            .get(&env.meta.name)
            .and_then(|ids| ids.get(&env.meta.id))
            .cloned();

        match tx {
            Some(tx) => {
                let _ = tx.send(env.body).await;
            }
            None => state.unclaimed.push(env),
        }
    }

    async fn close_inner(&self) -> relay_common::Result<()> {
        // Order matters (§4.5): stores first, then reporters, so no
        // reporter races the store routine's final drain.
        self.stores.close().await;
        self.reporters.close().await;
        Ok(())
    }
}

async fn store_routine(
    backend: Arc<LocalBackend>,
    mut to_rx: mpsc::Receiver<ReportEnvelope>,
    quit: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = quit.cancelled() => break,
            maybe = to_rx.recv() => match maybe {
                Some(env) => backend.store(env).await,
                None => break,
            },
        }
    }

    while let Ok(env) = to_rx.try_recv() {
        backend.store(env).await;
    }
}

#[async_trait::async_trait]
impl Object for LocalBackend {
    fn expect(&self, kinds: ObjectKind) -> relay_common::Result<()> {
        relay_common::expect_subset(ObjectKind::REPORTER | ObjectKind::STORE, kinds)
    }

    fn events(&self) -> Vec<mpsc::Receiver<Event>> {
        vec![self.reporters.events(), self.stores.events()]
    }

    async fn close(&self) -> relay_common::Result<()> {
        self.close_inner().await
    }
}
