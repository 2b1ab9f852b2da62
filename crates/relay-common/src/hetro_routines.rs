//! Heterogeneous routine supervisor: a cohort of independently-closable
//! routines, for components that accumulate routines over time rather than
//! managing a fixed cohort (the local backend's per-`Report` reporter
//! registrations — see `me.reporters` in
//! `examples/original_source/backend_local.go`, where each call to `Report`
//! registers one more routine with its own quit channel).

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::object::Event;

const DEFAULT_EVENT_BUFFER: usize = 64;

struct Child {
    quit: CancellationToken,
    handle: JoinHandle<()>,
}

/// A cohort of routines each independently closable by an integer id,
/// sharing one aggregated events channel.
#[derive(Debug)]
pub struct HetroRoutineGroup {
    next_id: AtomicU64,
    children: DashMap<u64, Child>,
    events_tx: mpsc::Sender<Event>,
    events_rx: std::sync::Mutex<Option<mpsc::Receiver<Event>>>,
}

impl std::fmt::Debug for Child {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Child").finish_non_exhaustive()
    }
}

impl HetroRoutineGroup {
    pub fn new() -> Self {
        Self::with_event_buffer(DEFAULT_EVENT_BUFFER)
    }

    pub fn with_event_buffer(buffer: usize) -> Self {
        let (events_tx, events_rx) = mpsc::channel(buffer);
        Self {
            next_id: AtomicU64::new(1),
            children: DashMap::new(),
            events_tx,
            events_rx: std::sync::Mutex::new(Some(events_rx)),
        }
    }

    /// Register and spawn a new independently-closable routine, returning
    /// its id (used later to close just this one via [`Self::close_one`]).
    pub fn spawn<F, Fut>(&self, f: F) -> u64
    where
        F: FnOnce(CancellationToken, mpsc::Sender<Event>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let quit = CancellationToken::new();
        let handle = tokio::spawn(f(quit.clone(), self.events_tx.clone()));
        self.children.insert(id, Child { quit, handle });
        id
    }

    /// Close one routine by id and wait for its done signal. No-op if the
    /// id is unknown (already closed, or never registered).
    pub async fn close_one(&self, id: u64) {
        if let Some((_, child)) = self.children.remove(&id) {
            child.quit.cancel();
            let _ = child.handle.await;
        }
    }

    /// Close every routine currently registered in this group.
    pub async fn close(&self) {
        let ids: Vec<u64> = self.children.iter().map(|e| *e.key()).collect();
        for id in ids {
            self.close_one(id).await;
        }
    }

    pub fn event_sender(&self) -> mpsc::Sender<Event> {
        self.events_tx.clone()
    }

    /// The receiving end of this group's aggregated events channel.
    ///
    /// # Panics
    /// Panics if called more than once on the same group.
    pub fn events(&self) -> mpsc::Receiver<Event> {
        self.events_rx
            .lock()
            .expect("events mutex poisoned")
            .take()
            .expect("HetroRoutineGroup::events() called more than once")
    }

    /// Number of routines currently registered (for tests/introspection).
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for HetroRoutineGroup {
    fn default() -> Self {
        Self::new()
    }
}
