//! Homogeneous routine supervisor: a scoped-lifecycle cohort sharing one
//! quit signal and one wait-group, for components that manage a fixed set
//! of routines with a single cancellation semantics (worker pools, the
//! local backend's store routine).
//!
//! Grounded on dingo's `common.Routines` (referenced throughout
//! `examples/original_source/backend_local.go` and `mapper.go` as
//! `me.stores`/`me.mappers`) and reimplemented with `tokio_util`'s
//! `CancellationToken` + `TaskTracker`, which already provide exactly the
//! close-only-quit / wait-for-drain semantics the Go version hand-rolled
//! with a channel and a `sync.WaitGroup`.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::object::Event;

const DEFAULT_EVENT_BUFFER: usize = 64;

/// A cohort of routines sharing one quit signal and one wait-group.
#[derive(Debug)]
pub struct RoutineGroup {
    quit: CancellationToken,
    tracker: TaskTracker,
    events_tx: mpsc::Sender<Event>,
    events_rx: std::sync::Mutex<Option<mpsc::Receiver<Event>>>,
}

impl RoutineGroup {
    pub fn new() -> Self {
        Self::with_event_buffer(DEFAULT_EVENT_BUFFER)
    }

    pub fn with_event_buffer(buffer: usize) -> Self {
        let (events_tx, events_rx) = mpsc::channel(buffer);
        Self {
            quit: CancellationToken::new(),
            tracker: TaskTracker::new(),
            events_tx,
            events_rx: std::sync::Mutex::new(Some(events_rx)),
        }
    }

    /// The shared quit signal, observed by every routine spawned from this
    /// group. Cloning is cheap (it's a handle onto the same token).
    pub fn quit(&self) -> CancellationToken {
        self.quit.clone()
    }

    /// Sending half of the group's aggregated events channel.
    pub fn event_sender(&self) -> mpsc::Sender<Event> {
        self.events_tx.clone()
    }

    /// Register and spawn a new routine under this group. `f` receives this
    /// group's quit token and event sender — the Rust analogue of dingo's
    /// `New() -> (quit, wait, events)` followed by `go routine(...)`,
    /// collapsed into one call since `TaskTracker::spawn` tracks the task
    /// for `wait`/`close` as it spawns it.
    pub fn spawn<F, Fut>(&self, f: F) -> AbortHandle
    where
        F: FnOnce(CancellationToken, mpsc::Sender<Event>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let fut = f(self.quit(), self.event_sender());
        self.tracker.spawn(fut).abort_handle()
    }

    /// The receiving end of this group's aggregated events channel. Takes
    /// ownership of the receiver; callable once.
    ///
    /// # Panics
    /// Panics if called more than once on the same group.
    pub fn events(&self) -> mpsc::Receiver<Event> {
        self.events_rx
            .lock()
            .expect("events mutex poisoned")
            .take()
            .expect("RoutineGroup::events() called more than once")
    }

    /// Close the shared quit signal and block until every spawned routine
    /// has signaled done. After this returns, no further sends occur from
    /// routines spawned by this group.
    pub async fn close(&self) {
        self.quit.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Default for RoutineGroup {
    fn default() -> Self {
        Self::new()
    }
}
