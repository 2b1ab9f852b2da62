//! Worker pool (§4.3): a per-name fan-out of executors sharing one task
//! queue, producing a finite report sequence per task.
//!
//! No `worker.go` source survives in `examples/original_source/` (only
//! `mapper.go`, `backend_local.go`, and `object.go` were retrieved), so this
//! module is grounded directly on §4.3's prose and on the routine-group
//! usage pattern established by [`relay_common::RoutineGroup`] — the same
//! "one shared quit, drain-then-exit" shape `mapper.go`'s `mapperRoutine`
//! and `backend_local.go`'s `_store_routine_` both use.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use relay_common::{Event, Object, ObjectKind, RoutineGroup};
use relay_transport::{Meta as _, Report, Status, Task};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::sync::mpsc::error::TryRecvError;

/// The error shape a [`TaskFn`] fails with — wire-compatible with
/// [`relay_transport::Report::with_error`]'s `(code, msg)` pair.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub code: i64,
    pub msg: String,
}

/// What a registered executor returns: either the task's result payload or
/// a failure description. The worker loop turns this into the task's
/// terminal report.
pub type TaskOutcome = std::result::Result<serde_json::Value, TaskFailure>;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A name's registered executor: invoked once per task, given a
/// [`ProgressSink`] it may use to emit zero or more `Progress` reports
/// before returning its terminal outcome (§4.3: "one `Sent` on receipt,
/// zero or more `Progress` during execution, and exactly one terminal").
pub type TaskFn = Arc<dyn Fn(Task, ProgressSink) -> BoxFuture<TaskOutcome> + Send + Sync>;

/// Handed to a running executor so it can emit `Progress` reports without
/// reaching into the worker pool's internals.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    name: String,
    id: String,
    report_tx: mpsc::Sender<Report>,
}

impl ProgressSink {
    /// Emit one `Progress` report, optionally carrying an interim result.
    /// Silently dropped if the report channel is gone (the caller has
    /// already stopped listening) — matching §5's "no operation spin-waits"
    /// and the general rule that report emission never blocks the task
    /// executor on a dead consumer.
    pub async fn progress(&self, result: Option<serde_json::Value>) {
        let mut report = Report::new(self.name.clone(), self.id.clone(), Status::Progress);
        if let Some(result) = result {
            report = report.with_result(result);
        }
        let _ = self.report_tx.send(report).await;
    }
}

/// Per-name fan-out of workers sharing one task queue. One `WorkerPool`
/// instance is shared across every allocated name — all workers, regardless
/// of name, belong to the same [`RoutineGroup`] and so share one quit signal
/// and drain together on [`WorkerPool::close`] (§4.1's homogeneous-group
/// contract, as used by `mapper.go`'s single `mp.workers.Close()` call).
#[derive(Debug)]
pub struct WorkerPool {
    group: RoutineGroup,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self {
            group: RoutineGroup::new(),
        }
    }

    /// Allocate `count` workers consuming `tasks`, invoking `executor` for
    /// each, and producing reports on `share`-sized per-worker channels.
    /// Returns one report receiver per worker (§4.3: "reports ... placed on
    /// the per-allocation report channel returned by `allocate`").
    pub fn allocate(
        &self,
        name: impl Into<String>,
        tasks: mpsc::Receiver<Task>,
        executor: TaskFn,
        count: usize,
        share: usize,
    ) -> Vec<mpsc::Receiver<Report>> {
        let name = name.into();
        let shared_tasks = Arc::new(AsyncMutex::new(tasks));
        let mut report_rxs = Vec::with_capacity(count);

        for _ in 0..count {
            let (report_tx, report_rx) = mpsc::channel(share.max(1));
            report_rxs.push(report_rx);

            let shared_tasks = Arc::clone(&shared_tasks);
            let executor = Arc::clone(&executor);
            let name = name.clone();

            self.group.spawn(move |quit, _events| async move {
                loop {
                    let task = tokio::select! {
                        _ = quit.cancelled() => break,
                        maybe = async { shared_tasks.lock().await.recv().await } => match maybe {
                            Some(t) => t,
                            None => break,
                        },
                    };
                    run_task(&name, task, &executor, &report_tx).await;
                }

                // drain: consume whatever is already queued, non-blockingly,
                // then terminate (§4.3 shutdown; §9 drain-then-exit).
                loop {
                    let next = {
                        let mut guard = shared_tasks.lock().await;
                        guard.try_recv()
                    };
                    match next {
                        Ok(task) => run_task(&name, task, &executor, &report_tx).await,
                        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                    }
                }
            });
        }

        report_rxs
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Object for WorkerPool {
    fn expect(&self, kinds: ObjectKind) -> relay_common::Result<()> {
        relay_common::expect_subset(ObjectKind::WORKER, kinds)
    }

    fn events(&self) -> Vec<mpsc::Receiver<Event>> {
        vec![self.group.events()]
    }

    async fn close(&self) -> relay_common::Result<()> {
        self.group.close().await;
        Ok(())
    }
}

/// `Sent` → invoke the executor → terminal report, in that order on the
/// worker's own report channel — the ordering §4.3 guarantees per task id.
async fn run_task(name: &str, task: Task, executor: &TaskFn, report_tx: &mpsc::Sender<Report>) {
    let id = task.id().to_string();
    let _ = report_tx
        .send(Report::new(name, id.clone(), Status::Sent))
        .await;

    let sink = ProgressSink {
        name: name.to_string(),
        id: id.clone(),
        report_tx: report_tx.clone(),
    };

    let terminal = match executor(task, sink).await {
        Ok(result) => Report::new(name, id, Status::Success).with_result(result),
        Err(failure) => Report::new(name, id, Status::Fail).with_error(failure.code, failure.msg),
    };
    let _ = report_tx.send(terminal).await;
}
