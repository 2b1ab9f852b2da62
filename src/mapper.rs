//! Mapper (§4.4): routes incoming tasks to the right worker pool by name,
//! emitting a `TaskReceipt` for every task consumed.
//!
//! Grounded directly on `examples/original_source/mapper.go`: the
//! `atomic.Value`-backed copy-on-write `name -> chan *Task` snapshot
//! (`mp.to`), the `toLock`-guarded `allocateWorkers`, and `mapperRoutine`'s
//! select/drain shape. The atomic snapshot is `arc_swap::ArcSwap` here
//! (§9: "implementations should use an atomic snapshot pointer with a
//! writer-side mutex; readers never block" — exactly what `ArcSwap` is).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use relay_common::{Event, Object, ObjectKind};
use relay_transport::{Meta as _, Report, Task, TaskReceipt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, Result};
use crate::worker::{TaskFn, WorkerPool};

type TaskChannels = HashMap<String, mpsc::Sender<Task>>;

/// The name-keyed task router. Holds one [`WorkerPool`] shared by every
/// allocated name and a copy-on-write snapshot of `name -> task-sender`
/// that `dispatch` reads without ever blocking on a writer.
#[derive(Debug)]
pub struct Mapper {
    to: ArcSwap<TaskChannels>,
    to_lock: Mutex<()>,
    workers: WorkerPool,
    group: relay_common::RoutineGroup,
}

impl Mapper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            to: ArcSwap::from_pointee(HashMap::new()),
            to_lock: Mutex::new(()),
            workers: WorkerPool::new(),
            group: relay_common::RoutineGroup::new(),
        })
    }

    /// Allocate a worker pool for `name`: creates its bounded task channel,
    /// installs it in the snapshot, and delegates to [`WorkerPool::allocate`].
    /// Fails with [`CoreError::NameAlreadyAllocated`] if `name` is already
    /// present — mutually exclusive by name (§8 invariant 5).
    pub fn allocate_workers(
        &self,
        name: impl Into<String>,
        executor: TaskFn,
        count: usize,
        share: usize,
    ) -> Result<Vec<mpsc::Receiver<Report>>> {
        let name = name.into();
        let _guard = self.to_lock.lock().expect("mapper registry lock poisoned");

        let current = self.to.load();
        if current.contains_key(&name) {
            return Err(CoreError::NameAlreadyAllocated(name));
        }

        let (task_tx, task_rx) = mpsc::channel(10);
        let report_rxs = self.workers.allocate(&name, task_rx, executor, count, share);

        let mut next = (**current).clone();
        next.insert(name, task_tx);
        self.to.store(Arc::new(next));

        Ok(report_rxs)
    }

    /// Dispatch one task by name. Blocks if the target worker channel is
    /// full (§4.4: "this is the intended backpressure path").
    pub async fn dispatch(&self, task: Task) -> Result<()> {
        let snapshot = self.to.load();
        match snapshot.get(task.name()) {
            Some(tx) => tx
                .send(task)
                .await
                .map_err(|_| CoreError::ClosedDuringOperation),
            None => Err(CoreError::WorkerNotFound),
        }
    }

    /// Spawn an additional mapper routine consuming `tasks` and producing
    /// receipts to `receipts`. Multiple calls register independent routines
    /// under this mapper's shared quit signal.
    pub fn more(self: &Arc<Self>, tasks: mpsc::Receiver<Task>, receipts: mpsc::Sender<TaskReceipt>) {
        let mapper = Arc::clone(self);
        self.group.spawn(move |quit, events| async move {
            mapper_routine(mapper, quit, events, tasks, receipts).await;
        });
    }

    pub async fn close_inner(&self) -> Result<()> {
        self.group.close().await;
        self.workers.close().await?;

        let _guard = self.to_lock.lock().expect("mapper registry lock poisoned");
        self.to.store(Arc::new(HashMap::new()));
        Ok(())
    }
}

async fn mapper_routine(
    mapper: Arc<Mapper>,
    quit: CancellationToken,
    events: mpsc::Sender<Event>,
    mut tasks: mpsc::Receiver<Task>,
    receipts: mpsc::Sender<TaskReceipt>,
) {
    loop {
        tokio::select! {
            _ = quit.cancelled() => break,
            maybe = tasks.recv() => match maybe {
                Some(task) => receive(&mapper, &events, &receipts, task).await,
                None => break,
            },
        }
    }

    // drain: consume whatever is already queued, non-blockingly, then
    // return (dropping `receipts` closes the channel, matching
    // `mapperRoutine`'s `defer close(receipts)`).
    while let Ok(task) = tasks.try_recv() {
        receive(&mapper, &events, &receipts, task).await;
    }
}

async fn receive(
    mapper: &Arc<Mapper>,
    events: &mpsc::Sender<Event>,
    receipts: &mpsc::Sender<TaskReceipt>,
    task: Task,
) {
    let id = task.id().to_string();
    let receipt = match mapper.dispatch(task).await {
        Ok(()) => TaskReceipt::ok(id),
        Err(CoreError::WorkerNotFound) => {
            let _ = events
                .send(Event::from_error(ObjectKind::MAPPER, &CoreError::WorkerNotFound))
                .await;
            TaskReceipt::worker_not_found(id)
        }
        Err(err) => {
            let _ = events.send(Event::from_error(ObjectKind::MAPPER, &err)).await;
            TaskReceipt::nok(id, err.to_string())
        }
    };
    let _ = receipts.send(receipt).await;
}

#[async_trait::async_trait]
impl Object for Mapper {
    /// `mapper.go`'s `Expect` checks for exact equality against
    /// `ObjT.Mapper`, not a subset — the mapper fulfills exactly one role.
    fn expect(&self, kinds: ObjectKind) -> relay_common::Result<()> {
        if kinds != ObjectKind::MAPPER {
            return Err(relay_common::Error::UnsupportedKind(kinds));
        }
        Ok(())
    }

    fn events(&self) -> Vec<mpsc::Receiver<Event>> {
        let mut streams = self.workers.events();
        streams.push(self.group.events());
        streams
    }

    async fn close(&self) -> relay_common::Result<()> {
        self.close_inner()
            .await
            .map_err(|_| relay_common::Error::ClosedDuringOperation)
    }
}
