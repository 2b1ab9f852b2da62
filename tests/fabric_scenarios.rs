//! Cross-module scenarios from §8 of the spec (S1-S6): basic round-trip,
//! late subscribe, order under concurrency, same-id-across-names isolation,
//! mapper receipts, and clean shutdown with buffered-but-unpolled reports.
//!
//! Grounded on the shape of `examples/original_source/backend_test_suite.go`
//! (register a name, compose a task, send reports, poll, check) translated
//! from its `testify`-suite-with-setup style into a flat `tokio::test` per
//! scenario, matching how this workspace's other crates lay out their
//! integration suites under `tests/`.

use std::sync::Arc;

use relay_core::{
    EnvelopeMeta, LocalBackend, Mapper, Meta as _, Object as _, Report, ReportEnvelope, Status,
    Task, TaskFn, TaskOutcome, TaskReceipt,
};
use relay_transport::{ReceiptStatus, TransportManager};
use tokio::sync::mpsc;

fn envelope_for(report: &Report) -> ReportEnvelope {
    ReportEnvelope {
        meta: EnvelopeMeta::from(report),
        body: serde_json::to_vec(report).unwrap(),
    }
}

fn echo_executor() -> TaskFn {
    Arc::new(|task: Task, _sink| {
        Box::pin(async move { Ok(task.arg) })
            as std::pin::Pin<Box<dyn std::future::Future<Output = TaskOutcome> + Send>>
    })
}

/// S1 - Basic round-trip.
#[tokio::test]
async fn s1_basic_round_trip() {
    let trans = TransportManager::new();
    trans
        .register("basic", relay_transport::CodecTag::Default, relay_transport::CodecTag::Default, 0)
        .unwrap();

    let backend = LocalBackend::new(false);
    let (reports_tx, reports_rx) = mpsc::channel(10);
    backend.report(reports_rx);

    let task = trans.compose_task("basic", vec![]).unwrap();
    let report = Report::new(task.name(), task.id(), Status::Sent);
    reports_tx.send(envelope_for(&report)).await.unwrap();

    let meta = EnvelopeMeta {
        name: task.name().to_string(),
        id: task.id().to_string(),
    };
    let mut rx = backend.poll(&meta).await.unwrap();
    let body = rx.recv().await.unwrap();
    let decoded = trans.decode_report("basic", &body).unwrap();
    assert_eq!(decoded.status(), report.status());
    assert_eq!(decoded.id(), report.id());

    backend.done(&meta).await;
    assert!(rx.try_recv().is_err());
}

/// S2 - Late subscribe: reports arrive before any Poll.
#[tokio::test]
async fn s2_late_subscribe_replays_in_order() {
    let backend = LocalBackend::new(false);
    let (reports_tx, reports_rx) = mpsc::channel(10);
    backend.report(reports_rx);

    for status in [Status::Sent, Status::Progress, Status::Success] {
        let report = Report::new("late", "task-1", status);
        reports_tx.send(envelope_for(&report)).await.unwrap();
    }
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let meta = EnvelopeMeta {
        name: "late".to_string(),
        id: "task-1".to_string(),
    };
    let mut rx = backend.poll(&meta).await.unwrap();

    let mut order = Vec::new();
    for _ in 0..3 {
        let body = rx.recv().await.unwrap();
        let report: Report = serde_json::from_slice(&body).unwrap();
        order.push(report.status());
    }
    assert_eq!(order, vec![Status::Sent, Status::Progress, Status::Success]);

    backend.done(&meta).await;
}

/// S3 - Order under concurrency: 100 tasks, 3 reports each, 100 parallel
/// producers and pollers; every task's three reports arrive in order.
#[tokio::test]
async fn s3_order_under_concurrency() {
    let backend = LocalBackend::new(false);
    let (reports_tx, reports_rx) = mpsc::channel(256);
    backend.report(reports_rx);

    let ids: Vec<String> = (0..100).map(|i| i.to_string()).collect();

    let producers = ids.clone().into_iter().map(|id| {
        let reports_tx = reports_tx.clone();
        tokio::spawn(async move {
            for status in [Status::Sent, Status::Progress, Status::Success] {
                let report = Report::new("order", id.clone(), status);
                reports_tx.send(envelope_for(&report)).await.unwrap();
            }
        })
    });
    for p in producers {
        p.await.unwrap();
    }
    drop(reports_tx);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let backend = Arc::new(backend);
    let pollers = ids.into_iter().map(|id| {
        let backend = Arc::clone(&backend);
        tokio::spawn(async move {
            let meta = EnvelopeMeta {
                name: "order".to_string(),
                id: id.clone(),
            };
            let mut rx = backend.poll(&meta).await.unwrap();
            let mut order = Vec::new();
            for _ in 0..3 {
                let body = rx.recv().await.unwrap();
                let report: Report = serde_json::from_slice(&body).unwrap();
                order.push(report.status());
            }
            backend.done(&meta).await;
            order
        })
    });

    for p in pollers {
        let order = p.await.unwrap();
        assert_eq!(order, vec![Status::Sent, Status::Progress, Status::Success]);
    }
}

/// S4 - Same id across distinct names: no cross-talk between tasks sharing
/// an id but differing in name.
#[tokio::test]
async fn s4_same_id_across_names_no_crosstalk() {
    let backend = LocalBackend::new(false);
    let (reports_tx, reports_rx) = mpsc::channel(256);
    backend.report(reports_rx);

    let names: Vec<String> = (0..10).map(|i| format!("SameID.{i}")).collect();
    let ids: Vec<String> = (1..=10).map(|i| i.to_string()).collect();

    for name in &names {
        for id in &ids {
            for status in [Status::Sent, Status::Progress, Status::Success] {
                let report = Report::new(name.clone(), id.clone(), status);
                reports_tx.send(envelope_for(&report)).await.unwrap();
            }
        }
    }
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    for name in &names {
        for id in &ids {
            let meta = EnvelopeMeta {
                name: name.clone(),
                id: id.clone(),
            };
            let mut rx = backend.poll(&meta).await.unwrap();
            for expected in [Status::Sent, Status::Progress, Status::Success] {
                let body = rx.recv().await.unwrap();
                let report: Report = serde_json::from_slice(&body).unwrap();
                assert_eq!(report.name(), name.as_str());
                assert_eq!(report.id(), id.as_str());
                assert_eq!(report.status(), expected);
            }
            backend.done(&meta).await;
        }
    }
}

/// S5 - Mapper receipts: two known names, one unknown, expect two OK and
/// one WorkerNotFound, all carrying the correct task id.
#[tokio::test]
async fn s5_mapper_receipts() {
    let mapper = Mapper::new();
    mapper
        .allocate_workers("known", echo_executor(), 1, 10)
        .unwrap();

    let (task_tx, task_rx) = mpsc::channel(10);
    let (receipt_tx, mut receipt_rx) = mpsc::channel(10);
    mapper.more(task_rx, receipt_tx);

    task_tx
        .send(Task::new("known", "a", serde_json::json!(null)))
        .await
        .unwrap();
    task_tx
        .send(Task::new("missing", "b", serde_json::json!(null)))
        .await
        .unwrap();
    task_tx
        .send(Task::new("known", "c", serde_json::json!(null)))
        .await
        .unwrap();
    drop(task_tx);

    let mut receipts: Vec<TaskReceipt> = Vec::new();
    while receipts.len() < 3 {
        if let Some(r) = receipt_rx.recv().await {
            receipts.push(r);
        } else {
            break;
        }
    }

    assert_eq!(receipts.len(), 3);
    let ok_count = receipts
        .iter()
        .filter(|r| matches!(r.status, ReceiptStatus::Ok))
        .count();
    let not_found_count = receipts
        .iter()
        .filter(|r| matches!(r.status, ReceiptStatus::WorkerNotFound))
        .count();
    assert_eq!(ok_count, 2);
    assert_eq!(not_found_count, 1);
    assert!(receipts.iter().any(|r| r.id == "a"));
    assert!(receipts.iter().any(|r| r.id == "b"));
    assert!(receipts.iter().any(|r| r.id == "c"));
}

/// S6 - Clean shutdown mid-flight: reports buffered in the backend but no
/// poller; Close returns without panicking and the channels end up closed.
#[tokio::test]
async fn s6_clean_shutdown_mid_flight() {
    let backend = LocalBackend::new(false);
    let (reports_tx, reports_rx) = mpsc::channel(10);
    backend.report(reports_rx);

    for status in [Status::Sent, Status::Progress, Status::Success] {
        let report = Report::new("orphan", "never-polled", status);
        reports_tx.send(envelope_for(&report)).await.unwrap();
    }
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    backend.close().await.unwrap();

    // A poll issued after close still works (the Mutex-guarded state
    // outlives routine shutdown) but no further store-side delivery will
    // ever occur since the store routine has exited; existing unclaimed
    // state is still observable.
    let meta = EnvelopeMeta {
        name: "orphan".to_string(),
        id: "never-polled".to_string(),
    };
    let mut rx = backend.poll(&meta).await.unwrap();
    let body = rx.recv().await.unwrap();
    let report: Report = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.status(), Status::Sent);
}
