use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hivebase_coalesce::prelude::*;
use tokio::sync::Notify;

fn fp(body: &str) -> Fingerprint {
    fingerprint("sk_test", "POST", "/api/generate/openai", body.as_bytes())
}

#[tokio::test]
async fn n_way_concurrent_duplicates_share_one_execution() {
    let table: InFlightTable<Result<String, String>> = InFlightTable::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let table = table.clone();
        let calls = calls.clone();
        let release = release.clone();
        handles.push(tokio::spawn(async move {
            table
                .coalesce(fp("{\"prompt\":\"bee\"}"), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    release.notified().await;
                    Ok::<_, String>("shared-body".to_string())
                })
                .await
        }));
    }

    // Let every task register against the pending entry before the
    // execution is allowed to finish.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(table.len(), 1);
    release.notify_waiters();

    let mut joined_count = 0;
    for handle in handles {
        let (result, joined) = handle.await.unwrap();
        assert_eq!(result.unwrap(), "shared-body");
        if joined {
            joined_count += 1;
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(joined_count, 3);
    assert!(table.is_empty());
}

#[tokio::test]
async fn sequential_requests_execute_separately() {
    let table: InFlightTable<u32> = InFlightTable::default();
    let calls = Arc::new(AtomicUsize::new(0));

    for expected in 1..=3 {
        let (_, joined) = table
            .coalesce(fp("{}"), {
                let calls = calls.clone();
                move || async move { calls.fetch_add(1, Ordering::SeqCst) as u32 }
            })
            .await;
        assert!(!joined);
        assert_eq!(calls.load(Ordering::SeqCst), expected);
    }
}

#[tokio::test]
async fn different_fingerprints_never_coalesce() {
    let table: InFlightTable<String> = InFlightTable::default();
    let release = Arc::new(Notify::new());

    let slow = {
        let table = table.clone();
        let release = release.clone();
        tokio::spawn(async move {
            table
                .coalesce(fp("{\"prompt\":\"a\"}"), move || async move {
                    release.notified().await;
                    "a".to_string()
                })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Same identity and path, different body: runs immediately on its own.
    let (other, joined) = table
        .coalesce(fp("{\"prompt\":\"b\"}"), || async { "b".to_string() })
        .await;
    assert_eq!(other, "b");
    assert!(!joined);

    release.notify_waiters();
    let (first, _) = slow.await.unwrap();
    assert_eq!(first, "a");
}

#[tokio::test]
async fn failures_propagate_to_all_waiters_and_clear_the_entry() {
    let table: InFlightTable<Result<String, String>> = InFlightTable::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());

    let mut handles = Vec::new();
    for _ in 0..3 {
        let table = table.clone();
        let calls = calls.clone();
        let release = release.clone();
        handles.push(tokio::spawn(async move {
            table
                .coalesce(fp("{\"boom\":true}"), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    release.notified().await;
                    Err::<String, _>("upstream timeout".to_string())
                })
                .await
        }));
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    release.notify_waiters();

    for handle in handles {
        let (result, _) = handle.await.unwrap();
        assert_eq!(result.unwrap_err(), "upstream timeout");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The failed entry is gone; the next identical request runs afresh.
    let (result, joined) = table
        .coalesce(fp("{\"boom\":true}"), {
            let calls = calls.clone();
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("recovered".to_string())
            }
        })
        .await;
    assert!(!joined);
    assert_eq!(result.unwrap(), "recovered");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
