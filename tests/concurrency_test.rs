mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use serde_json::json;
use common::{profile_with, profiles};
use docdex::{ErrorKind, Filter, QueryOptions};

#[test]
fn racing_inserts_of_one_username_admit_exactly_one() {
    let (_db, profiles) = profiles();
    let threads = 8;

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let profiles = Arc::clone(&profiles);
            thread::spawn(move || {
                profiles.insert(&json!({
                    "username": "contested",
                    "email": format!("racer{}@x.com", i),
                }))
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    let duplicates = outcomes.iter()
        .filter(|r| matches!(r, Err(e) if e.kind == ErrorKind::UniqueConstraintViolation))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(duplicates, threads - 1);
    assert_eq!(profiles.count(), 1);
}

#[test]
fn readers_never_observe_half_applied_writes() {
    let (_db, profiles) = profiles();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let profiles = Arc::clone(&profiles);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..200 {
                profiles
                    .insert(&profile_with(&format!("w{}", i), json!({"tags": ["shared"], "status": "active"})))
                    .unwrap();
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let profiles = Arc::clone(&profiles);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let by_tag = Filter::builder().eq("tags", "shared").build().unwrap();
                let by_status = Filter::builder().eq("status", "active").build().unwrap();
                while !done.load(Ordering::Acquire) {
                    // Each query sees one snapshot: every stored document is in both indexes
                    let results = profiles.find(&by_tag, &QueryOptions::new()).unwrap();
                    let stats = profiles.stats();
                    assert!(results.total_hits <= stats.documents);
                    for index in stats.indexes.iter().filter(|i| i.name == "tags_1" || i.name == "status_1") {
                        assert_eq!(index.documents, stats.documents, "index {} lags", index.name);
                    }
                    let _ = profiles.find(&by_status, &QueryOptions::new()).unwrap();
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(profiles.count(), 200);
}
