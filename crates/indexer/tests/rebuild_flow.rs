use dirview_indexer::{RebuildSchedule, RebuildScheduler, SnapshotIndexer};
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn tree(files: &[(&str, usize)]) -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    for (rel, bytes) in files {
        let path = temp.path().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, vec![b'.'; *bytes]).expect("write");
    }
    temp
}

#[test]
fn readers_keep_their_snapshot_across_rebuilds() {
    let temp = tree(&[("a/one.txt", 1), ("a/two.txt", 2)]);
    let indexer = SnapshotIndexer::new(temp.path()).expect("indexer");

    let (before, _) = indexer.rebuild();
    fs::remove_file(temp.path().join("a/two.txt")).unwrap();
    fs::write(temp.path().join("three.txt"), b"333").unwrap();
    let (after, stats) = indexer.rebuild();

    let old: Vec<&str> = before.records().iter().map(|r| r.path.as_str()).collect();
    let new: Vec<&str> = after.records().iter().map(|r| r.path.as_str()).collect();
    assert_eq!(old, vec!["a/one.txt", "a/two.txt"]);
    assert_eq!(new, vec!["a/one.txt", "three.txt"]);
    assert_eq!(stats.total_bytes, 4);
    assert_eq!(indexer.current().generation(), after.generation());
}

#[test]
fn concurrent_manual_rebuilds_publish_distinct_generations() {
    let temp = tree(&[("x.bin", 8)]);
    let indexer = Arc::new(SnapshotIndexer::new(temp.path()).expect("indexer"));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let indexer = Arc::clone(&indexer);
            thread::spawn(move || indexer.rebuild().0.generation())
        })
        .collect();
    let generations: HashSet<u64> = handles
        .into_iter()
        .map(|h| h.join().expect("rebuild thread"))
        .collect();

    assert_eq!(generations, (1..=4).collect());
    assert_eq!(indexer.current().generation(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scheduler_and_manual_rebuilds_interleave_monotonically() {
    let temp = tree(&[("pkg/app.apk", 16)]);
    let indexer = Arc::new(SnapshotIndexer::new(temp.path()).expect("indexer"));

    let scheduler = RebuildScheduler::start(
        Arc::clone(&indexer),
        RebuildSchedule {
            startup_delay: Duration::from_secs(3600),
            interval: Duration::from_secs(3600),
        },
    );
    let mut updates = scheduler.subscribe_updates();

    let manual = {
        let indexer = Arc::clone(&indexer);
        tokio::task::spawn_blocking(move || indexer.rebuild().0.generation())
    };
    scheduler.trigger("forced").await.expect("trigger");

    let update = tokio::time::timeout(Duration::from_secs(5), updates.recv())
        .await
        .expect("update in time")
        .expect("channel open");
    let manual_generation = manual.await.expect("manual rebuild");

    assert_eq!(update.reason, "forced");
    assert_ne!(update.generation, manual_generation);
    assert_eq!(indexer.current().generation(), 2);
    assert_eq!(update.stats.files, 1);
}
