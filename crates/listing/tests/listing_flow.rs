use dirview_indexer::RebuildSchedule;
use dirview_listing::{DirectoryService, ListingError, ServiceConfig};
use dirview_policy::{Caller, PolicyDefaults};
use dirview_protocol::{EntryKind, ListEntry, PathError};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, bytes: usize) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, vec![b'x'; bytes]).expect("write");
}

fn service(root: &Path) -> DirectoryService {
    DirectoryService::new(ServiceConfig::new(root)).expect("service")
}

fn names(entries: &[ListEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn single_child_chain_is_collapsed() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a/b/c/d.txt", 4);
    write(temp.path(), "top.txt", 1);

    let service = service(temp.path());
    assert_eq!(service.collapse("", "a").unwrap(), "a/b/c");

    service.indexer().rebuild();
    let listing = service.list("", None, None).unwrap();
    assert_eq!(names(&listing.entries), vec!["a/b/c", "top.txt"]);

    let dir = &listing.entries[0];
    assert_eq!(dir.kind, EntryKind::Dir);
    assert_eq!(dir.path, "a/b/c");
    assert_eq!(dir.size, 4);
}

#[test]
fn directory_listing_is_live_and_sorted() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "docs/zeta.md", 3);
    write(temp.path(), "docs/alpha.md", 7);
    fs::create_dir_all(temp.path().join("docs").join("img").join("x")).unwrap();
    fs::create_dir_all(temp.path().join("docs").join("img").join("y")).unwrap();

    let service = service(temp.path());
    let listing = service.list("docs", None, None).unwrap();

    assert_eq!(listing.dir, "docs");
    assert_eq!(names(&listing.entries), vec!["alpha.md", "img", "zeta.md"]);
    let alpha = &listing.entries[0];
    assert_eq!(alpha.path, "docs/alpha.md");
    assert_eq!(alpha.size, 7);
    assert!(!alpha.is_dir());
    assert!(listing.entries[1].is_dir());
}

#[test]
fn search_lists_matching_files_under_directory() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "foo/baz.txt", 1);
    write(temp.path(), "foo/bar.txt", 1);
    write(temp.path(), "foo/deep/baz-2.txt", 1);
    write(temp.path(), "qux/baz.txt", 1);
    write(temp.path(), "foobar/baz.txt", 1);

    let service = service(temp.path());
    service.indexer().rebuild();

    let listing = service.list("foo", Some("baz -bar"), None).unwrap();
    assert_eq!(names(&listing.entries), vec!["baz.txt", "deep/baz-2.txt"]);
    assert!(listing.entries.iter().all(|e| e.kind == EntryKind::File));
    assert_eq!(listing.entries[1].path, "foo/deep/baz-2.txt");
}

#[test]
fn blank_query_falls_back_to_directory_listing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "one.txt", 1);

    let service = service(temp.path());
    let listing = service.list("", Some("   "), None).unwrap();
    assert_eq!(names(&listing.entries), vec!["one.txt"]);
}

#[test]
fn search_is_capped_by_limit() {
    let temp = TempDir::new().unwrap();
    for i in 0..10 {
        write(temp.path(), &format!("logs/run-{i}.log"), 1);
    }

    let mut config = ServiceConfig::new(temp.path());
    config.search_limit = 3;
    let service = DirectoryService::new(config).unwrap();
    service.indexer().rebuild();

    let listing = service.list("logs", Some("run"), None).unwrap();
    assert_eq!(listing.entries.len(), 3);
}

#[test]
fn hidden_names_are_filtered_in_both_modes() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "keys/id.secret", 1);
    write(temp.path(), "keys/readme.txt", 1);
    fs::write(
        temp.path().join(".dirview.toml"),
        "[[accessTables]]\nregex = '\\.secret$'\nallow = false\n",
    )
    .unwrap();

    let service = service(temp.path());
    service.indexer().rebuild();

    let listing = service.list("keys", None, None).unwrap();
    assert_eq!(names(&listing.entries), vec!["readme.txt"]);

    let hits = service.list("", Some("keys"), None).unwrap();
    assert_eq!(names(&hits.entries), vec!["keys/readme.txt"]);
}

#[test]
fn listing_carries_caller_policy() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "drop/a.bin", 1);
    fs::write(
        temp.path().join("drop").join(".dirview.toml"),
        "upload = true\n[[users]]\ntoken = \"root-token\"\nupload = true\ndelete = true\n",
    )
    .unwrap();

    let config = ServiceConfig::new(temp.path()).with_defaults(PolicyDefaults {
        upload: false,
        delete: false,
    });
    let service = DirectoryService::new(config).unwrap();

    let anonymous = service.list("drop", None, None).unwrap();
    assert!(anonymous.policy.upload);
    assert!(!anonymous.policy.delete);

    let admin = service
        .list("drop", None, Some(&Caller::Token("root-token".into())))
        .unwrap();
    assert!(admin.policy.delete);

    let root = service.list("", None, None).unwrap();
    assert!(!root.policy.upload);
}

#[test]
fn directory_sizes_follow_rebuilds() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "dir1/x", 100);
    write(temp.path(), "dir1/y", 200);

    let service = service(temp.path());
    assert_eq!(service.size_of("dir1").unwrap(), 0);

    service.indexer().rebuild();
    assert_eq!(service.size_of("dir1").unwrap(), 300);

    fs::remove_file(temp.path().join("dir1").join("y")).unwrap();
    assert_eq!(service.size_of("dir1").unwrap(), 300);

    service.indexer().rebuild();
    assert_eq!(service.size_of("dir1").unwrap(), 100);
}

#[test]
fn rejects_escaping_and_non_directory_targets() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "inner/file.txt", 1);

    let service = service(&temp.path().join("inner"));
    assert!(matches!(
        service.list("../", None, None),
        Err(ListingError::Path(_))
    ));
    assert!(matches!(
        service.list("file.txt", None, None),
        Err(ListingError::NotADirectory(_))
    ));
    assert!(matches!(
        service.list("missing", None, None),
        Err(ListingError::NotADirectory(_))
    ));
}

#[test]
fn collapse_stays_inside_root() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "served/pkg/only/app.apk", 1);
    fs::create_dir_all(temp.path().join("outside").join("private_only_child")).unwrap();

    let service = service(&temp.path().join("served"));
    assert_eq!(service.collapse("", "pkg").unwrap(), "pkg/only");

    for name in ["../outside", "..", ".", "", "pkg/only", "pkg\\only"] {
        assert!(
            matches!(
                service.collapse("", name),
                Err(ListingError::Path(PathError::NotASegment(_)))
            ),
            "{name:?} must be rejected"
        );
    }
    assert!(matches!(
        service.collapse("..", "outside"),
        Err(ListingError::Path(PathError::EscapesRoot(_)))
    ));
}

#[test]
fn listing_serializes_with_wire_field_names() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.txt", 2);

    let service = service(temp.path());
    let value = serde_json::to_value(service.list("", None, None).unwrap()).unwrap();
    let entry = &value["entries"][0];
    assert_eq!(entry["name"], "a.txt");
    assert_eq!(entry["type"], "file");
    assert_eq!(entry["size"], 2);
    assert!(entry["mtime"].as_u64().is_some());
    assert_eq!(value["policy"], serde_json::json!({ "upload": false, "delete": false }));
}

#[tokio::test]
async fn scheduler_publishes_snapshot_for_service() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pkg/app.apk", 10);

    let mut config = ServiceConfig::new(temp.path());
    config.schedule = RebuildSchedule {
        startup_delay: Duration::from_millis(10),
        interval: Duration::from_secs(3600),
    };
    let service = DirectoryService::new(config).unwrap();
    let scheduler = service.start_scheduler();
    let mut updates = scheduler.subscribe_updates();

    let update = tokio::time::timeout(Duration::from_secs(10), updates.recv())
        .await
        .expect("rebuild in time")
        .expect("update");
    assert_eq!(update.reason, "startup");
    assert_eq!(service.snapshot().generation(), update.generation);

    let hits = service.list("", Some("apk"), None).unwrap();
    assert_eq!(names(&hits.entries), vec!["pkg/app.apk"]);
    assert_eq!(service.size_of("pkg").unwrap(), 10);
}
