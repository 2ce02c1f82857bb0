use mediatree::storage::{LoadedRows, StorageBackend, StorageStats};
use mediatree::session::{Session, SessionEnd};
use mediatree::{
    BoundingBox, Config, MediaLibrary, MediaTreeError, RebalancePolicy, Record, SearchMode,
    UserName,
};
use std::fs;
use tempfile::{NamedTempFile, TempDir};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn record(id: i64, title: &str, b: [f64; 4]) -> Record {
    Record::new(id, title, "tag", BoundingBox::new(b[0], b[1], b[2], b[3]))
}

fn sorted_ids(records: &[&Record]) -> Vec<i64> {
    let mut ids: Vec<i64> = records.iter().map(|r| r.id()).collect();
    ids.sort();
    ids
}

#[test]
fn test_basic_library_operations() {
    init_logging();
    let mut library = MediaLibrary::memory().unwrap();
    library.create_user("alice").unwrap();

    library
        .add("alice", record(1, "A", [0.0, 0.0, 10.0, 10.0]))
        .unwrap()
        .into_result()
        .unwrap();
    library
        .add("alice", record(2, "B", [5.0, 5.0, 15.0, 15.0]))
        .unwrap()
        .into_result()
        .unwrap();
    library
        .add("alice", record(3, "C", [20.0, 20.0, 30.0, 30.0]))
        .unwrap()
        .into_result()
        .unwrap();

    let query = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
    assert_eq!(sorted_ids(&library.search("alice", &query).unwrap()), vec![1, 2]);
    assert_eq!(sorted_ids(&library.search_exact("alice", &query).unwrap()), vec![2]);

    let removed = library.delete("alice", &query).unwrap().into_result().unwrap();
    assert_eq!(removed, 2);
    assert_eq!(sorted_ids(&library.list("alice").unwrap()), vec![3]);
}

#[test]
fn test_persistence_roundtrip() {
    init_logging();
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    {
        let mut library = MediaLibrary::open(path).unwrap();
        library.create_user("alice").unwrap();
        library.create_user("bob").unwrap();
        for i in 0..25 {
            let x = i as f64 * 0.1;
            library
                .add("alice", record(i, &format!("clip{i}"), [x, x, x + 0.3, x + 0.7]))
                .unwrap()
                .into_result()
                .unwrap();
        }
        library
            .add("bob", record(100, "song", [-3.5, 1e-9, 2.0, 1e9]))
            .unwrap()
            .into_result()
            .unwrap();
    }

    let library = MediaLibrary::open(path).unwrap();
    assert!(library.load_report().is_clean());
    assert_eq!(library.load_report().loaded, 26);
    assert_eq!(library.users().len(), 2);

    let alice = library.list("alice").unwrap();
    assert_eq!(alice.len(), 25);
    for i in 0..25 {
        let x = i as f64 * 0.1;
        let expected = record(i, &format!("clip{i}"), [x, x, x + 0.3, x + 0.7]);
        assert!(alice.contains(&&expected), "record {i} changed on reload");
    }

    let bob = library.list("bob").unwrap();
    assert_eq!(*bob[0].bbox(), BoundingBox::new(-3.5, 1e-9, 2.0, 1e9));
    assert!(library.index("alice").unwrap().check_invariants().is_ok());
}

#[test]
fn test_delete_rewrites_data_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users_content.csv");

    let mut library = MediaLibrary::open(&path).unwrap();
    library.create_user("alice").unwrap();
    library.create_user("bob").unwrap();
    for (user, id, b) in [
        ("alice", 1, [0.0, 0.0, 10.0, 10.0]),
        ("alice", 2, [5.0, 5.0, 15.0, 15.0]),
        ("bob", 3, [5.0, 5.0, 6.0, 6.0]),
        ("alice", 4, [20.0, 20.0, 30.0, 30.0]),
    ] {
        library
            .add(user, record(id, "t", b))
            .unwrap()
            .into_result()
            .unwrap();
    }
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 4);

    library
        .delete("alice", &BoundingBox::new(5.0, 5.0, 15.0, 15.0))
        .unwrap()
        .into_result()
        .unwrap();

    // Bob's record overlaps the query too but belongs to another index
    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["alice,4,t,tag,20,20,30,30", "bob,3,t,tag,5,5,6,6"]);
}

#[test]
fn test_empty_user_is_not_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.csv");

    let mut library = MediaLibrary::open(&path).unwrap();
    library.create_user("carol").unwrap();
    library.persist_all().unwrap();
    drop(library);

    let library = MediaLibrary::open(&path).unwrap();
    assert!(!library.has_user("carol"));
}

#[test]
fn test_malformed_rows_are_skipped() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(
        &path,
        "alice,1,Song,audio,0,0,1,1\n\
         alice,two,Song,audio,0,0,1,1\n\
         \n\
         bob,3,Clip,video,4,4,2,2\n\
         bob,4,Clip,video,4,4,5,5\n",
    )
    .unwrap();

    let library = MediaLibrary::open(&path).unwrap();
    let report = library.load_report();
    assert_eq!(report.loaded, 2);
    assert_eq!(report.blank, 1);
    assert_eq!(report.skipped_lines, vec![2, 4]);
    assert_eq!(library.list("alice").unwrap().len(), 1);
    assert_eq!(library.list("bob").unwrap().len(), 1);
}

#[test]
fn test_search_report_file() {
    let dir = TempDir::new().unwrap();
    let config = Config::default()
        .with_data_file(dir.path().join("data.csv"))
        .with_results_dir(dir.path().join("results"));
    let mut library = MediaLibrary::builder().config(config).build().unwrap();
    library.create_user("alice").unwrap();
    library
        .add("alice", Record::new(9, "Dune", "book", BoundingBox::new(1.5, 2.0, 3.0, 4.0)))
        .unwrap()
        .into_result()
        .unwrap();

    let summary = library
        .search_to_report("alice", &BoundingBox::new(0.0, 0.0, 2.0, 2.0))
        .unwrap();
    assert_eq!(summary.matches, 1);
    assert_eq!(
        summary.path,
        dir.path().join("results").join("alice_search_result.txt")
    );
    assert_eq!(
        fs::read_to_string(&summary.path).unwrap(),
        "ID: 9, Title: Dune, Tags: book, Bounding Box: [1.5, 2, 3, 4]\n"
    );

    let summary = library
        .search_to_report("alice", &BoundingBox::new(50.0, 50.0, 60.0, 60.0))
        .unwrap();
    assert_eq!(summary.matches, 0);
    assert_eq!(fs::read_to_string(&summary.path).unwrap(), "");
}

#[test]
fn test_exact_search_mode_from_config() {
    let config = Config::default().with_search_mode(SearchMode::Exact);
    let mut library = MediaLibrary::builder()
        .in_memory()
        .config(config)
        .build()
        .unwrap();
    library.create_user("alice").unwrap();
    library
        .add("alice", record(1, "A", [0.0, 0.0, 10.0, 10.0]))
        .unwrap()
        .into_result()
        .unwrap();

    assert!(library.search("alice", &BoundingBox::new(0.0, 0.0, 5.0, 5.0)).unwrap().is_empty());
    assert_eq!(library.search("alice", &BoundingBox::new(0.0, 0.0, 10.0, 10.0)).unwrap().len(), 1);
}

#[test]
fn test_root_only_policy_keeps_every_record() {
    let config = Config::default()
        .with_max_children(3)
        .with_rebalance(RebalancePolicy::RootOnly);
    let mut library = MediaLibrary::builder()
        .in_memory()
        .config(config)
        .build()
        .unwrap();
    library.create_user("alice").unwrap();

    for i in 0..200 {
        let x = (i % 17) as f64;
        let y = (i / 17) as f64;
        library
            .add("alice", record(i, "r", [x, y, x + 0.5, y + 0.5]))
            .unwrap()
            .into_result()
            .unwrap();
    }

    assert_eq!(library.list("alice").unwrap().len(), 200);
    let hits = library.search("alice", &BoundingBox::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    assert_eq!(hits.len(), 200);
    assert!(library.index("alice").unwrap().check_invariants().is_ok());
}

/// Backend whose writes always fail, for exercising persistence warnings.
struct FailingBackend;

impl StorageBackend for FailingBackend {
    fn load(&mut self) -> mediatree::Result<LoadedRows> {
        Ok(LoadedRows::default())
    }

    fn append(&mut self, _user: &UserName, _record: &Record) -> mediatree::Result<()> {
        Err(std::io::Error::other("disk full").into())
    }

    fn rewrite(&mut self, _rows: &[(&UserName, &Record)]) -> mediatree::Result<()> {
        Err(std::io::Error::other("disk full").into())
    }

    fn stats(&self) -> StorageStats {
        StorageStats::default()
    }
}

#[test]
fn test_storage_failure_keeps_memory_state() {
    init_logging();
    let mut library = MediaLibrary::builder()
        .backend(Box::new(FailingBackend))
        .build()
        .unwrap();
    library.create_user("alice").unwrap();

    let outcome = library
        .add("alice", record(1, "A", [0.0, 0.0, 1.0, 1.0]))
        .unwrap();
    assert!(!outcome.is_persisted());
    assert!(matches!(outcome.warning, Some(MediaTreeError::Io(_))));
    assert_eq!(library.list("alice").unwrap().len(), 1);

    let outcome = library
        .delete("alice", &BoundingBox::new(0.0, 0.0, 1.0, 1.0))
        .unwrap();
    assert_eq!(outcome.value, 1);
    assert!(outcome.into_result().is_err());
    assert!(library.list("alice").unwrap().is_empty());

    assert!(library.persist_all().is_err());
    assert_eq!(library.stats().failed_writes, 3);
}

#[test]
fn test_session_against_data_file() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let config = Config::default()
        .with_data_file(dir.path().join("users_content.csv"))
        .with_results_dir(dir.path());

    let script = "new\ndave\n1\n11\nTrailer\nvideo\n0 0 2 2\n1\n12\nPoster\nimage\n5 5 6 6\n4\n";
    {
        let mut library = MediaLibrary::builder().config(config.clone()).build().unwrap();
        let mut output = Vec::new();
        let end = Session::new(&mut library, script.as_bytes(), &mut output)
            .run()
            .unwrap();
        assert_eq!(end, SessionEnd::Exited);
    }

    // A second session logs in with the stored user and deletes a record
    let mut library = MediaLibrary::builder().config(config.clone()).build().unwrap();
    assert_eq!(library.list("dave").unwrap().len(), 2);

    let mut output = Vec::new();
    let end = Session::new(&mut library, "dave\n3\n1 1 1 1\n4\n".as_bytes(), &mut output)
        .run()
        .unwrap();
    assert_eq!(end, SessionEnd::Exited);
    assert!(String::from_utf8(output).unwrap().contains("Deleted 1 record(s)."));

    let library = MediaLibrary::builder().config(config).build().unwrap();
    let remaining = library.list("dave").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title(), "Poster");
}

#[cfg(feature = "toml")]
#[test]
fn test_config_from_toml() {
    let config = Config::from_toml(
        r#"
        search_mode = "exact"

        [index]
        max_children = 6
        rebalance = "root_only"

        [persistence]
        data_file = "media.csv"
        "#,
    )
    .unwrap();

    assert_eq!(config.index.max_children, 6);
    assert_eq!(config.index.rebalance, RebalancePolicy::RootOnly);
    assert_eq!(config.search_mode, SearchMode::Exact);
    assert_eq!(config.persistence.data_file, std::path::PathBuf::from("media.csv"));
}
