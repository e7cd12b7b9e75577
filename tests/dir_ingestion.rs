use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use sheet_nodes::graph::{MemoryHost, NodeKind};
use sheet_nodes::ingestion::{ingest_dir, DirIngestOptions, IngestionOptions};
use sheet_nodes::IngestionError;

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("sheet-nodes-{name}-{nanos}"));
    std::fs::create_dir_all(dir.join("sub")).unwrap();
    std::fs::write(dir.join("a.csv"), "x\n1\n").unwrap();
    std::fs::write(dir.join("sub").join("b.csv"), "y\n2\n3\n").unwrap();
    std::fs::write(dir.join("manual.pdf"), "%PDF-1.4").unwrap();
    std::fs::write(dir.join("empty.csv"), "").unwrap();
    dir
}

#[test]
fn every_file_gets_its_own_pass() {
    let dir = tmp_dir("all");
    let host = MemoryHost::new();
    let dir_opts = DirIngestOptions {
        num_threads: Some(2),
        ..Default::default()
    };

    let summary = ingest_dir(&dir, &host, &dir_opts, &IngestionOptions::default()).unwrap();
    assert_eq!(summary.reports.len(), 4);
    assert_eq!(summary.ingested(), 2);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.total_rows(), 3);

    let failed: Vec<_> = summary.failed().collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("empty.csv"));
    assert!(matches!(failed[0].result, Err(IngestionError::Decode { .. })));

    let graph = host.snapshot();
    let mut names: Vec<_> = graph
        .nodes_of_kind(NodeKind::Workbook)
        .iter()
        .filter_map(|n| n.name.clone())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(graph.nodes_of_kind(NodeKind::Row).len(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn pattern_limits_discovered_files() {
    let dir = tmp_dir("pattern");
    let host = MemoryHost::new();
    let dir_opts = DirIngestOptions {
        pattern: Some("sub/*.csv".to_string()),
        num_threads: Some(1),
    };

    let summary = ingest_dir(&dir, &host, &dir_opts, &IngestionOptions::default()).unwrap();
    assert_eq!(summary.reports.len(), 1);
    assert!(summary.reports[0].path.ends_with("b.csv"));
    assert_eq!(summary.total_rows(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_pattern_is_rejected() {
    let host = MemoryHost::new();
    let dir_opts = DirIngestOptions {
        pattern: Some("[".to_string()),
        num_threads: None,
    };

    let err = ingest_dir(std::env::temp_dir(), &host, &dir_opts, &IngestionOptions::default()).unwrap_err();
    assert!(matches!(err, IngestionError::InvalidOption { ref option, .. } if option == "pattern"));
    assert_eq!(host.call_count(), 0);
}
