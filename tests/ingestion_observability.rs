use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use sheet_nodes::graph::{FileNode, GraphStats, MemoryHost};
use sheet_nodes::ingestion::{
    on_create_node, CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionOptions,
    IngestionSeverity,
};
use sheet_nodes::projection::PluginOptions;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(String, GraphStats)>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: GraphStats) {
        self.successes.lock().unwrap().push((ctx.name.clone(), stats));
    }

    fn on_failure(
        &self,
        _ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &sheet_nodes::IngestionError,
    ) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(
        &self,
        _ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &sheet_nodes::IngestionError,
    ) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn observed(obs: &Arc<RecordingObserver>, plugin: PluginOptions) -> IngestionOptions {
    IngestionOptions {
        plugin,
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
    }
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let host = MemoryHost::new();
    let file = FileNode::from_path("file-1", fixture("does_not_exist.csv"));

    // Missing file -> Io error -> Critical
    let _ = on_create_node(&file, &host, &observed(&obs, PluginOptions::default())).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![IngestionSeverity::Critical]);
    assert!(obs.successes.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_without_alert_for_non_critical_error() {
    let obs = Arc::new(RecordingObserver::default());
    let host = MemoryHost::new();
    let file = FileNode::from_path("file-1", fixture("data.csv"));
    let plugin = PluginOptions::from_json_str(r#"{ "range": "nope" }"#).unwrap();

    // Bad option -> Error severity (not Critical) -> should not alert
    let _ = on_create_node(&file, &host, &observed(&obs, plugin)).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn lower_threshold_alerts_on_errors_too() {
    let obs = Arc::new(RecordingObserver::default());
    let host = MemoryHost::new().with_content("f", "");
    let file = FileNode::new("f", "empty").with_extension("csv");
    let opts = IngestionOptions {
        alert_at_or_above: IngestionSeverity::Error,
        ..observed(&obs, PluginOptions::default())
    };

    let _ = on_create_node(&file, &host, &opts).unwrap_err();

    assert_eq!(*obs.alerts.lock().unwrap(), vec![IngestionSeverity::Error]);
}

#[test]
fn observer_receives_success_stats() {
    let obs = Arc::new(RecordingObserver::default());
    let host = MemoryHost::new();
    let file = FileNode::from_path("file-1", fixture("data.csv"));

    on_create_node(&file, &host, &observed(&obs, PluginOptions::default())).unwrap();

    assert_eq!(
        *obs.successes.lock().unwrap(),
        vec![("data".to_string(), GraphStats { worksheets: 1, rows: 2 })]
    );
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn skipped_files_are_not_reported() {
    let obs = Arc::new(RecordingObserver::default());
    let host = MemoryHost::new();
    let file = FileNode::from_path("file-1", fixture("notes.md"));

    on_create_node(&file, &host, &observed(&obs, PluginOptions::default())).unwrap();

    assert!(obs.successes.lock().unwrap().is_empty());
    assert!(obs.failures.lock().unwrap().is_empty());
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn composite_and_file_observers_write_log_lines() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let log = std::env::temp_dir().join(format!("sheet-nodes-observer-{nanos}.log"));

    let recording = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new(vec![
        recording.clone() as Arc<dyn IngestionObserver>,
        Arc::new(FileObserver::new(&log)),
    ]);
    let opts = IngestionOptions {
        observer: Some(Arc::new(composite)),
        ..IngestionOptions::default()
    };

    let host = MemoryHost::new();
    on_create_node(&FileNode::from_path("file-1", fixture("data.csv")), &host, &opts).unwrap();
    let _ = on_create_node(&FileNode::from_path("file-2", fixture("gone.csv")), &host, &opts).unwrap_err();

    assert_eq!(recording.successes.lock().unwrap().len(), 1);
    let contents = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains(" ok file=data "));
    assert!(lines[0].contains("rows=2"));
    assert!(lines[1].contains(" fail severity=Critical file=gone "));
    assert!(lines[2].contains(" ALERT severity=Critical file=gone "));

    let _ = std::fs::remove_file(&log);
}
