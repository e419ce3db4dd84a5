//! Integration tests for the record store and timestamp index.
//!
//! These tests exercise append, read, delete and export across the
//! per-component files, the aggregate file and `index.json`.

use std::collections::HashSet;
use std::fs;

use tempfile::tempdir;
use thermolog::store::AGGREGATE_FILE;
use thermolog::{Measurement, Selection, Store, Target};

fn m(component: &str, temperature: f64, timestamp: i64) -> Measurement {
    Measurement::new(component, temperature, timestamp)
}

fn cpu() -> Target {
    Target::component("CPU")
}

/// Appends the three-record scenario used by several tests.
fn scenario_store(dir: &std::path::Path) -> Store {
    let mut store = Store::open(dir);
    store.append(&m("CPU", 45.0, 1000)).unwrap();
    store.append(&m("CPU", 46.0, 1010)).unwrap();
    store.append(&m("GPU", 60.0, 1005)).unwrap();
    store
}

#[test]
fn test_scenario_read_component_and_aggregate() {
    let temp_dir = tempdir().unwrap();
    let store = scenario_store(temp_dir.path());

    assert_eq!(
        store.read(&cpu(), Selection::all()).unwrap(),
        vec![m("CPU", 45.0, 1000), m("CPU", 46.0, 1010)]
    );
    assert_eq!(
        store.read(&Target::All, Selection::all()).unwrap(),
        vec![
            m("CPU", 45.0, 1000),
            m("CPU", 46.0, 1010),
            m("GPU", 60.0, 1005),
        ]
    );
}

#[test]
fn test_scenario_delete_then_export() {
    let temp_dir = tempdir().unwrap();
    let mut store = scenario_store(temp_dir.path());

    let removed = store.delete(&cpu(), Selection::first(1)).unwrap();
    assert_eq!(removed, vec![m("CPU", 45.0, 1000)]);
    assert_eq!(store.index().timestamps("CPU"), &[1010]);
    assert_eq!(
        store.read(&Target::All, Selection::all()).unwrap(),
        vec![m("CPU", 46.0, 1010), m("GPU", 60.0, 1005)]
    );

    let summary = store.export_csv(&cpu(), Selection::all()).unwrap();
    assert_eq!(summary.records, 1);
    assert_eq!(
        summary.path,
        temp_dir.path().join("export").join("export_CPU.csv")
    );
    assert_eq!(
        fs::read_to_string(&summary.path).unwrap(),
        "Component,Temperature,Timestamp\nCPU,46.0,1010\n"
    );
}

#[test]
fn test_append_order_is_preserved() {
    let temp_dir = tempdir().unwrap();
    let mut store = Store::open(temp_dir.path());

    // Out-of-order timestamps stay in insertion order in the file.
    let appended = vec![
        m("CPU", 40.0, 30),
        m("CPU", 41.0, 10),
        m("CPU", 42.0, 20),
    ];
    for record in &appended {
        store.append(record).unwrap();
    }

    assert_eq!(store.read(&cpu(), Selection::all()).unwrap(), appended);
    assert_eq!(store.index().timestamps("CPU"), &[10, 20, 30]);
}

#[test]
fn test_prefix_and_suffix_lengths() {
    let temp_dir = tempdir().unwrap();
    let mut store = Store::open(temp_dir.path());
    for i in 0..5 {
        store.append(&m("GPU", 50.0 + f64::from(i), 100 + i64::from(i))).unwrap();
    }
    let gpu = Target::component("GPU");

    for n in 1..=7 {
        let head = store.read(&gpu, Selection::first(n)).unwrap();
        let tail = store.read(&gpu, Selection::last(n)).unwrap();
        assert_eq!(head.len(), n.min(5));
        assert_eq!(tail.len(), n.min(5));
        assert_eq!(head[0].timestamp, 100);
        assert_eq!(tail.last().unwrap().timestamp, 104);
    }

    let head = store.read(&gpu, Selection::first(2)).unwrap();
    let tail = store.read(&gpu, Selection::last(3)).unwrap();
    let mut joined = head.clone();
    joined.extend(tail.clone());
    assert_eq!(joined, store.read(&gpu, Selection::all()).unwrap());
    assert!(head.iter().all(|h| !tail.contains(h)));
}

#[test]
fn test_delete_from_end_updates_all_files() {
    let temp_dir = tempdir().unwrap();
    let mut store = Store::open(temp_dir.path());
    for ts in [1, 2, 3, 4] {
        store.append(&m("CPU", 40.0, ts)).unwrap();
        store.append(&m("GPU", 60.0, ts + 100)).unwrap();
    }

    let removed = store.delete(&cpu(), Selection::last(2)).unwrap();
    let removed_ts: HashSet<i64> = removed.iter().map(|r| r.timestamp).collect();
    assert_eq!(removed_ts, HashSet::from([3, 4]));

    let component = store.read(&cpu(), Selection::all()).unwrap();
    let aggregate = store.read(&Target::All, Selection::all()).unwrap();
    for record in &removed {
        assert!(!component.contains(record));
        assert!(!aggregate.contains(record));
    }
    assert!(
        store
            .index()
            .timestamps("CPU")
            .iter()
            .all(|ts| !removed_ts.contains(ts))
    );
    assert_eq!(aggregate.len(), 6);
}

#[test]
fn test_delete_all_components_slice() {
    let temp_dir = tempdir().unwrap();
    let mut store = scenario_store(temp_dir.path());

    // The first two aggregate records are both CPU readings.
    let removed = store.delete(&Target::All, Selection::first(2)).unwrap();
    assert_eq!(removed.len(), 2);

    assert!(store.read(&cpu(), Selection::all()).unwrap_err().is_not_found());
    assert!(store.index().timestamps("CPU").is_empty());
    assert_eq!(store.index().timestamps("GPU"), &[1005]);
    assert_eq!(
        store.read(&Target::All, Selection::all()).unwrap(),
        vec![m("GPU", 60.0, 1005)]
    );
}

#[test]
fn test_delete_all_components_from_end_spans_components() {
    let temp_dir = tempdir().unwrap();
    let mut store = scenario_store(temp_dir.path());

    let removed = store.delete(&Target::All, Selection::last(2)).unwrap();
    assert_eq!(removed, vec![m("CPU", 46.0, 1010), m("GPU", 60.0, 1005)]);

    assert_eq!(
        store.read(&cpu(), Selection::all()).unwrap(),
        vec![m("CPU", 45.0, 1000)]
    );
    assert!(
        store
            .read(&Target::component("GPU"), Selection::all())
            .unwrap_err()
            .is_not_found()
    );
    assert_eq!(store.index().timestamps("CPU"), &[1000]);
    assert!(store.index().timestamps("GPU").is_empty());
}

#[test]
fn test_delete_everything_then_delete_again_is_not_found() {
    let temp_dir = tempdir().unwrap();
    let mut store = scenario_store(temp_dir.path());

    let removed = store.delete(&cpu(), Selection::all()).unwrap();
    assert_eq!(removed.len(), 2);
    assert!(store.index().timestamps("CPU").is_empty());

    let err = store.delete(&cpu(), Selection::all()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_export_all_components() {
    let temp_dir = tempdir().unwrap();
    let store = scenario_store(temp_dir.path());

    let summary = store.export_csv(&Target::All, Selection::last(2)).unwrap();
    assert!(summary.path.ends_with("export/export_all.csv"));
    assert_eq!(
        fs::read_to_string(&summary.path).unwrap(),
        "Component,Temperature,Timestamp\nCPU,46.0,1010\nGPU,60.0,1005\n"
    );
}

#[test]
fn test_export_missing_component_writes_nothing() {
    let temp_dir = tempdir().unwrap();
    let store = scenario_store(temp_dir.path());

    let err = store
        .export_csv(&Target::component("Motherboard"), Selection::all())
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!temp_dir.path().join("export").exists());
}

#[test]
fn test_index_survives_reopen() {
    let temp_dir = tempdir().unwrap();
    {
        let _store = scenario_store(temp_dir.path());
    }

    let store = Store::open(temp_dir.path());
    assert_eq!(store.index().timestamps("CPU"), &[1000, 1010]);
    assert_eq!(store.index().latest("CPU", 1), &[1010]);
    assert_eq!(store.index().oldest("CPU", 1), &[1000]);
}

#[test]
fn test_files_are_pretty_printed_arrays() {
    let temp_dir = tempdir().unwrap();
    let _store = scenario_store(temp_dir.path());

    let data = fs::read_to_string(temp_dir.path().join(AGGREGATE_FILE)).unwrap();
    assert!(data.starts_with("[\n"));
    let value: serde_json::Value = serde_json::from_str(&data).unwrap();
    assert_eq!(value[2]["Component"], "GPU");
    assert_eq!(value[2]["Timestamp"], 1005);
}
