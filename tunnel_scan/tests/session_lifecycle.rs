use std::sync::{mpsc, Arc};

use assert_fs::prelude::*;
use tunnel_scan::classify::classify;
use tunnel_scan::config::{AnalysisConfig, ModelConfig};
use tunnel_scan::geometry::Point3;
use tunnel_scan::io::las::write_points_las;
use tunnel_scan::task;
use tunnel_scan::{Monitor, PointSet, ScanError, Session};

fn tunnel(length: usize) -> PointSet {
    let mut pts = Vec::new();
    for j in 0..=length {
        let y = j as f64 * 0.25;
        for i in 0..=20 {
            pts.push(Point3::new(-5.0 + i as f64 * 0.5, y, 0.0));
        }
        for k in 1..=12 {
            pts.push(Point3::new(-5.0, y, k as f64 * 0.25));
            pts.push(Point3::new(5.0, y, k as f64 * 0.25));
        }
    }
    PointSet::new(pts)
}

fn write_scan(dir: &assert_fs::TempDir, name: &str, length: usize) -> String {
    let file = dir.child(name);
    let path = file.path().to_str().unwrap().to_string();
    write_points_las(&path, &tunnel(length)).unwrap();
    path
}

#[test]
fn full_pipeline_through_session() {
    let dir = assert_fs::TempDir::new().unwrap();
    let scan = write_scan(&dir, "tunnel.las", 40);
    let design = dir.child("design.csv");
    design.write_str("X,Z\n-5,3\n-5,0\n5,0\n5,3\n").unwrap();

    let mut session = Session::new(AnalysisConfig::default());
    let header = session.load(&scan, &Monitor::new()).unwrap();
    assert_eq!(header.point_count, 41 * 45);
    session.classify(&Monitor::new()).unwrap();
    session.reconstruct(&Monitor::new()).unwrap();
    session.extract_section(5.0, &Monitor::new()).unwrap();
    session.import_design(design.path().to_str().unwrap()).unwrap();
    let result = session.compare().unwrap();
    assert!(result.stats.max_absolute_deviation < 1e-9);

    let summary = session.summary(&ModelConfig::default());
    assert_eq!(summary.scan.as_ref().unwrap().point_count, 41 * 45);
    assert!(summary.mesh.is_some());
    assert!(summary.comparison.is_some());
    assert!(summary.rows().iter().any(|r| r.starts_with("Wall2 points")));
}

#[test]
fn loading_invalidates_derived_results() {
    let dir = assert_fs::TempDir::new().unwrap();
    let first = write_scan(&dir, "first.las", 40);
    let second = write_scan(&dir, "second.las", 20);

    let mut session = Session::default();
    session.load(&first, &Monitor::new()).unwrap();
    session.classify(&Monitor::new()).unwrap();
    session.extract_section(2.0, &Monitor::new()).unwrap();

    session.load(&second, &Monitor::new()).unwrap();
    assert!(session.classification().is_none());
    assert!(session.section().is_none());
    assert_eq!(session.points().unwrap().len(), 21 * 45);
}

#[test]
fn failed_section_keeps_previous_results() {
    let dir = assert_fs::TempDir::new().unwrap();
    let scan = write_scan(&dir, "tunnel.las", 40);
    let mut session = Session::default();
    session.load(&scan, &Monitor::new()).unwrap();
    session.classify(&Monitor::new()).unwrap();
    session.extract_section(2.0, &Monitor::new()).unwrap();

    let err = session.extract_section(1000.0, &Monitor::new()).unwrap_err();
    assert!(matches!(err, ScanError::EmptySlice { .. }));
    assert_eq!(session.section().unwrap().position, 2.0);
    assert!(session.classification().is_some());
}

#[test]
fn background_classification_commits() {
    let dir = assert_fs::TempDir::new().unwrap();
    let scan = write_scan(&dir, "tunnel.las", 40);
    let mut session = Session::default();
    session.load(&scan, &Monitor::new()).unwrap();

    let task = session.classify_in_background().unwrap();
    let classified = task.join().unwrap();
    session.commit_classification(classified).unwrap();
    assert_eq!(session.classification().unwrap().stats().wall_count(), 2);
}

#[test]
fn stale_background_result_is_rejected() {
    let dir = assert_fs::TempDir::new().unwrap();
    let first = write_scan(&dir, "first.las", 40);
    let second = write_scan(&dir, "second.las", 40);
    let mut session = Session::default();
    session.load(&first, &Monitor::new()).unwrap();
    let task = session.classify_in_background().unwrap();
    session.load(&second, &Monitor::new()).unwrap();

    let classified = task.join().unwrap();
    let err = session.commit_classification(classified).unwrap_err();
    assert!(matches!(err, ScanError::StaleResult));
    assert!(session.classification().is_none());
}

#[test]
fn cancelled_classification_leaves_session_untouched() {
    let dir = assert_fs::TempDir::new().unwrap();
    let scan = write_scan(&dir, "tunnel.las", 40);
    let mut session = Session::default();
    session.load(&scan, &Monitor::new()).unwrap();
    session.classify(&Monitor::new()).unwrap();
    let before = session.classification().unwrap().labels().to_vec();

    let points = Arc::clone(session.points().unwrap());
    let config = session.config().classifier.clone();
    let (go_tx, go_rx) = mpsc::channel::<()>();
    let task = task::spawn("classify", move |monitor| {
        go_rx.recv().ok();
        classify(points, &config, monitor)
    })
    .unwrap();
    task.cancel();
    go_tx.send(()).unwrap();

    assert!(matches!(task.join(), Err(ScanError::Cancelled)));
    assert_eq!(session.classification().unwrap().labels(), before.as_slice());
}
