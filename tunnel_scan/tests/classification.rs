use std::sync::{Arc, Mutex};

use tunnel_scan::classify::{classify, Label};
use tunnel_scan::config::ClassifierConfig;
use tunnel_scan::geometry::Point3;
use tunnel_scan::{Monitor, PointSet, ScanError};

/// Floor, two 3 m walls and some loose clutter inside the tunnel.
fn scan() -> PointSet {
    let mut pts = Vec::new();
    for j in 0..=40 {
        let y = j as f64 * 0.25;
        for i in 0..=20 {
            pts.push(Point3::new(-5.0 + i as f64 * 0.5, y, 0.0));
        }
        for k in 1..=12 {
            pts.push(Point3::new(-5.0, y, k as f64 * 0.25));
            pts.push(Point3::new(5.0, y, k as f64 * 0.25));
        }
    }
    for k in 0..60 {
        pts.push(Point3::new(
            -4.0 + (k * 37 % 80) as f64 * 0.1,
            (k * 13 % 100) as f64 * 0.1,
            0.5 + (k * 7 % 20) as f64 * 0.1,
        ));
    }
    PointSet::new(pts)
}

#[test]
fn ground_and_two_walls_found() {
    let set = Arc::new(scan());
    let classified = classify(Arc::clone(&set), &ClassifierConfig::default(), &Monitor::new()).unwrap();
    let stats = classified.stats();
    assert_eq!(stats.ground_points, 861);
    assert_eq!(stats.wall_points, vec![492, 492]);
    assert_eq!(stats.unclassified_points, 60);
    assert_eq!(classified.labels().len(), set.len());

    // Wall1 is the x = -5 wall: equal sizes go to the lower point index.
    let wall1 = classified.indices_of(Label::Wall(1));
    assert!(wall1.iter().all(|&i| set.points()[i].x == -5.0));
}

#[test]
fn classification_is_idempotent_on_classified_subset() {
    let set = Arc::new(scan());
    let config = ClassifierConfig::default();
    let first = classify(Arc::clone(&set), &config, &Monitor::new()).unwrap();
    let (subset, origin) = first.classified_subset();
    let second = classify(Arc::new(subset), &config, &Monitor::new()).unwrap();
    for (k, &i) in origin.iter().enumerate() {
        assert_eq!(second.labels()[k], first.labels()[i]);
    }
}

#[test]
fn progress_reaches_completion() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let monitor = Monitor::new().with_observer(move |p| sink.lock().unwrap().push(p.clone()));
    classify(Arc::new(scan()), &ClassifierConfig::default(), &monitor).unwrap();
    let seen = seen.lock().unwrap();
    assert!(seen.len() >= 2);
    assert_eq!(seen.last().unwrap().percent(), 100);
}

#[test]
fn strict_wall_height_reports_partial_result() {
    let config = ClassifierConfig {
        min_wall_height: 5.0,
        ..Default::default()
    };
    let err = classify(Arc::new(scan()), &config, &Monitor::new()).unwrap_err();
    assert!(err.hint().contains("RANSAC distance"));
    match err {
        ScanError::InsufficientWalls { found, partial } => {
            assert_eq!(found, 0);
            assert_eq!(partial.stats().ground_points, 861);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let config = ClassifierConfig {
        ransac_distance: -1.0,
        ..Default::default()
    };
    let err = classify(Arc::new(scan()), &config, &Monitor::new()).unwrap_err();
    assert!(matches!(err, ScanError::InvalidParameter { .. }));
}
