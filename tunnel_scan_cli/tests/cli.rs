use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tunnel_scan::geometry::Point3;
use tunnel_scan::io::las::write_points_las;
use tunnel_scan::PointSet;

/// Floor 10 m wide and 10 m long with 3 m walls on both sides.
fn tunnel_points() -> PointSet {
    let mut pts = Vec::new();
    for j in 0..=40 {
        let y = j as f64 * 0.25;
        for i in 0..=20 {
            pts.push(Point3::new(-5.0 + i as f64 * 0.5, y, 0.0));
        }
        for k in 1..=12 {
            let z = k as f64 * 0.25;
            pts.push(Point3::new(-5.0, y, z));
            pts.push(Point3::new(5.0, y, z));
        }
    }
    PointSet::new(pts)
}

fn tunnel_scan_file(dir: &assert_fs::TempDir) -> String {
    let file = dir.child("tunnel.las");
    write_points_las(file.path().to_str().unwrap(), &tunnel_points()).unwrap();
    file.path().to_str().unwrap().to_string()
}

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("tunnel_scan_cli").unwrap();
    cmd.env_remove("RUST_LOG").env("LOG_LEVEL", "warn");
    cmd
}

#[test]
fn info_command() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    cli()
        .args(["info", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("Points: 1845"))
        .stdout(predicate::str::contains("LAS version: 1.2"));
}

#[test]
fn info_missing_file_fails_with_hint() {
    cli()
        .args(["info", "no/such/scan.las"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"))
        .stderr(predicate::str::contains("Hint:"));
}

#[test]
fn classify_command_writes_classified_points() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    let output = dir.child("classified.las");
    cli()
        .args(["classify", &input, "--output", output.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ground points: 861"))
        .stdout(predicate::str::contains("Wall1 points: 492"))
        .stdout(predicate::str::contains("Wall2 points: 492"))
        .stdout(predicate::str::contains("Unclassified points: 0"));
    output.assert(predicate::path::exists());
}

#[test]
fn classify_with_tall_walls_required_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    cli()
        .args(["classify", &input, "--min-wall-height", "5.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not enough walls"))
        .stderr(predicate::str::contains("adjust RANSAC distance"));
}

#[test]
fn mesh_command_writes_obj() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    let output = dir.child("tunnel.obj");
    cli()
        .args(["mesh", &input, output.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("triangles written to"));
    output.assert(predicate::str::starts_with("# tunnel_scan surface mesh"));
}

#[test]
fn section_command_writes_profile_csv() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    let output = dir.child("section.csv");
    cli()
        .args([
            "section",
            &input,
            "5.0",
            "--tolerance",
            "0.1",
            "--output",
            output.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("boundary vertices"));
    output.assert(predicate::str::starts_with("X,Z,Type\n"));
    output.assert(predicate::str::contains("Wall1"));
    output.assert(predicate::str::contains("Ground"));
}

#[test]
fn section_samples_default_output_path() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    cli()
        .args(["section", &input, "5", "--samples"])
        .assert()
        .success();
    dir.child("tunnel_section_5.csv")
        .assert(predicate::str::starts_with("Y,5\nTol,0.5\n\nX,Z,Type\n"));
}

#[test]
fn section_outside_scan_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    cli()
        .args(["section", &input, "1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no points found near position 1000"));
}

#[test]
fn compare_command_against_matching_design() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    let design = dir.child("design.csv");
    design.write_str("X,Z\n-5,3\n-5,0\n5,0\n5,3\n").unwrap();
    cli()
        .args([
            "compare",
            &input,
            "5.0",
            design.path().to_str().unwrap(),
            "--tolerance",
            "0.1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Max deviation: 0.000"))
        .stdout(predicate::str::contains("RMS deviation: 0.000"));
}

#[test]
fn summary_command_prints_json() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    cli()
        .args(["summary", &input, "--position", "5.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ground_points\": 861"))
        .stdout(predicate::str::contains("\"model_name\""));
}

#[test]
fn damage_command() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = tunnel_scan_file(&dir);
    cli()
        .args(["damage", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("Surface points: 861"));
}
