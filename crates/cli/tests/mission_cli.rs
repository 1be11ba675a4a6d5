use std::fs::{self, File};
use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

const VEHICLES: &str = "../../configs/vehicles";
const HOVER: &str = "../../configs/missions/evtol_hover.yaml";

#[test]
fn mission_prints_profile_table() {
    Command::cargo_bin("mission")
        .expect("mission bin")
        .args(["--mission", HOVER, "--configs", VEHICLES])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Mission Profile ==="))
        .stdout(predicate::str::contains("takeoff hover"))
        .stdout(predicate::str::contains("SOC"));
}

#[test]
fn mission_writes_csv_and_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("out/history.csv");
    let json_path = dir.path().join("out/summary.json");

    Command::cargo_bin("mission")
        .expect("mission bin")
        .args([
            "--mission",
            HOVER,
            "--configs",
            VEHICLES,
            "--output-csv",
            csv_path.to_str().unwrap(),
            "--output-json",
            json_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let history = fs::read_to_string(&csv_path).expect("csv written");
    assert!(history.starts_with("segment,status,frames.inertial.time"));
    let summary = fs::read_to_string(&json_path).expect("json written");
    assert!(summary.contains("\"mission\": \"Vertiport hover\""));
}

#[test]
fn mission_streams_csv_to_stdout() {
    Command::cargo_bin("mission")
        .expect("mission bin")
        .args(["--mission", HOVER, "--configs", VEHICLES, "--output-csv", "-"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("segment,status,"))
        .stdout(predicate::str::contains("=== Mission Profile ===").not());
}

#[test]
fn mission_rejects_unknown_vehicle_override() {
    Command::cargo_bin("mission")
        .expect("mission bin")
        .args(["--mission", HOVER, "--configs", VEHICLES, "--vehicle", "Zeppelin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Zeppelin"));
}

#[test]
fn profile_plot_renders_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("history.csv");
    let png_path = dir.path().join("profile.png");

    let mut file = File::create(&csv_path).expect("csv create");
    writeln!(file, "segment,status,frames.inertial.time,freestream.altitude").unwrap();
    for i in 0..4 {
        writeln!(file, "climb,solved,{},{}", i as f64 * 10.0, i as f64 * 100.0).unwrap();
    }
    for i in 0..3 {
        writeln!(file, "cruise,solved,{},300", 40.0 + i as f64 * 50.0).unwrap();
    }

    Command::cargo_bin("profile_plot")
        .expect("profile_plot bin")
        .args([
            "--input",
            csv_path.to_str().unwrap(),
            "--output",
            png_path.to_str().unwrap(),
            "--width",
            "400",
            "--height",
            "300",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 segments"));

    let metadata = fs::metadata(png_path).expect("png metadata");
    assert!(metadata.len() > 0, "PNG output should not be empty");
}

#[test]
fn profile_plot_requires_the_metric_column() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("history.csv");
    fs::write(&csv_path, "segment,status,frames.inertial.time\nclimb,solved,0\n").expect("csv");

    Command::cargo_bin("profile_plot")
        .expect("profile_plot bin")
        .args([
            "--input",
            csv_path.to_str().unwrap(),
            "--metric",
            "propulsion.throttle",
            "--output",
            dir.path().join("x.png").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("propulsion.throttle"));
}
