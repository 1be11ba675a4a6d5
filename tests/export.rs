use std::fs;

use flight_mission_calculator::evaluate_mission_file;
use flight_mission_calculator::export::history::{columns, write_history};
use flight_mission_calculator::export::summary::{summarize, write_summary};
use flight_mission_calculator::mission::MissionResults;

fn hover_results() -> MissionResults {
    evaluate_mission_file("configs/missions/evtol_hover.yaml", "configs/vehicles")
        .expect("hover mission")
}

#[test]
fn history_csv_has_one_row_per_point() {
    let results = hover_results();
    let mut buffer: Vec<u8> = Vec::new();
    write_history(&mut buffer, &results).expect("write history");

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(&headers[0], "segment");
    assert_eq!(&headers[1], "status");
    assert_eq!(headers.len(), columns(&results).len() + 2);
    assert!(headers.iter().any(|h| h == "energy.battery.state_of_charge"));
    assert!(headers.iter().any(|h| h == "emissions.co2_rate"));
    assert!(!headers.iter().any(|h| h.starts_with("energy.fuel")));

    let soc_idx = headers
        .iter()
        .position(|h| h == "energy.battery.state_of_charge")
        .expect("soc column");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("row")).collect();
    assert_eq!(rows.len(), 16);
    assert_eq!(&rows[0][0], "takeoff hover");
    assert_eq!(&rows[15][0], "hold");
    let soc: Vec<f64> = rows
        .iter()
        .map(|r| r[soc_idx].parse().expect("numeric soc"))
        .collect();
    assert!(soc.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(soc[0], 1.0);
}

#[test]
fn summary_json_reports_segment_outcomes() {
    let results = hover_results();
    let summary = summarize(&results);
    assert_eq!(summary.segments.len(), 2);
    assert_eq!(summary.segments[0].kind, "hover");
    assert!(summary.segments[0].fuel_burned_kg.is_none());
    assert!(summary.segments[1].battery_energy_kwh.expect("battery") < 150.0);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/summary.json");
    write_summary(&path, &results).expect("write summary");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read summary")).expect("json");
    assert_eq!(json["mission"], "Vertiport hover");
    assert_eq!(json["all_solved"], results.all_solved());
    let segments = json["segments"].as_array().expect("segments array");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0]["name"], "takeoff hover");
    assert_eq!(segments[1]["battery_age"]["cycle_day"], 1);
    assert_eq!(segments[0]["battery_age"]["cycle_day"], 0);
    assert_eq!(segments[1]["start_altitude_m"], 15.0);
    assert!(segments[0]["degeneracies"]["zero_dynamic_pressure"].as_u64().expect("count") > 0);
}
