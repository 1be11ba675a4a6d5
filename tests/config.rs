use std::fs;

use flight_mission_calculator::config::{
    ConfigError, ElectricalConfigurationConfig, NetworkConfig, SegmentType, load_mission,
    load_vehicle_configs, parse_mission_yaml,
};

#[test]
fn vehicle_catalog_loads_every_toml_file() {
    let vehicles = load_vehicle_configs("configs/vehicles").expect("vehicle catalog");
    assert_eq!(vehicles.len(), 2);

    let jet = vehicles
        .iter()
        .find(|v| v.name == "Narrowbody Jet")
        .expect("jet present");
    match &jet.network {
        NetworkConfig::Turbofan {
            engine_count,
            lapse_exponent,
            additional_fuel_rate_kg_s,
            ..
        } => {
            assert_eq!(*engine_count, 2);
            assert_eq!(*lapse_exponent, 0.8);
            assert_eq!(*additional_fuel_rate_kg_s, Some(0.02));
        }
        other => panic!("jet must be a turbofan, got {other:?}"),
    }

    let evtol = vehicles
        .iter()
        .find(|v| v.name.contains("eVTOL"))
        .expect("eVTOL present");
    match &evtol.network {
        NetworkConfig::BatteryPropeller {
            electrical_configuration,
            propulsor_count,
            battery,
            ..
        } => {
            assert_eq!(*electrical_configuration, ElectricalConfigurationConfig::Parallel);
            assert_eq!(*propulsor_count, 8);
            assert!(battery.aging.is_some());
        }
        other => panic!("eVTOL must be battery powered, got {other:?}"),
    }
}

#[test]
fn mission_yaml_applies_defaults() {
    let mission = load_mission("configs/missions/evtol_hover.yaml").expect("mission yaml");
    assert_eq!(mission.vehicle, "Lift Cruise eVTOL");
    assert_eq!(mission.solver.control_points, 8);
    assert_eq!(mission.solver.max_iterations, 50);
    assert_eq!(mission.solver.tolerance, 1.0e-6);
    assert!(!mission.solver.halt_on_failure);
    assert_eq!(mission.atmosphere.temperature_deviation_k, 0.0);
    assert!(mission.noise.is_none());

    let emissions = mission.emissions.expect("emissions section");
    assert_eq!(emissions.co2_index, 3.16);
    assert_eq!(emissions.grid_co2_kg_per_kwh, 0.4);

    assert_eq!(mission.segments.len(), 2);
    assert_eq!(mission.segments[0].kind, SegmentType::Hover);
    assert_eq!(mission.segments[1].altitude_m, None);
    assert!(mission.segments[1].increment_battery_cycle_day);
}

#[test]
fn mission_toml_is_selected_by_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mission.toml");
    fs::write(
        &path,
        r#"
name = "Pattern"
vehicle = "Narrowbody Jet"

[solver]
max_iterations = 25

[[segments]]
name = "check"
type = "single_point"
altitude_m = 1000.0
air_speed_m_s = 90.0
throttle = 0.8
"#,
    )
    .expect("write mission");

    let mission = load_mission(&path).expect("mission toml");
    assert_eq!(mission.solver.max_iterations, 25);
    assert_eq!(mission.solver.control_points, 16);
    assert_eq!(mission.segments[0].kind, SegmentType::SinglePoint);
    assert_eq!(mission.segments[0].throttle, Some(0.8));
}

#[test]
fn unknown_segment_fields_are_rejected() {
    let yaml = r#"
name: typo
vehicle: Narrowbody Jet
segments:
  - name: climb
    type: climb
    altitude_end_m: 1000.0
    air_speed_m_s: 100.0
    climb_rte_m_s: 5.0
"#;
    match parse_mission_yaml(yaml) {
        Err(ConfigError::Parse(err)) => assert!(err.to_string().contains("climb_rte_m_s")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn unrecognized_network_types_parse_as_unsupported() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("balloon.toml"),
        r#"
name = "Balloon"
mass_kg = 500.0

[aerodynamics]
reference_area_m2 = 10.0
cl_alpha_per_rad = 0.0
cl_max = 0.1
cd0 = 0.5
induced_drag_factor = 0.0

[network]
type = "hot_air"
"#,
    )
    .expect("write vehicle");
    fs::write(dir.path().join("notes.txt"), "ignored").expect("write notes");

    let vehicles = load_vehicle_configs(dir.path()).expect("catalog");
    assert_eq!(vehicles.len(), 1);
    assert!(matches!(vehicles[0].network, NetworkConfig::Unsupported));
    assert_eq!(vehicles[0].aerodynamics.mean_chord_m, 1.0);
}

#[test]
fn missing_files_report_io_errors() {
    assert!(matches!(
        load_mission("configs/missions/does_not_exist.yaml"),
        Err(ConfigError::Io(_))
    ));
}
