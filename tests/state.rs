use flight_mission_calculator::core::constants::G0;
use flight_mission_calculator::state::{
    Conditions, Layout, ResidualKind, StateError, UnknownKind,
};

fn layout(points: usize) -> Layout {
    Layout {
        points,
        rotor: true,
        battery: true,
        ..Layout::default()
    }
}

#[test]
fn new_container_is_zeroed_and_shaped() {
    let conditions = Conditions::new(&layout(4));
    assert_eq!(conditions.points(), 4);
    assert!(conditions.check_shape().is_ok());
    assert!(conditions.energy.fuel.is_none());
    assert!(conditions.noise.is_none());
    assert!(conditions.propulsion.rotor.is_some());
    assert!(
        conditions
            .scalar_columns()
            .iter()
            .all(|(_, values)| values.iter().all(|v| *v == 0.0))
    );
    assert_eq!(conditions.diagnostics.total(), 0);
}

#[test]
fn columns_split_vectors_and_skip_absent_records() {
    let conditions = Conditions::new(&Layout {
        points: 2,
        fuel: true,
        ..Layout::default()
    });
    let names: Vec<String> = conditions.scalar_columns().into_iter().map(|(n, _)| n).collect();
    assert!(names.contains(&"frames.inertial.velocity_vector_x".to_string()));
    assert!(names.contains(&"frames.inertial.velocity_vector_z".to_string()));
    assert!(names.contains(&"energy.fuel.fuel_burned".to_string()));
    assert!(!names.iter().any(|n| n.starts_with("energy.battery")));
    assert!(!names.iter().any(|n| n.starts_with("propulsion.rotor")));
    assert!(!names.contains(&"energy.fuel.vehicle_additional_fuel_rate".to_string()));
}

#[test]
fn unknowns_round_trip_through_their_fields() {
    let mut conditions = Conditions::new(&layout(3));
    conditions
        .write_unknown(UnknownKind::BodyAngle, &[0.01, 0.02, 0.03])
        .expect("body angle");
    conditions
        .write_unknown(UnknownKind::Acceleration, &[1.0, 2.0, 3.0])
        .expect("acceleration");
    conditions
        .write_unknown(UnknownKind::RotorPowerCoefficient, &[0.04; 3])
        .expect("power coefficient");

    assert_eq!(conditions.frames.body.inclination_angle, vec![0.01, 0.02, 0.03]);
    assert_eq!(conditions.frames.inertial.acceleration_vector[1], [2.0, 0.0, 0.0]);
    assert_eq!(
        conditions.read_unknown(UnknownKind::Acceleration),
        Some(vec![1.0, 2.0, 3.0])
    );
    assert_eq!(
        conditions.read_unknown(UnknownKind::RotorPowerCoefficient),
        Some(vec![0.04; 3])
    );
}

#[test]
fn unknown_writes_reject_wrong_length_and_missing_records() {
    let mut conditions = Conditions::new(&layout(3));
    assert_eq!(
        conditions.write_unknown(UnknownKind::Throttle, &[0.5, 0.5]),
        Err(StateError::ShapeMismatch {
            path: "throttle".to_string(),
            expected: 3,
            found: 2,
        })
    );

    let mut jet = Conditions::new(&Layout {
        points: 3,
        fuel: true,
        ..Layout::default()
    });
    assert_eq!(
        jet.write_unknown(UnknownKind::RotorPowerCoefficient, &[0.1; 3]),
        Err(StateError::MissingRecord("propulsion.rotor"))
    );
    assert_eq!(jet.read_unknown(UnknownKind::RotorPowerCoefficient), None);
    assert!(jet.residual(ResidualKind::MotorTorque).is_err());
}

#[test]
fn force_residuals_are_normalized_by_weight() {
    let mut conditions = Conditions::new(&layout(2));
    conditions.weights.total_mass = vec![1_000.0, 1_000.0];
    conditions.frames.inertial.total_force_vector = vec![[G0 * 1_000.0, 0.0, 0.0], [0.0, 0.0, -500.0]];
    conditions.frames.inertial.acceleration_vector = vec![[0.0, 0.0, 0.0], [0.0, 0.0, -0.5]];

    let fx = conditions.residual(ResidualKind::ForceX).expect("force x");
    let fz = conditions.residual(ResidualKind::ForceZ).expect("force z");
    assert!((fx[0] - 1.0).abs() < 1e-12);
    assert_eq!(fx[1], 0.0);
    assert_eq!(fz[0], 0.0);
    assert!(fz[1].abs() < 1e-12);
}

#[test]
fn shape_check_finds_resized_fields() {
    let mut conditions = Conditions::new(&layout(3));
    conditions.freestream.density.push(1.0);
    match conditions.check_shape() {
        Err(StateError::ShapeMismatch { path, expected, found }) => {
            assert_eq!(path, "freestream.density");
            assert_eq!(expected, 3);
            assert_eq!(found, 4);
        }
        other => panic!("expected shape mismatch, got {other:?}"),
    }
}

#[test]
fn final_state_reads_the_last_point() {
    let mut conditions = Conditions::new(&layout(2));
    conditions.frames.inertial.time = vec![0.0, 12.0];
    conditions.freestream.altitude = vec![100.0, 250.0];
    conditions.weights.total_mass = vec![900.0, 899.0];
    if let Some(battery) = conditions.energy.battery.as_mut() {
        battery.energy = vec![5.0, 4.0];
    }
    let last = conditions.final_state().expect("final state");
    assert_eq!(last.time, 12.0);
    assert_eq!(last.altitude, 250.0);
    assert_eq!(last.mass, 899.0);
    assert_eq!(last.battery_energy, Some(4.0));
    assert_eq!(last.fuel_burned, None);

    assert!(Conditions::new(&layout(0)).final_state().is_none());
}
