#![allow(dead_code)]

use std::sync::Arc;

use flight_mission_calculator::analyses::{
    Analyses, BatteryPropeller, DragPolar, EmissionIndices, EmpiricalNoise, TurbofanNetwork,
    Vehicle,
};
use flight_mission_calculator::atmosphere::StandardAtmosphere;
use flight_mission_calculator::core::units::kwh_to_j;
use flight_mission_calculator::propulsion::{
    AgingModel, Battery, ElectricalConfiguration, Esc, Motor, Rotor, Turbofan,
};

pub fn jet_polar() -> DragPolar {
    DragPolar {
        reference_area_m2: 122.0,
        mean_chord_m: 4.2,
        cl0: 0.2,
        cl_alpha: 5.5,
        cl_max: 1.5,
        cd0: 0.02,
        induced_drag_factor: 0.045,
        cm0: 0.05,
        cm_alpha: -1.1,
        cy_beta: -0.6,
    }
}

pub fn turbofans() -> TurbofanNetwork {
    TurbofanNetwork {
        engine: Turbofan {
            sea_level_thrust_n: 120_000.0,
            thrust_specific_fuel_consumption: 1.6e-5,
            lapse_exponent: 0.8,
        },
        engine_count: 2,
        thrust_angle: 0.0,
        additional_fuel_rate: None,
    }
}

pub fn rotors(configuration: ElectricalConfiguration, aging: Option<AgingModel>) -> BatteryPropeller {
    BatteryPropeller {
        configuration,
        propulsor_count: 8,
        thrust_angle: 0.0,
        rotor: Rotor {
            radius_m: 1.2,
            thrust_coefficients: [0.10, -0.02, -0.08],
            power_coefficients: [0.045, 0.0, -0.038],
        },
        motor: Motor {
            speed_constant: 0.4,
            resistance_ohm: 0.05,
            no_load_current_a: 2.0,
            gear_ratio: 1.0,
            gearbox_efficiency: 0.98,
        },
        esc: Esc { efficiency: 0.95 },
        battery: Battery {
            max_energy_j: kwh_to_j(150.0),
            voltage_max_v: 800.0,
            voltage_min_v: 600.0,
            internal_resistance_ohm: 0.02,
            aging,
        },
        avionics_power_w: 1_500.0,
    }
}

pub fn aging() -> AgingModel {
    AgingModel {
        capacity_fade_per_day: 1.0e-4,
        capacity_fade_per_sqrt_ah: 2.0e-4,
        resistance_growth_per_day: 2.0e-4,
        resistance_growth_per_ah: 1.0e-5,
    }
}

/// Turbofan airliner without noise or emissions models.
pub fn jet() -> Arc<Analyses> {
    Arc::new(Analyses {
        vehicle: Vehicle {
            name: "Test Jet".to_string(),
            mass_kg: 60_000.0,
        },
        atmosphere: StandardAtmosphere::default(),
        aerodynamics: Arc::new(jet_polar()),
        energy: Arc::new(turbofans()),
        noise: None,
        emissions: None,
    })
}

/// Turbofan airliner with every optional model attached.
pub fn jet_with_models() -> Arc<Analyses> {
    let mut analyses = (*jet()).clone();
    analyses.noise = Some(Arc::new(EmpiricalNoise {
        reference_level_db: 150.0,
        reference_power_w: 1.0e7,
        observer_altitude_m: 0.0,
        minimum_distance_m: 10.0,
    }));
    analyses.emissions = Some(Arc::new(EmissionIndices::default()));
    Arc::new(analyses)
}

/// Eight-rotor battery aircraft.
pub fn evtol(aging: Option<AgingModel>) -> Arc<Analyses> {
    Arc::new(Analyses {
        vehicle: Vehicle {
            name: "Test eVTOL".to_string(),
            mass_kg: 2_500.0,
        },
        atmosphere: StandardAtmosphere::default(),
        aerodynamics: Arc::new(DragPolar {
            reference_area_m2: 15.0,
            mean_chord_m: 1.3,
            cl0: 0.3,
            cl_alpha: 5.0,
            cl_max: 1.4,
            cd0: 0.03,
            induced_drag_factor: 0.05,
            cm0: 0.0,
            cm_alpha: -0.8,
            cy_beta: 0.0,
        }),
        energy: Arc::new(rotors(ElectricalConfiguration::Parallel, aging)),
        noise: None,
        emissions: None,
    })
}
