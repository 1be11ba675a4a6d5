use std::path::PathBuf;

use clap::{ArgAction, Parser};
use flight_cli::logging;
use flight_mission_calculator::config::{load_mission, load_vehicle_configs};
use flight_mission_calculator::core::units::j_to_kwh;
use flight_mission_calculator::core::vector;
use flight_mission_calculator::export::history::write_history;
use flight_mission_calculator::export::summary::write_summary;
use flight_mission_calculator::export::writer_for_path;
use flight_mission_calculator::mission::{MissionResults, SegmentResult, build_mission};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Evaluate a flight mission segment by segment"
)]
struct Cli {
    /// Mission file (YAML, or TOML by extension)
    #[arg(long)]
    mission: PathBuf,

    /// Vehicle catalog: a directory of TOML files, one TOML file, or a YAML list
    #[arg(long, default_value = "configs/vehicles")]
    configs: PathBuf,

    /// Fly a different catalog vehicle than the mission file names
    #[arg(long)]
    vehicle: Option<String>,

    /// Write the per-point time history as CSV (`-` for stdout)
    #[arg(long)]
    output_csv: Option<PathBuf>,

    /// Write a JSON summary of segment outcomes
    #[arg(long)]
    output_json: Option<PathBuf>,

    /// Abort on the first segment that does not converge
    #[arg(long, default_value_t = false)]
    halt_on_failure: bool,

    /// Override the solver iteration limit
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Override the solver residual tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let mut file = load_mission(&cli.mission)?;
    if let Some(vehicle) = &cli.vehicle {
        file.vehicle = vehicle.clone();
    }
    if cli.halt_on_failure {
        file.solver.halt_on_failure = true;
    }
    if let Some(max_iterations) = cli.max_iterations {
        file.solver.max_iterations = max_iterations;
    }
    if let Some(tolerance) = cli.tolerance {
        file.solver.tolerance = tolerance;
    }
    let vehicles = load_vehicle_configs(&cli.configs)?;
    let mission = build_mission(&file, &vehicles)?;
    let results = mission.evaluate()?;

    let csv_to_stdout = cli.output_csv.as_deref() == Some(std::path::Path::new("-"));
    if !csv_to_stdout {
        print_profile(&results, &file.vehicle);
    }
    if let Some(path) = &cli.output_csv {
        let mut writer = writer_for_path(path)?;
        write_history(&mut *writer, &results)?;
    }
    if let Some(path) = &cli.output_json {
        write_summary(path, &results)?;
    }
    Ok(())
}

fn print_profile(results: &MissionResults, vehicle: &str) {
    println!("=== Mission Profile ===");
    println!("Mission  : {}", results.name);
    println!("Vehicle  : {vehicle}");
    println!(
        "{:<18} {:<13} {:<12} {:>5} {:>10} {:>9} {:>10} {:>10}  {}",
        "segment", "type", "status", "iter", "t_end[s]", "alt[m]", "V[m/s]", "mass[kg]", "energy"
    );
    for segment in &results.segments {
        let Some(state) = segment.final_state() else {
            continue;
        };
        println!(
            "{:<18} {:<13} {:<12} {:>5} {:>10.1} {:>9.1} {:>10.2} {:>10.1}  {}",
            segment.name,
            segment.kind,
            segment.status.as_str(),
            segment.iterations,
            state.time,
            state.altitude,
            vector::norm(&state.velocity),
            state.mass,
            energy_label(segment)
        );
    }
    let unconverged = results.segments.iter().filter(|s| !s.is_solved()).count();
    if unconverged > 0 {
        println!("Warning  : {unconverged} segment(s) did not converge");
    }
}

fn energy_label(segment: &SegmentResult) -> String {
    let energy = &segment.conditions().energy;
    if let Some(battery) = &energy.battery {
        let stored = battery.energy.last().copied().unwrap_or_default();
        let soc = battery.state_of_charge.last().copied().unwrap_or_default();
        format!("{:.2} kWh ({:.1}% SOC)", j_to_kwh(stored), soc * 100.0)
    } else if let Some(fuel) = &energy.fuel {
        let burned = fuel.fuel_burned.last().copied().unwrap_or_default();
        format!("{burned:.1} kg fuel burned")
    } else {
        String::new()
    }
}
