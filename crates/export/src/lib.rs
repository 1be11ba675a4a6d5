//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod history {
    use std::io::{self, Write};

    use flight_mission::MissionResults;

    /// Condition paths present in any segment, in first-seen order.
    pub fn columns(results: &MissionResults) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for segment in &results.segments {
            for (path, _) in segment.conditions().scalar_columns() {
                if !columns.contains(&path) {
                    columns.push(path);
                }
            }
        }
        columns
    }

    /// Write one CSV row per control point per segment.
    ///
    /// Columns a segment does not carry (for example battery fields on a
    /// turbofan segment) are left empty.
    pub fn write_history(writer: &mut dyn Write, results: &MissionResults) -> io::Result<()> {
        let columns = columns(results);
        writeln!(writer, "segment,status,{}", columns.join(","))?;
        for segment in &results.segments {
            let values = segment.conditions().scalar_columns();
            let lookup: Vec<Option<&Vec<f64>>> = columns
                .iter()
                .map(|column| values.iter().find(|(path, _)| path == column).map(|(_, v)| v))
                .collect();
            for i in 0..segment.conditions().points() {
                write!(writer, "{},{}", quote(&segment.name), segment.status.as_str())?;
                for column in &lookup {
                    match column.and_then(|v| v.get(i)) {
                        Some(value) => write!(writer, ",{value}")?,
                        None => write!(writer, ",")?,
                    }
                }
                writeln!(writer)?;
            }
        }
        writer.flush()
    }

    fn quote(field: &str) -> String {
        if field.contains([',', '"', '\n']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}

pub mod summary {
    use std::fs::{self, File};
    use std::io;
    use std::path::Path;

    use flight_core::units::j_to_kwh;
    use flight_mission::{MissionResults, SegmentResult};
    use flight_state::{BatteryAge, Diagnostics};
    use serde::Serialize;
    use serde_json::to_writer_pretty;

    /// Outcome of one segment in the JSON summary.
    #[derive(Debug, Clone, Serialize)]
    pub struct SegmentSummary {
        pub name: String,
        pub kind: &'static str,
        pub status: &'static str,
        pub iterations: usize,
        pub residual_norm: f64,
        pub start_time_s: f64,
        pub end_time_s: f64,
        pub start_altitude_m: f64,
        pub end_altitude_m: f64,
        pub final_mass_kg: f64,
        pub battery_energy_kwh: Option<f64>,
        pub state_of_charge: Option<f64>,
        pub fuel_burned_kg: Option<f64>,
        pub battery_age: Option<BatteryAge>,
        pub degeneracies: Diagnostics,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct MissionSummary {
        pub mission: String,
        pub all_solved: bool,
        pub segments: Vec<SegmentSummary>,
    }

    pub fn summarize(results: &MissionResults) -> MissionSummary {
        MissionSummary {
            mission: results.name.clone(),
            all_solved: results.all_solved(),
            segments: results.segments.iter().map(summarize_segment).collect(),
        }
    }

    fn summarize_segment(segment: &SegmentResult) -> SegmentSummary {
        let conditions = segment.conditions();
        let first = |values: &[f64]| values.first().copied().unwrap_or_default();
        let last = |values: &[f64]| values.last().copied().unwrap_or_default();
        let battery = conditions.energy.battery.as_ref();
        SegmentSummary {
            name: segment.name.clone(),
            kind: segment.kind,
            status: segment.status.as_str(),
            iterations: segment.iterations,
            residual_norm: segment.residual_norm,
            start_time_s: first(&conditions.frames.inertial.time),
            end_time_s: last(&conditions.frames.inertial.time),
            start_altitude_m: first(&conditions.freestream.altitude),
            end_altitude_m: last(&conditions.freestream.altitude),
            final_mass_kg: last(&conditions.weights.total_mass),
            battery_energy_kwh: battery.map(|b| j_to_kwh(last(&b.energy))),
            state_of_charge: battery.map(|b| last(&b.state_of_charge)),
            fuel_burned_kg: conditions.energy.fuel.as_ref().map(|f| last(&f.fuel_burned)),
            battery_age: segment.battery_age,
            degeneracies: conditions.diagnostics,
        }
    }

    /// Write the pretty-printed summary, creating parent directories as needed.
    pub fn write_summary(path: &Path, results: &MissionResults) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        to_writer_pretty(File::create(path)?, &summarize(results))?;
        Ok(())
    }
}
