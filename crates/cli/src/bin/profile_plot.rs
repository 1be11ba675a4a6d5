use std::fs;
use std::path::PathBuf;

use clap::Parser;
use csv::ReaderBuilder;
use plotters::prelude::*;

const TIME_COLUMN: &str = "frames.inertial.time";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Plot one condition from a mission history CSV against time"
)]
struct Cli {
    #[arg(long)]
    input: String,
    #[arg(long, default_value = "artifacts/profile.png")]
    output: PathBuf,
    /// Condition path, e.g. freestream.altitude or propulsion.throttle
    #[arg(long, default_value = "freestream.altitude")]
    metric: String,
    #[arg(long, default_value_t = 1200)]
    width: u32,
    #[arg(long, default_value_t = 700)]
    height: u32,
}

/// Samples of one segment, in file order.
#[derive(Debug, Default)]
struct Series {
    segment: String,
    points: Vec<(f64, f64)>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (series, metric_column) = read_series(&cli.input, &cli.metric)?;

    let all: Vec<(f64, f64)> = series.iter().flat_map(|s| s.points.iter().copied()).collect();
    if all.is_empty() {
        return Err(anyhow::anyhow!(
            "No finite samples of '{metric_column}' in the provided CSV"
        ));
    }
    let (t_min, t_max) = bounds(all.iter().map(|p| p.0));
    let (v_min, v_max) = bounds(all.iter().map(|p| p.1));

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let output_str = cli
        .output
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Output path contains invalid UTF-8"))?;
    let root = BitMapBackend::new(output_str, (cli.width, cli.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let font_family = select_font_family();
    let caption_font = FontDesc::new(font_family, 24.0, FontStyle::Bold);
    let label_font = FontDesc::new(font_family, 16.0, FontStyle::Normal);

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(format!("{metric_column} vs time"), caption_font)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(t_min..t_max, v_min..v_max)?;

    chart
        .configure_mesh()
        .x_desc("Time [s]")
        .y_desc(metric_column.as_str())
        .label_style(label_font.clone())
        .x_labels(8)
        .y_labels(8)
        .draw()?;

    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
            .label(s.segment.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(
            s.points
                .iter()
                .map(|&p| Circle::new(p, 3, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(label_font)
        .draw()?;

    root.present()?;
    println!("Wrote {} ({} segments)", cli.output.display(), series.len());
    Ok(())
}

fn select_font_family() -> FontFamily<'static> {
    if cfg!(target_os = "macos") {
        FontFamily::Name("Helvetica")
    } else if cfg!(target_os = "windows") {
        FontFamily::Name("Arial")
    } else {
        FontFamily::Name("DejaVu Sans")
    }
}

/// Axis range over finite values, widened when degenerate.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if (hi - lo).abs() < f64::EPSILON {
        let pad = if lo.abs() > 1.0 { lo.abs() * 0.05 } else { 1.0 };
        (lo - pad, hi + pad)
    } else {
        (lo, hi)
    }
}

fn read_series(path: &str, metric_name: &str) -> anyhow::Result<(Vec<Series>, String)> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let segment_idx = headers
        .iter()
        .position(|h| h == "segment")
        .ok_or_else(|| anyhow::anyhow!("CSV missing 'segment' column"))?;
    let time_idx = headers
        .iter()
        .position(|h| h == TIME_COLUMN)
        .ok_or_else(|| anyhow::anyhow!("CSV missing '{TIME_COLUMN}' column"))?;
    let metric_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(metric_name))
        .ok_or_else(|| anyhow::anyhow!("CSV missing metric column '{metric_name}'"))?;
    let metric_column = headers[metric_idx].to_string();

    let mut series: Vec<Series> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let segment = record.get(segment_idx).unwrap_or_default();
        let time: Option<f64> = record.get(time_idx).and_then(|v| v.parse().ok());
        let value: Option<f64> = record.get(metric_idx).and_then(|v| v.parse().ok());
        if series.last().is_none_or(|s| s.segment != segment) {
            series.push(Series {
                segment: segment.to_string(),
                points: Vec::new(),
            });
        }
        if let (Some(t), Some(v), Some(current)) = (time, value, series.last_mut()) {
            if t.is_finite() && v.is_finite() {
                current.points.push((t, v));
            }
        }
    }
    Ok((series, metric_column))
}
