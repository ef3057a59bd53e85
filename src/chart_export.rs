//! Write the results charts to PNG (plotters bitmap backend) or EPS (hand-written PostScript).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::chart_data::{format_axis_label, ChartKind, ChartSpec};
use crate::query::QueryResults;
use crate::ChartFormat;

const PNG_SIZE: (u32, u32) = (800, 480);

/// Export both result charts into `dir`, creating it if needed.
///
/// Files are named `<term>_per_day.<ext>` and `<term>_per_hour.<ext>`. Fails
/// when the term matched nothing, since there is nothing to draw.
pub fn export_charts(results: &QueryResults, dir: &Path, format: ChartFormat) -> Result<Vec<PathBuf>> {
    if results.is_empty() {
        return Err(eyre!("No matching posts for '{}', nothing to export", results.term));
    }
    fs::create_dir_all(dir)?;

    let stem = file_stem(&results.term);
    let mut written = Vec::with_capacity(2);
    for spec in [ChartSpec::per_day(results), ChartSpec::per_hour(results)] {
        let path = dir.join(format!("{}_{}.{}", stem, spec.slug, format.extension()));
        match format {
            ChartFormat::Png => write_chart_png(&path, &spec)?,
            ChartFormat::Eps => write_chart_eps(&path, &spec)?,
        }
        tracing::info!(path = %path.display(), "exported chart");
        written.push(path);
    }
    Ok(written)
}

/// File-name-safe version of the term.
fn file_stem(term: &str) -> String {
    let stem: String = term
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if stem.is_empty() {
        "all".to_string()
    } else {
        stem
    }
}

fn ps_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Round tick values covering [min, max], at most about `max_ticks` of them.
fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    let span = (max - min).max(1.0);
    let rough = span / max_ticks.max(1) as f64;
    let magnitude = 10.0_f64.powf(rough.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= rough)
        .unwrap_or(10.0 * magnitude)
        .max(1.0);

    let mut ticks = Vec::new();
    let mut v = (min / step).ceil() * step;
    while v <= max + step * 1e-3 && ticks.len() <= max_ticks + 2 {
        ticks.push(v);
        v += step;
    }
    if ticks.is_empty() {
        ticks.push(min);
    }
    ticks
}

/// Write one chart as Encapsulated PostScript.
pub fn write_chart_eps(path: &Path, spec: &ChartSpec) -> Result<()> {
    if spec.is_empty() {
        return Err(eyre!("No data to export"));
    }

    const W: f64 = 480.0;
    const H: f64 = 320.0;
    const LEFT: f64 = 56.0;
    const BOTTOM: f64 = 48.0;
    const PLOT_W: f64 = W - LEFT - 24.0;
    const PLOT_H: f64 = H - BOTTOM - 40.0;
    const CHAR_W: f64 = 5.0;

    let [x_min, x_max] = spec.x_bounds();
    let [y_min, y_max] = spec.y_bounds();
    let to_x = |x: f64| LEFT + (x - x_min) / (x_max - x_min) * PLOT_W;
    let to_y = |y: f64| BOTTOM + (y - y_min) / (y_max - y_min) * PLOT_H;

    let mut f = BufWriter::new(File::create(path)?);
    writeln!(f, "%!PS-Adobe-3.0 EPSF-3.0")?;
    writeln!(f, "%%BoundingBox: 0 0 {} {}", W as i32, H as i32)?;
    writeln!(f, "%%Title: ({})", ps_escape(&spec.title))?;
    writeln!(f, "%%Creator: potato")?;
    writeln!(f, "%%EndComments")?;
    writeln!(f, "gsave")?;

    // Horizontal grid lines at each y tick.
    let y_ticks = nice_ticks(y_min, y_max, 6);
    writeln!(f, "0.9 setgray 0.5 setlinewidth")?;
    for &v in &y_ticks {
        writeln!(f, "{} {} moveto {} 0 rlineto stroke", LEFT, to_y(v), PLOT_W)?;
    }

    writeln!(f, "0 setgray 1 setlinewidth")?;
    writeln!(
        f,
        "{} {} moveto {} 0 rlineto 0 {} rlineto {} 0 rlineto closepath stroke",
        LEFT, BOTTOM, PLOT_W, PLOT_H, -PLOT_W
    )?;

    writeln!(f, "/Helvetica findfont 9 scalefont setfont")?;
    for &v in &y_ticks {
        let label = format_axis_label(v);
        let tx = LEFT - label.len() as f64 * CHAR_W - 6.0;
        writeln!(f, "{} {} moveto ({}) show", tx, to_y(v) - 3.0, ps_escape(&label))?;
    }
    // Category labels sit under their points; thin them out when crowded.
    let every = (spec.labels.len() / 12).max(1);
    for (i, (label, &(x, _))) in spec.labels.iter().zip(&spec.points).enumerate() {
        if i % every != 0 {
            continue;
        }
        let tx = to_x(x) - label.len() as f64 * CHAR_W / 2.0;
        writeln!(f, "{} {} moveto ({}) show", tx, BOTTOM - 14.0, ps_escape(label))?;
    }

    writeln!(f, "/Helvetica findfont 11 scalefont setfont")?;
    writeln!(
        f,
        "{} {} moveto ({}) show",
        LEFT,
        H - 24.0,
        ps_escape(&spec.title)
    )?;
    writeln!(f, "/Helvetica findfont 10 scalefont setfont")?;
    writeln!(
        f,
        "{} {} moveto ({}) show",
        LEFT + PLOT_W / 2.0 - spec.x_label.len() as f64 * CHAR_W / 2.0,
        BOTTOM - 32.0,
        ps_escape(&spec.x_label)
    )?;
    writeln!(
        f,
        "gsave 14 {} translate 90 rotate 0 0 moveto ({}) show grestore",
        BOTTOM + PLOT_H / 2.0 - spec.y_label.len() as f64 * CHAR_W / 2.0,
        ps_escape(&spec.y_label)
    )?;

    writeln!(f, "0.0 0.6 0.85 setrgbcolor")?;
    match spec.kind {
        ChartKind::Bar => {
            let bar_w = (PLOT_W / spec.points.len() as f64) * 0.7;
            for &(x, y) in &spec.points {
                writeln!(
                    f,
                    "{} {} {} {} rectfill",
                    to_x(x) - bar_w / 2.0,
                    to_y(0.0),
                    bar_w,
                    to_y(y) - to_y(0.0)
                )?;
            }
        }
        ChartKind::Line => {
            writeln!(f, "1.5 setlinewidth")?;
            for (i, &(x, y)) in spec.points.iter().enumerate() {
                let op = if i == 0 { "moveto" } else { "lineto" };
                writeln!(f, "{} {} {}", to_x(x), to_y(y), op)?;
            }
            writeln!(f, "stroke")?;
            for &(x, y) in &spec.points {
                writeln!(f, "{} {} 2.5 0 360 arc fill", to_x(x), to_y(y))?;
            }
        }
    }

    writeln!(f, "grestore")?;
    writeln!(f, "%%EOF")?;
    f.flush()?;
    Ok(())
}

/// Write one chart as a PNG bitmap.
pub fn write_chart_png(path: &Path, spec: &ChartSpec) -> Result<()> {
    use plotters::prelude::*;

    if spec.is_empty() {
        return Err(eyre!("No data to export"));
    }

    let root = BitMapBackend::new(path, PNG_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let [x_min, x_max] = spec.x_bounds();
    let [y_min, y_max] = spec.y_bounds();
    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title.as_str(), ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(48)
        .y_label_area_size(56)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    let labels = &spec.labels;
    let points = &spec.points;
    let x_formatter = |x: &f64| match spec.kind {
        ChartKind::Bar => {
            let idx = x.round();
            if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        }
        ChartKind::Line => format!("{:02}", x.round() as i64),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(match spec.kind {
            ChartKind::Bar => points.len().min(12),
            ChartKind::Line => 12,
        })
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&|y: &f64| format_axis_label(*y))
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .draw()?;

    let color = RGBColor(0, 153, 217);
    match spec.kind {
        ChartKind::Bar => {
            chart.draw_series(points.iter().map(|&(x, y)| {
                Rectangle::new([(x - 0.35, 0.0), (x + 0.35, y)], color.filled())
            }))?;
        }
        ChartKind::Line => {
            chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )?;
        }
    }

    root.present()?;
    Ok(())
}
