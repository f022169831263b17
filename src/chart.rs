// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Rendering collaborator: turns finished series into PNG charts, or skips drawing entirely
// role: rendering/charts
// inputs: LineChart / BarChart / ReleaseChart descriptions and a target path
// outputs: PNG files (PlottersRenderer) or nothing (NullRenderer)
// side_effects: Writes image files; PlottersRenderer needs a system sans-serif font
// invariants:
// - Renderers never reorder or alter the data they are given
// - Multi-line titles and captions are drawn one line per row
// errors: Backend failures map to HealthError::Render
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{HealthError, HealthResult};

const WIDTH: u32 = 2400;
const HEIGHT: u32 = 800;
const TITLE_LINE: u32 = 44;
const CAPTION_LINE: u32 = 30;
const FONT: &str = "sans-serif";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineEmphasis {
  /// The reference volume line.
  Total,
  /// The subset being compared against the total.
  Matched,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
  pub label: String,
  pub values: Vec<u64>,
  pub emphasis: LineEmphasis,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineChart {
  pub title: String,
  pub caption: String,
  pub x_labels: Vec<String>,
  pub y_label: String,
  pub lines: Vec<Line>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarChart {
  pub title: String,
  pub caption: String,
  /// May contain `\n` for wrapped names.
  pub labels: Vec<String>,
  pub values: Vec<u64>,
  /// Drawn above each bar.
  pub annotations: Vec<String>,
  pub y_label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReleaseChart {
  pub title: String,
  pub caption: String,
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub releases: Vec<DateTime<Utc>>,
}

/// Draws a finished chart description to `path`; returns the path when something was written.
pub trait ChartRenderer {
  fn line_chart(&self, chart: &LineChart, path: &Path) -> HealthResult<Option<PathBuf>>;
  fn bar_chart(&self, chart: &BarChart, path: &Path) -> HealthResult<Option<PathBuf>>;
  fn release_chart(&self, chart: &ReleaseChart, path: &Path) -> HealthResult<Option<PathBuf>>;
}

/// Used with `--no-charts`.
#[derive(Default)]
pub struct NullRenderer;

impl ChartRenderer for NullRenderer {
  fn line_chart(&self, chart: &LineChart, _path: &Path) -> HealthResult<Option<PathBuf>> {
    tracing::debug!(title = %chart.title, "chart skipped");
    Ok(None)
  }

  fn bar_chart(&self, chart: &BarChart, _path: &Path) -> HealthResult<Option<PathBuf>> {
    tracing::debug!(title = %chart.title, "chart skipped");
    Ok(None)
  }

  fn release_chart(&self, chart: &ReleaseChart, _path: &Path) -> HealthResult<Option<PathBuf>> {
    tracing::debug!(title = %chart.title, "chart skipped");
    Ok(None)
  }
}

#[derive(Default)]
pub struct PlottersRenderer;

fn render_err<E: std::fmt::Display>(e: E) -> HealthError {
  HealthError::Render(e.to_string())
}

fn block_height(text: &str, line: u32) -> u32 {
  text.lines().count().max(1) as u32 * line + 20
}

fn draw_block<DB: DrawingBackend>(area: &DrawingArea<DB, plotters::coord::Shift>, text: &str, size: u32) -> HealthResult<()> {
  let (w, _) = area.dim_in_pixel();
  let style = (FONT, size).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Top));

  for (i, line) in text.lines().enumerate() {
    area
      .draw(&Text::new(line.to_string(), ((w / 2) as i32, 10 + (i as u32 * (size + 8)) as i32), style.clone()))
      .map_err(render_err)?;
  }
  Ok(())
}

/// Fill the canvas, draw title and caption, and hand back the middle plotting area.
fn frame<'a>(
  root: &DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>,
  title: &str,
  caption: &str,
) -> HealthResult<DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>> {
  root.fill(&WHITE).map_err(render_err)?;

  let header_h = block_height(title, TITLE_LINE);
  let footer_h = block_height(caption, CAPTION_LINE);
  let (header, rest) = root.split_vertically(header_h);
  let (body, footer) = rest.split_vertically(HEIGHT.saturating_sub(header_h + footer_h));

  draw_block(&header, title, 36)?;
  draw_block(&footer, caption, 24)?;

  Ok(body)
}

fn ensure_parent(path: &Path) -> HealthResult<()> {
  if let Some(dir) = path.parent() {
    std::fs::create_dir_all(dir)?;
  }
  Ok(())
}

impl ChartRenderer for PlottersRenderer {
  fn line_chart(&self, chart: &LineChart, path: &Path) -> HealthResult<Option<PathBuf>> {
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    let body = frame(&root, &chart.title, &chart.caption)?;

    let n = chart.x_labels.len().max(1);
    let y_max = chart.lines.iter().flat_map(|l| l.values.iter().copied()).max().unwrap_or(0).max(1) as f64 * 1.1;

    let mut ctx = ChartBuilder::on(&body)
      .margin(20)
      .x_label_area_size(60)
      .y_label_area_size(90)
      .build_cartesian_2d(0f64..(n - 1).max(1) as f64, 0f64..y_max)
      .map_err(render_err)?;

    let labels = chart.x_labels.clone();
    let x_fmt = move |x: &f64| {
      let idx = x.round() as usize;
      if (x - x.round()).abs() < 1e-6 {
        labels.get(idx).cloned().unwrap_or_default()
      } else {
        String::new()
      }
    };

    ctx
      .configure_mesh()
      .x_labels(n)
      .x_label_formatter(&x_fmt)
      .y_label_formatter(&|y| format!("{:.0}", y))
      .y_desc(chart.y_label.as_str())
      .label_style((FONT, 20).into_font())
      .draw()
      .map_err(render_err)?;

    for line in &chart.lines {
      let color = match line.emphasis {
        LineEmphasis::Total => BLACK,
        LineEmphasis::Matched => RGBColor(0, 128, 0),
      };
      let points: Vec<(f64, f64)> = line.values.iter().enumerate().map(|(i, v)| (i as f64, *v as f64)).collect();

      ctx
        .draw_series(LineSeries::new(points.clone(), color.stroke_width(4)))
        .map_err(render_err)?
        .label(line.label.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(4)));

      if line.emphasis == LineEmphasis::Matched {
        ctx
          .draw_series(points.into_iter().map(|p| Circle::new(p, 6, color.filled())))
          .map_err(render_err)?;
      }
    }

    ctx
      .configure_series_labels()
      .background_style(WHITE.mix(0.8))
      .border_style(BLACK)
      .label_font((FONT, 22).into_font())
      .draw()
      .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(Some(path.to_path_buf()))
  }

  fn bar_chart(&self, chart: &BarChart, path: &Path) -> HealthResult<Option<PathBuf>> {
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    let body = frame(&root, &chart.title, &chart.caption)?;

    let n = chart.values.len().max(1);
    let y_max = chart.values.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.2;
    let name_lines = chart.labels.iter().map(|l| l.lines().count()).max().unwrap_or(1) as u32;

    let mut ctx = ChartBuilder::on(&body)
      .margin(20)
      .x_label_area_size(name_lines * 26 + 20)
      .y_label_area_size(90)
      .build_cartesian_2d(0f64..n as f64, 0f64..y_max)
      .map_err(render_err)?;

    ctx
      .configure_mesh()
      .disable_x_mesh()
      .x_labels(0)
      .y_label_formatter(&|y| format!("{:.0}", y))
      .y_desc(chart.y_label.as_str())
      .label_style((FONT, 20).into_font())
      .draw()
      .map_err(render_err)?;

    let bar = RGBColor(76, 114, 176);
    ctx
      .draw_series(
        chart
          .values
          .iter()
          .enumerate()
          .map(|(i, v)| Rectangle::new([(i as f64 + 0.15, 0.0), (i as f64 + 0.85, *v as f64)], bar.filled())),
      )
      .map_err(render_err)?;

    let note = (FONT, 22).into_font().color(&RGBColor(128, 128, 128)).pos(Pos::new(HPos::Center, VPos::Bottom));
    ctx
      .draw_series(
        chart
          .values
          .iter()
          .zip(&chart.annotations)
          .enumerate()
          .map(|(i, (v, a))| Text::new(a.clone(), (i as f64 + 0.5, *v as f64), note.clone())),
      )
      .map_err(render_err)?;

    // axis names are drawn by hand so wrapped names keep their line breaks
    let name_style = (FONT, 22).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Top));
    for (i, label) in chart.labels.iter().enumerate() {
      let (px, py) = ctx.backend_coord(&(i as f64 + 0.5, 0.0));
      for (k, line) in label.lines().enumerate() {
        root
          .draw(&Text::new(line.to_string(), (px, py + 8 + k as i32 * 26), name_style.clone()))
          .map_err(render_err)?;
      }
    }

    root.present().map_err(render_err)?;
    Ok(Some(path.to_path_buf()))
  }

  fn release_chart(&self, chart: &ReleaseChart, path: &Path) -> HealthResult<Option<PathBuf>> {
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    let body = frame(&root, &chart.title, &chart.caption)?;

    let span = (chart.end - chart.start).num_days().max(1) as f64;
    let start = chart.start;

    let mut ctx = ChartBuilder::on(&body)
      .margin(20)
      .x_label_area_size(60)
      .y_label_area_size(40)
      .build_cartesian_2d(0f64..span, 0f64..2f64)
      .map_err(render_err)?;

    let x_fmt = move |x: &f64| (start + Duration::days(*x as i64)).format("%Y-%m").to_string();

    ctx
      .configure_mesh()
      .x_labels(12)
      .x_label_formatter(&x_fmt)
      .y_labels(0)
      .x_desc("Year Month")
      .label_style((FONT, 20).into_font())
      .draw()
      .map_err(render_err)?;

    let marker = RGBColor(76, 114, 176);
    ctx
      .draw_series(
        chart
          .releases
          .iter()
          .map(|r| (r.date_naive() - start).num_days() as f64)
          .filter(|x| (0.0..=span).contains(x))
          .map(|x| Cross::new((x, 1.0), 14, marker.stroke_width(4))),
      )
      .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(Some(path.to_path_buf()))
  }
}
