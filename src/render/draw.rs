use anyhow::Result;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::element::{DashedPathElement, DottedPathElement, Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::{BackendCoord, DrawingErrorKind};

use super::figure::{is_drawable, Figure, LegendEntry, LineStyle, Track};
use crate::color::Color as SeriesColor;

// ---------------------------------------------------------------------------
// Painting a Figure with plotters
// ---------------------------------------------------------------------------

/// Sizes below are in pixels at 100 dpi and get multiplied by `scale`.
const CURVE_WIDTH: f64 = 1.5;
const REFERENCE_WIDTH: f64 = 1.0;
const LEGEND_GLYPH: f64 = 24.0;

type TrackChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn rgb(c: SeriesColor) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

fn scaled(v: f64, scale: f64) -> u32 {
    (v * scale).round().max(1.0) as u32
}

/// Draw all tracks of `figure` side by side onto `root`.
///
/// `scale` is the ratio of the output resolution to 100 dpi; line widths,
/// fonts and margins grow with it.
pub fn draw_figure<DB>(root: &DrawingArea<DB, Shift>, figure: &Figure, scale: f64) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let px = |v: f64| scaled(v, scale);
    let font = |pt: f64| ("sans-serif", pt * scale).into_font();

    root.fill(&WHITE)?;
    let body = root.titled(&figure.title, font(18.0))?;
    let panels = body.split_evenly((1, figure.tracks.len().max(1)));

    for (i, (track, panel)) in figure.tracks.iter().zip(panels.iter()).enumerate() {
        let first = i == 0;
        let (x0, x1) = axis_range(track);
        let (y0, y1) = figure.y_range;

        let mut chart = ChartBuilder::on(panel)
            .margin(px(8.0))
            .x_label_area_size(px(45.0))
            .y_label_area_size(px(if first { 60.0 } else { 30.0 }))
            .build_cartesian_2d(x0..x1, y0..y1)?;

        let inverted = track.x_inverted;
        let x_fmt = move |v: &f64| format_tick(if inverted { -*v } else { *v });
        let y_fmt = move |v: &f64| {
            if first {
                format_tick(*v)
            } else {
                String::new()
            }
        };
        {
            let mut mesh = chart.configure_mesh();
            mesh.x_desc(track.x_label.as_str())
                .y_desc(if first { figure.y_label.as_str() } else { "" })
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .x_labels(7)
                .y_labels(12)
                .label_style(font(11.0))
                .axis_desc_style(font(13.0))
                .bold_line_style(BLACK.mix(0.25))
                .light_line_style(BLACK.mix(0.08));
            if !track.minor_grid {
                mesh.x_max_light_lines(0).y_max_light_lines(0);
            }
            if !track.major_grid {
                mesh.bold_line_style(TRANSPARENT);
            }
            mesh.draw()?;
        }

        for line in &track.reference_lines {
            let shape = rgb(line.color).stroke_width(px(REFERENCE_WIDTH));
            let points = vec![(x0, line.depth), (x1, line.depth)];
            draw_line(&mut chart, points, line.style, shape, scale)?;
        }

        for curve in &track.curves {
            let shape = rgb(curve.color).stroke_width(px(CURVE_WIDTH));
            for run in drawable_runs(&curve.points) {
                let run: Vec<(f64, f64)> = run
                    .into_iter()
                    .map(|(v, z)| (if inverted { -v } else { v }, z))
                    .collect();
                draw_line(&mut chart, run, curve.style, shape, scale)?;
            }
        }

        if let Some(entries) = &track.legend {
            draw_legend(&mut chart, entries, scale)?;
        }
    }

    Ok(())
}

/// Draw one polyline in chart coordinates as a series in `style`.
///
/// Points outside the axis ranges are pinned to the plotting area edge.
fn draw_line<DB>(
    chart: &mut TrackChart<'_, DB>,
    points: Vec<(f64, f64)>,
    style: LineStyle,
    shape: ShapeStyle,
    scale: f64,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let pattern = dash_pattern(style, shape.stroke_width, scale);
    match style {
        LineStyle::Solid => chart.draw_series(LineSeries::new(points, shape))?,
        LineStyle::Dashed => {
            chart.draw_series(DashedLineSeries::new(points, pattern.dash, pattern.gap, shape))?
        }
        LineStyle::Dotted => {
            let (radius, fill) = (pattern.dot_radius, shape.filled());
            chart.draw_series(DottedLineSeries::new(points, 0, pattern.gap, move |c| {
                Circle::new(c, radius, fill)
            }))?
        }
        LineStyle::DashDot => {
            chart.draw_series(std::iter::once(StyledPath::new(points, style, shape, pattern)))?
        }
    };
    Ok(())
}

/// Boxed legend in the upper right corner of the track. Entries are
/// registered as empty series so the glyph style is independent of the
/// curves drawn.
fn draw_legend<'a, DB>(chart: &mut TrackChart<'a, DB>, entries: &[LegendEntry], scale: f64) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
{
    if entries.is_empty() {
        return Ok(());
    }
    let glyph = scaled(LEGEND_GLYPH, scale) as i32;

    for entry in entries {
        let style = entry.style;
        let shape = rgb(entry.color).stroke_width(scaled(CURVE_WIDTH, scale));
        let pattern = dash_pattern(style, shape.stroke_width, scale);
        chart
            .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
            .label(entry.label.as_str())
            .legend(move |(x, y)| StyledPath::new(vec![(x, y), (x + glyph, y)], style, shape, pattern));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .legend_area_size(scaled(LEGEND_GLYPH + 8.0, scale))
        .margin(scaled(6.0, scale))
        .label_font(("sans-serif", 11.0 * scale).into_font())
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK.mix(0.3))
        .draw()?;
    Ok(())
}

/// Axis range in drawing coordinates; inverted tracks are drawn mirrored
/// and labelled with the original values.
fn axis_range(track: &Track) -> (f64, f64) {
    let (lo, hi) = track.x_range;
    if track.x_inverted {
        (-hi, -lo)
    } else {
        (lo, hi)
    }
}

fn format_tick(v: f64) -> String {
    // + 0.0 turns -0.0 into 0.0
    let v = (v * 100.0).round() / 100.0 + 0.0;
    format!("{v}")
}

/// Split maximal runs of drawable samples; a missing sample breaks the line.
pub fn drawable_runs(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    points
        .split(|&(v, z)| !is_drawable(v) || !is_drawable(z))
        .filter(|run| !run.is_empty())
        .map(<[(f64, f64)]>::to_vec)
        .collect()
}

// ---------------------------------------------------------------------------
// Line styles
// ---------------------------------------------------------------------------

/// Pixel sizes of a line style at a given scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashPattern {
    pub dash: u32,
    pub gap: u32,
    pub dot_radius: u32,
}

/// Dash, gap and dot sizes for `style`, scaled from 100 dpi. Dots are as
/// wide as the stroke.
pub fn dash_pattern(style: LineStyle, stroke_width: u32, scale: f64) -> DashPattern {
    let (dash, gap) = match style {
        LineStyle::Solid => (0.0, 0.0),
        LineStyle::Dashed => (7.0, 4.0),
        LineStyle::Dotted => (0.0, 4.0),
        LineStyle::DashDot => (7.0, 6.0),
    };
    let size = |v: f64| if v > 0.0 { scaled(v, scale) } else { 0 };
    DashPattern {
        dash: size(dash),
        gap: size(gap),
        dot_radius: (stroke_width / 2).max(1),
    }
}

/// A polyline in any [`LineStyle`], built from plotters' path elements.
///
/// Dash-dot is a dashed path with a dot centred in every gap. Legend
/// glyphs use this element for all styles.
pub struct StyledPath<Coord> {
    points: Vec<Coord>,
    style: LineStyle,
    shape: ShapeStyle,
    pattern: DashPattern,
}

impl<Coord> StyledPath<Coord> {
    pub fn new(points: Vec<Coord>, style: LineStyle, shape: ShapeStyle, pattern: DashPattern) -> Self {
        Self {
            points,
            style,
            shape,
            pattern,
        }
    }
}

impl<'a, Coord> PointCollection<'a, Coord> for &'a StyledPath<Coord> {
    type Point = &'a Coord;
    type IntoIter = &'a [Coord];
    fn point_iter(self) -> &'a [Coord] {
        &self.points
    }
}

impl<Coord, DB: DrawingBackend> Drawable<DB> for StyledPath<Coord> {
    fn draw<I: Iterator<Item = BackendCoord>>(
        &self,
        pos: I,
        backend: &mut DB,
        parent_dim: (u32, u32),
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        let pos: Vec<BackendCoord> = pos.collect();
        let DashPattern {
            dash,
            gap,
            dot_radius,
        } = self.pattern;
        let fill = self.shape.filled();
        let dot = move |c: BackendCoord| Circle::new(c, dot_radius, fill);

        match self.style {
            LineStyle::Solid => {
                let path = PathElement::new(pos.clone(), self.shape);
                Drawable::<DB>::draw(&path, pos.into_iter(), backend, parent_dim)
            }
            LineStyle::Dashed => {
                let path = DashedPathElement::new(pos.clone(), dash, gap, self.shape);
                Drawable::<DB>::draw(&path, pos.into_iter(), backend, parent_dim)
            }
            LineStyle::Dotted => {
                let path = DottedPathElement::new(pos.clone(), 0, gap, dot);
                Drawable::<DB>::draw(&path, pos.into_iter(), backend, parent_dim)
            }
            LineStyle::DashDot => {
                let dashes = DashedPathElement::new(pos.clone(), dash, gap, self.shape);
                Drawable::<DB>::draw(&dashes, pos.iter().copied(), backend, parent_dim)?;
                let dots = DottedPathElement::new(pos.clone(), dash + gap / 2, dash + gap, dot);
                Drawable::<DB>::draw(&dots, pos.into_iter(), backend, parent_dim)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::figure::NO_DATA;

    /// Draw `path` onto a white 120x20 bitmap and return the pixels of row 10.
    fn raster_row(path: StyledPath<BackendCoord>) -> Vec<[u8; 3]> {
        let (w, h) = (120u32, 20u32);
        let mut buf = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            root.draw(&path).unwrap();
            root.present().unwrap();
        }
        let row = 10 * w as usize * 3;
        buf[row..row + w as usize * 3]
            .chunks(3)
            .map(|px| [px[0], px[1], px[2]])
            .collect()
    }

    fn is_white(px: [u8; 3]) -> bool {
        px == [255, 255, 255]
    }

    #[test]
    fn test_pattern_scales_with_dpi() {
        assert_eq!(
            dash_pattern(LineStyle::Dashed, 1, 1.0),
            DashPattern { dash: 7, gap: 4, dot_radius: 1 }
        );
        assert_eq!(
            dash_pattern(LineStyle::Dashed, 5, 3.0),
            DashPattern { dash: 21, gap: 12, dot_radius: 2 }
        );
        let dotted = dash_pattern(LineStyle::Dotted, 1, 1.0);
        assert_eq!((dotted.dash, dotted.gap), (0, 4));
        assert_eq!(dash_pattern(LineStyle::Solid, 1, 1.0).gap, 0);
    }

    #[test]
    fn test_dash_dot_draws_dashes_and_a_dot_in_each_gap() {
        let shape = BLACK.stroke_width(1);
        let pattern = DashPattern { dash: 10, gap: 10, dot_radius: 1 };
        let row = raster_row(StyledPath::new(
            vec![(0, 10), (119, 10)],
            LineStyle::DashDot,
            shape,
            pattern,
        ));

        // dash 0..10, dot at 15, dash 20..30, dot at 35
        assert!(!is_white(row[5]));
        assert!(!is_white(row[15]));
        assert!(!is_white(row[25]));
        assert!(is_white(row[12]));
        assert!(is_white(row[18]));
        assert!(!is_white(row[35]));
    }

    #[test]
    fn test_solid_glyph_is_continuous() {
        let shape = BLACK.stroke_width(1);
        let pattern = dash_pattern(LineStyle::Solid, 1, 1.0);
        let row = raster_row(StyledPath::new(vec![(0, 10), (60, 10)], LineStyle::Solid, shape, pattern));
        assert!(row[..=60].iter().all(|px| !is_white(*px)));
        assert!(is_white(row[80]));
    }

    #[test]
    fn test_missing_samples_break_runs() {
        let pts = [(1.0, 0.0), (2.0, -1.0), (NO_DATA, -2.0), (f64::NAN, -3.0), (3.0, -4.0)];
        let runs = drawable_runs(&pts);
        assert_eq!(runs, vec![vec![(1.0, 0.0), (2.0, -1.0)], vec![(3.0, -4.0)]]);
    }

    #[test]
    fn test_inverted_axis_range() {
        let assigner = crate::color::CycleAssigner::default();
        let figure = crate::render::figure::Renderer::new(&assigner)
            .render(&crate::data::model::SoundingCollection::new());
        assert_eq!(axis_range(&figure.tracks[0]), (0.0, 30.0));
        assert_eq!(axis_range(&figure.tracks[1]), (-10.0, 0.0));
    }

    #[test]
    fn test_tick_format() {
        assert_eq!(format_tick(-0.0), "0");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(10.0), "10");
    }
}
