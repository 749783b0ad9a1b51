use crate::color::{Color, ColorAssigner, ColorMap, BLACK};
use crate::data::model::{NormalizedSounding, SoundingCollection};
use crate::data::schema::{
    CONE_RESISTANCE, FRICTION_RATIO, PORE_PRESSURE_U1, PORE_PRESSURE_U2, PORE_PRESSURE_U3,
};

// ---------------------------------------------------------------------------
// Fixed layout constants
// ---------------------------------------------------------------------------

/// Below this many soundings track 1 carries a per-sounding legend.
pub const DEFAULT_LEGEND_THRESHOLD: usize = 5;

pub const CONE_RESISTANCE_RANGE: (f64, f64) = (0.0, 30.0);
pub const FRICTION_RATIO_RANGE: (f64, f64) = (0.0, 10.0);
pub const PORE_PRESSURE_RANGE: (f64, f64) = (-0.1, 1.0);

/// Space added above ground level and below the deepest sample.
pub const VERTICAL_PADDING: f64 = 1.0;

/// Value the source uses for a missing measurement.
pub const NO_DATA: f64 = -999_999.0;

/// File stem for figures comparing several soundings.
pub const COMBINED_PLOT_NAME: &str = "combined_cpt_plot";

// ---------------------------------------------------------------------------
// Figure model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

/// One of the three pore pressure channels drawn in track 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoreChannel {
    U1,
    U2,
    U3,
}

impl PoreChannel {
    pub const ALL: [PoreChannel; 3] = [PoreChannel::U1, PoreChannel::U2, PoreChannel::U3];

    pub fn column(self) -> usize {
        match self {
            PoreChannel::U1 => PORE_PRESSURE_U1,
            PoreChannel::U2 => PORE_PRESSURE_U2,
            PoreChannel::U3 => PORE_PRESSURE_U3,
        }
    }

    /// Line style identifying the channel; colour identifies the sounding.
    pub fn line_style(self) -> LineStyle {
        match self {
            PoreChannel::U1 => LineStyle::Dotted,
            PoreChannel::U2 => LineStyle::Solid,
            PoreChannel::U3 => LineStyle::DashDot,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PoreChannel::U1 => "U1",
            PoreChannel::U2 => "U2",
            PoreChannel::U3 => "U3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    ConeResistance,
    FrictionRatio,
    PorePressure,
}

/// A curve of one sounding (and, in track 3, one channel).
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub sounding: String,
    pub channel: Option<PoreChannel>,
    pub color: Color,
    pub style: LineStyle,
    /// `(value, reference depth)` pairs in penetration order.
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Ground level: `referenceDepth == surfaceOffset`.
    Ground,
    /// Deepest sample reached.
    MaxExplored,
}

/// A horizontal line across a whole track.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub sounding: String,
    pub kind: ReferenceKind,
    pub depth: f64,
    pub color: Color,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub kind: TrackKind,
    pub x_label: String,
    pub x_range: (f64, f64),
    /// Draw the horizontal axis right to left.
    pub x_inverted: bool,
    pub major_grid: bool,
    pub minor_grid: bool,
    pub curves: Vec<Curve>,
    pub reference_lines: Vec<ReferenceLine>,
    pub legend: Option<Vec<LegendEntry>>,
}

/// Three tracks sharing one vertical reference depth axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub y_label: String,
    /// Shared vertical range `(bottom, top)`.
    pub y_range: (f64, f64),
    pub tracks: Vec<Track>,
    /// Sounding colours, in collection order.
    pub colors: ColorMap,
}

impl Figure {
    #[cfg(test)]
    pub(crate) fn track(&self, kind: TrackKind) -> Option<&Track> {
        self.tracks.iter().find(|t| t.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Builds the three-track comparison figure.
pub struct Renderer<'a> {
    assigner: &'a dyn ColorAssigner,
    legend_threshold: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(assigner: &'a dyn ColorAssigner) -> Self {
        Self {
            assigner,
            legend_threshold: DEFAULT_LEGEND_THRESHOLD,
        }
    }

    pub fn with_legend_threshold(mut self, threshold: usize) -> Self {
        self.legend_threshold = threshold;
        self
    }

    /// Compose the figure for a non-empty collection.
    ///
    /// Colours are assigned once, in collection order, before any track is
    /// built; every track then looks its colours up in the same map.
    pub fn render(&self, collection: &SoundingCollection) -> Figure {
        let ids = collection.ids();
        let colors = self.assigner.assign(&ids);

        let mut cone = Track::new(
            TrackKind::ConeResistance,
            "cone resistance [MPa]",
            CONE_RESISTANCE_RANGE,
            false,
        );
        let mut friction = Track::new(
            TrackKind::FrictionRatio,
            "friction ratio [%]",
            FRICTION_RATIO_RANGE,
            true,
        );
        let mut pore = Track::new(
            TrackKind::PorePressure,
            "pore pressure [MPa]",
            PORE_PRESSURE_RANGE,
            false,
        );

        for (id, sounding) in collection.iter() {
            let color = colors.color_for(id);

            cone.push_curve(id, None, color, LineStyle::Solid, sounding.series(CONE_RESISTANCE));
            friction.push_curve(id, None, color, LineStyle::Solid, sounding.series(FRICTION_RATIO));
            for channel in PoreChannel::ALL {
                pore.push_curve(
                    id,
                    Some(channel),
                    color,
                    channel.line_style(),
                    sounding.series(channel.column()),
                );
            }

            for track in [&mut cone, &mut friction, &mut pore] {
                track.push_reference_lines(id, sounding, color);
            }
        }

        if collection.len() < self.legend_threshold {
            cone.legend = Some(
                colors
                    .legend_entries()
                    .into_iter()
                    .map(|(label, color)| LegendEntry {
                        label,
                        color,
                        style: LineStyle::Solid,
                    })
                    .collect(),
            );
        }
        pore.legend = Some(channel_legend());

        Figure {
            title: figure_title(&ids),
            y_label: "depth [m NAP]".to_string(),
            y_range: vertical_range(collection),
            tracks: vec![cone, friction, pore],
            colors,
        }
    }
}

impl Track {
    fn new(kind: TrackKind, x_label: &str, x_range: (f64, f64), x_inverted: bool) -> Self {
        Self {
            kind,
            x_label: x_label.to_string(),
            x_range,
            x_inverted,
            major_grid: true,
            minor_grid: true,
            curves: Vec::new(),
            reference_lines: Vec::new(),
            legend: None,
        }
    }

    fn push_curve(
        &mut self,
        id: &str,
        channel: Option<PoreChannel>,
        color: Color,
        style: LineStyle,
        points: Vec<(f64, f64)>,
    ) {
        self.curves.push(Curve {
            sounding: id.to_string(),
            channel,
            color,
            style,
            points,
        });
    }

    fn push_reference_lines(&mut self, id: &str, sounding: &NormalizedSounding, color: Color) {
        self.reference_lines.push(ReferenceLine {
            sounding: id.to_string(),
            kind: ReferenceKind::Ground,
            depth: sounding.surface_offset(),
            color,
            style: LineStyle::Dashed,
        });
        self.reference_lines.push(ReferenceLine {
            sounding: id.to_string(),
            kind: ReferenceKind::MaxExplored,
            depth: sounding.max_explored_reference_depth(),
            color,
            style: LineStyle::Dotted,
        });
    }
}

/// Line style → channel legend of track 3; independent of the soundings.
pub fn channel_legend() -> Vec<LegendEntry> {
    PoreChannel::ALL
        .iter()
        .map(|ch| LegendEntry {
            label: ch.label().to_string(),
            color: BLACK,
            style: ch.line_style(),
        })
        .collect()
}

/// The identifier for a single sounding, otherwise all identifiers joined.
pub fn figure_title(ids: &[&str]) -> String {
    ids.join(" / ")
}

/// File stem of the rendered image for the given identifiers.
pub fn file_stem(ids: &[&str]) -> String {
    match ids {
        [single] => single.to_string(),
        _ => COMBINED_PLOT_NAME.to_string(),
    }
}

/// Shared vertical range: from the deepest explored sample of any sounding
/// to the highest ground level, padded on both ends.
pub fn vertical_range(collection: &SoundingCollection) -> (f64, f64) {
    let mut bottom = f64::INFINITY;
    let mut top = f64::NEG_INFINITY;
    for (_, s) in collection.iter() {
        top = top.max(s.surface_offset());
        bottom = bottom.min(s.max_explored_reference_depth());
        bottom = bottom.min(s.surface_offset());
    }
    if !bottom.is_finite() || !top.is_finite() {
        return (-VERTICAL_PADDING, VERTICAL_PADDING);
    }
    (bottom - VERTICAL_PADDING, top + VERTICAL_PADDING)
}

/// Whether a sample can be drawn: finite and not the no-data marker.
pub fn is_drawable(value: f64) -> bool {
    value.is_finite() && value != NO_DATA
}
