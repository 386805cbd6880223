use eframe::egui::Color32;

// ---------------------------------------------------------------------------
// Declarative chart description
// ---------------------------------------------------------------------------

/// Everything the renderer needs to draw one chart. All coordinates are in
/// data space (concentrations in mg/L, fractions in [0, 1]).
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub subtitle: Subtitle,
    pub x_axis: XAxis,
    pub y_axis_label: String,
    /// Whether a legend for categorical colours is drawn.
    pub show_color_legend: bool,
    /// Layers in draw order; later layers draw over earlier ones.
    pub layers: Vec<Layer>,
}

#[cfg(test)]
impl ChartSpec {
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|l| l.kind == kind)
    }

    pub fn has_layer(&self, kind: LayerKind) -> bool {
        self.layer(kind).is_some()
    }
}

/// `"estimated by **species**"`, split so the renderer can embolden the level.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtitle {
    pub prefix: String,
    pub emphasis: String,
}

/// Base-2 logarithmic concentration axis.
#[derive(Debug, Clone, PartialEq)]
pub struct XAxis {
    pub label: String,
    pub ticks: Vec<Tick>,
    /// Counter-clockwise rotation of the tick labels, in degrees.
    pub tick_label_rotation: f32,
    /// Which end of a rotated tick label sits on the tick.
    pub tick_label_anchor: Anchor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    HcHorizontalGuides,
    HcVerticalGuides,
    HcLabels,
    BackgroundCurves,
    FocalCurve,
    NameLabels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Dotted straight guides.
    Segments {
        segments: Vec<Segment>,
        color: Color32,
    },
    /// Polylines, each drawn through its points in order.
    Paths { paths: Vec<Path> },
    Labels { labels: Vec<Label>, boxed: bool },
}

impl Geometry {
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Segments { segments, .. } => segments.is_empty(),
            Geometry::Paths { paths } => paths.iter().all(|p| p.points.is_empty()),
            Geometry::Labels { labels, .. } => labels.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: [f64; 2],
    pub to: [f64; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub points: Vec<[f64; 2]>,
    pub color: Color32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: [f64; 2],
    pub text: String,
    pub anchor: Anchor,
    pub size: f32,
    pub color: Color32,
}
