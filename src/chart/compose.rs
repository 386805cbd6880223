use std::collections::BTreeMap;

use eframe::egui::Color32;

use super::scale::{concentration_ticks, format_concentration, line_start};
use super::spec::{
    Anchor, ChartSpec, Geometry, Label, Layer, LayerKind, Path, Segment, Subtitle, XAxis,
};
use crate::color::ColorMap;
use crate::data::filter::{FilteredTables, split_curves};
use crate::data::model::{CurvePoint, Level};
use crate::state::Selection;

pub const X_AXIS_LABEL: &str = "concentration (mg/L)";
pub const LINE_FADE_FACTOR: f32 = 0.2;
const TICK_LABEL_ROTATION: f32 = 45.0;
const HC_LABEL_SIZE: f32 = 11.0;
const GUIDE_COLOR: Color32 = Color32::BLACK;
const LABEL_COLOR: Color32 = Color32::BLACK;

// ---------------------------------------------------------------------------
// Chart composition
// ---------------------------------------------------------------------------

/// Build the chart for one render pass from the filtered views.
pub fn compose(view: &FilteredTables<'_>, selection: &Selection) -> ChartSpec {
    let level = selection.level;

    let mut layers = Vec::new();
    let mut push = |kind: LayerKind, geometry: Geometry| {
        if !geometry.is_empty() {
            layers.push(Layer { kind, geometry });
        }
    };

    // HC guides: dotted "L" from the left edge to the curve and down to the axis.
    let horizontal = view
        .hazards
        .iter()
        .map(|h| Segment {
            from: [line_start(), h.cutoff],
            to: [h.hc, h.cutoff],
        })
        .collect();
    push(
        LayerKind::HcHorizontalGuides,
        Geometry::Segments {
            segments: horizontal,
            color: GUIDE_COLOR,
        },
    );

    let vertical = view
        .hazards
        .iter()
        .map(|h| Segment {
            from: [h.hc, 0.0],
            to: [h.hc, h.cutoff],
        })
        .collect();
    push(
        LayerKind::HcVerticalGuides,
        Geometry::Segments {
            segments: vertical,
            color: GUIDE_COLOR,
        },
    );

    let hc_labels = view
        .hazards
        .iter()
        .map(|h| Label {
            position: [h.hc, h.cutoff],
            text: format_concentration(h.hc),
            anchor: Anchor::Left,
            size: HC_LABEL_SIZE,
            color: LABEL_COLOR,
        })
        .collect();
    push(
        LayerKind::HcLabels,
        Geometry::Labels {
            labels: hc_labels,
            boxed: true,
        },
    );

    let (focal, background) = split_curves(&view.curves, level);
    push(
        LayerKind::BackgroundCurves,
        Geometry::Paths {
            paths: background_paths(&background),
        },
    );
    push(
        LayerKind::FocalCurve,
        Geometry::Paths {
            paths: vec![Path {
                points: sorted_points(&focal),
                color: Color32::BLACK,
            }],
        },
    );

    if let Some(names) = selection.names {
        let genus_colors = names
            .color_by_genus
            .then(|| ColorMap::new(view.measurements.iter().filter_map(|m| m.genus.as_deref())));

        let labels = view
            .measurements
            .iter()
            .map(|m| Label {
                position: [m.msc, m.paf],
                text: m.name.clone(),
                anchor: Anchor::Right,
                size: f32::from(names.text_size),
                color: genus_colors
                    .as_ref()
                    .map_or(LABEL_COLOR, |map| map.color_for(m.genus.as_deref())),
            })
            .collect();
        push(
            LayerKind::NameLabels,
            Geometry::Labels {
                labels,
                boxed: false,
            },
        );
    }

    ChartSpec {
        title: format!(
            "{} (CASRN: {})",
            selection.antibiotic,
            view.casrn.unwrap_or("unknown")
        ),
        subtitle: Subtitle {
            prefix: "estimated by".to_string(),
            emphasis: level.to_string(),
        },
        x_axis: XAxis {
            label: X_AXIS_LABEL.to_string(),
            ticks: concentration_ticks(),
            tick_label_rotation: TICK_LABEL_ROTATION,
            tick_label_anchor: Anchor::Right,
        },
        y_axis_label: format!("PAF {level}"),
        show_color_legend: false,
        layers,
    }
}

/// Colour of the curves of the unselected level.
pub fn faded_curve_color() -> Color32 {
    Color32::BLACK.gamma_multiply(LINE_FADE_FACTOR)
}

/// One faded path per unselected level.
fn background_paths(curves: &[&CurvePoint]) -> Vec<Path> {
    let mut by_level: BTreeMap<Level, Vec<&CurvePoint>> = BTreeMap::new();
    for &c in curves {
        by_level.entry(c.level).or_default().push(c);
    }
    by_level
        .values()
        .map(|points| Path {
            points: sorted_points(points),
            color: faded_curve_color(),
        })
        .collect()
}

/// Lines connect points in order of concentration.
fn sorted_points(curves: &[&CurvePoint]) -> Vec<[f64; 2]> {
    let mut points: Vec<[f64; 2]> = curves.iter().map(|c| [c.msc, c.paf]).collect();
    points.sort_by(|a, b| a[0].total_cmp(&b[0]));
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::filter_tables;
    use crate::data::model::Tables;
    use crate::data::model::tests::sample_tables;

    fn chart_for(tables: &Tables, selection: &Selection) -> ChartSpec {
        compose(&filter_tables(tables, selection), selection)
    }

    fn kinds(chart: &ChartSpec) -> Vec<LayerKind> {
        chart.layers.iter().map(|l| l.kind).collect()
    }

    #[test]
    fn test_default_species_scenario() {
        let tables = sample_tables();
        let selection = Selection::initial(&tables).unwrap();
        let chart = chart_for(&tables, &selection);

        assert_eq!(chart.title, "AMX (CASRN: 26787-78-0)");
        assert_eq!(chart.subtitle.prefix, "estimated by");
        assert_eq!(chart.subtitle.emphasis, "species");
        assert_eq!(chart.y_axis_label, "PAF species");
        assert_eq!(chart.x_axis.label, "concentration (mg/L)");
        assert_eq!(chart.x_axis.ticks.len(), 17);
        assert_eq!(chart.x_axis.tick_label_rotation, 45.0);
        assert_eq!(chart.x_axis.tick_label_anchor, Anchor::Right);
        assert!(!chart.show_color_legend);
        assert_eq!(
            kinds(&chart),
            vec![
                LayerKind::BackgroundCurves,
                LayerKind::FocalCurve,
                LayerKind::NameLabels
            ]
        );

        let Some(Layer {
            geometry: Geometry::Labels { labels, boxed },
            ..
        }) = chart.layer(LayerKind::NameLabels)
        else {
            panic!("missing name labels");
        };
        assert!(!*boxed);
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].text, "E. coli");
        assert_eq!(labels[0].position, [0.25, 0.2]);
        assert_eq!(labels[0].anchor, Anchor::Right);
        assert_eq!(labels[0].size, 5.0);
        assert!(labels.iter().all(|l| l.color == Color32::BLACK));
    }

    #[test]
    fn test_title_uses_casrn_of_every_antibiotic() {
        let tables = sample_tables();
        let initial = Selection::initial(&tables).unwrap();
        for antibiotic in tables.antibiotics() {
            let selection = initial.clone().with_antibiotic(antibiotic);
            let chart = chart_for(&tables, &selection);
            let casrn = tables.casrn(antibiotic).unwrap();
            assert_eq!(chart.title, format!("{antibiotic} (CASRN: {casrn})"));
        }
    }

    #[test]
    fn test_curves_split_focal_and_faded() {
        let tables = sample_tables();
        let selection = Selection::initial(&tables).unwrap();
        let chart = chart_for(&tables, &selection);

        let Some(Layer {
            geometry: Geometry::Paths { paths },
            ..
        }) = chart.layer(LayerKind::FocalCurve)
        else {
            panic!("missing focal curve");
        };
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].color, Color32::BLACK);
        assert_eq!(paths[0].points, vec![[0.1, 0.1], [0.5, 0.3], [2.0, 0.7]]);

        let Some(Layer {
            geometry: Geometry::Paths { paths },
            ..
        }) = chart.layer(LayerKind::BackgroundCurves)
        else {
            panic!("missing background curves");
        };
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].color, faded_curve_color());
        assert_eq!(paths[0].points, vec![[0.1, 0.05], [1.0, 0.5]]);
    }

    #[test]
    fn test_hc_layers_follow_visible_cutoffs() {
        let tables = sample_tables();
        let selection = Selection::initial(&tables).unwrap().with_cutoff(0.05, true);
        let chart = chart_for(&tables, &selection);

        assert_eq!(
            &kinds(&chart)[..3],
            &[
                LayerKind::HcHorizontalGuides,
                LayerKind::HcVerticalGuides,
                LayerKind::HcLabels
            ]
        );

        let Some(Layer {
            geometry: Geometry::Segments { segments, .. },
            ..
        }) = chart.layer(LayerKind::HcHorizontalGuides)
        else {
            panic!("missing horizontal guides");
        };
        assert_eq!(
            segments,
            &vec![Segment {
                from: [line_start(), 0.05],
                to: [0.0625, 0.05]
            }]
        );

        let Some(Layer {
            geometry: Geometry::Segments { segments, .. },
            ..
        }) = chart.layer(LayerKind::HcVerticalGuides)
        else {
            panic!("missing vertical guides");
        };
        assert_eq!(
            segments,
            &vec![Segment {
                from: [0.0625, 0.0],
                to: [0.0625, 0.05]
            }]
        );

        let Some(Layer {
            geometry: Geometry::Labels { labels, boxed },
            ..
        }) = chart.layer(LayerKind::HcLabels)
        else {
            panic!("missing HC labels");
        };
        assert!(*boxed);
        assert_eq!(labels[0].text, "0.062");
        assert_eq!(labels[0].anchor, Anchor::Left);
    }

    #[test]
    fn test_no_cutoffs_no_hc_layers() {
        let tables = sample_tables();
        let selection = Selection::initial(&tables).unwrap();
        let view = filter_tables(&tables, &selection);
        assert!(view.hazards.is_empty());

        let chart = compose(&view, &selection);
        assert!(!chart.has_layer(LayerKind::HcHorizontalGuides));
        assert!(!chart.has_layer(LayerKind::HcVerticalGuides));
        assert!(!chart.has_layer(LayerKind::HcLabels));
    }

    #[test]
    fn test_hidden_names_ignore_label_settings() {
        let tables = sample_tables();
        let base = Selection::initial(&tables).unwrap();

        let hidden = base.clone().with_show_names(false);
        let tweaked = base
            .with_color_by_genus(true)
            .with_text_size(14)
            .with_show_names(false)
            .with_color_by_genus(true)
            .with_text_size(9);

        let a = chart_for(&tables, &hidden);
        let b = chart_for(&tables, &tweaked);
        assert_eq!(a, b);
        assert!(!a.has_layer(LayerKind::NameLabels));
    }

    #[test]
    fn test_color_by_genus() {
        let tables = sample_tables();
        let selection = Selection::initial(&tables)
            .unwrap()
            .with_color_by_genus(true)
            .with_text_size(10);
        let chart = chart_for(&tables, &selection);

        let Some(Layer {
            geometry: Geometry::Labels { labels, .. },
            ..
        }) = chart.layer(LayerKind::NameLabels)
        else {
            panic!("missing name labels");
        };
        assert_eq!(labels[0].size, 10.0);
        // E. coli and E. albertii share a genus, K. pneumoniae does not
        assert_eq!(labels[0].color, labels[2].color);
        assert_ne!(labels[0].color, labels[1].color);
        assert!(!chart.show_color_legend);
    }

    #[test]
    fn test_empty_level_still_has_title_and_axes() {
        // CIP only has species rows
        let tables = sample_tables();
        let selection = Selection::initial(&tables)
            .unwrap()
            .with_antibiotic("CIP")
            .with_level(Level::Genus);
        let chart = chart_for(&tables, &selection);

        assert_eq!(chart.title, "CIP (CASRN: 85721-33-1)");
        assert_eq!(chart.y_axis_label, "PAF genus");
        assert!(!chart.has_layer(LayerKind::NameLabels));
        assert!(!chart.has_layer(LayerKind::FocalCurve));
        assert!(chart.has_layer(LayerKind::BackgroundCurves));
    }
}
