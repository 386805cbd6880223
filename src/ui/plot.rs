use eframe::egui::epaint::TextShape;
use eframe::egui::{self, Align2, Color32, FontId, RichText, Sense, Ui, Vec2};
use egui_plot::{
    GridMark, Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, PlotTransform, PlotUi, Text,
};

use crate::chart::spec::{Anchor, ChartSpec, Geometry, Layer, XAxis};

/// Vertical room under the plot frame for rotated tick labels and the axis title.
const X_AXIS_BAND: f32 = 72.0;
const TICK_LENGTH: f32 = 4.0;
const TICK_FONT_SIZE: f32 = 12.0;
const AXIS_TITLE_SIZE: f32 = 14.0;
/// Distance between neighbouring ticks in log2 units.
const TICK_STEP: f64 = 2.0;

// ---------------------------------------------------------------------------
// SSD chart (central panel)
// ---------------------------------------------------------------------------

/// Render a composed chart: title, subtitle, plot, and the x axis underneath.
pub fn chart_view(ui: &mut Ui, chart: &ChartSpec) {
    ui.heading(chart.title.as_str());
    ui.horizontal(|ui: &mut Ui| {
        ui.spacing_mut().item_spacing.x = 4.0;
        ui.label(chart.subtitle.prefix.as_str());
        ui.label(RichText::new(&chart.subtitle.emphasis).strong());
    });
    ui.separator();

    let marks: Vec<f64> = chart
        .x_axis
        .ticks
        .iter()
        .filter_map(|t| to_plot_x(t.value))
        .collect();

    let height = (ui.available_height() - X_AXIS_BAND).max(120.0);

    let mut plot = Plot::new("ssd_plot")
        .height(height)
        // The x axis is painted by `paint_x_axis` so its labels can be rotated.
        .show_axes([false, true])
        .y_axis_label(chart.y_axis_label.clone())
        .x_grid_spacer(move |_input| {
            marks
                .iter()
                .map(|&value| GridMark {
                    value,
                    step_size: TICK_STEP,
                })
                .collect()
        })
        .include_y(0.0)
        .include_y(1.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if chart.show_color_legend {
        plot = plot.legend(Legend::default());
    }

    let response = plot.show(ui, |plot_ui| {
        for layer in &chart.layers {
            draw_layer(plot_ui, layer);
        }
    });

    paint_x_axis(ui, &response.transform, &chart.x_axis);
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

fn draw_layer(plot_ui: &mut PlotUi, layer: &Layer) {
    match &layer.geometry {
        Geometry::Segments { segments, color } => {
            for segment in segments {
                let points: PlotPoints = [segment.from, segment.to]
                    .into_iter()
                    .filter_map(to_plot)
                    .collect();
                if points.points().len() < 2 {
                    continue;
                }
                plot_ui.line(
                    Line::new(points)
                        .color(*color)
                        .style(LineStyle::dotted_dense())
                        .width(1.0),
                );
            }
        }
        Geometry::Paths { paths } => {
            for path in paths {
                let points: PlotPoints = path
                    .points
                    .iter()
                    .filter_map(|&p| to_plot(p))
                    .collect();
                plot_ui.line(Line::new(points).color(path.color).width(1.5));
            }
        }
        Geometry::Labels { labels, boxed } => {
            for label in labels {
                let Some([x, y]) = to_plot(label.position) else {
                    continue;
                };
                let mut text = RichText::new(&label.text).size(label.size).color(label.color);
                if *boxed {
                    text = text.background_color(Color32::WHITE);
                }
                plot_ui.text(
                    Text::new(PlotPoint::new(x, y), text)
                        .anchor(text_align(label.anchor))
                        .color(label.color),
                );
            }
        }
    }
}

fn text_align(anchor: Anchor) -> Align2 {
    match anchor {
        Anchor::Left => Align2::LEFT_CENTER,
        Anchor::Right => Align2::RIGHT_CENTER,
    }
}

/// Data space → plot space. Points that cannot sit on a log axis are dropped.
fn to_plot([x, y]: [f64; 2]) -> Option<[f64; 2]> {
    to_plot_x(x).map(|x| [x, y])
}

fn to_plot_x(x: f64) -> Option<f64> {
    (x > 0.0).then(|| x.log2())
}

// ---------------------------------------------------------------------------
// X axis: ticks, rotated labels, title
// ---------------------------------------------------------------------------

fn paint_x_axis(ui: &mut Ui, transform: &PlotTransform, axis: &XAxis) {
    let (band, _) = ui.allocate_exact_size(
        Vec2::new(ui.available_width(), X_AXIS_BAND),
        Sense::hover(),
    );
    let painter = ui.painter();
    let color = ui.visuals().text_color();
    let bounds = transform.bounds();
    let (x_min, x_max) = (bounds.min()[0], bounds.max()[0]);

    let angle = -axis.tick_label_rotation.to_radians();
    let along = Vec2::new(angle.cos(), angle.sin());
    let across = Vec2::new(-angle.sin(), angle.cos());

    for tick in &axis.ticks {
        let Some(x) = to_plot_x(tick.value) else {
            continue;
        };
        if x < x_min || x > x_max {
            continue;
        }
        let base = transform.position_from_point(&PlotPoint::new(x, bounds.min()[1]));
        painter.line_segment(
            [base, base + Vec2::new(0.0, TICK_LENGTH)],
            egui::Stroke::new(1.0, color),
        );
        if tick.label.is_empty() {
            continue;
        }

        let galley = painter.layout_no_wrap(
            tick.label.clone(),
            FontId::proportional(TICK_FONT_SIZE),
            color,
        );
        let size = galley.size();
        // Galleys rotate about their top-left corner; shift it so the chosen
        // end of the text lands just under the tick.
        let anchor = base + Vec2::new(0.0, TICK_LENGTH + 2.0);
        let end = match axis.tick_label_anchor {
            Anchor::Right => along * size.x,
            Anchor::Left => Vec2::ZERO,
        };
        let top_left = anchor - end - across * (size.y / 2.0);
        painter.add(TextShape::new(top_left, galley, color).with_angle(angle));
    }

    painter.text(
        band.center_bottom(),
        Align2::CENTER_BOTTOM,
        &axis.label,
        FontId::proportional(AXIS_TITLE_SIZE),
        color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log2_mapping() {
        assert_eq!(to_plot_x(32.0), Some(5.0));
        assert_eq!(to_plot_x(2f64.powi(-27)), Some(-27.0));
        assert_eq!(to_plot_x(0.0), None);
        assert_eq!(to_plot_x(f64::NAN), None);
    }

    #[test]
    fn test_non_positive_points_dropped() {
        assert_eq!(to_plot([0.5, 0.2]), Some([-1.0, 0.2]));
        assert_eq!(to_plot([0.0, 0.2]), None);
    }
}
