use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::chart::scale::format_concentration;
use crate::data::filter::FilteredTables;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Data view (bottom panel) – the rows feeding the current chart
// ---------------------------------------------------------------------------

pub fn data_view(ui: &mut Ui, view: &FilteredTables<'_>) {
    ui.columns(3, |cols: &mut [Ui]| {
        let measurements: Vec<[String; 5]> = view
            .measurements
            .iter()
            .map(|m| {
                [
                    m.name.clone(),
                    m.genus.clone().unwrap_or_default(),
                    m.level.to_string(),
                    format_concentration(m.msc),
                    format!("{:.3}", m.paf),
                ]
            })
            .collect();
        table(
            &mut cols[0],
            "measurements",
            &["name", "Genus", "level", "MSC", "PAF"],
            &measurements,
        );

        let curves: Vec<[String; 3]> = view
            .curves
            .iter()
            .map(|c| [c.level.to_string(), format!("{:.4}", c.msc), format!("{:.3}", c.paf)])
            .collect();
        table(&mut cols[1], "curves", &["level", "MSC", "PAF"], &curves);

        let hazards: Vec<[String; 3]> = view
            .hazards
            .iter()
            .map(|h| [h.level.to_string(), h.cutoff.to_string(), format_concentration(h.hc)])
            .collect();
        table(&mut cols[2], "hazards", &["level", "cutoff", "HC"], &hazards);
    });
}

fn table<const N: usize>(ui: &mut Ui, id: &str, headers: &[&str; N], rows: &[[String; N]]) {
    ui.strong(format!("{id} ({})", rows.len()));
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(Column::auto().at_least(48.0), N)
            .header(ROW_HEIGHT, |mut header| {
                for name in headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(*name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let cells = &rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell.as_str());
                        });
                    }
                });
            });
    });
    ui.add_space(8.0);
}
