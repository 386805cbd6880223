use std::sync::Arc;

use eframe::egui;

use crate::chart::compose::compose;
use crate::data::filter::filter_tables;
use crate::state::AppState;
use crate::ui::{export, panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SsdExplorerApp {
    pub state: AppState,
}

impl SsdExplorerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Write a pending screenshot once the viewport delivers it.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        let image = ctx.input(|i| {
            i.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(Arc::clone(image)),
                _ => None,
            })
        });
        let Some(image) = image else {
            return;
        };
        let Some(path) = self.state.pending_screenshot.take() else {
            return;
        };
        match export::save_png(&path, &image) {
            Ok(()) => self.state.status_message = None,
            Err(e) => {
                log::error!("Failed to save chart image: {e:#}");
                self.state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

impl eframe::App for SsdExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_screenshot(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selection ----
        egui::SidePanel::left("selection_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // Everything below is rebuilt from the selection on every frame.
        let tables = Arc::clone(&self.state.tables);
        let view = filter_tables(&tables, &self.state.selection);
        let chart = compose(&view, &self.state.selection);

        // ---- Bottom panel: filtered rows ----
        if self.state.show_data {
            egui::TopBottomPanel::bottom("data_panel")
                .resizable(true)
                .default_height(220.0)
                .show(ctx, |ui| {
                    table::data_view(ui, &view);
                });
        }

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart_view(ui, &chart);
        });
    }
}
