use std::sync::Arc;

use eframe::egui::{self, Color32, ComboBox, RichText, ScrollArea, Slider, Ui};

use crate::config::DataPaths;
use crate::data::model::{Level, Tables};
use crate::state::{AppState, Selection, TEXT_SIZE_RANGE, cutoff_toggles};

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left control panel and store the resulting selection.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("SSD explorer");
    ui.separator();

    let tables = Arc::clone(&state.tables);
    let current = state.selection.clone();

    let next = ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| controls(ui, &tables, current))
        .inner;

    if next != state.selection {
        log::debug!("Selection changed: {next:?}");
        state.selection = next;
    }
}

/// One widget per control, top to bottom; each feeds the next selection.
fn controls(ui: &mut Ui, tables: &Tables, selection: Selection) -> Selection {
    ui.strong("antibiotic");
    let mut antibiotic = selection.antibiotic.clone();
    ComboBox::from_id_salt("antibiotic")
        .selected_text(antibiotic.clone())
        .show_ui(ui, |ui: &mut Ui| {
            for a in tables.antibiotics() {
                ui.selectable_value(&mut antibiotic, a.to_string(), a);
            }
        });
    let selection = selection.with_antibiotic(&antibiotic);
    ui.add_space(4.0);

    ui.strong("estimation unit");
    let mut level = selection.level;
    ComboBox::from_id_salt("estimation_unit")
        .selected_text(level.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for l in Level::ALL {
                ui.selectable_value(&mut level, l, l.as_str());
            }
        });
    let mut selection = selection.with_level(level);
    ui.separator();

    let mut show_names = selection.show_names();
    ui.checkbox(&mut show_names, format!("show {} names", selection.level));
    selection = selection.with_show_names(show_names);

    if let Some(names) = selection.names {
        let mut color_by_genus = names.color_by_genus;
        ui.checkbox(&mut color_by_genus, "color by genus");

        let mut text_size = names.text_size;
        ui.add(Slider::new(&mut text_size, TEXT_SIZE_RANGE).text("text size"));

        selection = selection
            .with_color_by_genus(color_by_genus)
            .with_text_size(text_size);
    }
    ui.separator();

    let toggles = cutoff_toggles(tables, &selection);
    if toggles.is_empty() {
        ui.weak("no HC estimates");
    }
    for toggle in toggles {
        let mut checked = toggle.checked;
        if ui.checkbox(&mut checked, toggle.label()).changed() {
            selection = selection.with_cutoff(toggle.cutoff, checked);
        }
    }

    selection
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Save chart image…").clicked() {
                save_image_dialog(ui.ctx(), state);
                ui.close_menu();
            }
        });

        ui.separator();

        let (n_msc, n_curves, n_hc) = state.tables.row_counts();
        ui.label(format!(
            "{}  ·  {n_msc} observations, {n_curves} curve points, {n_hc} HC estimates",
            state.paths.msc.display()
        ));

        ui.separator();

        if ui.selectable_label(state.show_data, "Data").clicked() {
            state.show_data = !state.show_data;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open folder with MSC.csv, curvedata.csv and HC.csv")
        .pick_folder();

    if let Some(dir) = folder {
        state.open(DataPaths::in_dir(&dir));
    }
}

/// Ask for a target file and request a screenshot; the app writes it once
/// the frame has been captured.
pub fn save_image_dialog(ctx: &egui::Context, state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save chart image")
        .add_filter("PNG", &["png"])
        .set_file_name(format!("{}_{}.png", state.selection.antibiotic, state.selection.level))
        .save_file();

    if let Some(path) = file {
        state.pending_screenshot = Some(path);
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
    }
}
