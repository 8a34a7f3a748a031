use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use timmerman_finder::config::{APP_TITLE, DISCLAIMER, VERSION};
use timmerman_finder::data::model::StructuralFilter;
use timmerman_finder::export::{suggested_file_name, ExportFormat};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Header – title, version, date, disclaimer
// ---------------------------------------------------------------------------

pub fn header(ui: &mut Ui) {
    ui.heading(APP_TITLE);
    ui.horizontal_wrapped(|ui: &mut Ui| {
        let today = chrono::Local::now().date_naive();
        ui.label(RichText::new(format!("Version: {VERSION}  •  Date: {today}")).small());
    });
    ui.label(RichText::new(DISCLAIMER).small().weak());
}

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the selector panel. Changes are collected first and applied after
/// the widgets so the option lists are not borrowed while state changes.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selection");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No constraint table loaded.");
        return;
    }

    let fractions = state.fraction_options.clone();
    let organs = state.organ_options.clone();

    let mut new_fraction = None;
    let mut new_filter = None;
    let mut new_organ = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Fraction count ----
            ui.strong("How many fractions?");
            let current = state.fraction.map(|f| f.to_string()).unwrap_or_default();
            egui::ComboBox::from_id_salt("fractions")
                .selected_text(current)
                .show_ui(ui, |ui: &mut Ui| {
                    for fx in &fractions {
                        if ui
                            .selectable_label(state.fraction == Some(*fx), fx.to_string())
                            .clicked()
                        {
                            new_fraction = Some(*fx);
                        }
                    }
                });
            ui.add_space(8.0);

            // ---- Serial / parallel ----
            ui.strong("Show");
            ui.horizontal(|ui: &mut Ui| {
                for filter in StructuralFilter::OPTIONS {
                    if ui.radio(state.filter == filter, filter.label()).clicked() {
                        new_filter = Some(filter);
                    }
                }
            });
            ui.add_space(8.0);

            // ---- Organ ----
            ui.strong("Select OAR / Structure");
            if organs.is_empty() {
                ui.label(RichText::new("No structures for this selection.").italics());
            } else {
                let current = state.organ.clone().unwrap_or_default();
                egui::ComboBox::from_id_salt("organ")
                    .width(ui.available_width())
                    .selected_text(&current)
                    .show_ui(ui, |ui: &mut Ui| {
                        for organ in &organs {
                            if ui.selectable_label(current == *organ, organ).clicked() {
                                new_organ = Some(organ.clone());
                            }
                        }
                    });
            }
        });

    if let Some(fx) = new_fraction {
        state.set_fraction(fx);
    }
    if let Some(filter) = new_filter {
        state.set_filter(filter);
    }
    if let Some(organ) = new_organ {
        state.set_organ(organ);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        let can_export = state.result.is_some();
        ui.add_enabled_ui(can_export, |ui: &mut Ui| {
            ui.menu_button("Export", |ui: &mut Ui| {
                for format in ExportFormat::ALL {
                    if ui.button(format.label()).clicked() {
                        save_file_dialog(state, format);
                        ui.close_menu();
                    }
                }
            });
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} constraint rows from {}",
                ds.len(),
                state.data_path.display()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open constraint table")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open(path);
    }
}

pub fn save_file_dialog(state: &mut AppState, format: ExportFormat) {
    let Some(result) = &state.result else {
        return;
    };
    let ext = format.extension();
    let file = rfd::FileDialog::new()
        .set_title("Export selected constraints")
        .set_file_name(suggested_file_name(&result.query, ext))
        .add_filter(format.label(), &[ext])
        .save_file();

    if let Some(path) = file {
        match state.export_to(format, &path) {
            Ok(_) => state.status_message = None,
            Err(e) => {
                log::error!("Export failed: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
