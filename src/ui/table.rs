use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use timmerman_finder::color::type_tint;
use timmerman_finder::config::DISPLAY_COLUMNS;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Constraints table (central panel)
// ---------------------------------------------------------------------------

const ROW_HEIGHT: f32 = 22.0;

/// Render the rows of the current selection, tinted by structural type.
pub fn constraints_table(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a constraint table to begin  (File → Open…)");
        });
        return;
    }

    let Some(result) = &state.result else {
        ui.label(RichText::new("No data for this selection.").italics());
        return;
    };

    ui.heading("Constraints");
    if result.is_empty() {
        ui.label(RichText::new("No constraints for this combination.").italics());
        return;
    }

    let dark = ui.visuals().dark_mode;

    TableBuilder::new(ui)
        .striped(false)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(70.0))
        .column(Column::initial(220.0).at_least(120.0).clip(true))
        .columns(Column::auto().at_least(90.0), 3)
        .column(Column::remainder().at_least(120.0))
        .header(ROW_HEIGHT, |mut header| {
            for title in DISPLAY_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in &result.rows {
                let fill = type_tint(row.kind(), dark).map(|[r, g, b]| Color32::from_rgb(r, g, b));
                body.row(ROW_HEIGHT, |mut table_row| {
                    for cell in row.display_cells() {
                        table_row.col(|ui: &mut Ui| {
                            if let Some(fill) = fill {
                                ui.painter().rect_filled(ui.max_rect(), 0.0, fill);
                            }
                            ui.add(egui::Label::new(cell).truncate());
                        });
                    }
                });
            }
        });
}
