use std::path::PathBuf;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TimmermanApp {
    pub state: AppState,
}

impl TimmermanApp {
    /// Create the app and load the table once up front.
    pub fn new(data_path: PathBuf) -> Self {
        let mut state = AppState::new(data_path);
        state.load();
        Self { state }
    }
}

impl eframe::App for TimmermanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: fraction / type / organ selectors ----
        egui::SidePanel::left("selection_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: header + constraints ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::header(ui);
            ui.separator();
            table::constraints_table(ui, &self.state);
        });
    }
}
