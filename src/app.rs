use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct SheetSieveApp {
    pub state: AppState,
}

impl SheetSieveApp {
    /// Create the app and start loading `source`, if one was given.
    pub fn new(ctx: &egui::Context, source: Option<String>) -> Self {
        let mut app = Self::default();
        if let Some(source) = source {
            let ctx = ctx.clone();
            app.state.begin_load(source, move || ctx.request_repaint());
        }
        app
    }
}

impl eframe::App for SheetSieveApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_load();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filter form ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::sheet_table(ui, &self.state);
        });

        panels::export_modal(ctx, &mut self.state);

        if let Some(message) = self.state.take_alert() {
            panels::alert(&message);
        }
    }
}
