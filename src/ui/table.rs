use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::CellValue;
use crate::state::AppState;

const ROW_HEIGHT: f32 = 20.0;

// ---------------------------------------------------------------------------
// Sheet table (central panel)
// ---------------------------------------------------------------------------

/// Render the filtered view as a table with a header row.
pub fn sheet_table(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                if state.is_loading() {
                    ui.spinner();
                } else {
                    ui.heading("Open a spreadsheet to view it  (File → Open…)");
                }
            });
            return;
        }
    };

    if dataset.is_empty() || state.visible_indices.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No data available");
        });
        return;
    }

    let columns = dataset.column_names();

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(60.0).clip(true), columns.len())
            .header(ROW_HEIGHT, |mut header| {
                for name in columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, state.visible_indices.len(), |mut table_row| {
                    let Some(row) = state
                        .visible_indices
                        .get(table_row.index())
                        .and_then(|&i| dataset.row(i))
                    else {
                        return;
                    };
                    for name in columns {
                        table_row.col(|ui: &mut Ui| match row.get(name) {
                            CellValue::Null => {
                                ui.label(RichText::new("NULL").weak().italics());
                            }
                            value => {
                                ui.label(value.to_string());
                            }
                        });
                    }
                });
            });
    });
}
