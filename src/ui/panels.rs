use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::export::ExportFormat;
use crate::data::filter::NullCheck;
use crate::data::loader::SUPPORTED_EXTENSIONS;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter form
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ui.label("Primary column");
    ui.text_edit_singleline(&mut state.filter_form.primary);

    ui.label("Operation columns (comma-separated)");
    ui.text_edit_singleline(&mut state.filter_form.operations);

    ui.label("Keep rows where values are");
    egui::ComboBox::from_id_salt("null_check")
        .selected_text(state.filter_form.mode.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for mode in NullCheck::ALL {
                ui.selectable_value(&mut state.filter_form.mode, mode, mode.to_string());
            }
        });

    ui.add_space(8.0);
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Apply").clicked() {
            // Failures are already queued as an alert.
            let _ = state.apply_filter();
        }
        if ui.button("Reset").clicked() {
            state.clear_filter();
        }
    });

    ui.separator();
    if ui.button("Download…").clicked() {
        state.open_export_modal();
    }

    if let Some(ds) = &state.dataset {
        ui.separator();
        ui.strong("Columns");
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| {
                for name in ds.column_names() {
                    ui.monospace(name);
                }
            });
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
                open_file_dialog(ui.ctx(), state);
                ui.close_menu();
            }
            let has_data = state.dataset.is_some();
            if ui.add_enabled(has_data, egui::Button::new("Download…")).clicked() {
                state.open_export_modal();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::GRAY));
        }
    });
}

// ---------------------------------------------------------------------------
// Export modal
// ---------------------------------------------------------------------------

/// Render the download dialog while it is open.
pub fn export_modal(ctx: &egui::Context, state: &mut AppState) {
    if !state.export_form.open {
        return;
    }

    let mut confirm = false;
    let mut close = false;

    egui::Window::new("Download")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label("File name");
            ui.text_edit_singleline(&mut state.export_form.filename);

            ui.label("Format");
            egui::ComboBox::from_id_salt("export_format")
                .selected_text(state.export_form.format.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for format in ExportFormat::ALL {
                        ui.selectable_value(
                            &mut state.export_form.format,
                            format,
                            format.to_string(),
                        );
                    }
                });

            ui.add_space(8.0);
            ui.horizontal(|ui: &mut Ui| {
                confirm = ui.button("Download").clicked();
                close = ui.button("Close").clicked();
            });
        });

    if close {
        state.close_export_modal();
    } else if confirm {
        save_export(state);
    }
}

/// Serialise the view and let the user pick where the file goes.
fn save_export(state: &mut AppState) {
    let Ok(payload) = state.confirm_export() else {
        return;
    };

    let ext = payload
        .file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_string();
    let target = rfd::FileDialog::new()
        .set_title("Save download")
        .set_file_name(&payload.file_name)
        .add_filter(ext.to_uppercase(), &[ext.as_str()])
        .save_file();

    let Some(path) = target else {
        log::info!("Download of {} cancelled", payload.file_name);
        return;
    };
    match payload.save_as(&path) {
        Ok(()) => {
            log::info!("Saved {}", path.display());
            state.status_message = Some(format!("Saved {}", path.display()));
        }
        Err(e) => {
            log::error!("Failed to save download: {e:#}");
            state.raise(&crate::error::AppError::Export(e));
        }
    }
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(ctx: &egui::Context, state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open spreadsheet")
        .add_filter("Supported files", SUPPORTED_EXTENSIONS)
        .add_filter("Excel", &["xlsx", "xlsm", "xlsb", "xls"])
        .add_filter("OpenDocument", &["ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        let ctx = ctx.clone();
        state.begin_load(path.display().to_string(), move || ctx.request_repaint());
    }
}

/// Blocking native alert.
pub fn alert(message: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Sheet Sieve")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
