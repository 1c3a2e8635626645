use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::data::export::{
    DEFAULT_FILENAME, ExportFormat, ExportPayload, ExportRequest, export_view,
};
use crate::data::filter::{FilterCriteria, NullCheck, filtered_indices};
use crate::data::loader::load_source;
use crate::data::model::Dataset;
use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Form inputs
// ---------------------------------------------------------------------------

/// Raw text of the filter form, as typed.
#[derive(Debug, Clone, Default)]
pub struct FilterForm {
    pub primary: String,
    /// Comma-separated operation columns.
    pub operations: String,
    pub mode: NullCheck,
}

/// State of the export dialog.
#[derive(Debug, Clone)]
pub struct ExportForm {
    pub open: bool,
    pub filename: String,
    pub format: ExportFormat,
}

impl Default for ExportForm {
    fn default() -> Self {
        Self {
            open: false,
            filename: DEFAULT_FILENAME.to_string(),
            format: ExportFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Dataset>,

    /// Indices of rows in the current filtered view.
    pub visible_indices: Vec<usize>,

    pub filter_form: FilterForm,

    pub export_form: ExportForm,

    /// Status line shown in the top bar.
    pub status_message: Option<String>,

    /// Error waiting to be shown as a blocking alert.
    pending_alert: Option<String>,

    /// Result channel of the load currently in flight.
    loading: Option<Receiver<anyhow::Result<Dataset>>>,
}

impl AppState {
    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Start loading `source` on a worker thread. `on_done` runs on that thread
    /// once the result is ready (used to wake the UI).
    ///
    /// Refused while another load is in flight.
    pub fn begin_load<F>(&mut self, source: String, on_done: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_loading() {
            log::warn!("Ignoring load of {source}: another load is in progress");
            return;
        }

        log::info!("Loading {source}");
        self.status_message = Some(format!("Loading {source}…"));

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // The receiver is gone only if the state was dropped.
            let _ = tx.send(load_source(&source));
            on_done();
        });
        self.loading = Some(rx);
    }

    /// Pick up the result of an in-flight load, if it has arrived.
    pub fn poll_load(&mut self) {
        let Some(rx) = &self.loading else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("loader thread exited")),
        };
        self.loading = None;
        self.finish_load(result);
    }

    /// Install a load result. On failure the dataset is left empty and an
    /// alert is raised.
    pub fn finish_load(&mut self, result: anyhow::Result<Dataset>) {
        match result {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows with columns {:?}",
                    dataset.len(),
                    dataset.column_names()
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.dataset = None;
                self.visible_indices.clear();
                self.status_message = None;
                self.raise(&AppError::Load(e));
            }
        }
    }

    /// Replace the dataset wholesale; the view starts out unfiltered.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.visible_indices = (0..dataset.len()).collect();
        self.status_message = None;
        self.dataset = Some(dataset);
    }

    /// Validate the filter form and recompute the filtered view.
    ///
    /// On a validation error the previous view is kept.
    pub fn apply_filter(&mut self) -> Result<()> {
        let form = &self.filter_form;
        let criteria = match FilterCriteria::parse(&form.primary, &form.operations, form.mode) {
            Ok(criteria) => criteria,
            Err(e) => {
                log::warn!("Filter rejected: {e}");
                self.raise(&e);
                return Err(e);
            }
        };

        for (spec, position) in criteria.resolved_positions() {
            match position {
                Some(p) => log::debug!("Column {spec} resolves to position {p}"),
                None => log::warn!("Column {spec} is not a single letter A-Z"),
            }
        }

        let Some(dataset) = &self.dataset else {
            log::warn!("Filter applied with no dataset loaded");
            return Ok(());
        };
        self.visible_indices = filtered_indices(dataset, &criteria);

        log::info!(
            "Filter {} on {} + {:?}: {} of {} rows",
            criteria.mode,
            criteria.primary,
            criteria.operations.iter().map(|s| s.name()).collect::<Vec<_>>(),
            self.visible_indices.len(),
            dataset.len()
        );
        Ok(())
    }

    /// Show every row again.
    pub fn clear_filter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = (0..ds.len()).collect();
        }
    }

    pub fn open_export_modal(&mut self) {
        self.export_form.open = true;
    }

    pub fn close_export_modal(&mut self) {
        self.export_form.open = false;
    }

    /// Serialise the current view from the dialog inputs and close the dialog.
    ///
    /// The dialog closes whether or not the export succeeded.
    pub fn confirm_export(&mut self) -> Result<ExportPayload> {
        let request = ExportRequest::new(&self.export_form.filename, self.export_form.format);
        self.close_export_modal();

        let empty = Dataset::default();
        let dataset = self.dataset.as_ref().unwrap_or(&empty);
        match export_view(dataset, &self.visible_indices, &request) {
            Ok(payload) => {
                log::info!(
                    "Exported {} rows to {} ({}, {} bytes)",
                    self.visible_indices.len(),
                    payload.file_name,
                    payload.mime,
                    payload.bytes.len()
                );
                Ok(payload)
            }
            Err(e) => {
                log::warn!("Export of {} refused: {e}", request.file_name());
                self.raise(&e);
                Err(e)
            }
        }
    }

    /// Queue an error for the blocking alert.
    pub fn raise(&mut self, error: &AppError) {
        self.pending_alert = Some(error.to_string());
    }

    /// Take the alert waiting to be shown, if any.
    pub fn take_alert(&mut self) -> Option<String> {
        self.pending_alert.take()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::data::model::{CellValue, Row};

    fn loaded() -> AppState {
        let rows: Vec<Row> = vec![
            [("A", CellValue::Integer(1)), ("B", CellValue::Integer(2))]
                .into_iter()
                .collect(),
            [("A", CellValue::Null), ("B", CellValue::Integer(3))]
                .into_iter()
                .collect(),
            [("A", CellValue::Integer(4)), ("B", CellValue::Null)]
                .into_iter()
                .collect(),
        ];
        let mut state = AppState::default();
        state.set_dataset(Dataset::from_rows(rows));
        state
    }

    #[test]
    fn new_dataset_shows_every_row() {
        let state = loaded();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn apply_filter_updates_view() {
        let mut state = loaded();
        state.filter_form = FilterForm {
            primary: "a".into(),
            operations: "b".into(),
            mode: NullCheck::NotNull,
        };
        state.apply_filter().unwrap();
        assert_eq!(state.visible_indices, vec![0]);
        assert!(state.take_alert().is_none());

        state.clear_filter();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn missing_input_keeps_previous_view() {
        let mut state = loaded();
        state.filter_form.primary = "A".into();
        state.filter_form.operations = "B".into();
        state.apply_filter().unwrap();
        let before = state.visible_indices.clone();

        state.filter_form.primary = "  ".into();
        let err = state.apply_filter().unwrap_err();
        assert!(matches!(err, AppError::MissingInput));
        assert_eq!(state.visible_indices, before);
        assert_eq!(
            state.take_alert().as_deref(),
            Some("Please enter the primary column and at least one operation column.")
        );
    }

    #[test]
    fn failed_load_clears_dataset_and_alerts() {
        let mut state = loaded();
        state.finish_load(Err(anyhow::anyhow!("boom")));
        assert!(state.dataset.is_none());
        assert!(state.visible_indices.is_empty());
        let alert = state.take_alert().unwrap();
        assert!(alert.contains("boom"));
    }

    #[test]
    fn export_closes_modal_and_uses_view() {
        let mut state = loaded();
        state.visible_indices = vec![1];
        state.open_export_modal();
        state.export_form.filename = "subset".into();
        state.export_form.format = ExportFormat::Csv;

        let payload = state.confirm_export().unwrap();
        assert!(!state.export_form.open);
        assert_eq!(payload.file_name, "subset.csv");
        assert_eq!(String::from_utf8(payload.bytes).unwrap(), "A,B\n,3\n");
    }

    #[test]
    fn unsupported_export_alerts_and_closes() {
        let mut state = loaded();
        state.open_export_modal();
        state.export_form.format = ExportFormat::Pdf;
        assert!(state.confirm_export().is_err());
        assert!(!state.export_form.open);
        assert_eq!(
            state.take_alert().as_deref(),
            Some("Image and PDF downloads are not implemented yet.")
        );
    }

    #[test]
    fn background_load_delivers_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, "A,B\n1,\n,2\n").unwrap();

        let mut state = AppState::default();
        state.begin_load(path.display().to_string(), || {});
        assert!(state.is_loading());
        // A second request while the first is running is ignored.
        state.begin_load("other.csv".into(), || {});

        let deadline = Instant::now() + Duration::from_secs(10);
        while state.is_loading() && Instant::now() < deadline {
            state.poll_load();
            std::thread::sleep(Duration::from_millis(5));
        }

        let ds = state.dataset.as_ref().unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert!(state.take_alert().is_none());
    }
}
