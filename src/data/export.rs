use std::fmt;
use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use rust_xlsxwriter::Workbook;

use super::model::{CellValue, Dataset, Row};
use crate::error::{AppError, Result};

pub const DEFAULT_FILENAME: &str = "download";
const SHEET_NAME: &str = "Sheet1";

// ---------------------------------------------------------------------------
// Export request
// ---------------------------------------------------------------------------

/// Download formats offered by the export dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Png,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Xlsx,
        ExportFormat::Csv,
        ExportFormat::Png,
        ExportFormat::Pdf,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Xlsx => f.write_str("Excel (.xlsx)"),
            ExportFormat::Csv => f.write_str("CSV (.csv)"),
            ExportFormat::Png => f.write_str("Image (.png)"),
            ExportFormat::Pdf => f.write_str("PDF (.pdf)"),
        }
    }
}

/// Parsed input of the export dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub filename: String,
    pub format: ExportFormat,
}

impl ExportRequest {
    /// Build a request; a blank filename falls back to [`DEFAULT_FILENAME`].
    pub fn new(filename: &str, format: ExportFormat) -> Self {
        let filename = match filename.trim() {
            "" => DEFAULT_FILENAME.to_string(),
            name => name.to_string(),
        };
        Self { filename, format }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.filename, self.format.extension())
    }
}

/// A serialised download ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportPayload {
    pub fn save_as(&self, path: &Path) -> AnyResult<()> {
        std::fs::write(path, &self.bytes).with_context(|| format!("writing {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Serialisation
// ---------------------------------------------------------------------------

/// Serialise the rows of `view` (indices into `dataset`) in the requested
/// format. Image and PDF are refused with [`AppError::UnsupportedFormat`].
pub fn export_view(
    dataset: &Dataset,
    view: &[usize],
    request: &ExportRequest,
) -> Result<ExportPayload> {
    let (mime, bytes) = match request.format {
        ExportFormat::Xlsx => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            to_xlsx(dataset, view).map_err(AppError::Export)?,
        ),
        ExportFormat::Csv => (
            "text/csv;charset=utf-8",
            to_csv(dataset, view).map_err(AppError::Export)?,
        ),
        ExportFormat::Png | ExportFormat::Pdf => {
            return Err(AppError::UnsupportedFormat("Image and PDF"));
        }
    };

    Ok(ExportPayload {
        file_name: request.file_name(),
        mime,
        bytes,
    })
}

/// Header line plus one line per row; nulls become empty fields. An empty
/// view yields an empty document.
fn to_csv(dataset: &Dataset, view: &[usize]) -> AnyResult<Vec<u8>> {
    if view.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(dataset.column_names())
        .context("writing CSV header")?;
    for row in dataset.view(view) {
        writer
            .write_record(csv_fields(dataset.column_names(), row))
            .context("writing CSV row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV: {}", e.error()))
}

fn csv_fields<'a>(columns: &'a [String], row: &'a Row) -> impl Iterator<Item = String> + 'a {
    columns.iter().map(|col| match row.get(col) {
        CellValue::Null => String::new(),
        value => value.to_string(),
    })
}

/// Single `Sheet1` worksheet: header row, then values. Nulls stay blank.
fn to_xlsx(dataset: &Dataset, view: &[usize]) -> AnyResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).context("naming worksheet")?;

    if !view.is_empty() {
        for (col_idx, name) in dataset.column_names().iter().enumerate() {
            let col = u16::try_from(col_idx).context("too many columns for a worksheet")?;
            worksheet
                .write_string(0, col, name)
                .context("writing header")?;
        }

        for (row_idx, row) in dataset.view(view).enumerate() {
            let r = u32::try_from(row_idx + 1).context("too many rows for a worksheet")?;
            for (col_idx, name) in dataset.column_names().iter().enumerate() {
                let c = u16::try_from(col_idx).context("too many columns for a worksheet")?;
                match row.get(name) {
                    CellValue::Null => {}
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(r, c, *b).context("writing cell")?;
                    }
                    // Sheets store every number as f64.
                    CellValue::Integer(i) => {
                        worksheet.write_number(r, c, *i as f64).context("writing cell")?;
                    }
                    CellValue::Float(f) => {
                        worksheet.write_number(r, c, *f).context("writing cell")?;
                    }
                    CellValue::String(s) => {
                        worksheet.write_string(r, c, s).context("writing cell")?;
                    }
                }
            }
        }
    }

    workbook.save_to_buffer().context("serialising workbook")
}
