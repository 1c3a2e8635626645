use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use indexmap::IndexMap;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CellValue, Dataset, Row};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Source formats
// ---------------------------------------------------------------------------

/// Input formats understood by the loader, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Csv,
    Json,
    Parquet,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }

    /// Format of a fetched document. The URL path extension wins; without a
    /// known one, a CSV or JSON `Content-Type` is honoured and anything else
    /// goes to the workbook reader, which detects xlsx/xls/xlsb/ods itself.
    pub fn for_url(path: &str, content_type: Option<&str>) -> Self {
        let ext = Path::new(path).extension().and_then(|e| e.to_str());
        if let Some(format) = ext.and_then(Self::from_extension) {
            return format;
        }
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase());
        match mime.as_deref() {
            Some("text/csv") => Self::Csv,
            Some("application/json") => Self::Json,
            _ => Self::Workbook,
        }
    }

    fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match Self::from_extension(ext) {
            Some(format) => Ok(format),
            None => bail!("Unsupported file extension: .{ext}"),
        }
    }
}

/// File-dialog filter: every extension [`SourceFormat`] accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "json", "parquet", "pq",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset from a URL (`http://` / `https://`) or a local path.
pub fn load_source(source: &str) -> Result<Dataset> {
    let source = source.trim();
    if source.starts_with("http://") || source.starts_with("https://") {
        load_url(source)
    } else {
        load_file(Path::new(source))
    }
}

/// Load a dataset from a local file. Dispatch by extension.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let format = SourceFormat::from_path(path)?;
    let bytes =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_bytes(bytes, format)
}

fn load_url(url: &str) -> Result<Dataset> {
    let parsed = reqwest::Url::parse(url).with_context(|| format!("invalid URL {url}"))?;
    let path = parsed.path().to_string();

    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("building HTTP client")?;
    let response = client
        .get(parsed)
        .send()
        .with_context(|| format!("fetching {url}"))?
        .error_for_status()
        .with_context(|| format!("fetching {url}"))?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let format = SourceFormat::for_url(&path, content_type.as_deref());
    let bytes = response.bytes().context("reading response body")?;

    log::debug!("Fetched {} bytes from {url} as {format:?}", bytes.len());
    parse_bytes(bytes.to_vec(), format)
}

/// Decode an in-memory buffer in the given format.
pub fn parse_bytes(bytes: Vec<u8>, format: SourceFormat) -> Result<Dataset> {
    match format {
        SourceFormat::Workbook => parse_workbook(bytes),
        SourceFormat::Csv => parse_csv(&bytes),
        SourceFormat::Json => parse_json(&bytes),
        SourceFormat::Parquet => parse_parquet(bytes),
    }
}

// ---------------------------------------------------------------------------
// Header-row records
// ---------------------------------------------------------------------------

/// Turn a header cell list into unique keys.
///
/// Empty headers become `__EMPTY`; a header already taken gets the first free
/// `_1`, `_2`, … suffix, so `A, A, A_1` yields `A, A_1, A_1_1`.
fn unique_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut taken: HashSet<String> = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .map(|h| {
            let base = if h.is_empty() { "__EMPTY".to_string() } else { h };
            let counter = suffixes.entry(base.clone()).or_insert(0);
            let mut key = base.clone();
            while taken.contains(&key) {
                *counter += 1;
                key = format!("{base}_{counter}");
            }
            taken.insert(key.clone());
            key
        })
        .collect()
}

/// Zip a value row against the headers. Short rows are padded with `Null`;
/// a row with no non-null cell is dropped.
fn record<I>(headers: &[String], values: I) -> Option<Row>
where
    I: IntoIterator<Item = CellValue>,
{
    let mut values = values.into_iter();
    let row: Row = headers
        .iter()
        .map(|h| (h.clone(), values.next().unwrap_or(CellValue::Null)))
        .collect();
    let blank = headers.iter().all(|h| row.get(h).is_null());
    (!blank).then_some(row)
}

// ---------------------------------------------------------------------------
// Workbook loader (xlsx / xls / xlsb / ods)
// ---------------------------------------------------------------------------

/// First worksheet; its first row holds the column names.
fn parse_workbook(bytes: Vec<u8>) -> Result<Dataset> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("opening workbook")?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        bail!("Workbook contains no sheets");
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading sheet '{sheet_name}'"))?;

    let mut rows_iter = range.rows();
    let Some(header_cells) = rows_iter.next() else {
        return Ok(Dataset::default());
    };
    let headers = unique_headers(header_cells.iter().map(|c| header_text(&data_to_cell(c))));

    let rows: Vec<Row> = rows_iter
        .filter_map(|cells| record(&headers, cells.iter().map(data_to_cell)))
        .collect();

    log::debug!("Sheet '{sheet_name}': {} columns, {} rows", headers.len(), rows.len());
    Ok(Dataset::from_rows(rows))
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Serial date number, as the sheet stores it.
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#{e:?}")),
    }
}

/// Text used when a cell appears in the header row.
fn header_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, all other rows are values.
fn parse_csv(bytes: &[u8]) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);
    let headers = unique_headers(
        reader
            .headers()
            .context("reading CSV headers")?
            .iter()
            .map(str::to_string),
    );

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let fields = result.with_context(|| format!("CSV row {row_no}"))?;
        if let Some(row) = record(&headers, fields.iter().map(guess_cell_type)) {
            rows.push(row);
        }
    }

    Ok(Dataset::from_rows(rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON:
///
/// ```json
/// [
///   { "ID": 1, "NAME": "a", "SCORE": null },
///   { "ID": 2, "NAME": null, "SCORE": 4.5 }
/// ]
/// ```
///
/// Nested arrays or objects are rejected.
fn parse_json(bytes: &[u8]) -> Result<Dataset> {
    let records: Vec<IndexMap<String, CellValue>> =
        serde_json::from_slice(bytes).context("parsing JSON records")?;
    Ok(Dataset::from_rows(records.into_iter().map(Row::from).collect()))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Every Parquet column becomes a sheet column; Arrow nulls become `Null`.
fn parse_parquet(bytes: Vec<u8>) -> Result<Dataset> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(bytes))
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let cells: Row = schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, col)| (field.name().clone(), arrow_to_cell(col, row)))
                .collect();
            rows.push(cells);
        }
    }

    Ok(Dataset::from_rows(rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_to_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            CellValue::Integer(i64::from(col.as_primitive::<Int32Type>().value(row)))
        }
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            CellValue::Float(f64::from(col.as_primitive::<Float32Type>().value(row)))
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => match array_value_to_string(col, row) {
            Ok(text) => CellValue::String(text),
            Err(e) => {
                log::warn!("Unreadable {other:?} cell at row {row}: {e}");
                CellValue::Null
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    #[test]
    fn csv_header_becomes_column_names() {
        let ds = parse_csv(b"ID,NAME,SCORE\n1,alice,\n2,,3.5\n").unwrap();
        assert_eq!(ds.column_names(), ["ID", "NAME", "SCORE"]);
        assert_eq!(ds.len(), 2);
        let first = &ds.rows()[0];
        assert_eq!(first.get("ID"), &CellValue::Integer(1));
        assert_eq!(first.get("NAME"), &CellValue::String("alice".into()));
        assert!(first.get("SCORE").is_null());
        assert_eq!(ds.rows()[1].get("SCORE"), &CellValue::Float(3.5));
    }

    #[test]
    fn csv_short_rows_are_padded_and_blank_rows_dropped() {
        let ds = parse_csv(b"A,B,C\n1\n,,\ntrue,x,2\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.rows()[0].get("C").is_null());
        assert_eq!(ds.rows()[1].get("A"), &CellValue::Bool(true));
    }

    #[test]
    fn headers_are_made_unique() {
        let headers = unique_headers(
            ["A", "", "A", "", "B", "A"].into_iter().map(String::from),
        );
        assert_eq!(headers, ["A", "__EMPTY", "A_1", "__EMPTY_1", "B", "A_2"]);
    }

    #[test]
    fn suffixes_skip_headers_already_present() {
        let headers = unique_headers(["A", "A", "A_1"].into_iter().map(String::from));
        assert_eq!(headers, ["A", "A_1", "A_1_1"]);

        let headers = unique_headers(["", "__EMPTY_1", ""].into_iter().map(String::from));
        assert_eq!(headers, ["__EMPTY", "__EMPTY_1", "__EMPTY_2"]);
    }

    #[test]
    fn colliding_headers_keep_every_column() {
        let ds = parse_csv(b"A,A,A_1\n1,2,3\n").unwrap();
        assert_eq!(ds.column_names(), ["A", "A_1", "A_1_1"]);
        let row = &ds.rows()[0];
        assert_eq!(row.get("A"), &CellValue::Integer(1));
        assert_eq!(row.get("A_1"), &CellValue::Integer(2));
        assert_eq!(row.get("A_1_1"), &CellValue::Integer(3));
    }

    #[test]
    fn whitespace_header_is_kept_as_is() {
        let headers = unique_headers([" ", "B"].into_iter().map(String::from));
        assert_eq!(headers, [" ", "B"]);
    }

    #[test]
    fn json_records_keep_key_order() {
        let ds = parse_json(br#"[{"Z":1,"A":null},{"Z":null,"A":"x"}]"#).unwrap();
        assert_eq!(ds.column_names(), ["Z", "A"]);
        assert!(ds.rows()[0].get("A").is_null());
    }

    #[test]
    fn json_rejects_nested_values() {
        assert!(parse_json(br#"[{"A":[1,2]}]"#).is_err());
        assert!(parse_json(br#"{"A":1}"#).is_err());
    }

    #[test]
    fn parquet_nulls_become_null_cells() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("label", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("a"), None])),
            ],
        )
        .unwrap();
        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = parse_bytes(buf, SourceFormat::Parquet).unwrap();
        assert_eq!(ds.column_names(), ["id", "label"]);
        assert_eq!(ds.rows()[0].get("label"), &CellValue::String("a".into()));
        assert!(ds.rows()[1].get("label").is_null());
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let err = load_file(Path::new("sheet.txt")).unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn extensionless_urls_fall_back_to_content() {
        assert_eq!(
            SourceFormat::for_url("/export", Some("application/octet-stream")),
            SourceFormat::Workbook
        );
        assert_eq!(SourceFormat::for_url("/download", None), SourceFormat::Workbook);
        assert_eq!(
            SourceFormat::for_url("/export", Some("text/csv; charset=utf-8")),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::for_url("/report.json", Some("text/plain")),
            SourceFormat::Json
        );
    }

    #[test]
    fn extensionless_workbook_is_detected_from_bytes() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "ID").unwrap();
        sheet.write_string(0, 1, "NAME").unwrap();
        sheet.write_number(1, 0, 7.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let format = SourceFormat::for_url("/download", None);
        let ds = parse_bytes(bytes, format).unwrap();
        assert_eq!(ds.column_names(), ["ID", "NAME"]);
        assert_eq!(ds.rows()[0].get("ID"), &CellValue::Float(7.0));
        assert!(ds.rows()[0].get("NAME").is_null());
    }

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(SourceFormat::from_extension("XLSX"), Some(SourceFormat::Workbook));
        assert_eq!(SourceFormat::from_extension("Csv"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_extension("pdf"), None);
    }
}
