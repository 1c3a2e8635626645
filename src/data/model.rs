use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a sheet row
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as produced by the spreadsheet codecs.
///
/// Deserialises straight from flat JSON records (`null`, booleans, numbers,
/// strings), which is also how the JSON loader builds rows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "NULL"),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// Shared `Null` handed out for keys a row does not carry.
static NULL: CellValue = CellValue::Null;

// ---------------------------------------------------------------------------
// Row – one record of the sheet
// ---------------------------------------------------------------------------

/// One record: column name → value, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: IndexMap<String, CellValue>,
}

impl Row {
    /// Value stored under `column`; a missing key reads as `Null`.
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&NULL)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

impl From<IndexMap<String, CellValue>> for Row {
    fn from(cells: IndexMap<String, CellValue>) -> Self {
        Self { cells }
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded sheet
// ---------------------------------------------------------------------------

/// The rows of one load. Never mutated once built; a new load replaces it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    rows: Vec<Row>,
    /// Column names in display order, taken from the first row.
    column_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset; the column set comes from the first row's keys.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let column_names = rows
            .first()
            .map(|row| row.columns().map(str::to_string).collect())
            .unwrap_or_default();
        Dataset { rows, column_names }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Rows referenced by a filtered view, in view order.
    pub fn view<'a>(&'a self, indices: &'a [usize]) -> impl Iterator<Item = &'a Row> + 'a {
        indices.iter().filter_map(|&i| self.rows.get(i))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
