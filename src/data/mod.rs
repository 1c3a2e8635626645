/// Data layer: core types, loading, filtering and export.
///
/// Architecture:
/// ```text
///  .xlsx / .ods / .csv / .json / .parquet  (path or URL)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode first sheet → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Row>, column names from the first row
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │  filter   │ ──▶ │  export   │  view → .xlsx / .csv bytes
///   └──────────┘      └──────────┘
///   null / not-null predicates → row indices
/// ```

pub mod column;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
