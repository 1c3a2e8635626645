use std::fmt;

use super::column::ColumnSpec;
use super::model::{CellValue, Dataset};
use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Polarity of the filter: keep rows whose referenced cells are all null, or
/// all non-null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullCheck {
    Null,
    #[default]
    NotNull,
}

impl NullCheck {
    pub const ALL: [NullCheck; 2] = [NullCheck::Null, NullCheck::NotNull];

    /// Whether `value` satisfies this polarity.
    pub fn accepts(self, value: &CellValue) -> bool {
        match self {
            NullCheck::Null => value.is_null(),
            NullCheck::NotNull => !value.is_null(),
        }
    }
}

impl fmt::Display for NullCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullCheck::Null => f.write_str("Null"),
            NullCheck::NotNull => f.write_str("Not null"),
        }
    }
}

/// A validated filter request, built fresh from the form on every apply.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub primary: ColumnSpec,
    pub operations: Vec<ColumnSpec>,
    pub mode: NullCheck,
}

impl FilterCriteria {
    /// Normalise the raw form inputs.
    ///
    /// `operations` is a comma-separated list; blank entries are dropped.
    /// Fails with [`AppError::MissingInput`] when the primary column is blank
    /// or no operation column remains.
    pub fn parse(primary: &str, operations: &str, mode: NullCheck) -> Result<Self> {
        let primary = ColumnSpec::parse(primary);
        let operations: Vec<ColumnSpec> = operations
            .split(',')
            .map(ColumnSpec::parse)
            .filter(|spec| !spec.is_empty())
            .collect();

        if primary.is_empty() || operations.is_empty() {
            return Err(AppError::MissingInput);
        }

        Ok(Self {
            primary,
            operations,
            mode,
        })
    }

    /// Alphabet positions of the primary column followed by each operation
    /// column. Informational only: rows are matched by column name.
    pub fn resolved_positions(&self) -> Vec<(&ColumnSpec, Option<usize>)> {
        std::iter::once(&self.primary)
            .chain(&self.operations)
            .map(|spec| (spec, spec.position()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Predicate filter
// ---------------------------------------------------------------------------

/// Return indices of rows matching `criteria`, in dataset order.
///
/// A row passes when:
/// * its value under the primary column satisfies the null check, and
/// * its value under every operation column satisfies the same check.
///
/// Values are looked up by the normalised column name; a column the row does
/// not carry reads as null.
pub fn filtered_indices(dataset: &Dataset, criteria: &FilterCriteria) -> Vec<usize> {
    let mode = criteria.mode;

    dataset
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            if !mode.accepts(row.get(criteria.primary.name())) {
                return false;
            }
            criteria
                .operations
                .iter()
                .all(|spec| mode.accepts(row.get(spec.name())))
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Row;

    fn dataset(rows: &[&[(&str, CellValue)]]) -> Dataset {
        Dataset::from_rows(
            rows.iter()
                .map(|cells| cells.iter().cloned().collect::<Row>())
                .collect(),
        )
    }

    fn two_row_sample() -> Dataset {
        dataset(&[
            &[("A", CellValue::Integer(1)), ("B", CellValue::Null)],
            &[("A", CellValue::Null), ("B", CellValue::Integer(2))],
        ])
    }

    fn criteria(primary: &str, ops: &str, mode: NullCheck) -> FilterCriteria {
        FilterCriteria::parse(primary, ops, mode).unwrap()
    }

    #[test]
    fn not_null_requires_every_column_filled() {
        let ds = two_row_sample();
        let hits = filtered_indices(&ds, &criteria("A", "B", NullCheck::NotNull));
        assert!(hits.is_empty());
    }

    #[test]
    fn null_requires_every_column_empty() {
        let ds = two_row_sample();
        let hits = filtered_indices(&ds, &criteria("A", "B", NullCheck::Null));
        assert!(hits.is_empty());
    }

    #[test]
    fn keeps_matching_rows_in_order() {
        let ds = dataset(&[
            &[("A", CellValue::Integer(1)), ("B", CellValue::String("x".into()))],
            &[("A", CellValue::Null), ("B", CellValue::Null)],
            &[("A", CellValue::Bool(false)), ("B", CellValue::Float(0.0))],
            &[("A", CellValue::Null), ("B", CellValue::Null)],
        ]);
        assert_eq!(
            filtered_indices(&ds, &criteria("a", " b ", NullCheck::NotNull)),
            vec![0, 2]
        );
        assert_eq!(
            filtered_indices(&ds, &criteria("A", "B", NullCheck::Null)),
            vec![1, 3]
        );
    }

    #[test]
    fn all_operation_columns_must_pass() {
        let ds = dataset(&[
            &[
                ("A", CellValue::Integer(1)),
                ("B", CellValue::Integer(2)),
                ("C", CellValue::Null),
            ],
            &[
                ("A", CellValue::Integer(1)),
                ("B", CellValue::Integer(2)),
                ("C", CellValue::Integer(3)),
            ],
        ]);
        let hits = filtered_indices(&ds, &criteria("A", "B,C", NullCheck::NotNull));
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn matches_by_name_not_by_letter_position() {
        // "B" resolves to position 1, but the lookup goes through the key "B",
        // which these rows do not have, so every value reads as null.
        let ds = dataset(&[&[
            ("ID", CellValue::Integer(1)),
            ("NAME", CellValue::String("x".into())),
        ]]);
        assert!(filtered_indices(&ds, &criteria("ID", "B", NullCheck::NotNull)).is_empty());
        assert_eq!(
            filtered_indices(&ds, &criteria("ID", "NAME", NullCheck::NotNull)),
            vec![0]
        );
    }

    #[test]
    fn lowercase_headers_never_match() {
        let ds = dataset(&[&[("a", CellValue::Integer(1))]]);
        assert_eq!(
            filtered_indices(&ds, &criteria("a", "a", NullCheck::Null)),
            vec![0]
        );
    }

    #[test]
    fn filtering_twice_is_stable() {
        let ds = dataset(&[
            &[("A", CellValue::Integer(1)), ("B", CellValue::Integer(1))],
            &[("A", CellValue::Null), ("B", CellValue::Integer(1))],
            &[("A", CellValue::Integer(2)), ("B", CellValue::Integer(5))],
        ]);
        let c = criteria("A", "B", NullCheck::NotNull);
        let once = filtered_indices(&ds, &c);
        let subset = Dataset::from_rows(ds.view(&once).cloned().collect());
        let twice = filtered_indices(&subset, &c);
        assert_eq!(twice, (0..once.len()).collect::<Vec<_>>());
        assert!(once.iter().all(|&i| i < ds.len()));
    }

    #[test]
    fn blank_inputs_are_rejected() {
        assert!(matches!(
            FilterCriteria::parse("  ", "B", NullCheck::Null),
            Err(AppError::MissingInput)
        ));
        assert!(matches!(
            FilterCriteria::parse("A", " , ,", NullCheck::Null),
            Err(AppError::MissingInput)
        ));
        assert!(matches!(
            FilterCriteria::parse("A", "", NullCheck::NotNull),
            Err(AppError::MissingInput)
        ));
    }

    #[test]
    fn operation_list_is_split_and_normalised() {
        let c = criteria(" a ", "b, c ,,d", NullCheck::Null);
        let names: Vec<&str> = c.operations.iter().map(ColumnSpec::name).collect();
        assert_eq!(names, ["B", "C", "D"]);
        let positions: Vec<Option<usize>> =
            c.resolved_positions().into_iter().map(|(_, p)| p).collect();
        assert_eq!(positions, [Some(0), Some(1), Some(2), Some(3)]);
    }
}
