//! Tabular run summaries
//!
//! One row per executed binding: the binding's columns plus a back-reference
//! into the store (`run_index`, and `stage_index` once a pipeline has tagged
//! its stages). This is the in-memory answer a run hands back; the store
//! keeps the authoritative copy.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::value::Binding;

/// One executed binding with its store coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Stage index, set at pipeline level only
    pub stage_index: Option<usize>,
    /// Run index within the stage, dense from 0 in execution order
    pub run_index: usize,
    /// The binding's name/value columns
    #[serde(flatten)]
    pub columns: Binding,
}

/// Ordered collection of [`SummaryRow`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Append one row.
    pub fn push(&mut self, row: SummaryRow) {
        self.rows.push(row);
    }

    /// Append all rows of `other`, preserving order.
    pub fn concat(&mut self, other: Self) {
        self.rows.extend(other.rows);
    }

    /// Set the stage index of every row.
    pub fn tag_stage(&mut self, stage: usize) {
        for row in &mut self.rows {
            row.stage_index = Some(stage);
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in order.
    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Iterate over rows.
    pub fn iter(&self) -> std::slice::Iter<'_, SummaryRow> {
        self.rows.iter()
    }

    /// Count of distinct stage-index values (untagged rows count as one
    /// anonymous stage).
    #[must_use]
    pub fn stage_count(&self) -> usize {
        let stages: BTreeSet<Option<usize>> = self.rows.iter().map(|r| r.stage_index).collect();
        stages.len()
    }

    /// Count of distinct run indices within the first stage present, the
    /// representative bindings-per-stage figure.
    #[must_use]
    pub fn runs_in_first_stage(&self) -> usize {
        let Some(first) = self.rows.first().map(|r| r.stage_index) else {
            return 0;
        };
        let runs: BTreeSet<usize> = self
            .rows
            .iter()
            .filter(|r| r.stage_index == first)
            .map(|r| r.run_index)
            .collect();
        runs.len()
    }

    /// Column names across all rows, sorted.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .rows
            .iter()
            .flat_map(|r| r.columns.keys().map(String::as_str))
            .collect();
        names.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a SummaryTable {
    type Item = &'a SummaryRow;
    type IntoIter = std::slice::Iter<'a, SummaryRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.column_names();
        writeln!(f, "stage_index | run_index | {}", names.join(" | "))?;
        for row in &self.rows {
            let stage = row
                .stage_index
                .map_or_else(|| "-".to_string(), |s| s.to_string());
            let cells: Vec<String> = names
                .iter()
                .map(|n| {
                    row.columns
                        .get(*n)
                        .map_or_else(|| "-".to_string(), ToString::to_string)
                })
                .collect();
            writeln!(f, "{stage} | {} | {}", row.run_index, cells.join(" | "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn row(stage: Option<usize>, run: usize, a: i64) -> SummaryRow {
        let mut columns = Binding::new();
        columns.insert("a".to_string(), Value::Int(a));
        SummaryRow {
            stage_index: stage,
            run_index: run,
            columns,
        }
    }

    #[test]
    fn test_concat_and_counts() {
        let mut table = SummaryTable::new();
        table.push(row(None, 0, 1));
        table.push(row(None, 1, 2));
        table.tag_stage(0);

        let mut second = SummaryTable::new();
        second.push(row(None, 0, 3));
        second.tag_stage(1);

        table.concat(second);
        assert_eq!(table.len(), 3);
        assert_eq!(table.stage_count(), 2);
        assert_eq!(table.runs_in_first_stage(), 2);
    }

    #[test]
    fn test_row_serializes_binding_as_columns() {
        let json = serde_json::to_value(row(Some(1), 3, 7)).unwrap();
        assert_eq!(json["stage_index"], 1);
        assert_eq!(json["run_index"], 3);
        assert_eq!(json["a"], 7);
    }

    #[test]
    fn test_display_renders_header_and_missing_cells() {
        let mut first = Binding::new();
        first.insert("a".to_string(), Value::Int(1));
        first.insert("b".to_string(), Value::Int(2));
        let mut second = Binding::new();
        second.insert("a".to_string(), Value::Int(3));

        let mut table = SummaryTable::new();
        table.push(SummaryRow {
            stage_index: Some(0),
            run_index: 0,
            columns: first,
        });
        table.push(SummaryRow {
            stage_index: None,
            run_index: 1,
            columns: second,
        });

        assert_eq!(
            table.to_string(),
            "stage_index | run_index | a | b\n\
             0 | 0 | 1 | 2\n\
             - | 1 | 3 | -\n"
        );
    }

    #[test]
    fn test_column_names_sorted() {
        let mut columns = Binding::new();
        columns.insert("b".to_string(), Value::Int(1));
        columns.insert("a".to_string(), Value::Int(2));
        let mut table = SummaryTable::new();
        table.push(SummaryRow {
            stage_index: None,
            run_index: 0,
            columns,
        });
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }
}
