//! In-memory record tables built from worksheet rows.

use serde::{Serialize, Serializer};
use std::fmt;

/// A single cell as read from, or written to, a worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Convert raw worksheet text into a cell, turning numeric strings into numbers.
    ///
    /// Worksheet values arrive as display text: `"42"` becomes `Int(42)`,
    /// `"4.5"` becomes `Float(4.5)` and an empty string stays `Empty`.
    /// Anything else is kept verbatim as text.
    ///
    /// # Examples
    /// ```
    /// use sheetboard::table::CellValue;
    ///
    /// assert_eq!(CellValue::numericise("42"), CellValue::Int(42));
    /// assert_eq!(CellValue::numericise(""), CellValue::Empty);
    /// assert_eq!(CellValue::numericise("Cluster 6"), CellValue::Text("Cluster 6".into()));
    /// ```
    pub fn numericise(raw: &str) -> Self {
        if raw.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return CellValue::Int(i);
        }
        // "inf"/"NaN" parse as floats but are words in a sheet
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// Convert a JSON value returned by the Sheets API.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.into()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Empty),
            },
            serde_json::Value::String(s) => CellValue::numericise(s),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_str(""),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Float(f) => serializer.serialize_f64(*f),
            CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// The data rows of a worksheet, keyed by the worksheet's header row.
///
/// Every row holds exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// One data row of a [`RecordTable`], looked up by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl<'a> Record<'a> {
    /// Value under `column`. With duplicate header names the rightmost column wins.
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.columns
            .iter()
            .rposition(|c| c == column)
            .map(|idx| &self.cells[idx])
    }

    pub fn iter(self) -> impl Iterator<Item = (&'a str, &'a CellValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }

    pub fn cells(self) -> &'a [CellValue] {
        self.cells
    }
}

impl RecordTable {
    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from raw worksheet values, using the first row as headers.
    ///
    /// Short rows are padded with empty cells and cells past the header width
    /// are dropped. No rows at all produces [`RecordTable::empty`].
    pub fn from_values(mut values: Vec<Vec<CellValue>>) -> Self {
        if values.is_empty() {
            return Self::empty();
        }

        let header = values.remove(0);
        let columns: Vec<String> = header.iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let rows = values
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|cells| Record {
            columns: &self.columns,
            cells,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |cells| Record {
            columns: &self.columns,
            cells,
        })
    }

    /// Rows where any cell contains `filter`, ignoring case.
    ///
    /// A blank filter keeps every row. This is the same predicate the
    /// dashboard's filter box applies in the browser.
    pub fn filtered(&self, filter: &str) -> RecordTable {
        let needle = filter.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }

        let rows = self
            .rows
            .iter()
            .filter(|row| {
                row.iter()
                    .any(|cell| cell.to_string().to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();

        RecordTable {
            columns: self.columns.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn sample() -> RecordTable {
        RecordTable::from_values(vec![
            vec![text("Project"), text("URL:"), text("Budget")],
            vec![text("Fietspad Noord"), text("https://example.org/a"), CellValue::Int(1200)],
            vec![text("Laadpalen"), text("https://example.org/b")],
            vec![text("Zonnepanelen"), CellValue::Empty, CellValue::Float(3.5), text("extra")],
        ])
    }

    #[test]
    fn test_numericise() {
        assert_eq!(CellValue::numericise("12"), CellValue::Int(12));
        assert_eq!(CellValue::numericise("-3"), CellValue::Int(-3));
        assert_eq!(CellValue::numericise("2.25"), CellValue::Float(2.25));
        assert_eq!(CellValue::numericise("NaN"), text("NaN"));
        assert_eq!(CellValue::numericise("abc"), text("abc"));
        assert_eq!(CellValue::numericise(""), CellValue::Empty);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(CellValue::from_json(&serde_json::json!(7)), CellValue::Int(7));
        assert_eq!(CellValue::from_json(&serde_json::json!(0.5)), CellValue::Float(0.5));
        assert_eq!(CellValue::from_json(&serde_json::json!(true)), text("TRUE"));
        assert_eq!(CellValue::from_json(&serde_json::json!("")), CellValue::Empty);
        assert_eq!(CellValue::from_json(&serde_json::json!("15")), CellValue::Int(15));
    }

    #[test]
    fn test_from_values_uses_header_as_keys() {
        let table = sample();
        assert_eq!(table.columns(), &["Project", "URL:", "Budget"]);
        assert_eq!(table.len(), 3);

        let first = table.record(0).unwrap();
        assert_eq!(first.get("Budget"), Some(&CellValue::Int(1200)));
        assert_eq!(first.get("Missing"), None);
    }

    #[test]
    fn test_short_rows_are_padded_and_long_rows_truncated() {
        let table = sample();
        assert_eq!(table.rows()[1], vec![text("Laadpalen"), text("https://example.org/b"), CellValue::Empty]);
        assert_eq!(table.rows()[2].len(), 3);
    }

    #[test]
    fn test_no_values_is_empty_table() {
        let table = RecordTable::from_values(Vec::new());
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn test_header_only_has_columns_but_no_rows() {
        let table = RecordTable::from_values(vec![vec![text("timestamp"), text("name")]]);
        assert!(table.is_empty());
        assert!(table.has_column("name"));
    }

    #[test]
    fn test_duplicate_header_rightmost_wins() {
        let table = RecordTable::from_values(vec![
            vec![text("a"), text("a")],
            vec![CellValue::Int(1), CellValue::Int(2)],
        ]);
        assert_eq!(table.record(0).unwrap().get("a"), Some(&CellValue::Int(2)));
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_filtered_is_case_insensitive_over_any_cell() {
        let table = sample();
        let hits = table.filtered("LAAD");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.record(0).unwrap().get("Project"), Some(&text("Laadpalen")));

        assert_eq!(table.filtered("1200").len(), 1);
        assert_eq!(table.filtered("example.org").len(), 2);
        assert_eq!(table.filtered("nothing here").len(), 0);
    }

    #[test]
    fn test_blank_filter_keeps_everything() {
        let table = sample();
        assert_eq!(table.filtered("   "), table);
    }

    #[test]
    fn test_records_yield_one_mapping_per_row() {
        let table = sample();
        let projects: Vec<String> = table
            .records()
            .filter_map(|r| r.get("Project").map(|v| v.to_string()))
            .collect();
        assert_eq!(projects, vec!["Fietspad Noord", "Laadpalen", "Zonnepanelen"]);
    }

    #[test]
    fn test_record_iter_follows_column_order() {
        let table = sample();
        let names: Vec<&str> = table.record(0).unwrap().iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["Project", "URL:", "Budget"]);
    }
}
