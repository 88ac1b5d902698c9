//! Core data types for the predchart pipeline.

use crate::columns;
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Timezone-naive instant used as the join key.
pub type Timestamp = NaiveDateTime;

/// A single cell as yielded by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Scalar {
    /// Whether this cell is NULL.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view of the cell. Text is accepted when it parses as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Null => None,
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Real(r) => Some(*r),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Real(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Integer(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

/// All rows of one table, in source load order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Table name in the data source.
    pub name: String,
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Rows, each with one cell per column.
    pub rows: Vec<Vec<Scalar>>,
}

impl RawTable {
    /// Create an empty table with the given columns.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. The row must have one cell per column.
    pub fn push_row(&mut self, row: Vec<Scalar>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::schema(format!(
                "table '{}': row has {} cells, expected {}",
                self.name,
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// An actual table and the name of its predicted counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TablePair {
    /// Observed price table.
    pub actual: String,
    /// Predicted table name; it may not exist in the source.
    pub predicted: String,
}

impl TablePair {
    pub fn new(actual: impl Into<String>, predicted: impl Into<String>) -> Self {
        Self {
            actual: actual.into(),
            predicted: predicted.into(),
        }
    }
}

/// Which side of a pair a table plays. Determines the required columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesRole {
    /// Requires all of `Open, High, Low, Close`.
    Actual,
    /// Requires at least one of the `Predicted_*` columns.
    Predicted,
}

/// One row of a normalized series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRecord {
    /// Row timestamp, unique within its series.
    pub ts: Timestamp,
    /// One value per series field, `None` for NULL cells.
    pub values: Vec<Option<f64>>,
}

/// A table loaded into memory, keyed by unique timestamp.
///
/// Records keep discovery order. The series is immutable once built.
#[derive(Debug, Clone)]
pub struct NormalizedSeries {
    name: String,
    fields: Vec<String>,
    records: Vec<TimeSeriesRecord>,
    index: HashMap<Timestamp, usize>,
}

impl NormalizedSeries {
    /// Build a series. Fails if a timestamp repeats or a record's arity is wrong.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<String>,
        records: Vec<TimeSeriesRecord>,
    ) -> Result<Self> {
        let name = name.into();
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if record.values.len() != fields.len() {
                return Err(Error::schema(format!(
                    "series '{}': record at {} has {} values, expected {}",
                    name,
                    record.ts,
                    record.values.len(),
                    fields.len()
                )));
            }
            if index.insert(record.ts, i).is_some() {
                return Err(Error::schema(format!(
                    "series '{}': duplicate timestamp {}",
                    name, record.ts
                )));
            }
        }
        Ok(Self {
            name,
            fields,
            records,
            index,
        })
    }

    /// Source table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric field names, excluding the timestamp.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Records in discovery order.
    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    /// Position of a field by exact name.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Record for a timestamp.
    pub fn get(&self, ts: &Timestamp) -> Option<&TimeSeriesRecord> {
        self.index.get(ts).map(|&i| &self.records[i])
    }

    /// Value of `field` at `ts`, if both exist and the cell is not NULL.
    pub fn value(&self, ts: &Timestamp, field: &str) -> Option<f64> {
        let idx = self.field_index(field)?;
        self.get(ts).and_then(|r| r.values[idx])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One row of an aligned dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    /// Timestamp from the actual series.
    pub ts: Timestamp,
    /// Actual values, parallel to [`AlignedDataset::actual_fields`].
    pub actual: Vec<Option<f64>>,
    /// Predicted values, parallel to [`AlignedDataset::predicted_fields`].
    /// `None` when no predicted record shares this timestamp.
    pub predicted: Option<Vec<Option<f64>>>,
}

/// Left join of an actual series with an optional predicted series.
///
/// Holds exactly one row per actual record, in the actual series' order.
#[derive(Debug, Clone)]
pub struct AlignedDataset {
    /// Actual table name; charts are named after it.
    pub name: String,
    /// Predicted table name, when a predicted series took part in the join.
    pub predicted_name: Option<String>,
    pub actual_fields: Vec<String>,
    pub predicted_fields: Vec<String>,
    pub rows: Vec<AlignedRow>,
}

impl AlignedDataset {
    /// Whether the schema carries a field of this name on either side.
    pub fn has_field(&self, field: &str) -> bool {
        self.actual_fields.iter().any(|f| f == field)
            || self.predicted_fields.iter().any(|f| f == field)
    }

    /// Value of `field` in `row`; `None` if absent or NULL.
    pub fn value(&self, row: &AlignedRow, field: &str) -> Option<f64> {
        if let Some(i) = self.actual_fields.iter().position(|f| f == field) {
            return row.actual.get(i).copied().flatten();
        }
        let i = self.predicted_fields.iter().position(|f| f == field)?;
        row.predicted.as_ref().and_then(|p| p.get(i).copied().flatten())
    }

    /// Column of values for `field` across all rows.
    pub fn column(&self, field: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| self.value(r, field)).collect()
    }

    /// Whether `field` holds a non-NULL value in at least one row.
    pub fn is_populated(&self, field: &str) -> bool {
        self.rows.iter().any(|r| self.value(r, field).is_some())
    }

    /// Number of rows with a matching predicted record.
    pub fn matched_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.predicted.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Names of the four price fields of one candle series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcFields {
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl OhlcFields {
    /// `Open, High, Low, Close`.
    pub fn actual() -> Self {
        Self::from_names(columns::ACTUAL_OHLC)
    }

    /// `Predicted_Open, ..., Predicted_Close`.
    pub fn predicted() -> Self {
        Self::from_names(columns::PREDICTED_OHLC)
    }

    fn from_names([open, high, low, close]: [&str; 4]) -> Self {
        Self {
            open: open.to_string(),
            high: high.to_string(),
            low: low.to_string(),
            close: close.to_string(),
        }
    }

    /// Field names in open, high, low, close order.
    pub fn names(&self) -> [&str; 4] {
        [
            self.open.as_str(),
            self.high.as_str(),
            self.low.as_str(),
            self.close.as_str(),
        ]
    }
}

/// Rendering mode chosen for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonMode {
    FullOverlay,
    PredictedLineOnly,
    Skip,
}

/// Why a pair was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No predicted series took part in the join.
    PredictedAbsent,
    /// A predicted series was joined but holds no usable predicted prices.
    NoPredictedPrices,
}

/// Decision on how to render one aligned dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonPlan {
    /// Predicted candles alongside actual candles.
    FullOverlay {
        actual: OhlcFields,
        predicted: OhlcFields,
    },
    /// Predicted close as a line over actual candles.
    PredictedLineOnly {
        actual: OhlcFields,
        predicted_close: String,
    },
    /// Nothing is rendered for this pair.
    Skip { reason: SkipReason },
}

impl ComparisonPlan {
    pub fn mode(&self) -> ComparisonMode {
        match self {
            ComparisonPlan::FullOverlay { .. } => ComparisonMode::FullOverlay,
            ComparisonPlan::PredictedLineOnly { .. } => ComparisonMode::PredictedLineOnly,
            ComparisonPlan::Skip { .. } => ComparisonMode::Skip,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, ComparisonPlan::Skip { .. })
    }

    /// Actual candle fields, unless skipped.
    pub fn actual_fields(&self) -> Option<&OhlcFields> {
        match self {
            ComparisonPlan::FullOverlay { actual, .. }
            | ComparisonPlan::PredictedLineOnly { actual, .. } => Some(actual),
            ComparisonPlan::Skip { .. } => None,
        }
    }
}
