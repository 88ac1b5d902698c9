//! Series normalization.
//!
//! Turns a [`RawTable`] into a [`NormalizedSeries`]: the timestamp column is
//! parsed into naive instants, non-numeric columns are dropped, required
//! columns are checked and duplicate timestamps are resolved so that the row
//! loaded last wins.
//!
//! Predicted series keep only fields carrying the predicted prefix, so
//! bookkeeping columns such as a dataframe `index` never reach the join.

use crate::timestamp::parse_timestamp;
use predchart_core::config::ColumnConfig;
use predchart_core::{
    columns, Error, NormalizedSeries, RawTable, Result, SeriesRole, TimeSeriesRecord, Timestamp,
};
use std::collections::HashMap;

/// Loads raw tables into normalized series.
#[derive(Debug, Clone)]
pub struct SeriesNormalizer {
    timestamp_column: String,
    predicted_prefix: String,
}

impl SeriesNormalizer {
    /// Create a normalizer keyed on the given timestamp column.
    pub fn new(timestamp_column: impl Into<String>) -> Self {
        Self {
            timestamp_column: timestamp_column.into(),
            predicted_prefix: columns::PREDICTED_PREFIX.to_string(),
        }
    }

    /// Override the prefix that marks predicted fields.
    pub fn with_predicted_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.predicted_prefix = prefix.into();
        self
    }

    pub fn from_config(config: &ColumnConfig) -> Self {
        Self::new(config.timestamp.clone()).with_predicted_prefix(config.predicted_prefix.clone())
    }

    pub fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }

    /// Normalize one table.
    ///
    /// Fails with [`Error::Schema`] when the timestamp column is missing, any
    /// timestamp is unparseable, or the role's required columns are absent.
    pub fn normalize(&self, table: &RawTable, role: SeriesRole) -> Result<NormalizedSeries> {
        let ts_col = table.column_index(&self.timestamp_column).ok_or_else(|| {
            Error::schema(format!(
                "table '{}': missing timestamp column '{}'",
                table.name, self.timestamp_column
            ))
        })?;

        let mut fields = Vec::new();
        let mut field_cols = Vec::new();
        for (col, name) in table.columns.iter().enumerate() {
            if col == ts_col {
                continue;
            }
            if role == SeriesRole::Predicted && !name.starts_with(&self.predicted_prefix) {
                tracing::debug!(
                    table = %table.name,
                    column = %name,
                    "excluding unprefixed predicted column"
                );
                continue;
            }
            if is_numeric_column(table, col) {
                fields.push(name.clone());
                field_cols.push(col);
            } else {
                tracing::debug!(
                    table = %table.name,
                    column = %name,
                    "excluding non-numeric column"
                );
            }
        }
        check_required(&table.name, &fields, role)?;

        let mut stamps: Vec<Timestamp> = Vec::with_capacity(table.len());
        for (row_no, row) in table.rows.iter().enumerate() {
            let cell = row.get(ts_col);
            let ts = cell.and_then(parse_timestamp).ok_or_else(|| {
                Error::schema(format!(
                    "table '{}': unparseable timestamp {:?} in row {}",
                    table.name, cell, row_no
                ))
            })?;
            stamps.push(ts);
        }

        // Last occurrence of each timestamp in load order.
        let mut last: HashMap<Timestamp, usize> = HashMap::with_capacity(stamps.len());
        for (i, ts) in stamps.iter().enumerate() {
            last.insert(*ts, i);
        }

        let mut records = Vec::with_capacity(last.len());
        for (i, (row, ts)) in table.rows.iter().zip(&stamps).enumerate() {
            if last.get(ts) != Some(&i) {
                continue;
            }
            let values = field_cols
                .iter()
                .map(|&c| {
                    row.get(c)
                        .and_then(|v| v.as_f64())
                        .filter(|v| v.is_finite())
                })
                .collect();
            records.push(TimeSeriesRecord { ts: *ts, values });
        }

        let dropped = table.len() - records.len();
        if dropped > 0 {
            tracing::debug!(
                table = %table.name,
                dropped,
                "dropped duplicate timestamps, last row kept"
            );
        }

        NormalizedSeries::new(table.name.clone(), fields, records)
    }
}

impl Default for SeriesNormalizer {
    fn default() -> Self {
        Self::new(columns::DATETIME)
    }
}

/// A column is numeric when every non-NULL cell converts to a float.
fn is_numeric_column(table: &RawTable, col: usize) -> bool {
    table.rows.iter().all(|row| match row.get(col) {
        Some(cell) => cell.is_null() || cell.as_f64().is_some(),
        None => true,
    })
}

fn check_required(table: &str, fields: &[String], role: SeriesRole) -> Result<()> {
    let has = |name: &str| fields.iter().any(|f| f == name);
    match role {
        SeriesRole::Actual => {
            let missing: Vec<&str> = columns::ACTUAL_OHLC
                .iter()
                .copied()
                .filter(|c| !has(*c))
                .collect();
            if !missing.is_empty() {
                return Err(Error::schema(format!(
                    "table '{}': missing numeric column(s) {}",
                    table,
                    missing.join(", ")
                )));
            }
        }
        SeriesRole::Predicted => {
            if !columns::PREDICTED_OHLC.iter().any(|c| has(*c)) {
                return Err(Error::schema(format!(
                    "table '{}': none of {} present",
                    table,
                    columns::PREDICTED_OHLC.join(", ")
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use predchart_core::Scalar;

    fn at(h: u32, m: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn actual_table(rows: &[(&str, f64)]) -> RawTable {
        let mut table = RawTable::new(
            "NIFTY50",
            ["Datetime", "Open", "High", "Low", "Close"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        for (ts, close) in rows {
            table
                .push_row(vec![
                    Scalar::from(*ts),
                    Scalar::from(100.0),
                    Scalar::from(105.0),
                    Scalar::from(99.0),
                    Scalar::from(*close),
                ])
                .unwrap();
        }
        table
    }

    #[test]
    fn test_last_duplicate_wins() {
        let table = actual_table(&[
            ("2024-01-01 09:15:00", 103.0),
            ("2024-01-01 09:15:00", 104.0),
        ]);
        let series = SeriesNormalizer::default().normalize(&table, SeriesRole::Actual).unwrap();
        assert_eq!(series.len(), 1);
        assert_relative_eq!(series.value(&at(9, 15), "Close").unwrap(), 104.0);
    }

    #[test]
    fn test_dedup_keeps_position_of_last_row() {
        let table = actual_table(&[
            ("2024-01-01 09:15:00", 10.0),
            ("2024-01-01 09:16:00", 20.0),
            ("2024-01-01 09:15:00", 12.0),
            ("2024-01-01 09:17:00", 30.0),
            ("2024-01-01 09:15:00", 14.0),
        ]);
        let series = SeriesNormalizer::default().normalize(&table, SeriesRole::Actual).unwrap();
        let order: Vec<Timestamp> = series.records().iter().map(|r| r.ts).collect();
        assert_eq!(order, vec![at(9, 16), at(9, 17), at(9, 15)]);
        assert_relative_eq!(series.value(&at(9, 15), "Close").unwrap(), 14.0);
    }

    #[test]
    fn test_duplicate_across_offsets() {
        // Same instant spelled in two zones; the later row wins.
        let table = actual_table(&[
            ("2024-01-01 09:15:00+05:30", 10.0),
            ("2024-01-01T03:45:00Z", 12.0),
        ]);
        let series = SeriesNormalizer::default().normalize(&table, SeriesRole::Actual).unwrap();
        assert_eq!(series.len(), 1);
        assert_relative_eq!(series.value(&at(3, 45), "Close").unwrap(), 12.0);
    }

    #[test]
    fn test_missing_timestamp_column() {
        let table = RawTable::new(
            "T",
            vec!["Open".into(), "High".into(), "Low".into(), "Close".into()],
        );
        let err = SeriesNormalizer::default().normalize(&table, SeriesRole::Actual).unwrap_err();
        assert!(matches!(err, Error::Schema(ref m) if m.contains("Datetime")));
    }

    #[test]
    fn test_unparseable_timestamp_fails_whole_table() {
        let table = actual_table(&[("2024-01-01 09:15:00", 1.0), ("yesterday", 2.0)]);
        let err = SeriesNormalizer::default().normalize(&table, SeriesRole::Actual).unwrap_err();
        assert!(matches!(err, Error::Schema(ref m) if m.contains("row 1")));
    }

    #[test]
    fn test_null_timestamp_fails() {
        let mut table = actual_table(&[]);
        table
            .push_row(vec![Scalar::Null, 1.0.into(), 1.0.into(), 1.0.into(), 1.0.into()])
            .unwrap();
        assert!(SeriesNormalizer::default().normalize(&table, SeriesRole::Actual).is_err());
    }

    #[test]
    fn test_actual_requires_ohlc() {
        let mut table = RawTable::new("T", vec!["Datetime".into(), "Close".into()]);
        table.push_row(vec!["2024-01-01".into(), 1.0.into()]).unwrap();
        let err = SeriesNormalizer::default().normalize(&table, SeriesRole::Actual).unwrap_err();
        assert!(matches!(err, Error::Schema(ref m) if m.contains("Open, High, Low")));
    }

    #[test]
    fn test_predicted_requires_any_predicted_column() {
        let mut table = RawTable::new("T_predictions", vec!["Datetime".into(), "Score".into()]);
        table.push_row(vec!["2024-01-01".into(), 1.0.into()]).unwrap();
        assert!(SeriesNormalizer::default().normalize(&table, SeriesRole::Predicted).is_err());

        let mut table = RawTable::new(
            "T_predictions",
            vec!["Datetime".into(), "Predicted_Close".into()],
        );
        table.push_row(vec!["2024-01-01".into(), 1.0.into()]).unwrap();
        let series = SeriesNormalizer::default().normalize(&table, SeriesRole::Predicted).unwrap();
        assert_eq!(series.fields(), &["Predicted_Close".to_string()]);
    }

    #[test]
    fn test_predicted_keeps_prefixed_fields_only() {
        let mut table = RawTable::new(
            "T_predictions",
            ["index", "Datetime", "Predicted_Close"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        table
            .push_row(vec![Scalar::Integer(0), "2024-01-01".into(), 1.0.into()])
            .unwrap();
        let series = SeriesNormalizer::default().normalize(&table, SeriesRole::Predicted).unwrap();
        assert_eq!(series.fields(), &["Predicted_Close".to_string()]);
    }

    #[test]
    fn test_non_numeric_column_excluded() {
        let mut table = RawTable::new(
            "T",
            ["Datetime", "Symbol", "Open", "High", "Low", "Close"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        table
            .push_row(vec![
                "2024-01-01 09:15".into(),
                "NIFTY".into(),
                "100".into(),
                101.0.into(),
                99.0.into(),
                Scalar::Null,
            ])
            .unwrap();
        let series = SeriesNormalizer::default().normalize(&table, SeriesRole::Actual).unwrap();
        assert_eq!(series.fields(), &["Open", "High", "Low", "Close"]);
        assert_relative_eq!(series.value(&at(9, 15), "Open").unwrap(), 100.0);
        assert_eq!(series.value(&at(9, 15), "Close"), None);
    }

    #[test]
    fn test_non_finite_values_are_null() {
        let mut table = RawTable::new(
            "T_predictions",
            vec!["Datetime".into(), "Predicted_Close".into()],
        );
        table.push_row(vec!["2024-01-01 09:15".into(), "nan".into()]).unwrap();
        table.push_row(vec!["2024-01-01 09:16".into(), "inf".into()]).unwrap();
        table.push_row(vec!["2024-01-01 09:17".into(), 7.0.into()]).unwrap();
        let series = SeriesNormalizer::default()
            .normalize(&table, SeriesRole::Predicted)
            .unwrap();
        assert_eq!(series.fields(), &["Predicted_Close".to_string()]);
        assert_eq!(series.value(&at(9, 15), "Predicted_Close"), None);
        assert_eq!(series.value(&at(9, 16), "Predicted_Close"), None);
        assert_relative_eq!(series.value(&at(9, 17), "Predicted_Close").unwrap(), 7.0);
    }

    #[test]
    fn test_custom_timestamp_column() {
        let mut table = RawTable::new("T_predictions", vec!["ts".into(), "Predicted_Close".into()]);
        table.push_row(vec![Scalar::Integer(1_704_067_200_000), 5.0.into()]).unwrap();
        let series = SeriesNormalizer::new("ts").normalize(&table, SeriesRole::Predicted).unwrap();
        assert_relative_eq!(series.value(&at(0, 0), "Predicted_Close").unwrap(), 5.0);
    }

    #[test]
    fn test_empty_table_is_valid() {
        let table = actual_table(&[]);
        let series = SeriesNormalizer::default().normalize(&table, SeriesRole::Actual).unwrap();
        assert!(series.is_empty());
    }
}
