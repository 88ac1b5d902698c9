//! Left join of an actual series against its predicted counterpart.
//!
//! Every actual timestamp yields exactly one aligned row, in actual order.
//! Timestamps that exist only in the predicted series are dropped.

use predchart_core::{AlignedDataset, AlignedRow, Error, NormalizedSeries, Result};

/// Join `actual` with an optional `predicted` series on timestamp.
///
/// An absent predicted series is not an error: every row then carries no
/// predicted values. Fails with [`Error::SchemaConflict`] if both series
/// share a field name.
pub fn align(
    actual: &NormalizedSeries,
    predicted: Option<&NormalizedSeries>,
) -> Result<AlignedDataset> {
    if let Some(pred) = predicted {
        let clashes: Vec<&str> = pred
            .fields()
            .iter()
            .filter(|f| actual.field_index(f).is_some())
            .map(String::as_str)
            .collect();
        if !clashes.is_empty() {
            return Err(Error::schema_conflict(format!(
                "'{}' and '{}' both define {}",
                actual.name(),
                pred.name(),
                clashes.join(", ")
            )));
        }
    }

    let rows: Vec<AlignedRow> = actual
        .records()
        .iter()
        .map(|record| AlignedRow {
            ts: record.ts,
            actual: record.values.clone(),
            predicted: predicted
                .and_then(|p| p.get(&record.ts))
                .map(|r| r.values.clone()),
        })
        .collect();

    let dataset = AlignedDataset {
        name: actual.name().to_string(),
        predicted_name: predicted.map(|p| p.name().to_string()),
        actual_fields: actual.fields().to_vec(),
        predicted_fields: predicted.map(|p| p.fields().to_vec()).unwrap_or_default(),
        rows,
    };

    tracing::debug!(
        table = %dataset.name,
        rows = dataset.len(),
        matched = dataset.matched_rows(),
        "aligned series"
    );
    Ok(dataset)
}
