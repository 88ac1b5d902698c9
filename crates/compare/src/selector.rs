//! Comparison selection.
//!
//! Picks the rendering mode for an aligned dataset from the predicted fields
//! it actually carries. Rules are checked in order, first match wins:
//!
//! | Available predicted data                         | Plan              |
//! |--------------------------------------------------|-------------------|
//! | one row with all four predicted OHLC values set  | FullOverlay       |
//! | `Predicted_Close` set in at least one row        | PredictedLineOnly |
//! | otherwise                                        | Skip              |

use predchart_core::{AlignedDataset, ComparisonPlan, OhlcFields, SkipReason};

/// Decide how to render `dataset`.
pub fn plan(dataset: &AlignedDataset) -> ComparisonPlan {
    let actual = OhlcFields::actual();
    let predicted = OhlcFields::predicted();

    if dataset.predicted_name.is_none() {
        return ComparisonPlan::Skip {
            reason: SkipReason::PredictedAbsent,
        };
    }

    if has_full_row(dataset, &predicted) {
        return ComparisonPlan::FullOverlay { actual, predicted };
    }

    if dataset.has_field(&predicted.close) && dataset.is_populated(&predicted.close) {
        return ComparisonPlan::PredictedLineOnly {
            actual,
            predicted_close: predicted.close,
        };
    }

    ComparisonPlan::Skip {
        reason: SkipReason::NoPredictedPrices,
    }
}

/// Whether some row carries all four fields with non-NULL values.
fn has_full_row(dataset: &AlignedDataset, fields: &OhlcFields) -> bool {
    let names = fields.names();
    if !names.iter().all(|f| dataset.has_field(f)) {
        return false;
    }
    dataset
        .rows
        .iter()
        .any(|row| names.iter().all(|f| dataset.value(row, f).is_some()))
}
