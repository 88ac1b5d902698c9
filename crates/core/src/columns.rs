//! Expected column names (case-sensitive).

/// Timestamp column shared by actual and predicted tables.
pub const DATETIME: &str = "Datetime";

pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";

/// Namespace of predicted fields.
pub const PREDICTED_PREFIX: &str = "Predicted_";

pub const PREDICTED_OPEN: &str = "Predicted_Open";
pub const PREDICTED_HIGH: &str = "Predicted_High";
pub const PREDICTED_LOW: &str = "Predicted_Low";
pub const PREDICTED_CLOSE: &str = "Predicted_Close";

/// Columns an actual table must carry besides the timestamp.
pub const ACTUAL_OHLC: [&str; 4] = [OPEN, HIGH, LOW, CLOSE];

/// Columns a predicted table may carry; at least one is required.
pub const PREDICTED_OHLC: [&str; 4] = [
    PREDICTED_OPEN,
    PREDICTED_HIGH,
    PREDICTED_LOW,
    PREDICTED_CLOSE,
];
