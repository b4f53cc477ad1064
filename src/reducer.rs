use crate::driver::RawResult;
use serde::Serialize;
use tracing::warn;

/// Column separator used when flattening a row
pub const DELIMITER: char = ' ';

/// Rendering of SQL NULL inside a flattened row
pub const NULL_TEXT: &str = "null";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Integer,
    Float,
    Text,
}

/// The single scalar a check reports
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
        }
    }

    /// Numeric value, `None` for text
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReducedOutcome {
    pub row_count: u64,
    pub value: ScalarValue,
}

/// Collapse a result set into a row count and one scalar.
///
/// Every row is visited and counted but only the flattened text of the
/// last row is kept.
pub fn reduce(cursor: &mut RawResult) -> ReducedOutcome {
    let mut row_count = cursor.passed();
    let mut retained = String::new();

    while let Some(row) = cursor.next_row() {
        row_count += 1;
        retained = flatten_row(&row);
    }

    let retained = retained.trim();
    if retained.is_empty() {
        warn!(row_count, "the string result is empty");
    }

    ReducedOutcome {
        row_count,
        value: classify(retained),
    }
}

/// Join the columns of a row with [`DELIMITER`]
#[must_use]
pub fn flatten_row(row: &[Option<String>]) -> String {
    let mut text = String::new();
    for (index, column) in row.iter().enumerate() {
        if index > 0 {
            text.push(DELIMITER);
        }
        text.push_str(column.as_deref().unwrap_or(NULL_TEXT));
    }
    text
}

/// Sniff the type of an already trimmed value.
///
/// A dot means float, otherwise integer; anything that fails to parse
/// stays text.
#[must_use]
pub fn classify(text: &str) -> ScalarValue {
    let parsed = if text.contains('.') {
        text.parse::<f64>().ok().map(ScalarValue::Float)
    } else {
        text.parse::<i64>().ok().map(ScalarValue::Integer)
    };

    parsed.unwrap_or_else(|| ScalarValue::Text(text.to_string()))
}
