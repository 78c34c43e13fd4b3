//! Recoverable proxy errors.
//!
//! Handle misuse (an index from another model, an index without a bound
//! mapping) is not represented here: it panics, because continuing would
//! hand out addresses into the wrong rows.

use std::fmt;

/// Error returned when a sort request is rejected.
///
/// Rejection happens before any state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The key column is not below the current column count.
    KeyColumnOutOfRange { column: usize, column_count: usize },
    /// The source reports the column as not sortable.
    ColumnNotSortable { column: usize },
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyColumnOutOfRange {
                column,
                column_count,
            } => write!(
                f,
                "sort key column {column} out of range (source has {column_count} columns)"
            ),
            Self::ColumnNotSortable { column } => write!(f, "column {column} is not sortable"),
        }
    }
}

impl std::error::Error for ProxyError {}
