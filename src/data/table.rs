use chrono::{Duration, NaiveDateTime};
use log::warn;

// ---------------------------------------------------------------------------
// Canonical column names
// ---------------------------------------------------------------------------

/// Canonical EIS column names every vendor table is mapped onto.
pub const FREQ: &str = "Freq";
pub const ZREAL: &str = "Zreal";
pub const ZIMAG: &str = "Zimag";
pub const ZMOD: &str = "Zmod";
pub const ZPHZ: &str = "Zphz";
pub const TIMESTAMP: &str = "timestamp";

/// Elapsed-time column candidates, checked in this order when deriving the
/// absolute `timestamp` column.
const TIME_COLUMNS: [&str; 5] = ["Time", "T", "time", "time/s", "elapsed"];

// ---------------------------------------------------------------------------
// ParsedTable
// ---------------------------------------------------------------------------

/// Values of one named column: numeric, or the derived absolute timestamps.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<f64>),
    Time(Vec<NaiveDateTime>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A rectangular table of named columns, rows aligned by position.
///
/// Column order is insertion order. Invariant: all columns have equal
/// length, maintained by [`ParsedTable::push_column`].
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    columns: Vec<(String, ColumnData)>,
}

impl ParsedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Its length must match the existing rows.
    pub fn push_column(&mut self, name: impl Into<String>, data: ColumnData) {
        debug_assert!(
            self.columns.is_empty() || data.len() == self.n_rows(),
            "column length mismatch"
        );
        self.columns.push((name.into(), data));
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Numeric values of the named column, if present and numeric.
    pub fn floats(&self, name: &str) -> Option<&[f64]> {
        match self.column(name)? {
            ColumnData::Float(v) => Some(v),
            ColumnData::Time(_) => None,
        }
    }

    /// Rename a column in place. Returns whether the column existed.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        match self.columns.iter_mut().find(|(n, _)| n == from) {
            Some((n, _)) => {
                *n = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Negate a numeric column in place. Returns whether it existed.
    pub fn negate(&mut self, name: &str) -> bool {
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, ColumnData::Float(v))) => {
                for x in v.iter_mut() {
                    *x = -*x;
                }
                true
            }
            _ => false,
        }
    }

    /// Derive `Zmod` and `Zphz` (degrees) from `Zreal`/`Zimag` when the
    /// vendor omitted them.
    pub fn derive_polar(&mut self) {
        let (re, im) = match (self.floats(ZREAL), self.floats(ZIMAG)) {
            (Some(re), Some(im)) => (re.to_vec(), im.to_vec()),
            _ => return,
        };
        if !self.contains(ZMOD) {
            let zmod = re.iter().zip(&im).map(|(r, i)| r.hypot(*i)).collect();
            self.push_column(ZMOD, ColumnData::Float(zmod));
        }
        if !self.contains(ZPHZ) {
            let zphz = re
                .iter()
                .zip(&im)
                .map(|(r, i)| i.atan2(*r).to_degrees())
                .collect();
            self.push_column(ZPHZ, ColumnData::Float(zphz));
        }
    }

    /// Append an absolute `timestamp` column: experiment start plus the
    /// table's elapsed-seconds column, when one exists. Failure to append
    /// is a logged warning, never an error.
    pub fn append_timestamps(&mut self, start: NaiveDateTime) {
        let Some(elapsed) = TIME_COLUMNS.iter().find_map(|c| self.floats(c)) else {
            return;
        };
        if elapsed.iter().any(|s| !s.is_finite()) {
            warn!("non-finite elapsed times; timestamp column skipped");
            return;
        }
        let stamps: Vec<NaiveDateTime> = elapsed
            .iter()
            .map(|&s| start + Duration::milliseconds((s * 1000.0).round() as i64))
            .collect();
        self.push_column(TIMESTAMP, ColumnData::Time(stamps));
    }
}
