use std::path::Path;

use chrono::NaiveDateTime;

use crate::data::table::ParsedTable;
use crate::error::Result;

/// Boundary to the BioLogic binary container reader.
///
/// The byte-level .mpr layout belongs to an external collaborator; the
/// contract here is "give me a structured table and optional timestamp
/// fields". A BioLogic binary file encountered with no reader registered
/// is an explicit [`crate::error::LoadError::MprReaderUnavailable`] fault —
/// there is no fallback parse path for this format.
pub trait MprReader {
    fn read(&self, path: &Path) -> Result<MprData>;
}

/// Structured contents of one .mpr file, as delivered by the reader.
#[derive(Debug, Clone)]
pub struct MprData {
    /// Raw vendor-named columns (`freq/Hz`, `Re(Z)/Ohm`, `-Im(Z)/Ohm`, ...),
    /// normalized to canonical names by the caller.
    pub table: ParsedTable,
    /// Acquisition timestamp embedded in the file, when present.
    pub timestamp: Option<NaiveDateTime>,
    /// Start date recorded in the file, used when `timestamp` is absent.
    pub start_date: Option<NaiveDateTime>,
}

impl MprData {
    /// Preferred experiment start time: the embedded timestamp, falling
    /// back to the start date.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.timestamp.or(self.start_date)
    }
}
