//! Data layer: format detection, parsing, and normalization.
//!
//! Architecture:
//! ```text
//!  .txt / .csv / .DTA / .mpr
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  source   │  sniff header → SourceFormat / ChiKind
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  parser   │  locate data region → ParsedTable (canonical names)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │   eis     │  assemble (freq, complex impedance)
//!   └──────────┘
//! ```
//!
//! `chi` is the single-purpose CHI loader feeding the simple conversion
//! mode; `timestamp` orders files within a batch; `mpr` is the boundary to
//! the external BioLogic binary reader.

pub mod chi;
pub mod eis;
pub mod mpr;
pub mod parser;
pub mod source;
pub mod table;
pub mod timestamp;

use std::path::Path;

use crate::error::Result;

/// Decode raw file bytes: UTF-8 with a Latin-1 fallback, BOM stripped.
/// Latin-1 maps every byte, so text decoding itself never fails.
pub(crate) fn read_text_bytes(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };
    text.trim_start_matches('\u{feff}').to_string()
}

/// Read a file's full contents as text. The file is read once and the
/// handle closed before parsing begins.
pub fn read_text(path: &Path) -> Result<String> {
    Ok(read_text_bytes(std::fs::read(path)?))
}
