use std::fmt;

use crate::data::timestamp::parse_chi_header;

// ---------------------------------------------------------------------------
// Source formats
// ---------------------------------------------------------------------------

/// Vendor family of an instrument export.
///
/// Instrument files carry no format tag, so the vendor is identified from
/// header content alone. The file extension is never trusted for detection;
/// it only disambiguates encodings of an already-declared vendor (CHI
/// `.txt` vs `.csv`, BioLogic text vs `.mpr` binary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Chi,
    Gamry,
    ZPlot,
    BioLogic,
    RelaxIs,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Chi => "CHI",
            SourceFormat::Gamry => "Gamry",
            SourceFormat::ZPlot => "ZPlot",
            SourceFormat::BioLogic => "BioLogic",
            SourceFormat::RelaxIs => "RelaxIS",
        };
        write!(f, "{name}")
    }
}

/// Measurement kind of a CHI export, determined by its column-header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChiKind {
    Eis,
    Tafel,
    Cv,
    Ca,
    Cp,
}

impl fmt::Display for ChiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChiKind::Eis => "EIS",
            ChiKind::Tafel => "Tafel",
            ChiKind::Cv => "CV",
            ChiKind::Ca => "CA",
            ChiKind::Cp => "CP",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Classify a file from its first line. Returns `None` when no rule matches.
///
/// Rules are checked in priority order; real vendor headers are mutually
/// exclusive, so the first match wins. The CHI rule is a timestamp parse:
/// CHI exports put the experiment start time on line one and nothing else.
pub fn detect_source(text: &str) -> Option<SourceFormat> {
    let first = text.lines().next().unwrap_or("");

    if first == "EXPLAIN" {
        Some(SourceFormat::Gamry)
    } else if first == "ZPLOT2 ASCII" {
        Some(SourceFormat::ZPlot)
    } else if first.starts_with("BIO-LOGIC") {
        Some(SourceFormat::BioLogic)
    } else if first.split(' ').next() == Some("RelaxIS") {
        Some(SourceFormat::RelaxIs)
    } else if parse_chi_header(first).is_some() {
        Some(SourceFormat::Chi)
    } else {
        None
    }
}

/// Scan every line for one of the five CHI column-header signatures and
/// return the index of the first matching line together with its kind.
///
/// `None` means "not a CHI data file of any known kind", which is a
/// recoverable condition for the caller, not a fault. Tafel must be checked
/// before CV: its header extends the CV header with a `log(i/A)` column.
pub fn find_chi_header(text: &str) -> Option<(usize, ChiKind)> {
    for (i, line) in text.lines().enumerate() {
        if line.starts_with("Freq/Hz") {
            return Some((i, ChiKind::Eis));
        } else if line.starts_with("Potential/V, Current/A, log(i/A)") {
            return Some((i, ChiKind::Tafel));
        } else if line.starts_with("Potential/V") {
            return Some((i, ChiKind::Cv));
        } else if line.starts_with("Time/sec, Current/A") {
            return Some((i, ChiKind::Ca));
        } else if line.starts_with("Time/sec, Potential/V") {
            return Some((i, ChiKind::Cp));
        }
    }
    None
}
