//! Multi-vendor EIS reading and impedance assembly.

use std::path::Path;

use chrono::NaiveDateTime;
use log::warn;
use num_complex::Complex64;

use crate::data::mpr::MprReader;
use crate::data::parser;
use crate::data::read_text;
use crate::data::source::{detect_source, SourceFormat};
use crate::data::table::{ParsedTable, FREQ, ZIMAG, ZREAL};
use crate::data::timestamp::{chi_timestamp, gamry_timestamp, modified_time, zplot_timestamp};
use crate::error::{LoadError, Result};

/// One EIS measurement: frequency sweep and complex impedance, index
/// aligned.
#[derive(Debug, Clone)]
pub struct EisSpectrum {
    pub freq: Vec<f64>,
    pub z: Vec<Complex64>,
}

impl EisSpectrum {
    pub fn len(&self) -> usize {
        self.freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }
}

/// Extract (frequency, complex impedance) from a normalized table,
/// optionally restricted to `min_freq <= f <= max_freq`.
///
/// The two bounds apply independently and commute. Fails with
/// `MissingColumns` when the canonical columns are absent.
pub fn assemble_eis(
    table: &ParsedTable,
    min_freq: Option<f64>,
    max_freq: Option<f64>,
) -> Result<EisSpectrum> {
    let missing: Vec<&str> = [FREQ, ZREAL, ZIMAG]
        .into_iter()
        .filter(|c| table.floats(c).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing.join(", ")));
    }

    let freq_col = table.floats(FREQ).unwrap_or_default();
    let re = table.floats(ZREAL).unwrap_or_default();
    let im = table.floats(ZIMAG).unwrap_or_default();

    let mut freq = Vec::new();
    let mut z = Vec::new();
    for i in 0..freq_col.len() {
        let f = freq_col[i];
        if min_freq.map_or(true, |m| f >= m) && max_freq.map_or(true, |m| f <= m) {
            freq.push(f);
            z.push(Complex64::new(re[i], im[i]));
        }
    }
    Ok(EisSpectrum { freq, z })
}

// ---------------------------------------------------------------------------
// EisReader
// ---------------------------------------------------------------------------

/// Reader for EIS files of every supported vendor.
///
/// Owns the optional BioLogic binary reader; everything else is plain
/// text sniffed from header content.
#[derive(Default)]
pub struct EisReader {
    mpr: Option<Box<dyn MprReader>>,
}

impl EisReader {
    pub fn new() -> Self {
        Self { mpr: None }
    }

    /// Reader with a BioLogic .mpr collaborator registered.
    pub fn with_mpr_reader(mpr: Box<dyn MprReader>) -> Self {
        Self { mpr: Some(mpr) }
    }

    /// Experiment start time of a file of any supported format.
    ///
    /// `TimestampUnavailable` is recoverable: the batch keeps the file and
    /// only drops it from ordering.
    pub fn timestamp(&self, path: &Path) -> Result<NaiveDateTime> {
        let text = read_text(path)?;
        self.timestamp_of(path, &text, detect_source(&text))
    }

    fn timestamp_of(
        &self,
        path: &Path,
        text: &str,
        source: Option<SourceFormat>,
    ) -> Result<NaiveDateTime> {
        let unavailable = || LoadError::TimestampUnavailable(path.to_path_buf());
        match source {
            Some(SourceFormat::Chi) => chi_timestamp(text).ok_or_else(unavailable),
            Some(SourceFormat::Gamry) => gamry_timestamp(text).ok_or_else(unavailable),
            Some(SourceFormat::ZPlot) => zplot_timestamp(text).ok_or_else(unavailable),
            Some(SourceFormat::BioLogic) => {
                let reader = self
                    .mpr
                    .as_deref()
                    .ok_or_else(|| LoadError::MprReaderUnavailable(path.to_path_buf()))?;
                reader.read(path)?.start_time().ok_or_else(unavailable)
            }
            // RelaxIS files carry no extractable timestamp.
            Some(SourceFormat::RelaxIs) => Err(unavailable()),
            None => modified_time(path).ok_or_else(unavailable),
        }
    }

    /// Read a file into the canonical EIS table.
    ///
    /// Dispatch: `.mpr` goes through the binary collaborator; a `.txt`/
    /// `.csv` containing a `Freq/Hz` header is tried as CHI first; anything
    /// else is classified from its first line.
    pub fn get_eis(&self, path: &Path) -> Result<ParsedTable> {
        if extension(path) == "mpr" {
            let reader = self
                .mpr
                .as_deref()
                .ok_or_else(|| LoadError::MprReaderUnavailable(path.to_path_buf()))?;
            let data = reader.read(path)?;
            let start = data.start_time();
            let mut table = data.table;
            parser::normalize_columns(&mut table, SourceFormat::BioLogic);
            if let Some(start) = start {
                table.append_timestamps(start);
            }
            return Ok(table);
        }

        let text = read_text(path)?;

        if matches!(extension(path).as_str(), "txt" | "csv") && text.contains("Freq/Hz") {
            match parser::parse(&text, SourceFormat::Chi) {
                Ok(mut table) => {
                    if let Some(start) = chi_timestamp(&text) {
                        table.append_timestamps(start);
                    }
                    return Ok(table);
                }
                Err(e) => {
                    warn!("{}: CHI parse failed, trying header detection: {e}", path.display());
                }
            }
        }

        let source = detect_source(&text)
            .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
        let mut table = parser::parse(&text, source)?;
        match self.timestamp_of(path, &text, Some(source)) {
            Ok(start) => table.append_timestamps(start),
            Err(e) => warn!("{}: no start time for timestamp column: {e}", path.display()),
        }
        Ok(table)
    }

    /// Read a file and assemble its (frequency, impedance) arrays.
    pub fn get_eis_tuple(
        &self,
        path: &Path,
        min_freq: Option<f64>,
        max_freq: Option<f64>,
    ) -> Result<EisSpectrum> {
        let table = self.get_eis(path)?;
        assemble_eis(&table, min_freq, max_freq)
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}
