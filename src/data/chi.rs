//! Single-purpose loader for CHI potentiostat exports.
//!
//! Unlike the multi-vendor EIS reader, this loader handles every CHI
//! measurement kind (EIS, Tafel, CV, CA, CP) and feeds the simple batch
//! conversion mode: each file reduces to one (x, y) series pair.

use std::path::Path;

use chrono::NaiveDateTime;
use num_complex::Complex64;

use crate::data::eis::EisSpectrum;
use crate::data::source::{find_chi_header, ChiKind};
use crate::data::timestamp::parse_chi_header;
use crate::data::{read_text, read_text_bytes};
use crate::error::{LoadError, Result};

/// One extracted (x, y) series with its axis labels — the unit of output
/// for the simple conversion mode and the plotting payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPair {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub labels: [String; 2],
}

/// First-line experiment start time, or `None` when the file is missing,
/// undecodable, or the line does not match the CHI pattern. Never a fault:
/// the batch pre-pass uses this as a boolean CHI test as well.
pub fn file_timestamp(path: &Path) -> Option<NaiveDateTime> {
    let bytes = std::fs::read(path).ok()?;
    let text = read_text_bytes(bytes);
    parse_chi_header(text.lines().next()?)
}

/// Read the requested columns of a CHI file of the expected kind.
///
/// Rows with any blank or unparseable cell among the selected columns are
/// dropped whole.
fn load_columns(path: &Path, expected: ChiKind, usecols: &[usize]) -> Result<(Vec<String>, Vec<Vec<f64>>)> {
    let text = read_text(path)?;
    let not_of_kind = || LoadError::NotOfKind {
        expected,
        path: path.to_path_buf(),
    };
    let (header_idx, kind) = find_chi_header(&text).ok_or_else(not_of_kind)?;
    if kind != expected {
        return Err(not_of_kind());
    }

    let lines: Vec<&str> = text.lines().collect();
    let header: Vec<&str> = lines[header_idx].split(',').collect();
    let names: Vec<String> = usecols
        .iter()
        .map(|&c| header.get(c).map_or("", |s| s.trim()).to_string())
        .collect();

    let mut cols: Vec<Vec<f64>> = vec![Vec::new(); usecols.len()];
    for line in &lines[header_idx + 1..] {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').collect();
        let row: Vec<Option<f64>> = usecols
            .iter()
            .map(|&c| {
                cells
                    .get(c)
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .and_then(|s| s.parse::<f64>().ok())
            })
            .collect();
        if row.iter().all(Option::is_some) {
            for (col, v) in cols.iter_mut().zip(row) {
                col.push(v.unwrap_or(f64::NAN));
            }
        }
    }
    Ok((names, cols))
}

fn series(path: &Path, expected: ChiKind, usecols: &[usize]) -> Result<SeriesPair> {
    let (names, mut cols) = load_columns(path, expected, usecols)?;
    let y = cols.pop().unwrap_or_default();
    let x = cols.pop().unwrap_or_default();
    Ok(SeriesPair {
        x,
        y,
        labels: [names[0].clone(), names[1].clone()],
    })
}

/// EIS data as (frequency, complex impedance), canonical sign convention,
/// optionally restricted to `min_freq <= f <= max_freq`.
pub fn get_eis(path: &Path, min_freq: Option<f64>, max_freq: Option<f64>) -> Result<EisSpectrum> {
    let (_, cols) = load_columns(path, ChiKind::Eis, &[0, 1, 2])?;
    let mut freq = Vec::new();
    let mut z = Vec::new();
    for i in 0..cols[0].len() {
        let f = cols[0][i];
        if min_freq.map_or(true, |m| f >= m) && max_freq.map_or(true, |m| f <= m) {
            freq.push(f);
            z.push(Complex64::new(cols[1][i], cols[2][i]));
        }
    }
    Ok(EisSpectrum { freq, z })
}

/// ZView-style export of an EIS file.
///
/// Writes `{stem}_ZView.txt` next to the source — tab-separated, no header,
/// freq/real/imag with the canonical sign — and returns the Nyquist series
/// with the imaginary part negated. The negation is the ZView plotting
/// convention, kept as its own output path; the written file is canonical.
pub fn get_zview(path: &Path) -> Result<SeriesPair> {
    let (_, cols) = load_columns(path, ChiKind::Eis, &[0, 1, 2])?;
    let stem = path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    let out = path.with_file_name(format!("{stem}_ZView.txt"));

    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_path(&out)?;
    for i in 0..cols[0].len() {
        writer.write_record([
            cols[0][i].to_string(),
            cols[1][i].to_string(),
            cols[2][i].to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(SeriesPair {
        x: cols[1].clone(),
        y: cols[2].iter().map(|v| -v).collect(),
        labels: ["z_real/Ω".to_string(), "z_imag/Ω".to_string()],
    })
}

/// CV (or LSV) data: potential vs current.
pub fn get_cv(path: &Path) -> Result<SeriesPair> {
    series(path, ChiKind::Cv, &[0, 1])
}

/// Tafel data: potential vs log-current.
pub fn get_tafel(path: &Path) -> Result<SeriesPair> {
    series(path, ChiKind::Tafel, &[0, 2])
}

/// CA data: time vs current.
pub fn get_ca(path: &Path) -> Result<SeriesPair> {
    series(path, ChiKind::Ca, &[0, 1])
}

/// CP data: time vs potential.
pub fn get_cp(path: &Path) -> Result<SeriesPair> {
    series(path, ChiKind::Cp, &[0, 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const CV_FILE: &str = "Jan. 1, 2024 10:00:00\nCyclic Voltammetry\n\n\
                           Potential/V, Current/A\n\
                           0.1, 1e-5\n\
                           0.2, 2e-5\n\
                           0.3, 3e-5\n";

    const EIS_FILE: &str = "Jan. 1, 2024 10:00:00\nA.C. Impedance\n\n\
                            Freq/Hz, Z'/ohm, Z\"/ohm\n\
                            100000, 0.5, -0.1\n\
                            1000, 0.6, -0.2\n\
                            10, 0.7, -0.3\n";

    #[test]
    fn file_timestamp_reads_first_line() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "cv.txt", CV_FILE);
        let ts = file_timestamp(&path).unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-01 10:00:00");

        let bad = write_file(dir.path(), "bad.txt", "no timestamp here\n");
        assert_eq!(file_timestamp(&bad), None);
    }

    #[test]
    fn cv_series_and_labels() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "cv.txt", CV_FILE);
        let s = get_cv(&path).unwrap();
        assert_eq!(s.x, vec![0.1, 0.2, 0.3]);
        assert_eq!(s.y, vec![1e-5, 2e-5, 3e-5]);
        assert_eq!(s.labels, ["Potential/V".to_string(), "Current/A".to_string()]);
    }

    #[test]
    fn kind_mismatch_is_not_of_kind() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "cv.txt", CV_FILE);
        let err = get_ca(&path).unwrap_err();
        assert!(matches!(err, LoadError::NotOfKind { expected: ChiKind::Ca, .. }));
    }

    #[test]
    fn eis_frequency_bounds_commute() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "eis.txt", EIS_FILE);

        let s = get_eis(&path, Some(100.0), Some(10000.0)).unwrap();
        assert_eq!(s.freq, vec![1000.0]);
        assert_eq!(s.z, vec![Complex64::new(0.6, -0.2)]);

        // Applying only one bound keeps the other side open.
        let lo = get_eis(&path, Some(100.0), None).unwrap();
        assert_eq!(lo.freq, vec![100000.0, 1000.0]);
        let hi = get_eis(&path, None, Some(10000.0)).unwrap();
        assert_eq!(hi.freq, vec![1000.0, 10.0]);
    }

    #[test]
    fn zview_negates_series_but_writes_canonical_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "eis.txt", EIS_FILE);
        let s = get_zview(&path).unwrap();

        assert_eq!(s.x, vec![0.5, 0.6, 0.7]);
        assert_eq!(s.y, vec![0.1, 0.2, 0.3]);
        assert_eq!(s.labels[0], "z_real/Ω");

        let written = std::fs::read_to_string(dir.path().join("eis_ZView.txt")).unwrap();
        let first = written.lines().next().unwrap();
        assert_eq!(first, "100000\t0.5\t-0.1");
        assert_eq!(written.lines().count(), 3);
    }

    #[test]
    fn trailing_invalid_rows_dropped() {
        let dir = TempDir::new().unwrap();
        let text = format!("{CV_FILE}0.4,\n\n");
        let path = write_file(dir.path(), "cv.txt", &text);
        let s = get_cv(&path).unwrap();
        assert_eq!(s.x.len(), 3);
    }
}
