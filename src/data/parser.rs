//! Per-vendor parse-parameter derivation and body parsing.
//!
//! Each vendor encodes its metadata differently, so the data region is
//! located by content, never by fixed offsets: Gamry by a data-start
//! marker, BioLogic by a declared header-line count, ZPlot by the end of
//! its comment block, RelaxIS by a `Data: ` header row, CHI by the
//! column-header line itself.

use crate::data::source::SourceFormat;
use crate::data::table::{ColumnData, ParsedTable};
use crate::error::{LoadError, Result};

/// Gamry data-start marker for impedance curves, matched case-insensitively
/// at line starts.
const GAMRY_EIS_MARKER: &str = "ZCURVE";

/// Marker Gamry writes into a DTA file when a run is stopped early; every
/// line from it onward is excluded from the body.
const GAMRY_ABORT_MARKER: &str = "EXPERIMENTABORTED";

const BIOLOGIC_NB_HEADER: &str = "Nb header lines :";

/// How body rows with blank or unparseable cells are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowPolicy {
    /// Bad cells become NaN, short rows are right-padded (pandas behavior).
    NanFill,
    /// A row with any invalid cell is dropped whole (CHI validity filter).
    DropInvalid,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Parse the text of a detected vendor format into a normalized table.
///
/// The returned table has trimmed, canonically renamed column names,
/// blank-header columns removed, and `Zmod`/`Zphz` derived when absent.
pub fn parse(text: &str, source: SourceFormat) -> Result<ParsedTable> {
    let lines: Vec<&str> = text.lines().collect();

    let (names, body, sep, policy) = match source {
        SourceFormat::Gamry => gamry_section(&lines)?,
        SourceFormat::BioLogic => biologic_section(&lines)?,
        SourceFormat::ZPlot => zplot_section(&lines)?,
        SourceFormat::RelaxIs => relaxis_section(&lines)?,
        SourceFormat::Chi => chi_section(&lines)?,
    };

    let mut table = build_table(names, body, sep, policy);
    normalize_columns(&mut table, source);
    Ok(table)
}

/// Apply the vendor's canonical rename map and derive missing polar
/// columns. Also used for tables produced by the binary .mpr reader.
pub(crate) fn normalize_columns(table: &mut ParsedTable, source: SourceFormat) {
    // BioLogic stores the negated imaginary part; the canonical table
    // carries the true sign.
    if source == SourceFormat::BioLogic {
        table.negate("-Im(Z)/Ohm");
    }
    for (from, to) in rename_map(source) {
        table.rename(from, to);
    }
    table.derive_polar();
}

fn rename_map(source: SourceFormat) -> &'static [(&'static str, &'static str)] {
    match source {
        SourceFormat::Chi => &[
            ("Freq/Hz", "Freq"),
            ("Z'/ohm", "Zreal"),
            ("Z\"/ohm", "Zimag"),
            ("Z/ohm", "Zmod"),
            ("Phase/deg", "Zphz"),
        ],
        SourceFormat::ZPlot => &[
            ("Z'(a)", "Zreal"),
            ("Z''(b)", "Zimag"),
            ("Freq(Hz)", "Freq"),
        ],
        SourceFormat::RelaxIs => &[
            ("Frequency", "Freq"),
            ("Z'", "Zreal"),
            ("Z''", "Zimag"),
            ("|Z|", "Zmod"),
            ("Theta (Z)", "Zphz"),
        ],
        SourceFormat::BioLogic => &[
            ("freq/Hz", "Freq"),
            ("Re(Z)/Ohm", "Zreal"),
            ("-Im(Z)/Ohm", "Zimag"),
            ("|Z|/Ohm", "Zmod"),
            ("Phase(Z)/deg", "Zphz"),
        ],
        // Gamry already uses the canonical names.
        SourceFormat::Gamry => &[],
    }
}

// ---------------------------------------------------------------------------
// Per-vendor section location
// ---------------------------------------------------------------------------

type Section<'a> = (Vec<String>, &'a [&'a str], char, RowPolicy);

/// Gamry DTA: the column-name row follows the data-start marker, a units
/// row follows that, and the body starts one line later.
fn gamry_section<'a>(lines: &'a [&'a str]) -> Result<Section<'a>> {
    let m = lines
        .iter()
        .position(|l| {
            l.trim_start()
                .to_ascii_uppercase()
                .starts_with(GAMRY_EIS_MARKER)
        })
        .ok_or_else(|| LoadError::MalformedHeader(format!("no {GAMRY_EIS_MARKER} data block")))?;

    let names = lines
        .get(m + 1)
        .ok_or_else(|| LoadError::MalformedHeader("missing Gamry column row".into()))?
        .split('\t')
        .map(String::from)
        .collect();

    // m + 2 is the units row; the body starts after it.
    let start = (m + 3).min(lines.len());
    let end = lines
        .iter()
        .position(|l| l.contains(GAMRY_ABORT_MARKER))
        .map(|a| a.max(start))
        .unwrap_or(lines.len());

    Ok((names, &lines[start..end], '\t', RowPolicy::NanFill))
}

/// BioLogic text export: `"Nb header lines : N"`; the column-name row is
/// line N-1 and the body starts at line N. Delimiter is sniffed from the
/// name row (tab if it tab-splits, else comma).
fn biologic_section<'a>(lines: &'a [&'a str]) -> Result<Section<'a>> {
    let nh_line = lines
        .iter()
        .find(|l| l.contains(BIOLOGIC_NB_HEADER))
        .ok_or_else(|| LoadError::MalformedHeader("missing 'Nb header lines :'".into()))?;

    let idx = nh_line.find(BIOLOGIC_NB_HEADER).unwrap_or(0);
    let nh: usize = nh_line[idx + BIOLOGIC_NB_HEADER.len()..]
        .trim()
        .parse()
        .map_err(|_| LoadError::MalformedHeader("bad 'Nb header lines' count".into()))?;

    let header_row = nh
        .checked_sub(1)
        .and_then(|i| lines.get(i))
        .ok_or_else(|| LoadError::MalformedHeader("header count exceeds file".into()))?;

    let sep = if header_row.split('\t').count() > 1 {
        '\t'
    } else {
        ','
    };
    let names = header_row.split(sep).map(String::from).collect();

    Ok((names, &lines[nh.min(lines.len())..], sep, RowPolicy::NanFill))
}

/// ZPlot: the column-name row immediately precedes the `End Comments`
/// line; the body follows it.
fn zplot_section<'a>(lines: &'a [&'a str]) -> Result<Section<'a>> {
    let e = lines
        .iter()
        .position(|l| l.contains("End Comments"))
        .filter(|&e| e > 0)
        .ok_or_else(|| LoadError::MalformedHeader("missing 'End Comments'".into()))?;

    let names = lines[e - 1].trim().split('\t').map(String::from).collect();
    Ok((
        names,
        &lines[(e + 1).min(lines.len())..],
        '\t',
        RowPolicy::NanFill,
    ))
}

/// RelaxIS: the column-name row starts with `Data: `, each name carrying
/// that literal prefix; the body begins two lines after the name row.
fn relaxis_section<'a>(lines: &'a [&'a str]) -> Result<Section<'a>> {
    let h = lines
        .iter()
        .position(|l| l.starts_with("Data: "))
        .ok_or_else(|| LoadError::MalformedHeader("missing 'Data: ' header row".into()))?;

    let names = lines[h]
        .split('\t')
        .map(|tok| {
            let tok = tok.trim();
            tok.strip_prefix("Data: ").unwrap_or(tok).to_string()
        })
        .collect();

    Ok((
        names,
        &lines[(h + 2).min(lines.len())..],
        '\t',
        RowPolicy::NanFill,
    ))
}

/// CHI EIS export: the `Freq/Hz` header line starts the data region;
/// comma-delimited; rows with any blank field are dropped whole.
fn chi_section<'a>(lines: &'a [&'a str]) -> Result<Section<'a>> {
    let h = lines
        .iter()
        .position(|l| l.contains("Freq/Hz"))
        .ok_or_else(|| LoadError::MalformedHeader("no Freq/Hz header".into()))?;

    let names = lines[h].split(',').map(String::from).collect();
    Ok((
        names,
        &lines[(h + 1).min(lines.len())..],
        ',',
        RowPolicy::DropInvalid,
    ))
}

// ---------------------------------------------------------------------------
// Body parsing
// ---------------------------------------------------------------------------

/// Build a table from raw header names and body lines.
///
/// Names are trimmed; blank names become positional `blank{i}` placeholders
/// whose columns are excluded from the emitted table. Blank body lines are
/// skipped.
fn build_table(raw_names: Vec<String>, body: &[&str], sep: char, policy: RowPolicy) -> ParsedTable {
    let names: Vec<String> = raw_names
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let t = n.trim();
            if t.is_empty() {
                format!("blank{i}")
            } else {
                t.to_string()
            }
        })
        .collect();

    // (source cell index, column name) for each emitted column.
    let kept: Vec<(usize, String)> = names
        .into_iter()
        .enumerate()
        .filter(|(_, n)| !n.contains("blank"))
        .collect();

    let mut cols: Vec<Vec<f64>> = vec![Vec::new(); kept.len()];
    for line in body {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(sep).collect();
        let row: Vec<Option<f64>> = kept
            .iter()
            .map(|(i, _)| {
                cells
                    .get(*i)
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .and_then(|s| s.parse::<f64>().ok())
            })
            .collect();

        match policy {
            RowPolicy::NanFill => {
                for (col, v) in cols.iter_mut().zip(row) {
                    col.push(v.unwrap_or(f64::NAN));
                }
            }
            RowPolicy::DropInvalid => {
                if row.iter().all(Option::is_some) {
                    for (col, v) in cols.iter_mut().zip(row) {
                        col.push(v.unwrap_or(f64::NAN));
                    }
                }
            }
        }
    }

    let mut table = ParsedTable::new();
    for ((_, name), col) in kept.into_iter().zip(cols) {
        table.push_column(name, ColumnData::Float(col));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::{FREQ, ZIMAG, ZMOD, ZPHZ, ZREAL};

    #[test]
    fn chi_round_trip_three_rows() {
        let text = "Jan. 1, 2024 10:00:00\nA.C. Impedance\n\n\
                    Freq/Hz, Z'/ohm, Z\"/ohm\n\
                    100000,0.5,-0.1\n\
                    10000,0.6,-0.2\n\
                    1000,0.7,-0.3\n";
        let t = parse(text, SourceFormat::Chi).unwrap();

        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.floats(FREQ), Some(&[100000.0, 10000.0, 1000.0][..]));
        assert_eq!(t.floats(ZREAL), Some(&[0.5, 0.6, 0.7][..]));
        assert_eq!(t.floats(ZIMAG), Some(&[-0.1, -0.2, -0.3][..]));
        // Modulus and phase are derived when the vendor omits them.
        assert!(t.contains(ZMOD));
        assert!(t.contains(ZPHZ));
    }

    #[test]
    fn chi_drops_rows_with_blank_fields() {
        let text = "Freq/Hz, Z'/ohm, Z\"/ohm\n\
                    100,0.5,-0.1\n\
                    10,,-0.2\n\
                    \n\
                    1,0.7,-0.3\n\
                    Note: run complete\n";
        let t = parse(text, SourceFormat::Chi).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.floats(FREQ), Some(&[100.0, 1.0][..]));
    }

    fn gamry_text(aborted: bool) -> String {
        let mut s = String::from(
            "EXPLAIN\nTAG\tEISPOT\nDATE\tLABEL\t2023/03/27\tDate\n\
             ZCURVE\tTABLE\n\
             \tPt\tFreq\tZreal\tZimag\n\
             \t#\tHz\tohm\tohm\n\
             \t0\t100000\t0.5\t-0.1\n\
             \t1\t10000\t0.6\t-0.2\n",
        );
        if aborted {
            s.push_str("EXPERIMENTABORTED\tTOGGLE\n\t2\t1000\t0.7\t-0.3\n");
        } else {
            s.push_str("\t2\t1000\t0.7\t-0.3\n");
        }
        s
    }

    #[test]
    fn gamry_parses_all_rows_without_abort_marker() {
        let t = parse(&gamry_text(false), SourceFormat::Gamry).unwrap();
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.floats(FREQ), Some(&[100000.0, 10000.0, 1000.0][..]));
        // The leading tab produces a blank-named column, which is dropped.
        assert!(!t.names().any(|n| n.starts_with("blank")));
    }

    #[test]
    fn gamry_truncates_at_abort_marker() {
        let t = parse(&gamry_text(true), SourceFormat::Gamry).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.floats(FREQ), Some(&[100000.0, 10000.0][..]));
    }

    #[test]
    fn gamry_marker_is_case_insensitive() {
        let text = gamry_text(false).replace("ZCURVE", "Zcurve");
        let t = parse(&text, SourceFormat::Gamry).unwrap();
        assert_eq!(t.n_rows(), 3);
    }

    #[test]
    fn zplot_names_precede_end_comments() {
        let text = "ZPLOT2 ASCII\n  Comment: test\n\
                    Freq(Hz)\tZ'(a)\tZ''(b)\n\
                    End Comments\n\
                    1000\t0.5\t-0.1\n\
                    100\t0.6\t-0.2\n";
        let t = parse(text, SourceFormat::ZPlot).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.floats(FREQ), Some(&[1000.0, 100.0][..]));
        assert_eq!(t.floats(ZREAL), Some(&[0.5, 0.6][..]));
        assert_eq!(t.floats(ZIMAG), Some(&[-0.1, -0.2][..]));
        assert!(t.contains(ZMOD));
    }

    #[test]
    fn biologic_header_count_and_tab_sniff() {
        let text = "BIO-LOGIC ASCII FILE\nNb header lines : 4\nAcquisition started\n\
                    freq/Hz\tRe(Z)/Ohm\t-Im(Z)/Ohm\n\
                    1000\t0.5\t0.1\n\
                    100\t0.6\t0.2\n";
        let t = parse(text, SourceFormat::BioLogic).unwrap();
        assert_eq!(t.n_rows(), 2);
        // The stored -Im(Z) is sign-flipped into the canonical Zimag.
        assert_eq!(t.floats(ZIMAG), Some(&[-0.1, -0.2][..]));
        assert_eq!(t.floats(FREQ), Some(&[1000.0, 100.0][..]));
    }

    #[test]
    fn biologic_comma_fallback() {
        let text = "BIO-LOGIC ASCII FILE\nNb header lines : 3\n\
                    freq/Hz,Re(Z)/Ohm,-Im(Z)/Ohm\n\
                    1000,0.5,0.1\n";
        let t = parse(text, SourceFormat::BioLogic).unwrap();
        assert_eq!(t.n_rows(), 1);
        assert_eq!(t.floats(ZREAL), Some(&[0.5][..]));
    }

    #[test]
    fn biologic_missing_marker_is_malformed() {
        let err = parse("BIO-LOGIC ASCII FILE\nno count\n", SourceFormat::BioLogic).unwrap_err();
        assert!(matches!(err, LoadError::MalformedHeader(_)));
    }

    #[test]
    fn relaxis_strips_data_prefix() {
        let text = "RelaxIS export\nmeta\n\
                    Data: Frequency\tData: Z'\tData: Z''\n\
                    units\n\
                    1000\t0.5\t-0.1\n\
                    100\t0.6\t-0.2\n";
        let t = parse(text, SourceFormat::RelaxIs).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.floats(FREQ), Some(&[1000.0, 100.0][..]));
        assert_eq!(t.floats(ZREAL), Some(&[0.5, 0.6][..]));
        assert_eq!(t.floats(ZIMAG), Some(&[-0.1, -0.2][..]));
    }

    #[test]
    fn blank_names_become_excluded_placeholders() {
        let names = vec!["a".to_string(), "".to_string(), "b".to_string()];
        let body = ["1\t2\t3", "4\t5\t6"];
        let t = build_table(names, &body, '\t', RowPolicy::NanFill);
        assert_eq!(t.n_cols(), 2);
        assert_eq!(t.floats("a"), Some(&[1.0, 4.0][..]));
        assert_eq!(t.floats("b"), Some(&[3.0, 6.0][..]));
    }

    #[test]
    fn short_rows_nan_fill() {
        let names = vec!["a".to_string(), "b".to_string()];
        let body = ["1\t2", "3"];
        let t = build_table(names, &body, '\t', RowPolicy::NanFill);
        assert_eq!(t.floats("a"), Some(&[1.0, 3.0][..]));
        let b = t.floats("b").unwrap();
        assert_eq!(b[0], 2.0);
        assert!(b[1].is_nan());
    }
}
