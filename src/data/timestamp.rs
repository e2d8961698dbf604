use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};

// ---------------------------------------------------------------------------
// CHI
// ---------------------------------------------------------------------------

/// CHI instruments spell some months inconsistently in their own output:
/// `"June 1, 2023 ..."` next to `"Jan. 1, 2024 ..."`. The substitutions are
/// special-cased per token rather than generalized, and already-normalized
/// tokens pass through, so applying the normalization twice is a no-op.
fn normalize_month(token: &str) -> &str {
    match token {
        "May" | "May." => "May.",
        "June" | "Jun." => "Jun.",
        "July" | "Jul." => "Jul.",
        "Sept." | "Sep." => "Sep.",
        other => other,
    }
}

/// Parse a CHI first-line timestamp such as `"Jan. 1, 2024 10:00:00"`.
///
/// Doubles as the CHI-format sniff: a first line that parses as this
/// pattern identifies the file as a CHI export.
pub fn parse_chi_header(line: &str) -> Option<NaiveDateTime> {
    let line = line.trim();
    let (month, rest) = line.split_once(' ')?;
    let normalized = format!("{} {}", normalize_month(month), rest);
    NaiveDateTime::parse_from_str(&normalized, "%b. %d, %Y %H:%M:%S").ok()
}

/// Experiment start time of a CHI export: the first line is the sole source.
pub fn chi_timestamp(text: &str) -> Option<NaiveDateTime> {
    parse_chi_header(text.lines().next()?)
}

// ---------------------------------------------------------------------------
// Gamry
// ---------------------------------------------------------------------------

/// Third tab-delimited field of the first line starting with `key`.
fn tab_field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .find(|l| l.starts_with(key))
        .and_then(|l| l.split('\t').nth(2))
        .map(str::trim)
}

/// Gamry DTA files carry `DATE` and `TIME` rows with the value in the third
/// tab field. pygamry-generated logs reuse the same block but store an epoch
/// second count; that fallback is read as UTC and kept naive.
pub fn gamry_timestamp(text: &str) -> Option<NaiveDateTime> {
    let date = tab_field(text, "DATE")?;
    let time = tab_field(text, "TIME")?;
    let joined = format!("{date} {time}");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&joined, "%Y/%m/%d %H:%M:%S") {
        return Some(dt);
    }
    let secs = time.parse::<f64>().ok()?;
    DateTime::from_timestamp(secs as i64, 0).map(|dt| dt.naive_utc())
}

// ---------------------------------------------------------------------------
// ZPlot
// ---------------------------------------------------------------------------

/// Second whitespace token of the first line starting with `key`.
fn ws_field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .find(|l| l.trim_start().starts_with(key))
        .and_then(|l| l.split_whitespace().nth(1))
}

pub fn zplot_timestamp(text: &str) -> Option<NaiveDateTime> {
    let date = ws_field(text, "Date")?;
    let time = ws_field(text, "Time")?;
    let joined = format!("{date} {time}");
    NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S").ok()
}

// ---------------------------------------------------------------------------
// Filesystem fallback
// ---------------------------------------------------------------------------

/// Last-modified time of the file, as local naive time. Used when the
/// format is unknown and no embedded timestamp exists.
pub fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let dt: DateTime<Local> = modified.into();
    Some(dt.naive_local())
}
