//! Batch orchestration: order files by experiment time, drive per-file
//! parse → transform, merge variable-length results, write and hand off
//! for plotting.
//!
//! Per-file failures are contained here: the file is logged and skipped,
//! the batch continues. A batch with zero successful files produces no
//! output and no callback.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;
use log::{info, warn};

use crate::data::chi::{self, SeriesPair};
use crate::data::eis::EisReader;
use crate::error::Result as LoadResult;
use crate::fit::{fixed_basis_tau, DrtFitter, FitModel, FitOptions};
use crate::output::write_merged;
use crate::request::{BatchRequest, Operation};

// ---------------------------------------------------------------------------
// Merged dataset
// ---------------------------------------------------------------------------

/// One named value sequence of a merged batch table.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSeries {
    pub key: String,
    pub values: Vec<f64>,
}

/// The merged output of one batch unit: named series in insertion order,
/// padded with NaN to a common length before serialization.
#[derive(Debug, Clone, Default)]
pub struct MergedDataset {
    series: Vec<MergedSeries>,
}

impl MergedDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series, replacing an existing one of the same key in place.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<f64>) {
        let key = key.into();
        match self.series.iter_mut().find(|s| s.key == key) {
            Some(existing) => existing.values = values,
            None => self.series.push(MergedSeries { key, values }),
        }
    }

    pub fn series(&self) -> &[MergedSeries] {
        &self.series
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Length of the longest series.
    pub fn max_len(&self) -> usize {
        self.series.iter().map(|s| s.values.len()).max().unwrap_or(0)
    }

    /// Right-pad every series with NaN to the longest length.
    pub fn pad_to_max(&mut self) {
        let max = self.max_len();
        for s in &mut self.series {
            s.values.resize(max, f64::NAN);
        }
    }

    /// Keep only the first x column: positions {0, 1}, then every second
    /// column from 3 (the y columns of the remaining files).
    pub fn keep_single_x(&mut self) {
        let mut i = 0;
        self.series.retain(|_| {
            let keep = i <= 1 || (i >= 3 && i % 2 == 1);
            i += 1;
            keep
        });
    }

    /// Scale a series in place. No-op when the key is absent.
    pub fn scale(&mut self, key: &str, factor: f64) {
        if let Some(s) = self.series.iter_mut().find(|s| s.key == key) {
            for v in &mut s.values {
                *v *= factor;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Plot payloads
// ---------------------------------------------------------------------------

/// What the rendering collaborator receives after a simple-mode unit.
pub struct PlotPayload<'a> {
    /// Count of successfully converted files.
    pub n_files: usize,
    /// Axis labels from the last converted file.
    pub axis_labels: [String; 2],
    pub dataset: &'a MergedDataset,
    pub unit_dir: &'a Path,
}

/// What the rendering collaborator receives after a DRT batch. The
/// renderer owns figure state and the 300 DPI `{output_stem}.png` export.
pub struct DrtPlotPayload<'a> {
    /// Fitted models in processing order, keyed by source file name.
    pub fits: &'a [(String, Box<dyn FitModel>)],
    pub output_stem: &'a str,
    pub unit_dir: &'a Path,
}

/// Result of one DRT batch run.
pub struct DrtOutcome {
    pub data: MergedDataset,
    pub dop: Option<MergedDataset>,
    pub n_files: usize,
    pub output_stem: String,
}

// ---------------------------------------------------------------------------
// File enumeration and ordering
// ---------------------------------------------------------------------------

struct BatchUnit {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

/// Files of a directory, sorted by name so enumeration order (and with it
/// timestamp tie-breaking) is deterministic across platforms.
fn list_files(dir: &Path, chi_only: bool) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            if !chi_only {
                return true;
            }
            let ext = p
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            matches!(ext.as_deref(), Some("txt" | "csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Simple-mode batch units: every first-level subdirectory of each
/// selected folder, or the folder itself when it has none. Only CHI-style
/// `.txt`/`.csv` files are considered.
fn simple_units(paths: &[PathBuf]) -> std::io::Result<Vec<BatchUnit>> {
    let mut units = Vec::new();
    let mut selected_files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut subdirs: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect();
            subdirs.sort();
            if subdirs.is_empty() {
                subdirs.push(path.clone());
            }
            for dir in subdirs {
                let files = list_files(&dir, true)?;
                units.push(BatchUnit { dir, files });
            }
        } else {
            selected_files.push(path.clone());
        }
    }

    if !selected_files.is_empty() {
        let dir = selected_files[0]
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        units.push(BatchUnit {
            dir,
            files: selected_files,
        });
    }
    Ok(units)
}

/// DRT-mode unit: a selected folder is its own unit; a file selection is
/// one unit rooted at the first file's parent. Every file type counts.
fn drt_unit(paths: &[PathBuf]) -> anyhow::Result<BatchUnit> {
    let first = paths.first().context("no paths selected")?;
    if first.is_dir() {
        let files = list_files(first, false)
            .with_context(|| format!("listing {}", first.display()))?;
        Ok(BatchUnit {
            dir: first.clone(),
            files,
        })
    } else {
        let dir = first
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(BatchUnit {
            dir,
            files: paths.to_vec(),
        })
    }
}

/// Stable-sort files ascending by extracted timestamp. Files without one
/// keep their enumeration order after every timestamped file, and are
/// still processed.
fn sort_by_timestamp(
    files: Vec<PathBuf>,
    mut key: impl FnMut(&Path) -> Option<NaiveDateTime>,
) -> Vec<(PathBuf, Option<NaiveDateTime>)> {
    let mut keyed: Vec<(PathBuf, Option<NaiveDateTime>)> = files
        .into_iter()
        .map(|f| {
            let ts = key(&f);
            if ts.is_none() {
                warn!("{}: no timestamp; ordered after timestamped files", f.display());
            }
            (f, ts)
        })
        .collect();
    keyed.sort_by_key(|(_, ts)| ts.unwrap_or(NaiveDateTime::MAX));
    keyed
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

type Extractor = fn(&Path) -> LoadResult<SeriesPair>;

/// Per-file extraction for the simple conversion mode. `None` for DRT,
/// which runs through [`BatchRunner::run_drt`].
fn simple_extractor(op: Operation) -> Option<Extractor> {
    match op {
        Operation::Eis | Operation::ZView => Some(chi::get_zview),
        Operation::Cv | Operation::Lsv => Some(chi::get_cv),
        Operation::Ca => Some(chi::get_ca),
        Operation::Cp => Some(chi::get_cp),
        Operation::Tafel => Some(chi::get_tafel),
        Operation::Drt => None,
    }
}

/// Drives batch runs. Owns the multi-vendor reader; one batch at a time,
/// the merged dataset lives only for the duration of a unit.
#[derive(Default)]
pub struct BatchRunner {
    reader: EisReader,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self {
            reader: EisReader::new(),
        }
    }

    /// Runner with a configured reader (e.g. with a .mpr collaborator).
    pub fn with_reader(reader: EisReader) -> Self {
        Self { reader }
    }

    /// Simple conversion mode: per-type extraction, one merged table and
    /// one `{operation}_merged.txt` per unit. The callback receives each
    /// unit's payload for rendering.
    pub fn run_simple(
        &self,
        req: &BatchRequest,
        mut on_complete: impl FnMut(PlotPayload<'_>),
    ) -> anyhow::Result<Vec<MergedDataset>> {
        let extract = simple_extractor(req.operation)
            .with_context(|| format!("{} batches run through run_drt", req.operation.label()))?;

        let mut results = Vec::new();
        for unit in simple_units(&req.paths)? {
            let Some((n, labels, data)) = convert_unit(&unit, req, extract) else {
                info!("no convertible files in {}", unit.dir.display());
                continue;
            };

            let out = unit.dir.join(format!("{}_merged.txt", req.operation.label()));
            if let Err(e) = write_merged(&data, &out) {
                warn!("failed to write {}: {e}", out.display());
                continue;
            }
            info!("wrote {}", out.display());

            on_complete(PlotPayload {
                n_files: n,
                axis_labels: labels,
                dataset: &data,
                unit_dir: &unit.dir,
            });
            results.push(data);
        }
        Ok(results)
    }

    /// DRT analysis mode: assemble each file's impedance, hand it to the
    /// fitting collaborator, and merge the predicted distributions over
    /// the fixed tau basis.
    pub fn run_drt(
        &self,
        req: &BatchRequest,
        fitter: &dyn DrtFitter,
        mut on_complete: impl FnMut(DrtPlotPayload<'_>),
    ) -> anyhow::Result<Option<DrtOutcome>> {
        req.validate()?;

        let unit = drt_unit(&req.paths)?;
        let sorted = sort_by_timestamp(unit.files, |f| match self.reader.timestamp(f) {
            Ok(ts) => Some(ts),
            Err(e) => {
                warn!("{}: {e}", f.display());
                None
            }
        });
        if sorted.is_empty() {
            return Ok(None);
        }

        let tau = fixed_basis_tau();
        let mut data = MergedDataset::new();
        data.insert("0x", tau.clone());
        let mut dop: Option<MergedDataset> = None;
        let mut fits: Vec<(String, Box<dyn FitModel>)> = Vec::new();

        for (file, _) in &sorted {
            let spectrum = match self.reader.get_eis_tuple(file, None, None) {
                Ok(s) => s,
                Err(e) => {
                    warn!("skipping {}: {e}", file.display());
                    continue;
                }
            };

            let options = FitOptions {
                lambda: req.lambda,
                nonneg: false,
                fit_dop: req.dop_enabled,
                dop_lambda: req.dop_enabled.then_some(req.dop_lambda),
            };
            let model = match fitter.fit(&spectrum.freq, &spectrum.z, &tau, &options) {
                Ok(m) => m,
                Err(e) => {
                    warn!("fit failed for {}: {e:#}", file.display());
                    continue;
                }
            };

            let name = file_name(file);
            data.insert(name.clone(), model.predict_distribution(&tau));
            if req.dop_enabled {
                let (nu, values) = model.predict_dop(true);
                let d = dop.get_or_insert_with(MergedDataset::new);
                d.insert("0x_dop", nu);
                d.insert(name.clone(), values);
            }
            fits.push((name, model));
        }

        if fits.is_empty() {
            return Ok(None);
        }

        let output_stem = format!(
            "DRT_Fit_Results_{}_λ={}",
            file_stem(&sorted[0].0),
            req.lambda
        );

        data.pad_to_max();
        let out = unit.dir.join(format!("{output_stem}.txt"));
        write_merged(&data, &out).with_context(|| format!("writing {}", out.display()))?;

        if let Some(d) = &mut dop {
            // The nu axis is written in degrees of phasance angle.
            d.scale("0x_dop", -90.0);
            d.pad_to_max();
            let out = unit.dir.join(format!("{output_stem}_dop.txt"));
            write_merged(d, &out).with_context(|| format!("writing {}", out.display()))?;
        }

        on_complete(DrtPlotPayload {
            fits: &fits,
            output_stem: &output_stem,
            unit_dir: &unit.dir,
        });

        Ok(Some(DrtOutcome {
            data,
            dop,
            n_files: fits.len(),
            output_stem,
        }))
    }
}

/// Sort, extract, and merge one simple-mode unit. `None` when no file
/// converts successfully.
fn convert_unit(
    unit: &BatchUnit,
    req: &BatchRequest,
    extract: Extractor,
) -> Option<(usize, [String; 2], MergedDataset)> {
    let sorted = sort_by_timestamp(unit.files.clone(), chi::file_timestamp);

    let mut data = MergedDataset::new();
    let mut labels = [String::new(), String::new()];
    let mut n = 0;
    for (file, _) in &sorted {
        match extract(file) {
            Ok(series) => {
                let stem = file_stem(file);
                data.insert(format!("{stem}_x"), series.x);
                data.insert(format!("{stem}_y"), series.y);
                labels = series.labels;
                n += 1;
            }
            Err(e) => warn!("skipping {}: {e}", file.display()),
        }
    }

    if n == 0 {
        return None;
    }
    data.pad_to_max();
    if req.single_x_axis && !req.operation.is_impedance() {
        data.keep_single_x();
    }
    Some((n, labels, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::TempDir;

    fn dt(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn padding_invariant() {
        let mut data = MergedDataset::new();
        data.insert("a", vec![1.0; 5]);
        data.insert("b", vec![2.0; 3]);
        data.insert("c", vec![3.0; 7]);
        data.pad_to_max();

        for s in data.series() {
            assert_eq!(s.values.len(), 7);
        }
        let a = &data.series()[0].values;
        assert!(a[..5].iter().all(|v| *v == 1.0));
        assert!(a[5..].iter().all(|v| v.is_nan()));
        let b = &data.series()[1].values;
        assert!(b[3..].iter().all(|v| v.is_nan()));
        assert_eq!(b[3..].len(), 4);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut data = MergedDataset::new();
        data.insert("0x_dop", vec![1.0]);
        data.insert("file1", vec![2.0]);
        data.insert("0x_dop", vec![9.0, 8.0]);

        assert_eq!(data.series()[0].key, "0x_dop");
        assert_eq!(data.series()[0].values, vec![9.0, 8.0]);
        assert_eq!(data.series().len(), 2);
    }

    #[test]
    fn single_x_keeps_first_axis_and_all_y() {
        let mut data = MergedDataset::new();
        for key in ["f1_x", "f1_y", "f2_x", "f2_y", "f3_x", "f3_y"] {
            data.insert(key, vec![0.0]);
        }
        data.keep_single_x();
        let keys: Vec<&str> = data.series().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["f1_x", "f1_y", "f2_y", "f3_y"]);
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        let files = vec![
            PathBuf::from("b.txt"),
            PathBuf::from("a.txt"),
            PathBuf::from("c.txt"),
        ];
        let sorted = sort_by_timestamp(files, |_| Some(dt(10)));
        let names: Vec<String> = sorted.iter().map(|(f, _)| file_name(f)).collect();
        assert_eq!(names, vec!["b.txt", "a.txt", "c.txt"]);
    }

    #[test]
    fn untimestamped_files_sort_last_but_stay() {
        let files = vec![
            PathBuf::from("late.txt"),
            PathBuf::from("none.txt"),
            PathBuf::from("early.txt"),
        ];
        let sorted = sort_by_timestamp(files, |f| match f.to_str() {
            Some("late.txt") => Some(dt(11)),
            Some("early.txt") => Some(dt(9)),
            _ => None,
        });
        let names: Vec<String> = sorted.iter().map(|(f, _)| file_name(f)).collect();
        assert_eq!(names, vec!["early.txt", "late.txt", "none.txt"]);
    }

    fn chi_cv_file(dir: &Path, name: &str, header_time: &str, rows: usize) {
        let mut text = format!("{header_time}\nCyclic Voltammetry\n\nPotential/V, Current/A\n");
        for i in 0..rows {
            text.push_str(&format!("0.{i}, {i}e-5\n"));
        }
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn end_to_end_cv_batch_sorted_and_padded() {
        let dir = TempDir::new().unwrap();
        chi_cv_file(dir.path(), "one.txt", "Jan. 1, 2024 10:00:00", 2);
        chi_cv_file(dir.path(), "two.txt", "Jan. 1, 2024 09:00:00", 3);
        chi_cv_file(dir.path(), "three.txt", "Jan. 1, 2024 11:00:00", 1);

        let req = BatchRequest {
            paths: vec![dir.path().to_path_buf()],
            operation: Operation::Cv,
            ..Default::default()
        };

        let mut calls = 0;
        let results = BatchRunner::new()
            .run_simple(&req, |payload| {
                calls += 1;
                assert_eq!(payload.n_files, 3);
                assert_eq!(payload.axis_labels[0], "Potential/V");
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(results.len(), 1);

        let written = std::fs::read_to_string(dir.path().join("CV_merged.txt")).unwrap();
        let mut lines = written.lines();
        // Processing order follows timestamps: two, one, three.
        assert_eq!(
            lines.next().unwrap(),
            "two_x\ttwo_y\tone_x\tone_y\tthree_x\tthree_y"
        );
        let body: Vec<&str> = lines.collect();
        assert_eq!(body.len(), 3);
        // Shortest series padded with the NaN token.
        let last: Vec<&str> = body[2].split('\t').collect();
        assert_eq!(last[0], "0.2");
        assert_eq!(last[2], "NaN");
        assert_eq!(last[4], "NaN");
    }

    #[test]
    fn single_x_batch_drops_extra_axes() {
        let dir = TempDir::new().unwrap();
        chi_cv_file(dir.path(), "one.txt", "Jan. 1, 2024 10:00:00", 2);
        chi_cv_file(dir.path(), "two.txt", "Jan. 1, 2024 09:00:00", 2);

        let req = BatchRequest {
            paths: vec![dir.path().to_path_buf()],
            operation: Operation::Cv,
            single_x_axis: true,
            ..Default::default()
        };

        BatchRunner::new().run_simple(&req, |_| {}).unwrap();
        let written = std::fs::read_to_string(dir.path().join("CV_merged.txt")).unwrap();
        assert_eq!(written.lines().next().unwrap(), "two_x\ttwo_y\tone_y");
    }

    #[test]
    fn empty_unit_writes_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("junk.txt"), "not a CHI file\n").unwrap();

        let req = BatchRequest {
            paths: vec![dir.path().to_path_buf()],
            operation: Operation::Cv,
            ..Default::default()
        };
        let mut calls = 0;
        let results = BatchRunner::new().run_simple(&req, |_| calls += 1).unwrap();
        assert_eq!(calls, 0);
        assert!(results.is_empty());
        assert!(!dir.path().join("CV_merged.txt").exists());
    }

    #[test]
    fn subfolders_become_units() {
        let root = TempDir::new().unwrap();
        let sub_a = root.path().join("a");
        let sub_b = root.path().join("b");
        std::fs::create_dir(&sub_a).unwrap();
        std::fs::create_dir(&sub_b).unwrap();
        chi_cv_file(&sub_a, "x.txt", "Jan. 1, 2024 10:00:00", 1);
        chi_cv_file(&sub_b, "y.txt", "Jan. 1, 2024 10:00:00", 1);

        let req = BatchRequest {
            paths: vec![root.path().to_path_buf()],
            operation: Operation::Cv,
            ..Default::default()
        };
        let results = BatchRunner::new().run_simple(&req, |_| {}).unwrap();
        assert_eq!(results.len(), 2);
        assert!(sub_a.join("CV_merged.txt").exists());
        assert!(sub_b.join("CV_merged.txt").exists());
    }

    // -- DRT mode with a stub fitter --

    struct StubModel {
        level: f64,
    }

    impl FitModel for StubModel {
        fn predict_distribution(&self, tau: &[f64]) -> Vec<f64> {
            vec![self.level; tau.len()]
        }
        fn predict_dop(&self, _normalize: bool) -> (Vec<f64>, Vec<f64>) {
            (vec![0.5, 1.0], vec![self.level, self.level])
        }
        fn residuals(
            &self,
            _freq: &[f64],
            z: &[num_complex::Complex64],
        ) -> Vec<num_complex::Complex64> {
            vec![num_complex::Complex64::new(0.0, 0.0); z.len()]
        }
    }

    struct StubFitter;

    impl DrtFitter for StubFitter {
        fn fit(
            &self,
            freq: &[f64],
            _z: &[num_complex::Complex64],
            _basis_tau: &[f64],
            options: &FitOptions,
        ) -> anyhow::Result<Box<dyn FitModel>> {
            anyhow::ensure!(!freq.is_empty(), "empty spectrum");
            assert!(!options.nonneg);
            Ok(Box::new(StubModel { level: freq[0] }))
        }
    }

    fn chi_eis_file(dir: &Path, name: &str, header_time: &str, first_freq: f64) {
        let text = format!(
            "{header_time}\nA.C. Impedance\n\nFreq/Hz, Z'/ohm, Z\"/ohm\n\
             {first_freq},0.5,-0.1\n1000,0.6,-0.2\n"
        );
        std::fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn drt_batch_merges_distributions_over_tau() {
        let dir = TempDir::new().unwrap();
        chi_eis_file(dir.path(), "one.txt", "Jan. 1, 2024 10:00:00", 100000.0);
        chi_eis_file(dir.path(), "two.txt", "Jan. 1, 2024 09:00:00", 50000.0);

        let req = BatchRequest {
            paths: vec![dir.path().to_path_buf()],
            operation: Operation::Drt,
            dop_enabled: true,
            ..Default::default()
        };

        let mut seen_stem = String::new();
        let outcome = BatchRunner::new()
            .run_drt(&req, &StubFitter, |payload| {
                seen_stem = payload.output_stem.to_string();
                assert_eq!(payload.fits.len(), 2);
                assert_eq!(payload.fits[0].0, "two.txt");
            })
            .unwrap()
            .expect("outcome");

        assert_eq!(outcome.n_files, 2);
        // Earliest file names the output.
        assert_eq!(outcome.output_stem, "DRT_Fit_Results_two_λ=10");
        assert_eq!(seen_stem, outcome.output_stem);

        let keys: Vec<&str> = outcome.data.series().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["0x", "two.txt", "one.txt"]);
        assert_eq!(outcome.data.series()[0].values.len(), 181);

        // DOP companion: nu axis scaled by -90 at write time.
        let dop = outcome.dop.expect("dop table");
        assert_eq!(dop.series()[0].key, "0x_dop");
        assert_eq!(dop.series()[0].values, vec![-45.0, -90.0]);

        assert!(dir.path().join("DRT_Fit_Results_two_λ=10.txt").exists());
        assert!(dir.path().join("DRT_Fit_Results_two_λ=10_dop.txt").exists());
    }

    #[test]
    fn drt_batch_with_no_parsable_files_is_silent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("junk.txt"), "nothing\n").unwrap();

        let req = BatchRequest {
            paths: vec![dir.path().to_path_buf()],
            operation: Operation::Drt,
            ..Default::default()
        };
        let mut calls = 0;
        let outcome = BatchRunner::new()
            .run_drt(&req, &StubFitter, |_| calls += 1)
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(calls, 0);
    }
}
