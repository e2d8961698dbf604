//! Batch conversion and DRT pre-processing for electrochemical
//! instrument data.
//!
//! Ingests potentiostat exports (CHI, Gamry, BioLogic, ZPlot, RelaxIS —
//! heterogeneous text and binary layouts with no shared schema or format
//! tag), classifies each file from header content, parses it into a table
//! with canonical column names, and merges whole batches into
//! timestamp-ordered tab-separated datasets for plotting and DRT/DOP
//! analysis.
//!
//! The interactive shell, the plot renderer, the DRT numerical fitter,
//! and the BioLogic `.mpr` binary reader are external collaborators:
//! the shell passes a [`request::BatchRequest`] in, the others are reached
//! through the [`fit::DrtFitter`] / [`data::mpr::MprReader`] traits and
//! the completion callbacks of [`batch::BatchRunner`].

pub mod batch;
pub mod data;
pub mod error;
pub mod fit;
pub mod output;
pub mod request;

pub use batch::{BatchRunner, DrtOutcome, DrtPlotPayload, MergedDataset, MergedSeries, PlotPayload};
pub use data::eis::{assemble_eis, EisReader, EisSpectrum};
pub use data::mpr::{MprData, MprReader};
pub use data::source::{detect_source, ChiKind, SourceFormat};
pub use data::table::{ColumnData, ParsedTable};
pub use error::LoadError;
pub use fit::{fixed_basis_tau, DrtFitter, FitModel, FitOptions};
pub use request::{BatchRequest, Operation};
