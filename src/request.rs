use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Batch request
// ---------------------------------------------------------------------------

/// Operation requested by the shell for one batch run.
///
/// `Eis` and `ZView` both take the ZView extraction path, and `Lsv` shares
/// the CV reader; the aliases stay distinct so output files keep the name
/// the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Eis,
    ZView,
    Cv,
    Ca,
    Cp,
    Tafel,
    Lsv,
    Drt,
}

impl Operation {
    /// Name used in merged-output file names.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Eis => "EIS",
            Operation::ZView => "ZView",
            Operation::Cv => "CV",
            Operation::Ca => "CA",
            Operation::Cp => "CP",
            Operation::Tafel => "Tafel",
            Operation::Lsv => "LSV",
            Operation::Drt => "DRT",
        }
    }

    /// Impedance-type operations always keep a per-file frequency axis in
    /// the merged output; the single-shared-x option does not apply.
    pub fn is_impedance(&self) -> bool {
        matches!(self, Operation::Eis | Operation::ZView)
    }
}

/// Bounds accepted for regularization strengths, matching the shell's
/// parameter dialog.
pub const LAMBDA_RANGE: std::ops::RangeInclusive<f64> = 1e-6..=1000.0;

/// Immutable description of one batch run.
///
/// The interactive shell produces one of these per run from its selection
/// state; the core never reaches back into shell state. Cancellation of a
/// shell dialog retains the previous value, so a request always carries a
/// complete parameter set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Selected folder or file paths.
    pub paths: Vec<PathBuf>,
    pub operation: Operation,
    /// Keep only the first x column in merged output (non-impedance types).
    pub single_x_axis: bool,
    /// DRT regularization strength.
    pub lambda: f64,
    /// Also fit a distribution of phasance alongside the DRT.
    pub dop_enabled: bool,
    /// DOP regularization strength.
    pub dop_lambda: f64,
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            operation: Operation::Eis,
            single_x_axis: false,
            lambda: 10.0,
            dop_enabled: false,
            dop_lambda: 10.0,
        }
    }
}

impl BatchRequest {
    /// Check the regularization parameters against the dialog bounds.
    /// The shell validates on input; the core validates again on entry.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            LAMBDA_RANGE.contains(&self.lambda),
            "lambda {} outside {:?}",
            self.lambda,
            LAMBDA_RANGE
        );
        if self.dop_enabled {
            anyhow::ensure!(
                LAMBDA_RANGE.contains(&self.dop_lambda),
                "DOP lambda {} outside {:?}",
                self.dop_lambda,
                LAMBDA_RANGE
            );
        }
        Ok(())
    }
}
