use std::error::Error;
use std::fmt::{self, Display, Formatter};

use polars::prelude::PolarsError;

/// Suggested to the user whenever a failure indicates a defect in this tool
/// rather than bad input.
pub const REPORT_POSTLUDE: &str = "Please report this error by filing a \
     Github issue at https://github.com/stjudecloud/merge-counts/issues.";

/// Fatal conditions raised by the merge engine. None of these are retried:
/// each one means either invalid input or a latent bug, and the only correct
/// behavior is to abort with enough context to diagnose it.
#[derive(Debug)]
pub enum MergeError {
    /// Merge or load was invoked with zero tables.
    EmptyInput,
    /// A loaded table, or the final matrix, has unexpected dimensions.
    ShapeMismatch {
        expected: (usize, usize),
        actual:   (usize, usize),
    },
    /// Reduction-tree join-count bookkeeping is internally inconsistent.
    MergeArithmetic {
        expected: usize,
        actual:   usize,
    },
    /// A randomly sampled source value disagrees with the merged matrix.
    Coherence {
        sample:   String,
        gene:     String,
        expected: Option<i64>,
        actual:   Option<i64>,
    },
    /// Sequential and recursive merge outputs diverged.
    Concordance {
        detail: String,
    },
    /// Error surfaced by the underlying DataFrame engine.
    Polars(PolarsError),
}

fn fmt_count(value: &Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "<missing>".to_string(),
    }
}

impl Display for MergeError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> fmt::Result {
        match self {
            MergeError::EmptyInput => {
                write!(f, "Must contain at least one count file to merge.")
            },
            MergeError::ShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "Matrix shape {:?} does not match expected shape {:?}! {}",
                    actual, expected, REPORT_POSTLUDE
                )
            },
            MergeError::MergeArithmetic { expected, actual } => {
                write!(
                    f,
                    "Reduction-tree bookkeeping was incorrect: performed {} \
                     pairwise joins, expected {}. {}",
                    actual, expected, REPORT_POSTLUDE
                )
            },
            MergeError::Coherence {
                sample,
                gene,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Found inconsistencies when randomly sampling counts for \
                     coherence. Specifically, {} for gene {} has count {} in \
                     the standalone count file but has value {} in the merged \
                     counts matrix. This must be fixed by the developers! {}",
                    sample,
                    gene,
                    fmt_count(expected),
                    fmt_count(actual),
                    REPORT_POSTLUDE
                )
            },
            MergeError::Concordance { detail } => {
                write!(
                    f,
                    "Sequential and recursive merge results were not \
                     concordant: {}. {}",
                    detail, REPORT_POSTLUDE
                )
            },
            MergeError::Polars(e) => write!(f, "DataFrame error: {}", e),
        }
    }
}

impl Error for MergeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MergeError::Polars(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PolarsError> for MergeError {
    fn from(err: PolarsError) -> Self {
        MergeError::Polars(err)
    }
}
