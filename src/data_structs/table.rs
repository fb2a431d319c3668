use polars::prelude::*;

use super::GENE_COL;
use crate::error::MergeError;

/// A single sample's counts: a [DataFrame] with
/// 1. A `"Gene Name"` string column with unique, non-null values
/// 2. Exactly one Int64 count column, named by the sample identifier
///
/// Tables are constructed once per merge invocation and consumed (moved) by
/// exactly one merge algorithm. Callers that need the originals afterwards,
/// such as the coherence check, clone before merging.
#[derive(Clone, Debug)]
pub struct CountsTable(DataFrame);

impl CountsTable {
    /// Expected schema of the raw two-column counts file for `sample`.
    pub fn schema(sample: &str) -> Schema {
        Schema::from_iter([
            (PlSmallStr::from_static(GENE_COL), DataType::String),
            (PlSmallStr::from_str(sample), DataType::Int64),
        ])
    }

    /// Sample identifier, i.e. the name of the single count column.
    pub fn sample_name(&self) -> &str {
        self.0.get_columns()[1].name().as_str()
    }

    /// Number of rows (genes) in this table.
    pub fn height(&self) -> usize {
        self.0.height()
    }

    /// (rows, columns) of the underlying frame.
    pub fn shape(&self) -> (usize, usize) {
        self.0.shape()
    }

    /// Gene name at `idx`.
    pub fn gene_at(
        &self,
        idx: usize,
    ) -> PolarsResult<&str> {
        self.0
            .column(GENE_COL)?
            .str()?
            .get(idx)
            .ok_or_else(|| polars_err!(ComputeError: "null gene name at row {}", idx))
    }

    /// Count at `idx`. Source files carry no nulls, but the accessor keeps
    /// the option so a corrupted cell surfaces as a value mismatch instead
    /// of a panic.
    pub fn count_at(
        &self,
        idx: usize,
    ) -> PolarsResult<Option<i64>> {
        Ok(self.0.column(self.sample_name())?.i64()?.get(idx))
    }

    /// Reference to the inner [DataFrame].
    pub fn data(&self) -> &DataFrame {
        &self.0
    }
}

impl TryFrom<DataFrame> for CountsTable {
    type Error = MergeError;

    /// Validates the two-column layout and gene-name uniqueness.
    fn try_from(df: DataFrame) -> Result<Self, Self::Error> {
        if df.width() != 2 {
            return Err(MergeError::ShapeMismatch {
                expected: (df.height(), 2),
                actual:   df.shape(),
            });
        }
        let gene = df.column(GENE_COL)?;
        if !matches!(gene.dtype(), DataType::String) {
            return Err(MergeError::Polars(
                polars_err!(SchemaMismatch: "'{}' column must be a string column", GENE_COL),
            ));
        }
        if gene.null_count() > 0 || gene.n_unique()? != df.height() {
            return Err(MergeError::Polars(
                polars_err!(ComputeError: "'{}' column must hold unique, non-null gene names", GENE_COL),
            ));
        }
        let counts = &df.get_columns()[1];
        if !matches!(counts.dtype(), DataType::Int64) {
            return Err(MergeError::Polars(
                polars_err!(SchemaMismatch: "count column '{}' must be Int64", counts.name()),
            ));
        }
        Ok(CountsTable(df))
    }
}

impl From<CountsTable> for DataFrame {
    fn from(table: CountsTable) -> Self {
        table.0
    }
}
