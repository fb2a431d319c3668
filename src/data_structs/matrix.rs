use polars::prelude::*;

use super::GENE_COL;
use crate::error::MergeError;

/// The merged genes x samples matrix: a `"Gene Name"` column plus one Int64
/// column per input sample. Sample columns are sorted lexicographically and
/// rows are sorted by gene name; a gene absent from a sample's source table
/// is a null cell (outer-join semantics).
#[derive(Clone, Debug)]
pub struct CountsMatrix(DataFrame);

impl CountsMatrix {
    /// Wraps a finalized merge result without re-validating it. Only the
    /// merge finalizer constructs matrices, after its own shape assertion.
    pub(crate) fn new_unchecked(df: DataFrame) -> Self {
        CountsMatrix(df)
    }

    /// Number of sample columns.
    pub fn n_samples(&self) -> usize {
        self.0.width() - 1
    }

    /// Number of gene rows.
    pub fn n_genes(&self) -> usize {
        self.0.height()
    }

    /// (genes, samples), the shape the merge contract asserts on. The
    /// gene-name column is the row index, not a sample, so it is excluded.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_genes(), self.n_samples())
    }

    /// Sample identifiers in column order.
    pub fn sample_names(&self) -> Vec<&str> {
        self.0
            .get_column_names_str()
            .into_iter()
            .filter(|name| *name != GENE_COL)
            .collect()
    }

    /// Value at (`gene`, `sample`). `Ok(None)` means a missing cell: the
    /// gene is absent from the matrix or was absent from that sample's
    /// source table. An unknown `sample` column is an error.
    pub fn cell(
        &self,
        gene: &str,
        sample: &str,
    ) -> Result<Option<i64>, MergeError> {
        let genes = self.0.column(GENE_COL)?.str()?;
        let row = match genes.iter().position(|g| g == Some(gene)) {
            Some(row) => row,
            None => return Ok(None),
        };
        Ok(self.0.column(sample)?.i64()?.get(row))
    }

    /// Full structural and value equality, with missing cells compared
    /// exactly (null == null).
    pub fn equals(
        &self,
        other: &CountsMatrix,
    ) -> bool {
        self.0.equals_missing(&other.0)
    }

    /// Reference to the inner [DataFrame].
    pub fn data(&self) -> &DataFrame {
        &self.0
    }
}

impl From<CountsMatrix> for DataFrame {
    fn from(matrix: CountsMatrix) -> Self {
        matrix.0
    }
}
