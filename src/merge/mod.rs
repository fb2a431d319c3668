//! The matrix-merge engine. Two algorithms share one contract: consume a
//! non-empty list of [CountsTable]s and produce a [CountsMatrix] whose rows
//! are the union of all gene names and whose columns are the sample
//! identifiers sorted lexicographically.
//!
//! [merge_sequential] is the low-throughput correctness baseline;
//! [merge_recursive] is the production path.

mod recursive;
mod sequential;

pub use recursive::merge_recursive;
pub use sequential::merge_sequential;

use std::iter::once;

use itertools::Itertools;
use polars::prelude::*;

use crate::data_structs::{CountsMatrix, CountsTable, GENE_COL};
use crate::error::MergeError;

const JOIN_ARGS: JoinArgs = JoinArgs {
    how:            JoinType::Full,
    validation:     JoinValidation::ManyToMany,
    suffix:         None,
    slice:          None,
    join_nulls:     false,
    coalesce:       JoinCoalesce::CoalesceColumns,
    maintain_order: MaintainOrderJoin::None,
};

/// Full outer join of two intermediate frames on the gene-name column,
/// keeping every gene from both sides and coalescing the key columns. This
/// is the single pairwise operation both mergers are built from.
pub fn outer_join(
    left: DataFrame,
    right: DataFrame,
) -> PolarsResult<DataFrame> {
    left.join(&right, [GENE_COL], [GENE_COL], JOIN_ARGS)
}

/// Shape the final matrix must have: the first table's row count by the
/// number of input tables. Holds whenever all inputs share one gene set,
/// which loading already enforced; violation here means a merge defect.
pub(crate) fn expected_shape(tables: &[CountsTable]) -> (usize, usize) {
    (tables[0].height(), tables.len())
}

/// Normalizes a reduced frame into the output matrix: sample columns sorted
/// lexicographically, rows sorted by gene name, then the fatal shape
/// assertion. Both mergers finalize through here so their outputs are
/// directly comparable.
pub(crate) fn finalize(
    result: DataFrame,
    expected: (usize, usize),
) -> Result<CountsMatrix, MergeError> {
    let ordered = once(GENE_COL.to_string())
        .chain(
            result
                .get_column_names_str()
                .into_iter()
                .filter(|name| *name != GENE_COL)
                .map(String::from)
                .sorted_unstable(),
        )
        .collect::<Vec<_>>();

    let normalized = result
        .select(ordered)?
        .sort([GENE_COL], SortMultipleOptions::default())?;

    let matrix = CountsMatrix::new_unchecked(normalized);
    if matrix.shape() != expected {
        return Err(MergeError::ShapeMismatch {
            expected,
            actual: matrix.shape(),
        });
    }
    Ok(matrix)
}
