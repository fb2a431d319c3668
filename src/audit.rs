//! Post-merge correctness audits.
//!
//! [coherence_check] is a cheap sampling spot-audit run on every merge;
//! [concordance_test] is the expensive offline oracle that diffs the two
//! merge algorithms against each other.

use itertools::Itertools;
use log::{debug, info};
use rand::Rng;

use crate::data_structs::{CountsMatrix, CountsTable};
use crate::error::MergeError;
use crate::merge::{merge_recursive, merge_sequential};

/// Checks that the merged matrix looks consistent with the original counts
/// tables by drawing one random gene per table and requiring its count to be
/// identical in the matrix. This catches the majority of merge bugs in real
/// time; it is the last line of defense on the production path and must
/// never be skipped there.
///
/// This is a sampling check, not exhaustive verification: it bounds the risk
/// of silent corruption but does not eliminate it. Full verification is
/// [concordance_test]'s job, at far higher cost.
pub fn coherence_check<R: Rng + ?Sized>(
    tables: &[CountsTable],
    matrix: &CountsMatrix,
    rng: &mut R,
) -> Result<(), MergeError> {
    for table in tables {
        if table.height() == 0 {
            continue;
        }
        let row = rng.gen_range(0..table.height());
        let gene = table.gene_at(row)?;
        let sample = table.sample_name();
        let expected = table.count_at(row)?;
        let actual = matrix.cell(gene, sample)?;

        debug!(
            "coherence sample: ({}, {}) source={:?} merged={:?}",
            sample, gene, expected, actual
        );
        if expected != actual {
            return Err(MergeError::Coherence {
                sample: sample.to_string(),
                gene: gene.to_string(),
                expected,
                actual,
            });
        }
    }
    Ok(())
}

/// Runs both merge algorithms on the same input and requires full structural
/// and value equality, missing cells included. Offline validation only: the
/// extra full sequential merge makes this far too slow for the hot path.
pub fn concordance_test(tables: &[CountsTable]) -> Result<(), MergeError> {
    info!("concordance test has begun");
    info!("merging tables sequentially");
    let sequential = merge_sequential(tables.to_vec())?;
    info!("merging tables recursively");
    let recursive = merge_recursive(tables.to_vec())?;

    info!("asserting concordance between the two matrices");
    if !sequential.equals(&recursive) {
        return Err(MergeError::Concordance {
            detail: diff_matrices(&sequential, &recursive),
        });
    }
    info!("testing completed, results were concordant");
    Ok(())
}

/// Describes the first divergence between two matrices: shape, then column
/// names, then the first unequal column.
fn diff_matrices(
    sequential: &CountsMatrix,
    recursive: &CountsMatrix,
) -> String {
    if sequential.shape() != recursive.shape() {
        return format!(
            "sequential shape {:?} != recursive shape {:?}",
            sequential.shape(),
            recursive.shape()
        );
    }
    if sequential.sample_names() != recursive.sample_names() {
        return format!(
            "sequential columns [{}] != recursive columns [{}]",
            sequential.sample_names().iter().join(", "),
            recursive.sample_names().iter().join(", ")
        );
    }
    for (left, right) in sequential
        .data()
        .get_columns()
        .iter()
        .zip(recursive.data().get_columns())
    {
        if !left
            .as_materialized_series()
            .equals_missing(right.as_materialized_series())
        {
            return format!("column '{}' differs between the two matrices", left.name());
        }
    }
    "matrices differ in an unexpected way".to_string()
}
