use log::debug;
use polars::frame::DataFrame;
use polars::prelude::PolarsResult;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use super::{expected_shape, finalize, outer_join};
use crate::data_structs::{CountsMatrix, CountsTable};
use crate::error::MergeError;

/// Merges tables with a divide-and-conquer reduction tree. Each round pairs
/// the surviving frames left-to-right, outer-joins every pair in parallel,
/// and passes an odd trailing frame through unmerged; rounds repeat until one
/// frame remains. This is the production merge path.
///
/// A reduction over N inputs performs exactly N - 1 pairwise joins; the
/// bookkeeping is verified after the reduction and any mismatch aborts as an
/// internal defect rather than returning a possibly-wrong matrix.
pub fn merge_recursive(tables: Vec<CountsTable>) -> Result<CountsMatrix, MergeError> {
    if tables.is_empty() {
        return Err(MergeError::EmptyInput);
    }
    let expected = expected_shape(&tables);
    let num_tables = tables.len();
    debug!(
        "merging {} tables recursively, expected shape {:?}",
        num_tables, expected
    );

    let worklist = tables.into_iter().map(DataFrame::from).collect();
    let (result, joins_performed) = reduce(worklist)?;

    if joins_performed != num_tables - 1 {
        return Err(MergeError::MergeArithmetic {
            expected: num_tables - 1,
            actual:   joins_performed,
        });
    }

    // Pairing order scrambles the columns, so the lexicographic re-sort in
    // finalize is mandatory here, not just cosmetic.
    finalize(result, expected)
}

/// Runs reduction rounds until one frame remains, returning it together with
/// the number of pairwise joins performed. Every round reads a fixed input
/// list and produces a new output list, which is what makes the parallel map
/// safe and the tree shape deterministic: round k + 1 starts only after every
/// join of round k has completed.
fn reduce(mut worklist: Vec<DataFrame>) -> Result<(DataFrame, usize), MergeError> {
    let mut joins_performed = 0;
    let mut round = 0;

    while worklist.len() > 1 {
        round += 1;
        let pairs = {
            let mut remaining = worklist.into_iter();
            let mut pairs = Vec::new();
            while let Some(left) = remaining.next() {
                pairs.push((left, remaining.next()));
            }
            pairs
        };
        joins_performed += pairs.iter().filter(|(_, right)| right.is_some()).count();
        debug!(
            "round {}: {} frames, {} pairwise joins",
            round,
            pairs.len(),
            pairs.iter().filter(|(_, right)| right.is_some()).count()
        );

        worklist = pairs
            .into_par_iter()
            .map(|(left, right)| {
                match right {
                    Some(right) => outer_join(left, right),
                    None => Ok(left),
                }
            })
            .collect::<PolarsResult<Vec<_>>>()?;
    }

    match worklist.pop() {
        Some(result) if worklist.is_empty() => Ok((result, joins_performed)),
        _ => {
            Err(MergeError::MergeArithmetic {
                expected: 1,
                actual:   worklist.len() + 1,
            })
        },
    }
}
