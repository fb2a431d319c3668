use log::debug;
use polars::frame::DataFrame;

use super::{expected_shape, finalize, outer_join};
use crate::data_structs::{CountsMatrix, CountsTable};
use crate::error::MergeError;

/// Merges tables with a sequential left-to-right accumulation:
/// `result = result ⋈ table[i]`, one full outer join per input.
///
/// Each join re-scans the whole accumulator, so this path takes much longer
/// than [super::merge_recursive] and exists only as the ground-truth baseline
/// for the concordance test. Do not use it for large input sets.
pub fn merge_sequential(tables: Vec<CountsTable>) -> Result<CountsMatrix, MergeError> {
    if tables.is_empty() {
        return Err(MergeError::EmptyInput);
    }
    let expected = expected_shape(&tables);
    debug!(
        "merging {} tables sequentially, expected shape {:?}",
        tables.len(),
        expected
    );

    let mut result: Option<DataFrame> = None;
    for table in tables {
        result = Some(match result {
            None => table.into(),
            Some(accumulator) => outer_join(accumulator, table.into())?,
        });
    }

    // Non-empty input guarantees at least one iteration above.
    let result = result.ok_or(MergeError::EmptyInput)?;
    finalize(result, expected)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{table, three_tables};
    use super::*;

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            merge_sequential(Vec::new()),
            Err(MergeError::EmptyInput)
        ));
    }

    #[test]
    fn single_table_passes_through() {
        let matrix = merge_sequential(vec![table("s1", &["g1", "g2"], &[1, 2])]).unwrap();
        assert_eq!(matrix.shape(), (2, 1));
        assert_eq!(matrix.sample_names(), vec!["s1"]);
        assert_eq!(matrix.cell("g2", "s1").unwrap(), Some(2));
    }

    #[test]
    fn three_table_scenario() {
        let matrix = merge_sequential(three_tables()).unwrap();
        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix.sample_names(), vec!["s1", "s2", "s3"]);
        for (gene, counts) in [("g1", [10, 11, 12]), ("g2", [20, 21, 22])] {
            for (sample, count) in ["s1", "s2", "s3"].iter().zip(counts) {
                assert_eq!(matrix.cell(gene, sample).unwrap(), Some(count));
            }
        }
    }

    #[test]
    fn columns_are_sorted_regardless_of_input_order() {
        let matrix = merge_sequential(vec![
            table("zebra", &["g1"], &[1]),
            table("alpha", &["g1"], &[2]),
            table("mid", &["g1"], &[3]),
        ])
        .unwrap();
        assert_eq!(matrix.sample_names(), vec!["alpha", "mid", "zebra"]);
    }

    #[test]
    fn value_round_trip() {
        let tables = three_tables();
        let originals = tables.clone();
        let matrix = merge_sequential(tables).unwrap();

        for table in &originals {
            for idx in 0..table.height() {
                let gene = table.gene_at(idx).unwrap();
                assert_eq!(
                    matrix.cell(gene, table.sample_name()).unwrap(),
                    table.count_at(idx).unwrap()
                );
            }
        }
    }

    #[test]
    fn disjoint_gene_sets_fail_the_shape_assertion() {
        // The union has three genes but the first table promised two; the
        // contract treats that as a fatal mismatch, not a bigger matrix.
        let result = merge_sequential(vec![
            table("a", &["g1", "g2"], &[1, 2]),
            table("b", &["g2", "g3"], &[20, 30]),
        ]);
        assert!(matches!(result, Err(MergeError::ShapeMismatch { .. })));
    }
}
