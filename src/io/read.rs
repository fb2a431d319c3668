use std::path::PathBuf;

use log::{debug, info};
use polars::prelude::*;

use crate::data_structs::CountsTable;
use crate::error::MergeError;

/// CSV options for a raw counts file: headerless, tab-separated, two columns
/// typed (gene name, Int64 count), with the count column named after the
/// sample so no rename pass is needed afterwards.
fn read_options(sample: &str) -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(false)
        .with_schema(Some(SchemaRef::new(CountsTable::schema(sample))))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(b'\t')
                .with_try_parse_dates(false),
        )
}

/// Reads `(sample identifier, path)` pairs into memory as [CountsTable]s.
///
/// `limit` truncates the source list and exists for testing subsets of a
/// large batch. After loading, every table must have the same shape as the
/// first one; a batch with drifting row counts is rejected outright rather
/// than silently outer-joined into a ragged matrix.
pub fn read_counts(
    sources: &[(String, PathBuf)],
    limit: Option<usize>,
) -> Result<Vec<CountsTable>, MergeError> {
    let sources = match limit {
        Some(n) => &sources[..n.min(sources.len())],
        None => sources,
    };
    if sources.is_empty() {
        return Err(MergeError::EmptyInput);
    }

    info!("reading {} count files into memory", sources.len());
    let mut tables = Vec::with_capacity(sources.len());
    for (sample, path) in sources {
        debug!("reading counts for sample {} from {}", sample, path.display());
        let df = read_options(sample)
            .try_into_reader_with_file_path(Some(path.clone()))?
            .finish()?;
        tables.push(CountsTable::try_from(df)?);
    }

    let expected = tables[0].shape();
    for table in &tables {
        if table.shape() != expected {
            return Err(MergeError::ShapeMismatch {
                expected,
                actual: table.shape(),
            });
        }
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    fn write_counts_file(
        dir: &TempDir,
        name: &str,
        rows: &[(&str, i64)],
    ) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for (gene, count) in rows {
            writeln!(file, "{gene}\t{count}").unwrap();
        }
        path
    }

    #[test]
    fn loads_and_labels_tables() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            (
                "s1".to_string(),
                write_counts_file(&dir, "s1.txt", &[("g1", 10), ("g2", 20)]),
            ),
            (
                "s2".to_string(),
                write_counts_file(&dir, "s2.txt", &[("g1", 11), ("g2", 21)]),
            ),
        ];

        let tables = read_counts(&sources, None).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].sample_name(), "s1");
        assert_eq!(tables[1].sample_name(), "s2");
        assert_eq!(tables[0].gene_at(0).unwrap(), "g1");
        assert_eq!(tables[1].count_at(1).unwrap(), Some(21));
    }

    #[test]
    fn limit_truncates_the_batch() {
        let dir = TempDir::new().unwrap();
        let sources: Vec<_> = (0..4)
            .map(|i| {
                (
                    format!("s{i}"),
                    write_counts_file(&dir, &format!("s{i}.txt"), &[("g1", i)]),
                )
            })
            .collect();

        let tables = read_counts(&sources, Some(2)).unwrap();
        assert_eq!(tables.len(), 2);

        // A limit larger than the batch is not an error.
        assert_eq!(read_counts(&sources, Some(10)).unwrap().len(), 4);
    }

    #[test]
    fn mismatched_row_counts_are_rejected() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            (
                "s1".to_string(),
                write_counts_file(&dir, "s1.txt", &[("g1", 1), ("g2", 2)]),
            ),
            (
                "s2".to_string(),
                write_counts_file(&dir, "s2.txt", &[("g1", 1)]),
            ),
        ];

        assert!(matches!(
            read_counts(&sources, None),
            Err(MergeError::ShapeMismatch {
                expected: (2, 2),
                actual: (1, 2),
            })
        ));
    }

    #[test]
    fn empty_source_list_is_rejected() {
        assert!(matches!(
            read_counts(&[], None),
            Err(MergeError::EmptyInput)
        ));
        let dir = TempDir::new().unwrap();
        let sources = vec![(
            "s1".to_string(),
            write_counts_file(&dir, "s1.txt", &[("g1", 1)]),
        )];
        assert!(matches!(
            read_counts(&sources, Some(0)),
            Err(MergeError::EmptyInput)
        ));
    }
}
