use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use log::info;
use polars::prelude::*;
use tempfile::NamedTempFile;

use crate::data_structs::CountsMatrix;

/// Supported output sinks for a merged matrix. `Ipc` is the binary columnar
/// format (Arrow IPC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tsv,
    Csv,
    Ipc,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Csv => "csv",
            OutputFormat::Ipc => "ipc",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tsv" => Ok(OutputFormat::Tsv),
            "csv" => Ok(OutputFormat::Csv),
            "ipc" => Ok(OutputFormat::Ipc),
            other => anyhow::bail!("unhandled output file type: {other}"),
        }
    }
}

/// Serializes the merged counts matrix. See [write_frame].
pub fn write_matrix(
    matrix: &CountsMatrix,
    path: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    write_frame(matrix.data(), path, format)
}

/// Writes a frame to `path` in the selected format. The header row carries
/// the row-index label first, then the column labels in frame order.
///
/// The frame is written to a temporary file in the destination directory and
/// moved into place only once the write has fully succeeded, so a failure
/// never leaves a partial output file behind.
pub fn write_frame(
    frame: &DataFrame,
    path: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent)?;

    let mut frame = frame.clone();
    match format {
        OutputFormat::Tsv => {
            CsvWriter::new(tmp.as_file_mut())
                .include_header(true)
                .with_separator(b'\t')
                .finish(&mut frame)?;
        },
        OutputFormat::Csv => {
            CsvWriter::new(tmp.as_file_mut())
                .include_header(true)
                .finish(&mut frame)?;
        },
        OutputFormat::Ipc => {
            IpcWriter::new(tmp.as_file_mut()).finish(&mut frame)?;
        },
    }
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    info!(
        "wrote {} rows x {} columns to {}",
        frame.height(),
        frame.width(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::TempDir;

    use super::*;
    use crate::data_structs::GENE_COL;

    fn matrix() -> CountsMatrix {
        CountsMatrix::new_unchecked(
            df![
                GENE_COL => ["g1", "g2"],
                "s1" => [Some(10i64), Some(20)],
                "s2" => [None, Some(21i64)]
            ]
            .unwrap(),
        )
    }

    #[test]
    fn tsv_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("counts-matrix.tsv");
        write_matrix(&matrix(), &path, OutputFormat::Tsv).unwrap();

        let read_back = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_separator(b'\t'))
            .try_into_reader_with_file_path(Some(path))
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(read_back.shape(), (2, 3));
        assert_eq!(
            read_back.get_column_names_str(),
            vec![GENE_COL, "s1", "s2"]
        );
    }

    #[test]
    fn csv_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("counts-matrix.csv");
        write_matrix(&matrix(), &path, OutputFormat::Csv).unwrap();

        let read_back = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path))
            .unwrap()
            .finish()
            .unwrap();
        assert!(read_back.equals_missing(matrix().data()));
    }

    #[test]
    fn ipc_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("counts-matrix.ipc");
        write_matrix(&matrix(), &path, OutputFormat::Ipc).unwrap();

        let read_back = IpcReader::new(File::open(&path).unwrap())
            .finish()
            .unwrap();
        assert!(read_back.equals_missing(matrix().data()));
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-subdir").join("out.tsv");
        assert!(write_matrix(&matrix(), &path, OutputFormat::Tsv).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn format_parsing() {
        assert_eq!("tsv".parse::<OutputFormat>().unwrap(), OutputFormat::Tsv);
        assert_eq!("IPC".parse::<OutputFormat>().unwrap(), OutputFormat::Ipc);
        assert!("hdf".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Csv.extension(), "csv");
    }
}
