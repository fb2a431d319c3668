use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, ValueEnum};
use console::style;
use log::info;
use mergecounts::prelude::*;

use crate::utils::{expand_wildcards, sample_identifier, UtilsArgs};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MergeMode {
    Sequential,
    Recursive,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub(crate) enum OutputFileType {
    Tsv,
    Csv,
    Ipc,
}

impl From<OutputFileType> for OutputFormat {
    fn from(value: OutputFileType) -> Self {
        match value {
            OutputFileType::Tsv => OutputFormat::Tsv,
            OutputFileType::Csv => OutputFormat::Csv,
            OutputFileType::Ipc => OutputFormat::Ipc,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct MergeArgs {
    #[arg(
        value_parser,
        num_args = 1..,
        required = true,
        help = "Paths to counts files (glob patterns allowed)."
    )]
    files: Vec<String>,

    #[arg(
        short = 'o',
        long,
        help = "Output file path. Defaults to counts-matrix.<ext>."
    )]
    output_file: Option<PathBuf>,

    #[arg(short = 't', long, value_enum, default_value_t = OutputFileType::Tsv)]
    output_file_type: OutputFileType,

    #[arg(
        long,
        help = "Suffix trimmed from file names to obtain sample identifiers."
    )]
    strip_suffix: Option<String>,

    #[arg(
        long,
        help = "For testing purposes only, merge just the first N inputs."
    )]
    limit_inputs: Option<usize>,
}

impl MergeArgs {
    pub fn run(
        &self,
        utils: &UtilsArgs,
        mode: MergeMode,
    ) -> anyhow::Result<()> {
        let sources = sources_from(&self.files, self.strip_suffix.as_deref())?;
        let tables = read_counts(&sources, self.limit_inputs)?;

        let spinner = utils.spinner(match mode {
            MergeMode::Recursive => "Merging recursively...",
            MergeMode::Sequential => "Merging sequentially...",
        });
        let matrix = match mode {
            MergeMode::Recursive => merge_recursive(tables.clone()),
            MergeMode::Sequential => merge_sequential(tables.clone()),
        }?;
        spinner.finish_and_clear();

        info!("checking consistency with the original counts files by random sampling");
        coherence_check(&tables, &matrix, &mut rand::thread_rng())?;

        let format = OutputFormat::from(self.output_file_type);
        let path = self.output_file.clone().unwrap_or_else(|| {
            PathBuf::from(format!("counts-matrix.{}", format.extension()))
        });
        write_matrix(&matrix, &path, format)?;
        println!(
            "[{}] Wrote {} genes x {} samples to {}",
            style("V").green(),
            matrix.n_genes(),
            matrix.n_samples(),
            path.display()
        );
        Ok(())
    }
}

/// Expands wildcards and pairs every input path with its sample identifier.
pub(crate) fn sources_from(
    files: &[String],
    strip_suffix: Option<&str>,
) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let paths = expand_wildcards(files);
    if paths.is_empty() {
        bail!("no input files matched the given paths");
    }
    for path in &paths {
        if !path.is_file() {
            bail!("path {} is not a file", path.display());
        }
    }
    Ok(paths
        .into_iter()
        .map(|path| (sample_identifier(&path, strip_suffix), path))
        .collect())
}
