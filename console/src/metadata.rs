use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use console::style;
use log::info;
use mergecounts::cache::{default_pointer, FileCache};
use mergecounts::io::write::{write_frame, OutputFormat};
use mergecounts::metadata::{
    annotations_from_record,
    collect_metadata,
    read_annotation,
    MetadataSchema,
};

use crate::merge::OutputFileType;
use crate::utils::{expand_wildcards, UtilsArgs};

#[derive(Args, Debug, Clone)]
pub(crate) struct MetadataArgs {
    #[arg(
        value_parser,
        num_args = 1..,
        required = true,
        help = "Paths to per-sample annotation records (JSON, glob patterns allowed)."
    )]
    files: Vec<String>,

    #[arg(
        short = 'o',
        long,
        help = "Output file path. Defaults to metadata-matrix.<ext>."
    )]
    output_file: Option<PathBuf>,

    #[arg(short = 't', long, value_enum, default_value_t = OutputFileType::Tsv)]
    output_file_type: OutputFileType,

    #[arg(
        long,
        help = "Enable the filesystem record cache to speed up development. \
                The cache deserializes JSON without safety checks; only \
                specify this if you are a developer of this tool."
    )]
    developer_mode: bool,
}

impl MetadataArgs {
    pub fn run(
        &self,
        utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let paths = expand_wildcards(&self.files);
        if paths.is_empty() {
            bail!("no annotation records matched the given paths");
        }

        let mut cache = if self.developer_mode {
            let cache = FileCache::discover(&default_pointer()?)?;
            info!("using cache at directory: {}", cache.root().display());
            Some(cache)
        }
        else {
            None
        };

        let schema = MetadataSchema::default();
        let pbar = utils.pbar(paths.len())?;
        pbar.set_message("Collecting sample metadata");

        let mut samples = Vec::with_capacity(paths.len());
        for path in paths {
            let id = path.to_string_lossy().into_owned();
            let record = match cache.as_ref().and_then(|c| c.get(&id)).cloned() {
                Some(record) => record,
                None => {
                    let record = read_annotation(&path)?;
                    if let Some(cache) = cache.as_mut() {
                        cache.insert(&id, record.clone())?;
                    }
                    record
                },
            };
            samples.push(annotations_from_record(&record, &schema)?);
            pbar.inc(1);
        }
        pbar.finish_and_clear();

        let frame = collect_metadata(&samples, &schema)?;
        let format = OutputFormat::from(self.output_file_type);
        let path = self.output_file.clone().unwrap_or_else(|| {
            PathBuf::from(format!("metadata-matrix.{}", format.extension()))
        });
        write_frame(&frame, &path, format)?;
        println!(
            "[{}] Wrote metadata for {} samples to {}",
            style("V").green(),
            frame.height(),
            path.display()
        );
        Ok(())
    }
}
