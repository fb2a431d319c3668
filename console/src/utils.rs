use std::path::{Path, PathBuf};

use clap::Args;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

#[derive(Args, Debug, Clone)]
pub(crate) struct UtilsArgs {
    #[arg(
        short,
        long,
        help = "Enable verbose logging (DEBUG logging level)."
    )]
    pub verbose: bool,

    #[arg(
        long,
        default_value_t = mergecounts::utils::n_threads(),
        help = "Number of threads used for parallel joins."
    )]
    pub threads: usize,

    #[arg(long, help = "Display progress bars.")]
    pub progress: bool,
}

impl UtilsArgs {
    pub fn setup(&self) -> anyhow::Result<()> {
        pretty_env_logger::formatted_builder()
            .filter_level(if self.verbose {
                LevelFilter::Debug
            }
            else {
                LevelFilter::Info
            })
            .try_init()?;
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build_global()?;
        Ok(())
    }

    /// Progress bar over `total` items, hidden unless `--progress` was given.
    pub fn pbar(
        &self,
        total: usize,
    ) -> anyhow::Result<ProgressBar> {
        if self.progress {
            init_pbar(total)
        }
        else {
            Ok(ProgressBar::hidden())
        }
    }

    /// Indeterminate spinner with a message, hidden unless `--progress`.
    pub fn spinner(
        &self,
        message: &str,
    ) -> ProgressBar {
        if self.progress {
            let spinner = ProgressBar::new_spinner();
            spinner.set_message(message.to_string());
            spinner
        }
        else {
            ProgressBar::hidden()
        }
    }
}

pub(crate) fn init_pbar(total: usize) -> anyhow::Result<ProgressBar> {
    let progress_bar = ProgressBar::new(total as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}, ETA: {eta}] [{bar:40.cyan/blue}] {pos:>5.green}/{len:5} {msg}")?
            .progress_chars("#>-"),
    );
    progress_bar.set_message("Processing...");
    Ok(progress_bar)
}

pub(crate) fn expand_wildcards(paths: &[String]) -> Vec<PathBuf> {
    let mut expanded_paths = Vec::new();

    for path in paths {
        if path.contains('*') || path.contains('?') {
            // Expand wildcard using glob
            match glob(path) {
                Ok(matches) => {
                    for entry in matches.filter_map(Result::ok) {
                        expanded_paths.push(entry);
                    }
                },
                Err(e) => eprintln!("Error processing wildcard '{}': {}", path, e),
            }
        }
        else {
            // If not a wildcard, push the path as-is
            expanded_paths.push(PathBuf::from(path));
        }
    }

    expanded_paths
}

/// Derives a sample identifier from a counts file name: the file name with
/// `strip_suffix` removed when it matches, the file stem otherwise.
pub(crate) fn sample_identifier(
    path: &Path,
    strip_suffix: Option<&str>,
) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(suffix) = strip_suffix {
        if let Some(stripped) = file_name.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_identifier_strips_suffix() {
        let path = Path::new("/data/SJE001.RNA-Seq.feature-counts.txt");
        assert_eq!(
            sample_identifier(path, Some(".RNA-Seq.feature-counts.txt")),
            "SJE001"
        );
    }

    #[test]
    fn sample_identifier_falls_back_to_stem() {
        let path = Path::new("/data/SJE001.txt");
        assert_eq!(sample_identifier(path, None), "SJE001");
        assert_eq!(sample_identifier(path, Some(".nope")), "SJE001");
    }
}
