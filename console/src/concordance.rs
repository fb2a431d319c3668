use clap::Args;
use console::style;
use mergecounts::prelude::*;

use crate::merge::sources_from;
use crate::utils::UtilsArgs;

#[derive(Args, Debug, Clone)]
pub(crate) struct ConcordanceArgs {
    #[arg(
        value_parser,
        num_args = 1..,
        required = true,
        help = "Paths to counts files (glob patterns allowed)."
    )]
    files: Vec<String>,

    #[arg(
        long,
        help = "Suffix trimmed from file names to obtain sample identifiers."
    )]
    strip_suffix: Option<String>,

    #[arg(
        long,
        help = "For testing purposes only, test just the first N inputs."
    )]
    limit_inputs: Option<usize>,
}

impl ConcordanceArgs {
    /// Runs both merge algorithms and asserts their outputs are identical.
    /// Writes no output file.
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let sources = sources_from(&self.files, self.strip_suffix.as_deref())?;
        let tables = read_counts(&sources, self.limit_inputs)?;
        concordance_test(&tables)?;
        println!(
            "[{}] {}",
            style("V").green(),
            style("Sequential and recursive results were concordant").green()
        );
        Ok(())
    }
}
