mod concordance;
mod merge;
mod metadata;
mod utils;

use clap::{Parser, Subcommand};
use concordance::ConcordanceArgs;
use console::style;
use merge::{MergeArgs, MergeMode};
use metadata::MetadataArgs;
use utils::UtilsArgs;
use wild::ArgsOs;

#[derive(Parser, Debug)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = "Merge HTSeq feature counts into a single matrix.",
    long_about = None,)]
struct Cli {
    #[command(subcommand)]
    command: MainMenu,
}

#[derive(Subcommand, Debug)]
enum MainMenu {
    #[command(about = "Recursively join counts files (fastest, recommended).")]
    Recursive {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  MergeArgs,
    },

    #[command(about = "Sequentially join counts files (legacy baseline).")]
    Sequential {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  MergeArgs,
    },

    #[command(
        name = "concordance-test",
        about = "Check the concordance of recursive and sequential matrix creation."
    )]
    ConcordanceTest {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  ConcordanceArgs,
    },

    #[command(about = "Compile a metadata matrix from per-sample annotation records.")]
    Metadata {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  MetadataArgs,
    },
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("{} {:#}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args: ArgsOs = wild::args_os();
    let cli = Cli::parse_from(args);

    match cli.command {
        MainMenu::Recursive { utils, args } => {
            utils.setup()?;
            args.run(&utils, MergeMode::Recursive)?;
        },
        MainMenu::Sequential { utils, args } => {
            utils.setup()?;
            args.run(&utils, MergeMode::Sequential)?;
        },
        MainMenu::ConcordanceTest { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Metadata { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
    }
    Ok(())
}
