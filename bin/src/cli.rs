use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "birch", version, about = "Structured markup editing engine")]
pub struct Cli {
    /// Log file path, or a directory to place per-process logs in.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Parser)]
pub enum Command {
    /// Parse a document and report the first structural error, if any.
    Validate {
        file: PathBuf,
    },
    /// Print (or rewrite in place) the canonical serialization of a document.
    Format {
        file: PathBuf,
        /// Write the formatted text back to the file instead of stdout.
        #[arg(short, long)]
        write: bool,
    },
    /// Print the element tree of a document.
    Outline {
        file: PathBuf,
        /// Maximum depth to materialize; unlimited when omitted.
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Replace the text content of one element and rewrite the document.
    Set {
        file: PathBuf,
        /// Slash-separated child indices from the root, e.g. `/0/2`.
        path: String,
        value: String,
    },
}
