use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Build and manage vector collections of catalysis papers.
///
/// Papers come from a local PDF directory or an arXiv keyword search; each
/// is chunked, embedded and stored under a collection name.
#[derive(Parser, Debug)]
#[command(name = "catbase", version, about = "Vector collections of catalysis papers")]
pub struct CliArgs {
    /// Storage directory (overrides STORAGE_PATH)
    #[arg(long, global = true)]
    pub storage_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Say hello to NAME
    Hello {
        #[arg(long, default_value = "Fellow Catalysis Enthusiast")]
        name: String,
    },

    /// List all collections
    List,

    /// Delete a collection
    Pluck {
        #[arg(short = 'n', long = "database-name")]
        database_name: String,
    },

    /// Inspect a collection in human-readable form
    Inspect {
        #[arg(short = 'n', long = "database-name")]
        database_name: String,

        /// Number of sample chunks to print
        #[arg(short = 's', long, default_value = "5")]
        sample: usize,
    },

    /// Create a collection from a directory of PDFs
    Create {
        #[arg(short = 'n', long = "database-name")]
        database_name: String,

        #[arg(short = 'd', long = "pdf-directory")]
        pdf_directory: PathBuf,
    },

    /// Create a collection from an arXiv keyword search
    Arxiv {
        #[arg(short = 'n', long = "database-name")]
        database_name: String,

        /// Comma-separated search keywords
        #[arg(short = 'k', long = "keyword-list")]
        keyword_list: String,

        /// Maximum results per keyword
        #[arg(short = 'm', long = "max-docs", default_value = "10")]
        max_docs: usize,
    },
}
