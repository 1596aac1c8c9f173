use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create and format a disk image
    Make {
        disk: PathBuf,
        /// Number of data blocks
        data_blocks: usize,
    },
    /// Print the volume layout
    Info { disk: PathBuf },
    /// List the root directory
    Ls { disk: PathBuf },
    /// Copy a host file into the image
    Add { disk: PathBuf, host_file: PathBuf },
    /// Delete a file
    Rm { disk: PathBuf, name: String },
    /// Print a file to stdout
    Cat { disk: PathBuf, name: String },
    /// Print the size of a file
    Stat { disk: PathBuf, name: String },
}
