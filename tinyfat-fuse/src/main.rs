mod cli;

use std::io;

use clap::Parser;
use tinyfat_fuse::commands;

use self::cli::{Cli, Command};

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();
    match cli.command {
        Command::Make { disk, data_blocks } => commands::make(&disk, data_blocks),
        Command::Info { disk } => commands::info(&disk, &mut out),
        Command::Ls { disk } => commands::ls(&disk, &mut out),
        Command::Add { disk, host_file } => {
            let written = commands::add(&disk, &host_file)?;
            log::info!("added {host_file:?}: {written} bytes");
            Ok(())
        }
        Command::Rm { disk, name } => commands::rm(&disk, &name),
        Command::Cat { disk, name } => commands::cat(&disk, &name, &mut out),
        Command::Stat { disk, name } => commands::stat(&disk, &name, &mut out),
    }
}
