use std::process::ExitCode;

use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    let cli = playlistgen::cli::Cli::parse();
    playlistgen::init(cli.log_level());

    playlistgen::cli::execute(cli)
}
