use clap::Parser;
use tradesim::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
