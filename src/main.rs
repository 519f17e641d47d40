use clap::Parser;
use tradebook::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
