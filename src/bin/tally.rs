use clap::Parser;

use tally::cli::{self, Cli};

fn main() {
    let args = Cli::parse();
    tally::init();

    if let Err(err) = cli::run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
