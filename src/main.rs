//! BTOR IR translation driver entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: register the available
//! translations, parse args, dispatch to the selected translation, and exit
//! with appropriate status. For programmatic use, prefer the library API
//! (`btorir::api`).

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    btorir::translate::register_all_translations();
    let args = cli::CliArgs::parse();
    cli::run(args)
}
