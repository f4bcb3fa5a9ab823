//! Keyness CLI: log-likelihood keyness over a corpus of HTML documents.
//!
//! Normalizes every raw document, counts its terms, and reports the terms
//! each document over-uses relative to the whole corpus.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
