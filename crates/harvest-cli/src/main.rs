use clap::Parser;
use harvest_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible; CI runners log to stderr.
    logging::init_logging(!cli.log_stderr);

    if let Err(err) = cli.run().await {
        eprintln!("harvest error: {:#}", err);
        std::process::exit(1);
    }
}
