//! Standalone decorator stage.
//!
//! Reads batches of records as newline-delimited JSON from standard input, decorates them with the configured device
//! profile, and writes the decorated batches to standard output.

#![deny(warnings)]
#![deny(missing_docs)]

use clap::Parser as _;
use tracing::{error, info};

mod config;
use self::config::{Action, Cli};

mod logging;
use self::logging::{fatal_and_exit, initialize_logging};

mod pipeline;
use self::pipeline::run;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging(None) {
        fatal_and_exit(format!("failed to initialize logging: {}", e));
    }

    match cli.action {
        Action::Run(config) => match run(config).await {
            Ok(()) => info!("Decorator stage stopped."),
            Err(e) => {
                error!("{:?}", e);
                std::process::exit(1);
            }
        },
    }
}
