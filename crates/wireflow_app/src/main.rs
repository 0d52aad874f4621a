// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wireflow - headless node graph editor.
//!
//! Documents hold a dataflow graph of typed nodes and wires. Each command
//! opens a document, changes it through the graph engine and saves it, so
//! every value shown is already recomputed.
//!
//! ## Usage
//!
//! ```bash
//! wireflow new demo.wflow --demo
//! wireflow show demo.wflow
//! wireflow edit demo.wflow 0 10
//! wireflow tick demo.wflow --seconds 2
//! ```

mod cli;
mod clipboard;
mod document;
mod settings;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wireflow=info,wireflow_graph=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();
    tracing::debug!("Starting Wireflow v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = cli::execute(cli) {
        eprintln!("error: {err}");
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
