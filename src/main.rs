mod args;
mod stats;

use clap::Parser;
use log::{info, LevelFilter};

use crate::args::Args;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args: {:?}", args);

    match stats::run_report(&args) {
        Ok(outcome) if outcome.output == "stdout" => {
            info!("Report written with {} voters", outcome.num_voters);
        }
        Ok(outcome) => {
            println!(
                "Wrote {} with {} voters.",
                outcome.output, outcome.num_voters
            );
        }
        Err(e) => {
            eprintln!("An error occured: {}", e);
            if let Some(source) = std::error::Error::source(&e) {
                eprintln!("Caused by: {}", source);
            }
            std::process::exit(1);
        }
    }
}
