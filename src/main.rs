mod cli;
mod download;
mod erddap;
mod export;
mod extent;
mod grid;
mod regions;
mod stats;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Extent {
            start,
            end,
            region,
            opts,
        } => match command::extent(*start, *end, *region, opts).await {
            Ok(saved) => println!("File saved to `{}`", saved),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Annual {
            start_year,
            end_year,
            opts,
        } => match command::annual(*start_year, *end_year, opts).await {
            Ok(saved) => println!("File saved to `{}`", saved),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Baseline {
            start_year,
            end_year,
            region,
            opts,
        } => match command::baseline(*start_year, *end_year, *region, opts).await {
            Ok(saved) => println!("File saved to `{}`", saved),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Update { opts } => match command::update(opts).await {
            Ok(outcome) => println!("{}", outcome),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Area { opts } => match command::area(opts).await {
            Ok(saved) => println!("File saved to `{}`", saved),
            Err(e) => eprintln!("Error: {}", e),
        },
    }

    Ok(())
}
