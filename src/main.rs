//! REST Docs from Source - Command-line tool for documenting API payload fields.
//!
//! Reads the types, doc comments and validation attributes of a Rust web project and prints
//! one table row per request or response field: path, type, optionality and description.
//!
//! # Usage
//!
//! ```bash
//! restdocs-from-source <COMMAND> [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Document the fields of a type:
//! ```bash
//! restdocs-from-source fields ./my-api-project 'Page<Item>' -f text
//! ```
//!
//! Document a handler:
//! ```bash
//! restdocs-from-source endpoint ./my-api-project handlers::get_item -o get_item.yaml
//! ```
//!
//! Write doc sidecars, then read comments from them:
//! ```bash
//! restdocs-from-source extract ./my-api-project -o target/restdocs
//! restdocs-from-source fields ./my-api-project Item --sidecars target/restdocs
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use restdocs_from_source::cli;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can configure the logger
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("REST Docs from Source starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Documentation generated successfully");

    Ok(())
}
