//! Command-line front end.
//!
//! # Usage
//!
//! ```bash
//! u-timetable catalog.json [config.toml] [middle_school | high_school | SECTION...]
//! ```
//!
//! Prints the timetable report as JSON on stdout. Without a scope argument
//! every section is scheduled.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: `u_timetable=info`)

use std::env;
use std::error::Error;
use std::fs;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use u_timetable::prelude::*;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("u_timetable=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    match run(env::args().skip(1).collect()) {
        Ok(complete) if complete => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every scope was solved completely.
fn run(args: Vec<String>) -> Result<bool, Box<dyn Error>> {
    let mut args = args.into_iter();
    let catalog_path = args
        .next()
        .ok_or("usage: u-timetable catalog.json [config.toml] [middle_school | high_school | SECTION...]")?;
    let input: CatalogInput = serde_json::from_str(&fs::read_to_string(&catalog_path)?)?;

    let mut rest: Vec<String> = args.collect();
    let config = match rest.first() {
        Some(path) if path.ends_with(".toml") => {
            let config = EngineConfig::load(path)?;
            rest.remove(0);
            config
        }
        _ => EngineConfig::default(),
    };
    let selector = selector_from(rest);
    info!(catalog = %catalog_path, selector = ?selector, "starting");

    let result = Timetabler::new(config).run(&input, &selector)?;
    println!("{}", result.report.to_json_string()?);

    info!(
        rows = result.report.row_count(),
        sentinels = result.sentinel_count(),
        complete = result.is_complete(),
        "done"
    );
    Ok(result.is_complete())
}

fn selector_from(args: Vec<String>) -> ScopeSelector {
    match args.as_slice() {
        [] => ScopeSelector::All,
        [one] if one == Level::Middle.payload_key() => ScopeSelector::Level(Level::Middle),
        [one] if one == Level::High.payload_key() => ScopeSelector::Level(Level::High),
        _ => ScopeSelector::Sections(args),
    }
}
