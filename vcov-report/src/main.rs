//! `vcov-report` merges the Verilator coverage data of several simulation phases, drops what the ignore rules waive,
//! and writes `merged.dat` plus the `code_coverage.json` summary.
//!
//! ```sh
//! vcov-report -o coverage -i waivers/ sim/smoke/coverage.dat sim/regress/coverage.dat
//! vcov-report --config coverage.toml --write-info
//! ```

#![recursion_limit = "128"] // needed for error_chain.

#[macro_use]
extern crate clap;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
extern crate env_logger;
extern crate rayon;
extern crate termcolor;
extern crate toml;
extern crate vcov;
#[cfg(test)]
extern crate tempfile;

#[macro_use]
mod ui;
mod argparse;
mod convert;
mod error;

use argparse::RunConfig;
use error::{Result, ResultExt};
use vcov::pipeline::generate;

use std::process::exit;

/// Program entry. Calls [`run()`] and prints any error returned to `stderr`.
///
/// [`run()`]: ./fn.run.html
fn main() {
    if let Err(error) = run() {
        ui::print_error(&error).expect("error while printing error 🤷");
        exit(1);
    }
}

/// Runs the `vcov-report` program.
fn run() -> Result<()> {
    let matches = argparse::app().get_matches();
    env_logger::init();

    let config = RunConfig::parse(&matches)?;
    debug!("config = {:?}", config);

    if let Some(jobs) = config.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .chain_err(|| "Cannot configure the thread pool")?;
    }

    progress!("Merging", "{} data files", config.phases.len());
    let outcome = generate(&config.phases, &config.output)?;

    for &(ref data, ref info) in &outcome.ignore_info {
        for file in info.ignore_file_names() {
            progress!("Ignoring", "rules in {} for {}", file, data.display());
        }
        for pattern in &info.patterns {
            progress!("Ignoring", "files matching {} for {}", pattern, data.display());
        }
        for line_spec in &info.line_specs {
            progress!("Ignoring", "lines {} for {}", line_spec, data.display());
        }
    }
    for hierarchy in &outcome.summary.module_conflicts {
        warning!("instance {} is reported under more than one module name", hierarchy);
    }

    progress!("Written", "{}", outcome.dat_path.display());
    progress!("Written", "{}", outcome.json_path.display());

    if config.write_info {
        let info_path = convert::write_info(&config.converter, &outcome.dat_path)?;
        progress!("Converted", "{}", info_path.display());
    }

    ui::print_overview(&outcome.summary)?;
    Ok(())
}
