#[macro_use]
extern crate error_chain;
extern crate env_logger;
extern crate vcov;

use vcov::{IgnoreRules, Result};
use vcov::filter::filter;
use vcov::merge::merge;
use vcov::report::aggregate;

use std::env;
use std::io::stdout;

quick_main!(run);

fn run() -> Result<()> {
    env_logger::init();

    // Arguments starting with `--ignore=` are ignore specifications, the rest are data files.
    let (ignores, files): (Vec<String>, Vec<String>) = env::args().skip(1).partition(|arg| arg.starts_with("--ignore="));
    let ignores = ignores.iter().map(|arg| &arg["--ignore=".len()..]).collect::<Vec<_>>();

    let rules = IgnoreRules::resolve(&ignores)?;
    let table = filter(merge(&files)?, &rules);
    aggregate(&table).write_json(stdout())?;
    Ok(())
}
