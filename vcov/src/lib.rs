//! `vcov` merges the coverage data files (`*.dat`) written by many Verilator simulation runs into one consistent,
//! filtered coverage summary.
//!
//! The pipeline is:
//!
//! 1. [`merge`] parses every data file in parallel and sums the hit counts of identical coverage points into a
//!    [`HitTable`].
//! 2. [`ignore`] resolves the user supplied ignore specifications into [`IgnoreRules`].
//! 3. [`filter`] drops ignored files and excluded missed lines from the table.
//! 4. [`report`] aggregates the table into a file → module → metric [`Summary`] of totals and misses.
//!
//! [`pipeline::generate()`] runs all of the above and writes the merged data file and the JSON summary.
//!
//! [`merge`]: ./merge/index.html
//! [`ignore`]: ./ignore/index.html
//! [`filter`]: ./filter/index.html
//! [`report`]: ./report/index.html
//! [`HitTable`]: ./merge/struct.HitTable.html
//! [`IgnoreRules`]: ./ignore/struct.IgnoreRules.html
//! [`Summary`]: ./report/struct.Summary.html
//! [`pipeline::generate()`]: ./pipeline/fn.generate.html

#![recursion_limit="128"] // needed for error_chain.

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;
#[macro_use]
extern crate serde_json;
extern crate glob;
extern crate rayon;
extern crate walkdir;
#[cfg(test)]
extern crate tempfile;

mod utils;
pub mod error;
pub mod span;
pub mod record;
pub mod codec;
pub mod merge;
pub mod ignore;
pub mod filter;
pub mod report;
pub mod pipeline;

pub use error::{Error, ErrorKind, Result};
pub use ignore::IgnoreRules;
pub use merge::HitTable;
pub use record::{MetricType, Record};
pub use report::Summary;
