//! Errors related to the `vcov` crate.
//!
//! Please see documentation of the [`error-chain` crate](https://docs.rs/error-chain/0.12.0/error_chain/) for detailed
//! usage.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

error_chain! {
    foreign_links {
        Io(io::Error) /** Wrapper of standard I/O error. */;
        Json(::serde_json::Error) /** Wrapper of JSON error. */;
        Pattern(::glob::PatternError) /** Wrapper of glob pattern syntax error. */;
        Walk(::walkdir::Error) /** Wrapper of directory traversal error. */;
        ParseInt(ParseIntError) /** Wrapper of integer parse error. */;
    }

    errors {
        /// A coverage data file listed in a phase does not exist.
        MissingDataFile(path: PathBuf) {
            description("missing coverage data file")
            display("coverage data file {} does not exist", path.display())
        }

        /// An ignore specification names a `*.ignore` file which does not exist.
        MissingIgnoreFile(path: PathBuf) {
            description("missing ignore file")
            display("ignore file {} does not exist", path.display())
        }

        /// A glob pattern contains a quote character, which usually means the ignore file is malformed.
        QuotedPattern(origin: String, pattern: String) {
            description("quote character in ignore pattern")
            display("{}: ignore pattern {:?} must not contain quote characters", origin, pattern)
        }

        /// A glob pattern cannot be compiled.
        InvalidPattern(origin: String, pattern: String) {
            description("invalid ignore pattern")
            display("{}: ignore pattern {:?} is not a valid glob", origin, pattern)
        }

        /// An encoded coverage record cannot be decoded.
        InvalidRecord(reason: String) {
            description("invalid coverage record")
            display("invalid coverage record: {}", reason)
        }

        /// An encoded coverage record lacks a mandatory key.
        MissingField(key: &'static str) {
            description("missing field in coverage record")
            display("coverage record has no `{}` field", key)
        }

        /// The metric type in the `page` field is not one of `line`, `toggle`, `branch` or `expr`.
        UnsupportedMetric(name: String) {
            description("unsupported coverage metric")
            display("unsupported coverage metric {:?}", name)
        }

        /// A line of a data file is not of the form `C <record> <hits>`.
        InvalidDataLine(path: PathBuf, line: usize) {
            description("invalid coverage data line")
            display("{}:{}: invalid coverage data line", path.display(), line)
        }
    }
}

impl ErrorKind {
    /// Checks whether the error only affects a single coverage point which can be skipped without corrupting the
    /// totals of other points.
    pub fn is_skippable_record(&self) -> bool {
        match *self {
            ErrorKind::UnsupportedMetric(_) => true,
            _ => false,
        }
    }
}
