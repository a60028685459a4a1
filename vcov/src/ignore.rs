//! Resolution of ignore specifications.
//!
//! An ignore specification is one of:
//!
//! * `path/to/file.v:3,10-20`: the listed lines of `path/to/file.v` are excluded from the missed lines;
//! * a directory: every `*.ignore` file below it is read;
//! * an existing file: it is read as an ignore file;
//! * anything else: a glob pattern (with `fnmatch` semantics, `*` also matches `/`). Coverage points in a matching
//!   source file are removed completely.
//!
//! Ignore files contain one line-range token or glob pattern per line. A line starting with `#` is a comment, and a
//! `#` elsewhere starts a trailing comment:
//!
//! ```text
//! # generated code
//! */gen/*.v
//! rtl/fifo.v:120-135   # unreachable default branch
//! ```

use error::*;
use span::{self, Span};
use utils::{strip_comment, IntoStringLossy};

use glob::Pattern;
use walkdir::WalkDir;

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const IGNORE_FILE_SUFFIX: &str = ".ignore";

/// The resolved ignore rules of a run.
#[derive(Clone, Debug, Default)]
pub struct IgnoreRules {
    patterns: BTreeMap<String, Pattern>,
    excluded: BTreeMap<String, BTreeSet<u32>>,
}

/// What a list of ignore specifications has been resolved into, for display purpose.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct IgnoreInfo {
    /// All ignore files which have been read, including those found in directories.
    pub ignore_files: Vec<PathBuf>,
    /// The specifications given literally as glob patterns.
    pub patterns: Vec<String>,
    /// The specifications given literally as `file:ranges` tokens.
    pub line_specs: Vec<String>,
}

impl IgnoreRules {
    /// Creates an empty rule set, which ignores nothing.
    pub fn new() -> IgnoreRules {
        IgnoreRules::default()
    }

    /// Resolves a list of ignore specifications into a new rule set.
    pub fn resolve<S: AsRef<str>>(specs: &[S]) -> Result<IgnoreRules> {
        let mut rules = IgnoreRules::new();
        rules.add_specs(specs)?;
        Ok(rules)
    }

    /// Resolves a list of ignore specifications and adds them to this rule set.
    ///
    /// # Errors
    ///
    /// * Returns [`MissingIgnoreFile`] if a specification ends with `.ignore` but names no existing file.
    /// * Returns [`QuotedPattern`] if a glob pattern contains `'` or `"`.
    /// * Returns [`InvalidPattern`] if a glob pattern cannot be compiled.
    /// * Returns [`Io`] or [`Walk`] if an ignore file or directory cannot be read.
    ///
    /// [`MissingIgnoreFile`]: ../error/enum.ErrorKind.html#variant.MissingIgnoreFile
    /// [`QuotedPattern`]: ../error/enum.ErrorKind.html#variant.QuotedPattern
    /// [`InvalidPattern`]: ../error/enum.ErrorKind.html#variant.InvalidPattern
    /// [`Io`]: ../error/enum.ErrorKind.html#variant.Io
    /// [`Walk`]: ../error/enum.ErrorKind.html#variant.Walk
    pub fn add_specs<S: AsRef<str>>(&mut self, specs: &[S]) -> Result<IgnoreInfo> {
        let mut info = IgnoreInfo::default();
        for spec in specs {
            self.add_spec(spec.as_ref(), &mut info)?;
        }
        Ok(info)
    }

    fn add_spec(&mut self, spec: &str, info: &mut IgnoreInfo) -> Result<()> {
        if self.add_line_spec(spec) {
            info.line_specs.push(spec.to_owned());
            return Ok(());
        }

        let path = Path::new(spec);
        if path.is_dir() {
            let walker = WalkDir::new(path).sort_by(|a, b| a.file_name().cmp(b.file_name()));
            for entry in walker {
                let entry = entry?;
                let is_ignore_file = entry.file_name().to_string_lossy().ends_with(IGNORE_FILE_SUFFIX);
                if is_ignore_file && entry.file_type().is_file() {
                    self.add_file(entry.path())?;
                    info.ignore_files.push(entry.into_path());
                }
            }
        } else if path.is_file() {
            self.add_file(path)?;
            info.ignore_files.push(path.to_owned());
        } else if spec.ends_with(IGNORE_FILE_SUFFIX) {
            bail!(ErrorKind::MissingIgnoreFile(path.to_owned()));
        } else {
            self.add_pattern(spec, || "command line".to_owned())?;
            info.patterns.push(spec.to_owned());
        }
        Ok(())
    }

    /// Reads an ignore file.
    fn add_file(&mut self, path: &Path) -> Result<()> {
        debug!("reading ignore file {:?}", path);
        let file = File::open(path).chain_err(|| format!("Cannot open ignore file {}", path.display()))?;
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = match strip_comment(&line) {
                Some(line) => line,
                None => continue,
            };
            if !self.add_line_spec(line) {
                self.add_pattern(line, || format!("{}:{}", path.display(), index + 1))?;
            }
        }
        Ok(())
    }

    /// Tries to interpret `spec` as `file:ranges`. Returns whether it succeeded.
    fn add_line_spec(&mut self, spec: &str) -> bool {
        match parse_line_spec(spec) {
            Some((file, spans)) => {
                trace!("excluding lines {:?} of {:?}", spans, file);
                self.excluded
                    .entry(file.to_owned())
                    .or_insert_with(BTreeSet::new)
                    .extend(span::expand(&spans));
                true
            },
            None => false,
        }
    }

    fn add_pattern<F: FnOnce() -> String>(&mut self, pattern: &str, origin: F) -> Result<()> {
        if pattern.contains('\'') || pattern.contains('"') {
            bail!(ErrorKind::QuotedPattern(origin(), pattern.to_owned()));
        }
        if !self.patterns.contains_key(pattern) {
            let compiled = match Pattern::new(pattern) {
                Ok(compiled) => compiled,
                Err(e) => bail!(Error::with_chain(e, ErrorKind::InvalidPattern(origin(), pattern.to_owned()))),
            };
            trace!("ignoring files matching {:?}", pattern);
            self.patterns.insert(pattern.to_owned(), compiled);
        }
        Ok(())
    }

    /// Checks whether the whole source file should be removed from the coverage.
    pub fn is_file_ignored(&self, path: &str) -> bool {
        self.patterns.values().any(|pattern| pattern.matches(path))
    }

    /// Obtains the excluded lines of a source file.
    ///
    /// If the path itself has exclusions, they are returned as-is. Otherwise the exclusions of every relative path
    /// which is a suffix of `path` are combined, so that rules written relative to the project apply to the absolute
    /// paths recorded by the simulator.
    pub fn excluded_lines(&self, path: &str) -> Cow<BTreeSet<u32>> {
        if let Some(lines) = self.excluded.get(path) {
            return Cow::Borrowed(lines);
        }
        let mut lines = BTreeSet::new();
        for (key, key_lines) in &self.excluded {
            if !key.starts_with('/') && path.ends_with(key.as_str()) {
                lines.extend(key_lines.iter().cloned());
            }
        }
        Cow::Owned(lines)
    }

    /// Iterates over all resolved glob patterns.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(|s| &**s)
    }

    /// Checks whether the rule set ignores nothing.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.excluded.is_empty()
    }
}

/// Splits `file:ranges` at the last colon. Returns `None` if the text after the colon is not a list of line ranges.
fn parse_line_spec(spec: &str) -> Option<(&str, Vec<Span>)> {
    let colon = spec.rfind(':')?;
    let file = &spec[..colon];
    let ranges = &spec[(colon + 1)..];
    if file.is_empty() || ranges.trim().is_empty() {
        return None;
    }
    span::parse_list(ranges).ok().map(|spans| (file, spans))
}

impl IgnoreInfo {
    /// The ignore files as display strings.
    pub fn ignore_file_names(&self) -> Vec<String> {
        self.ignore_files.iter().cloned().map(IntoStringLossy::into_string_lossy).collect()
    }
}
