//! Inclusive line ranges and interval compression.

use error::*;

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// An inclusive range of line numbers, `start..=end`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Creates a span covering a single line.
    pub fn single(line: u32) -> Span {
        Span { start: line, end: line }
    }

    /// Iterates all lines in this span.
    pub fn lines(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    /// Formats the span as `"start-end"`, even if the span covers only one line.
    ///
    /// This is the shape used in the JSON summary. The wire format uses [`Display`] instead.
    ///
    /// [`Display`]: #impl-Display
    pub fn to_range_string(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Writes `N` for a single line, and `A-B` otherwise, which is the block syntax of the data file.
impl fmt::Display for Span {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.start == self.end {
            write!(fmt, "{}", self.start)
        } else {
            write!(fmt, "{}-{}", self.start, self.end)
        }
    }
}

/// Parses either `N` or `A-B`. A reversed range (`B < A`) is rejected.
impl FromStr for Span {
    type Err = Error;
    fn from_str(s: &str) -> Result<Span> {
        let s = s.trim();
        let span = match s.find('-') {
            Some(dash) => Span {
                start: s[..dash].trim().parse()?,
                end: s[(dash + 1)..].trim().parse()?,
            },
            None => Span::single(s.parse()?),
        };
        ensure!(span.start <= span.end, "reversed line range {:?}", s);
        Ok(span)
    }
}

/// Parses a comma-separated list of spans, e.g. `3,5-7,10`.
pub fn parse_list(s: &str) -> Result<Vec<Span>> {
    s.split(',').map(str::parse).collect()
}

/// Compresses a set of line numbers into the minimal sorted list of maximal runs of consecutive lines.
///
/// Duplicates and ordering of the input do not matter.
pub fn compress<I: IntoIterator<Item = u32>>(lines: I) -> Vec<Span> {
    let mut lines = lines.into_iter().collect::<Vec<_>>();
    lines.sort_unstable();
    lines.dedup();

    let mut result: Vec<Span> = Vec::new();
    for line in lines {
        match result.last_mut() {
            Some(last) if last.end.checked_add(1) == Some(line) => last.end = line,
            _ => result.push(Span::single(line)),
        }
    }
    result
}

/// Expands a list of spans back into the individual line numbers.
pub fn expand<'a>(spans: &'a [Span]) -> impl Iterator<Item = u32> + 'a {
    spans.iter().flat_map(Span::lines)
}
