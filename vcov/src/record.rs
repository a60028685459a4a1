//! The in-memory model of a coverage record.
//!
//! A [`Record`] is split into its [`Identity`], which decides whether two records from different data files describe
//! the same coverage point, and its [`Attributes`], which are carried along for re-serialization only.
//!
//! [`Record`]: ./struct.Record.html
//! [`Identity`]: ./struct.Identity.html
//! [`Attributes`]: ./struct.Attributes.html

use error::*;
use span::Span;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

//----------------------------------------------------------------------------------------------------------------------
//{{{ MetricType

/// The kind of coverage a point measures.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Statement (line) coverage.
    Line,
    /// Signal toggle coverage.
    Toggle,
    /// Branch coverage.
    Branch,
    /// Expression coverage.
    Expr,
}

/// All metric types, in the order they appear in the JSON summary.
pub const METRIC_TYPES: [MetricType; 4] = [MetricType::Line, MetricType::Toggle, MetricType::Branch, MetricType::Expr];

impl MetricType {
    /// The name of the metric as written in the data file and the JSON summary.
    pub fn name(self) -> &'static str {
        match self {
            MetricType::Line => "line",
            MetricType::Toggle => "toggle",
            MetricType::Branch => "branch",
            MetricType::Expr => "expr",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

impl FromStr for MetricType {
    type Err = Error;
    fn from_str(s: &str) -> Result<MetricType> {
        Ok(match s {
            "line" => MetricType::Line,
            "toggle" => MetricType::Toggle,
            "branch" => MetricType::Branch,
            "expr" => MetricType::Expr,
            _ => bail!(ErrorKind::UnsupportedMetric(s.to_owned())),
        })
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Identity & Attributes

/// The structural identity of a coverage point.
///
/// The hit count is not part of the identity: records with the same identity coming from different data files are
/// the same logical point, and their hit counts are summed.
///
/// The derived ordering (path first, then line, column, metric, module, hierarchy) is the order of the merged data
/// file.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Identity {
    /// Source file path, absolute or relative.
    pub path: String,
    /// Line number of the point.
    pub line: u32,
    /// Column number of the point.
    pub column: u32,
    /// The kind of coverage.
    pub metric: MetricType,
    /// Leaf module name.
    pub module: String,
    /// Full dotted instance path.
    pub hierarchy: String,
}

/// The fields of a record which do not take part in its identity.
///
/// The presence of every optional field is remembered, since the external converter reading the merged data file is
/// sensitive to it.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Attributes {
    /// Raw value of the `t` key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    /// Diagnostic annotation (the `o` key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// The lines spanned by the point (the `S` key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Vec<Span>>,
}

impl Attributes {
    /// Returns the set of lines covered by a point located at `line`.
    ///
    /// This is the union of the block, or just `line` if there is no block.
    pub fn covered_lines(&self, line: u32) -> BTreeSet<u32> {
        match self.block {
            Some(ref block) => block.iter().flat_map(Span::lines).collect(),
            None => Some(line).into_iter().collect(),
        }
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Record

/// One coverage point as reported by the simulator.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Record {
    pub identity: Identity,
    pub attributes: Attributes,
}

impl Record {
    /// Returns the set of lines covered by this record.
    pub fn covered_lines(&self) -> BTreeSet<u32> {
        self.attributes.covered_lines(self.identity.line)
    }
}

//}}}
