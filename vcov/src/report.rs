//! Coverage summary.
//!
//! The [`Summary`] structure contains, for every source file and every module in it, the number of coverage points
//! and missed points of each metric, together with the missed lines. It is serialized to the JSON document consumed by
//! the report front end:
//!
//! ```json
//! {
//!   "description": "Code coverage summary. `data` field contains uncovered lines",
//!   "simulator": "verilator",
//!   "overview": {
//!     "total": { "line": 120, "toggle": 64, "branch": 30, "expr": 4 },
//!     "miss": { "line": 7, "toggle": 10, "branch": 3, "expr": 0 }
//!   },
//!   "uncovered": {
//!     "schema": { ... },
//!     "data": {
//!       "/work/rtl/alu.v": {
//!         "total": { ... },
//!         "miss": { ... },
//!         "modules": {
//!           "alu": {
//!             "total": { ... },
//!             "miss": { ... },
//!             "line": ["12-14", "20-20"],
//!             "toggle": [],
//!             "branch": ["12-12"],
//!             "expr": []
//!           }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! [`Summary`]: ./struct.Summary.html

use error::*;
use merge::HitTable;
use record::{MetricType, METRIC_TYPES};
use span::{self, Span};

use serde::{Serialize, Serializer};
use serde_json::Value;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::collections::hash_map::Entry;
use std::io::Write;
use std::ops::{Index, IndexMut};
use std::result::Result as StdResult;

const DESCRIPTION: &str = "Code coverage summary. `data` field contains uncovered lines";
const SIMULATOR: &str = "verilator";

//----------------------------------------------------------------------------------------------------------------------
//{{{ MetricStats

/// Number of coverage points per metric.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize)]
pub struct MetricStats {
    pub line: usize,
    pub toggle: usize,
    pub branch: usize,
    pub expr: usize,
}

impl Index<MetricType> for MetricStats {
    type Output = usize;
    fn index(&self, metric: MetricType) -> &usize {
        match metric {
            MetricType::Line => &self.line,
            MetricType::Toggle => &self.toggle,
            MetricType::Branch => &self.branch,
            MetricType::Expr => &self.expr,
        }
    }
}

impl IndexMut<MetricType> for MetricStats {
    fn index_mut(&mut self, metric: MetricType) -> &mut usize {
        match metric {
            MetricType::Line => &mut self.line,
            MetricType::Toggle => &mut self.toggle,
            MetricType::Branch => &mut self.branch,
            MetricType::Expr => &mut self.expr,
        }
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Summary, FileCoverage & ModuleCoverage

/// Coverage of one module within a source file.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ModuleCoverage {
    /// Number of coverage points.
    pub total: MetricStats,
    /// Number of missed coverage points.
    pub miss: MetricStats,
    /// Lines not covered by any coverage point, and lines spanned by missed line points.
    pub line: BTreeSet<u32>,
    /// Lines spanned by missed toggle points.
    pub toggle: BTreeSet<u32>,
    /// Lines spanned by missed branch points.
    pub branch: BTreeSet<u32>,
    /// Lines spanned by missed expression points.
    pub expr: BTreeSet<u32>,
}

impl ModuleCoverage {
    /// The missed lines of a metric.
    pub fn missed(&self, metric: MetricType) -> &BTreeSet<u32> {
        match metric {
            MetricType::Line => &self.line,
            MetricType::Toggle => &self.toggle,
            MetricType::Branch => &self.branch,
            MetricType::Expr => &self.expr,
        }
    }

    fn missed_mut(&mut self, metric: MetricType) -> &mut BTreeSet<u32> {
        match metric {
            MetricType::Line => &mut self.line,
            MetricType::Toggle => &mut self.toggle,
            MetricType::Branch => &mut self.branch,
            MetricType::Expr => &mut self.expr,
        }
    }

    /// The missed lines of a metric compressed into maximal runs.
    pub fn missed_spans(&self, metric: MetricType) -> Vec<Span> {
        span::compress(self.missed(metric).iter().cloned())
    }
}

/// Writes the missed line sets as lists of `"start-end"` strings.
impl Serialize for ModuleCoverage {
    fn serialize<S: Serializer>(&self, serializer: S) -> StdResult<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ModuleCoverage", 2 + METRIC_TYPES.len())?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("miss", &self.miss)?;
        for &metric in &METRIC_TYPES {
            let ranges = self.missed_spans(metric).iter().map(Span::to_range_string).collect::<Vec<_>>();
            state.serialize_field(metric.name(), &ranges)?;
        }
        state.end()
    }
}

/// Coverage of one source file.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct FileCoverage {
    pub total: MetricStats,
    pub miss: MetricStats,
    pub modules: BTreeMap<String, ModuleCoverage>,
}

/// Coverage summary of the whole run.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Summary {
    /// Number of coverage points over all files.
    pub total: MetricStats,
    /// Number of missed coverage points over all files.
    pub miss: MetricStats,
    /// Coverage per source file.
    pub files: BTreeMap<String, FileCoverage>,
    /// Instance hierarchies which appeared with more than one module name. Such points are attributed to each of the
    /// module names they carry.
    pub module_conflicts: BTreeSet<String>,
}

impl Summary {
    /// Counts one coverage point at every level, and returns the module it belongs to.
    fn count(&mut self, path: &str, module: &str, metric: MetricType, is_miss: bool) -> &mut ModuleCoverage {
        let file = self.files.entry(path.to_owned()).or_insert_with(FileCoverage::default);
        let module = file.modules.entry(module.to_owned()).or_insert_with(ModuleCoverage::default);
        let is_miss = is_miss as usize;
        self.total[metric] += 1;
        self.miss[metric] += is_miss;
        file.total[metric] += 1;
        file.miss[metric] += is_miss;
        module.total[metric] += 1;
        module.miss[metric] += is_miss;
        module
    }

    /// Ensures the module exists in the summary without counting anything, and returns it.
    fn touch(&mut self, path: &str, module: &str) -> &mut ModuleCoverage {
        self.files
            .entry(path.to_owned())
            .or_insert_with(FileCoverage::default)
            .modules
            .entry(module.to_owned())
            .or_insert_with(ModuleCoverage::default)
    }

    /// Converts the summary into the JSON document.
    pub fn to_document(&self) -> Value {
        let metric_fields = METRIC_TYPES.iter().map(|m| m.name()).collect::<Vec<_>>();
        json!({
            "description": DESCRIPTION,
            "simulator": SIMULATOR,
            "overview": {
                "total": self.total,
                "miss": self.miss,
            },
            "uncovered": {
                "schema": {
                    "file_path": {
                        "total": metric_fields,
                        "miss": metric_fields,
                        "modules": {
                            "module_name": {
                                "total": metric_fields,
                                "miss": metric_fields,
                                "line": ["lines"],
                                "toggle": ["lines"],
                                "branch": ["lines"],
                                "expr": ["lines"],
                            },
                        },
                    },
                },
                "data": self.files,
            },
        })
    }

    /// Writes the JSON document, pretty-printed.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, &self.to_document())?;
        writeln!(writer)?;
        Ok(())
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ aggregate

/// Hit count of a source line, accumulated over every coverage point spanning it.
struct LineHits<'a> {
    hits: u64,
    module: &'a str,
}

/// Aggregates a (filtered) table into a summary.
///
/// Toggle, branch and expression points are counted directly. Line coverage instead considers every distinct
/// `(path, line)` spanned by any coverage point: the line is covered if any of those points has been hit. Each line
/// is counted exactly once, and belongs to the module of the last point spanning it in table order.
///
/// Every missed point adds the lines it spans to the missed set of its own metric, line points included. The `line`
/// set therefore also holds the lines of missed line points which another point has covered.
pub fn aggregate(table: &HitTable) -> Summary {
    let mut summary = Summary::default();
    let mut lines = BTreeMap::<(&str, u32), LineHits>::new();
    let mut hierarchy_modules = HashMap::<&str, &str>::new();

    for (identity, entry) in table {
        match hierarchy_modules.entry(&identity.hierarchy) {
            Entry::Vacant(slot) => {
                slot.insert(&identity.module);
            },
            Entry::Occupied(slot) => {
                if *slot.get() != identity.module && summary.module_conflicts.insert(identity.hierarchy.clone()) {
                    warn!(
                        "instance {} appears as both module {} and {}",
                        identity.hierarchy,
                        slot.get(),
                        identity.module
                    );
                }
            },
        }

        let covered_lines = entry.attributes.covered_lines(identity.line);
        let module = if identity.metric == MetricType::Line {
            summary.touch(&identity.path, &identity.module)
        } else {
            summary.count(&identity.path, &identity.module, identity.metric, entry.is_miss())
        };
        if entry.is_miss() {
            module.missed_mut(identity.metric).extend(covered_lines.iter().cloned());
        }

        for line in covered_lines {
            let line_hits = lines.entry((identity.path.as_str(), line)).or_insert(LineHits {
                hits: 0,
                module: &identity.module,
            });
            line_hits.hits = line_hits.hits.saturating_add(entry.hits);
            line_hits.module = &identity.module;
        }
    }

    for ((path, line), line_hits) in lines {
        let is_miss = line_hits.hits == 0;
        let module = summary.count(path, line_hits.module, MetricType::Line, is_miss);
        if is_miss {
            module.line.insert(line);
        }
    }

    summary
}

//}}}
