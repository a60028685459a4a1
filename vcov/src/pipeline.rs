//! The complete report generation.

use error::*;
use filter::filter;
use ignore::{IgnoreInfo, IgnoreRules};
use merge::merge;
use report::{aggregate, Summary};

use std::collections::HashSet;
use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// File name of the merged data file.
pub const DEFAULT_DAT_NAME: &str = "merged.dat";
/// File name of the JSON summary.
pub const DEFAULT_JSON_NAME: &str = "code_coverage.json";

/// One simulation phase: a coverage data file and the ignore specifications which apply to it.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Phase {
    /// Path to the `*.dat` file.
    pub data: PathBuf,
    /// Ignore specifications; see the [`ignore`](../ignore/index.html) module.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Where the outputs are written.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Config {
    pub output_dir: PathBuf,
    pub dat_name: String,
    pub json_name: String,
}

impl Config {
    /// Creates a configuration writing the default file names into `output_dir`.
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Config {
        Config {
            output_dir: output_dir.into(),
            dat_name: DEFAULT_DAT_NAME.to_owned(),
            json_name: DEFAULT_JSON_NAME.to_owned(),
        }
    }

    pub fn dat_path(&self) -> PathBuf {
        self.output_dir.join(&self.dat_name)
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(&self.json_name)
    }
}

/// Result of a successful [`generate()`] call.
///
/// [`generate()`]: ./fn.generate.html
#[derive(Clone, Debug)]
pub struct Outcome {
    pub summary: Summary,
    pub dat_path: PathBuf,
    pub json_path: PathBuf,
    /// What the ignore specifications of each phase resolved into, keyed by the phase's data file.
    pub ignore_info: Vec<(PathBuf, IgnoreInfo)>,
}

/// Merges the data files of all phases, applies the ignore rules, and writes the merged data file and the JSON summary
/// into the output directory.
///
/// Phases listed more than once are only merged once. The ignore rules of all phases are combined and applied to the
/// whole merged table.
///
/// # Errors
///
/// Any error from ignore resolution, merging or writing the outputs is returned. Nothing is written unless merging and
/// aggregation have succeeded.
pub fn generate(phases: &[Phase], config: &Config) -> Result<Outcome> {
    let mut seen = HashSet::new();
    let phases = phases.iter().filter(|phase| seen.insert(*phase)).collect::<Vec<_>>();

    let mut rules = IgnoreRules::new();
    let mut ignore_info = Vec::with_capacity(phases.len());
    for phase in &phases {
        let info = rules
            .add_specs(&phase.ignore)
            .chain_err(|| format!("Cannot resolve ignore rules for {}", phase.data.display()))?;
        ignore_info.push((phase.data.clone(), info));
    }

    let data_files = phases.iter().map(|phase| &*phase.data).collect::<Vec<&Path>>();
    let table = filter(merge(&data_files)?, &rules);
    let summary = aggregate(&table);

    create_dir_all(&config.output_dir)
        .chain_err(|| format!("Cannot create output directory {}", config.output_dir.display()))?;

    let dat_path = config.dat_path();
    let dat_file = File::create(&dat_path).chain_err(|| format!("Cannot create {}", dat_path.display()))?;
    table.write_dat(BufWriter::new(dat_file))?;
    debug!("written merged data to {:?}", dat_path);

    let json_path = config.json_path();
    let json_file = File::create(&json_path).chain_err(|| format!("Cannot create {}", json_path.display()))?;
    summary.write_json(BufWriter::new(json_file))?;
    debug!("written summary to {:?}", json_path);

    Ok(Outcome {
        summary,
        dat_path,
        json_path,
        ignore_info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::SIGNATURE;
    use merge::HitTable;

    use serde_json::{self, Value};
    use tempfile::{tempdir, TempDir};

    use std::fs;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn data_line(path: &str, line: u32, metric: &str, hits: u64) -> String {
        format!(
            "C '\x01f\x02{}\x01l\x02{}\x01n\x020\x01page\x02v_{}/m\x01h\x02top.m' {}\n",
            path, line, metric, hits
        )
    }

    fn phase(data: &Path, ignore: &[&str]) -> Phase {
        Phase {
            data: data.to_owned(),
            ignore: ignore.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_generate() {
        let dir = tempdir().unwrap();
        let a = write(&dir, "a.dat", &format!("{}\n{}{}", SIGNATURE, data_line("x.v", 1, "line", 0), data_line("x.v", 2, "toggle", 1)));
        let b = write(&dir, "b.dat", &format!("{}\n{}{}", SIGNATURE, data_line("x.v", 1, "line", 3), data_line("gen/y.v", 1, "line", 0)));
        let config = Config::new(dir.path().join("out"));

        let outcome = generate(&[phase(&a, &[]), phase(&b, &["gen/*"])], &config).unwrap();
        assert_eq!(outcome.dat_path, dir.path().join("out/merged.dat"));
        assert_eq!(outcome.json_path, dir.path().join("out/code_coverage.json"));
        assert_eq!(outcome.summary.total.line, 2);
        assert_eq!(outcome.summary.miss.line, 0);
        assert_eq!(outcome.ignore_info[1].1.patterns, ["gen/*"]);

        let json: Value = serde_json::from_reader(File::open(&outcome.json_path).unwrap()).unwrap();
        assert_eq!(json, outcome.summary.to_document());
        let merged = HitTable::open(&outcome.dat_path).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_duplicate_phases_are_merged_once() {
        let dir = tempdir().unwrap();
        let a = write(&dir, "a.dat", &format!("{}\n{}", SIGNATURE, data_line("x.v", 1, "line", 2)));
        let config = Config::new(dir.path());

        let outcome = generate(&[phase(&a, &[]), phase(&a, &[])], &config).unwrap();
        assert_eq!(outcome.ignore_info.len(), 1);
        let merged = HitTable::open(&outcome.dat_path).unwrap();
        assert_eq!(merged.iter().map(|(_, entry)| entry.hits).collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn test_nothing_is_written_on_failure() {
        let dir = tempdir().unwrap();
        let a = write(&dir, "a.dat", &format!("{}\n{}", SIGNATURE, data_line("x.v", 1, "line", 2)));
        let output_dir = dir.path().join("out");
        let config = Config::new(&output_dir);

        let err = generate(&[phase(&a, &[]), phase(&dir.path().join("missing.dat"), &[])], &config).unwrap_err();
        match *err.kind() {
            ErrorKind::MissingDataFile(_) => {},
            ref kind => panic!("unexpected error {:?}", kind),
        }
        assert!(!output_dir.exists());

        let err = generate(&[phase(&a, &["waivers.ignore"])], &config).unwrap_err();
        assert!(err.iter().any(|e| e.to_string().contains("waivers.ignore")));
        assert!(!output_dir.exists());
    }
}
