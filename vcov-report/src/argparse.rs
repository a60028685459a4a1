//! Command line and manifest parsing.
//!
//! Phases can be given as positional `DATA` arguments, or listed in a TOML manifest passed with `--config`:
//!
//! ```toml
//! output = "coverage"
//! jobs = 8
//! write_info = true
//!
//! [[phase]]
//! data = "sim/smoke/coverage.dat"
//! ignore = ["waivers/", "*/gen/*.v"]
//!
//! [[phase]]
//! data = "sim/regress/coverage.dat"
//! ignore = ["rtl/fifo.v:120-135"]
//! ```
//!
//! Relative paths in the manifest are relative to the manifest itself. Command line options take precedence over the
//! manifest, and `--ignore` specifications apply to every phase.

use convert::DEFAULT_CONVERTER;
use error::*;

use clap::{App, ArgMatches};
use vcov::pipeline::{Config, Phase};

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Builds the `clap` application.
pub fn app() -> App<'static, 'static> {
    clap_app!(vcov_report =>
        (bin_name: "vcov-report")
        (about: crate_description!())
        (version: crate_version!())
        (@setting DeriveDisplayOrder)
        (@setting ArgRequiredElseHelp)
        (@arg config: -c --config [FILE] "TOML manifest listing the phases and output settings")
        (@arg output: -o --output [DIR] "The directory to store merged.dat and code_coverage.json, default to the current directory")
        (@arg ignore: -i --ignore [SPEC]... number_of_values(1) "Ignore file, directory of *.ignore files, glob pattern or `file:lines`")
        (@arg jobs: -j --jobs [N] "Number of threads decoding the data files")
        (@arg write_info: --("write-info") "Also convert merged.dat to lcov format")
        (@arg converter: --converter [PROGRAM] "The program converting to lcov, default to `verilator_coverage`")
        (@arg data: [DATA]... "Coverage data files (*.dat), one phase each")
    )
}

/// The `--config` manifest.
#[derive(Clone, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub output: Option<PathBuf>,
    pub jobs: Option<usize>,
    #[serde(default)]
    pub write_info: bool,
    pub converter: Option<String>,
    #[serde(default, rename = "phase")]
    pub phases: Vec<Phase>,
}

impl Manifest {
    /// Reads a manifest, resolving its relative paths against the manifest's directory.
    pub fn open(path: &Path) -> Result<Manifest> {
        use toml::de::from_slice;

        let mut file = File::open(path).chain_err(|| format!("Cannot open manifest at `{}`", path.display()))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        let mut manifest: Manifest = from_slice(&content).chain_err(|| format!("Cannot read manifest at `{}`", path.display()))?;

        if let Some(base) = path.parent() {
            for phase in &mut manifest.phases {
                phase.data = base.join(&phase.data);
            }
            manifest.output = manifest.output.map(|output| base.join(output));
        }
        Ok(manifest)
    }
}

/// Everything needed for one run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub phases: Vec<Phase>,
    pub output: Config,
    pub jobs: Option<usize>,
    pub write_info: bool,
    pub converter: String,
}

impl RunConfig {
    /// Combines the command line arguments with the manifest, if any.
    ///
    /// # Errors
    ///
    /// * Returns [`NoPhases`] if neither the command line nor the manifest lists any data file.
    /// * Returns an error if the manifest cannot be read, or `--jobs` is not a number.
    ///
    /// [`NoPhases`]: ../error/enum.ErrorKind.html#variant.NoPhases
    pub fn parse(matches: &ArgMatches) -> Result<RunConfig> {
        let manifest = match matches.value_of_os("config") {
            Some(path) => Manifest::open(Path::new(path))?,
            None => Manifest::default(),
        };

        let mut phases = manifest.phases;
        if let Some(data) = matches.values_of_os("data") {
            phases.extend(data.map(|data| Phase { data: PathBuf::from(data), ignore: Vec::new() }));
        }
        ensure!(!phases.is_empty(), ErrorKind::NoPhases);
        if let Some(specs) = matches.values_of("ignore") {
            let specs = specs.map(String::from).collect::<Vec<_>>();
            for phase in &mut phases {
                phase.ignore.extend(specs.iter().cloned());
            }
        }

        let output_dir = match matches.value_of_os("output") {
            Some(output) => PathBuf::from(output),
            None => manifest.output.unwrap_or_else(|| PathBuf::from(".")),
        };
        let jobs = match matches.value_of("jobs") {
            Some(jobs) => Some(jobs.parse().chain_err(|| format!("Invalid --jobs value `{}`", jobs))?),
            None => manifest.jobs,
        };
        let converter = matches
            .value_of("converter")
            .map(String::from)
            .or(manifest.converter)
            .unwrap_or_else(|| DEFAULT_CONVERTER.to_owned());

        Ok(RunConfig {
            phases,
            output: Config::new(output_dir),
            jobs,
            write_info: matches.is_present("write_info") || manifest.write_info,
            converter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    use std::fs;

    fn parse(args: &[&str]) -> Result<RunConfig> {
        let mut argv = vec!["vcov-report"];
        argv.extend_from_slice(args);
        let matches = app().get_matches_from_safe(argv).unwrap();
        RunConfig::parse(&matches)
    }

    #[test]
    fn test_command_line_only() {
        let config = parse(&["-i", "*/gen/*", "a.dat", "b.dat", "-o", "out", "--jobs", "3"]).unwrap();
        assert_eq!(
            config.phases,
            vec![
                Phase { data: "a.dat".into(), ignore: vec!["*/gen/*".to_owned()] },
                Phase { data: "b.dat".into(), ignore: vec!["*/gen/*".to_owned()] },
            ]
        );
        assert_eq!(config.output, Config::new("out"));
        assert_eq!(config.jobs, Some(3));
        assert!(!config.write_info);
        assert_eq!(config.converter, DEFAULT_CONVERTER);
    }

    #[test]
    fn test_no_phases() {
        let err = parse(&["-o", "out"]).unwrap_err();
        match *err.kind() {
            ErrorKind::NoPhases => {},
            ref kind => panic!("unexpected error {:?}", kind),
        }
    }

    #[test]
    fn test_bad_jobs() {
        assert!(parse(&["--jobs", "many", "a.dat"]).is_err());
    }

    #[test]
    fn test_manifest() {
        let dir = tempdir().unwrap();
        let manifest_path = dir.path().join("coverage.toml");
        fs::write(
            &manifest_path,
            r#"
output = "report"
jobs = 2
write_info = true

[[phase]]
data = "smoke.dat"
ignore = ["waivers/"]

[[phase]]
data = "/abs/regress.dat"
"#,
        ).unwrap();
        let manifest_arg = manifest_path.to_string_lossy().into_owned();

        let config = parse(&["--config", &manifest_arg, "--converter", "my_conv", "-i", "x.v:1", "extra.dat"]).unwrap();
        assert_eq!(
            config.phases,
            vec![
                Phase { data: dir.path().join("smoke.dat"), ignore: vec!["waivers/".to_owned(), "x.v:1".to_owned()] },
                Phase { data: "/abs/regress.dat".into(), ignore: vec!["x.v:1".to_owned()] },
                Phase { data: "extra.dat".into(), ignore: vec!["x.v:1".to_owned()] },
            ]
        );
        assert_eq!(config.output, Config::new(dir.path().join("report")));
        assert_eq!(config.jobs, Some(2));
        assert!(config.write_info);
        assert_eq!(config.converter, "my_conv");
    }

    #[test]
    fn test_manifest_rejects_unknown_keys() {
        let dir = tempdir().unwrap();
        let manifest_path = dir.path().join("coverage.toml");
        fs::write(&manifest_path, "outptu = \"typo\"\n").unwrap();
        assert!(Manifest::open(&manifest_path).is_err());
    }
}
