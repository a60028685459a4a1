//! Conversion of the merged data file to the lcov `.info` format.
//!
//! The conversion is delegated to `verilator_coverage -write-info`.

use error::*;

use std::path::{Path, PathBuf};
use std::process::Command;

/// The program converting data files to lcov, unless configured otherwise.
pub const DEFAULT_CONVERTER: &str = "verilator_coverage";

/// Extension methods for `Command`.
trait CommandExt {
    /// Runs the command to completion, failing with its standard error if it does not exit successfully.
    fn ensure_success(&mut self, name: &str) -> Result<()>;
}

impl CommandExt for Command {
    fn ensure_success(&mut self, name: &str) -> Result<()> {
        debug!("running {:?}", self);
        let output = self.output().chain_err(|| format!("Cannot run {}", name))?;
        ensure!(
            output.status.success(),
            ErrorKind::ToolFailed(name.to_owned(), output.status, String::from_utf8_lossy(&output.stderr).into_owned())
        );
        Ok(())
    }
}

/// Converts `dat_path` into an lcov file next to it, and returns the path of the lcov file.
///
/// # Errors
///
/// * Returns [`ToolFailed`] if the converter exits unsuccessfully.
/// * Returns an error if the converter cannot be started at all.
///
/// [`ToolFailed`]: ../error/enum.ErrorKind.html#variant.ToolFailed
pub fn write_info(converter: &str, dat_path: &Path) -> Result<PathBuf> {
    let info_path = dat_path.with_extension("info");
    Command::new(converter)
        .arg("-write-info")
        .arg(&info_path)
        .arg(dat_path)
        .ensure_success(converter)?;
    Ok(info_path)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    use tempfile::{tempdir, TempDir};

    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("convert.sh");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_write_info() {
        let dir = tempdir().unwrap();
        let converter = script(&dir, r#"[ "$1" = "-write-info" ] && echo "TN:" > "$2""#);
        let dat_path = dir.path().join("merged.dat");

        let info_path = write_info(&converter, &dat_path).unwrap();
        assert_eq!(info_path, dir.path().join("merged.info"));
        assert_eq!(fs::read_to_string(&info_path).unwrap(), "TN:\n");
    }

    #[test]
    fn test_tool_failure_carries_stderr() {
        let dir = tempdir().unwrap();
        let converter = script(&dir, "echo 'cannot open merged.dat' >&2\nexit 3");

        let err = write_info(&converter, &dir.path().join("merged.dat")).unwrap_err();
        match *err.kind() {
            ErrorKind::ToolFailed(ref tool, status, ref stderr) => {
                assert_eq!(*tool, converter);
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr.trim(), "cannot open merged.dat");
            },
            ref kind => panic!("unexpected error {:?}", kind),
        }
    }

    #[test]
    fn test_missing_converter() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("no-such-converter");
        assert!(write_info(&missing.to_string_lossy(), &dir.path().join("merged.dat")).is_err());
    }
}
