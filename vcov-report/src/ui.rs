//! Print colored text.
//!
//! Provides functions and macros that simulate the `cargo` output style.

use error::Error;
use vcov::Summary;
use vcov::record::METRIC_TYPES;

use termcolor::*;

use std::io::{Result, Write};

/// Prints a progress (green text), similar to the cargo output.
macro_rules! progress {
    ($tag:expr, $fmt:expr $(, $args:expr)*) => {{
        #[cfg_attr(feature="cargo-clippy", allow(redundant_closure_call))]
        (|| -> ::std::io::Result<()> {
            use ::termcolor::*;
            use ::std::io::Write;
            let stream = StandardStream::stderr(ColorChoice::Auto);
            let mut lock = stream.lock();
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
            write!(lock, "{:>12} ", $tag)?;
            lock.reset()?;
            writeln!(lock, $fmt $(, $args)*)?;
            Ok(())
        })().expect("print progress")
    }}
}

/// Prints a warning (yellow text), similar to cargo output.
macro_rules! warning {
    ($fmt:expr $(, $args:expr)*) => {{
        #[cfg_attr(feature="cargo-clippy", allow(redundant_closure_call))]
        (|| -> ::std::io::Result<()> {
            use ::termcolor::*;
            use ::std::io::Write;
            let stream = StandardStream::stderr(ColorChoice::Auto);
            let mut lock = stream.lock();
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
            write!(lock, "warning: ")?;
            lock.reset()?;
            writeln!(lock, $fmt $(, $args)*)?;
            Ok(())
        })().expect("print warning")
    }}
}

/// Prints an error and the causes.
pub fn print_error(error: &Error) -> Result<()> {
    let stream = StandardStream::stderr(ColorChoice::Auto);
    let mut lock = stream.lock();

    for (i, e) in error.iter().enumerate() {
        if i == 0 {
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_intense(true).set_bold(true))?;
            write!(lock, "error: ")?;
        } else {
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(lock, "caused by: ")?;
        }
        lock.reset()?;
        writeln!(lock, "{}", e)?;
    }
    if let Some(backtrace) = error.backtrace() {
        writeln!(lock, "\n{:?}", backtrace)?;
    }
    Ok(())
}

/// Prints the overall coverage of every metric to stdout.
///
/// ```text
///   line      92.31%   (12 of 156 lines missed)
///   toggle   100.00%   (0 of 40 points missed)
///   branch       n/a
/// ```
pub fn print_overview(summary: &Summary) -> Result<()> {
    let stream = StandardStream::stdout(ColorChoice::Auto);
    let mut lock = stream.lock();

    for &metric in &METRIC_TYPES {
        let total = summary.total[metric];
        let miss = summary.miss[metric];
        lock.set_color(ColorSpec::new().set_bold(true))?;
        write!(lock, "  {:<8}", metric.name())?;
        if total == 0 {
            lock.reset()?;
            writeln!(lock, "     n/a")?;
            continue;
        }
        let percentage = 100.0 * (total - miss) as f64 / total as f64;
        let color = if miss == 0 { Color::Green } else { Color::Yellow };
        lock.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(lock, "{:>7.2}%", percentage)?;
        lock.reset()?;
        let unit = if metric == ::vcov::MetricType::Line { "lines" } else { "points" };
        writeln!(lock, "   ({} of {} {} missed)", miss, total, unit)?;
    }
    Ok(())
}
