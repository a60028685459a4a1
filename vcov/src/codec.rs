//! Reader and writer of the Verilator coverage data format.
//!
//! A data file starts with the signature line `# SystemC::Coverage-3`, followed by one line per coverage point:
//!
//! ```text
//! C '<encoded record>' <hit count>
//! ```
//!
//! The encoded record is a sequence of key/value tokens. Every key is preceded by the byte `0x01` and followed by the
//! byte `0x02`, and the value runs until the next `0x01` or the end of the record:
//!
//! ```text
//! \x01f\x02rtl/alu.v\x01l\x0212\x01n\x024\x01page\x02v_branch/alu\x01o\x02if\x01S\x0212-14\x01h\x02top.u_alu
//! ```
//!
//! | Key    | Meaning |
//! |--------|---------|
//! | `f`    | source path |
//! | `l`    | line number |
//! | `n`    | column number |
//! | `t`    | type flag, only kept for re-serialization |
//! | `page` | `v_<metric>/<module>` |
//! | `o`    | comment (optional) |
//! | `S`    | block, e.g. `3,5-7` (optional) |
//! | `h`    | instance hierarchy |

use error::*;
use record::{Attributes, Identity, MetricType, Record};
use span::{self, Span};

use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// The first line of every valid data file.
pub const SIGNATURE: &str = "# SystemC::Coverage-3";

const KEY_START: char = '\x01';
const VALUE_START: char = '\x02';

/// The literal prefix before the metric type in the `page` field.
const METRIC_PREFIX: &str = "v_";

//----------------------------------------------------------------------------------------------------------------------
//{{{ Decoding

/// Decodes one encoded record.
///
/// Unknown keys are ignored.
///
/// # Errors
///
/// * Returns [`MissingField`] if any of `f`, `l`, `n`, `page` or `h` is absent.
/// * Returns [`UnsupportedMetric`] if the metric type is not known.
/// * Returns [`InvalidRecord`] if a field cannot be decoded.
///
/// [`MissingField`]: ../error/enum.ErrorKind.html#variant.MissingField
/// [`UnsupportedMetric`]: ../error/enum.ErrorKind.html#variant.UnsupportedMetric
/// [`InvalidRecord`]: ../error/enum.ErrorKind.html#variant.InvalidRecord
pub fn parse(raw: &str) -> Result<Record> {
    let mut path = None;
    let mut line = None;
    let mut column = None;
    let mut page = None;
    let mut hierarchy = None;
    let mut attributes = Attributes::default();

    for token in raw.split(KEY_START).skip(1) {
        let (key, value) = match token.find(VALUE_START) {
            Some(0) | None => {
                trace!("skipping malformed token {:?}", token);
                continue;
            },
            Some(index) => (&token[..index], &token[(index + 1)..]),
        };
        match key {
            "f" => path = Some(value),
            "l" => line = Some(parse_number("l", value)?),
            "n" => column = Some(parse_number("n", value)?),
            "t" => attributes.type_tag = Some(value.to_owned()),
            "page" => page = Some(parse_page(value)?),
            "o" => attributes.comment = Some(value.to_owned()),
            "S" => {
                let block = span::parse_list(value).chain_err(|| invalid_field("S", value))?;
                attributes.block = Some(block);
            },
            "h" => hierarchy = Some(value),
            _ => trace!("ignoring unknown key {:?}", key),
        }
    }

    let (metric, module) = page.ok_or(ErrorKind::MissingField("page"))?;
    let identity = Identity {
        path: path.ok_or(ErrorKind::MissingField("f"))?.to_owned(),
        line: line.ok_or(ErrorKind::MissingField("l"))?,
        column: column.ok_or(ErrorKind::MissingField("n"))?,
        metric,
        module: module.to_owned(),
        hierarchy: hierarchy.ok_or(ErrorKind::MissingField("h"))?.to_owned(),
    };
    Ok(Record { identity, attributes })
}

fn invalid_field(key: &str, value: &str) -> ErrorKind {
    ErrorKind::InvalidRecord(format!("bad `{}` field {:?}", key, value))
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value.parse().chain_err(|| invalid_field(key, value))
}

/// Splits `v_<metric>/<module>`.
fn parse_page(value: &str) -> Result<(MetricType, &str)> {
    let mut parts = value.split('/');
    let (metric, module) = match (parts.next(), parts.next(), parts.next()) {
        (Some(metric), Some(module), None) => (metric, module),
        _ => bail!(invalid_field("page", value)),
    };
    let metric = if metric.starts_with(METRIC_PREFIX) {
        &metric[METRIC_PREFIX.len()..]
    } else {
        metric
    };
    Ok((metric.parse::<MetricType>()?, module))
}

/// Decodes one line of a data file, `C '<encoded record>' <hits>`.
///
/// The encoded record is everything between the first and the last space, so a comment containing spaces is fine.
/// Surrounding single quotes are optional.
pub fn parse_data_line(line: &str) -> Result<(Record, u64)> {
    let line = line.trim();
    let (first, last) = match (line.find(' '), line.rfind(' ')) {
        (Some(first), Some(last)) if first < last => (first, last),
        _ => bail!(ErrorKind::InvalidRecord(format!("expecting `C <record> <hits>`, found {:?}", line))),
    };
    ensure!(&line[..first] == "C", ErrorKind::InvalidRecord(format!("unknown line type {:?}", &line[..first])));

    let mut encoded = &line[(first + 1)..last];
    if encoded.len() >= 2 && encoded.starts_with('\'') && encoded.ends_with('\'') {
        encoded = &encoded[1..(encoded.len() - 1)];
    }
    let hits = &line[(last + 1)..];
    let hits = hits.parse::<u64>().chain_err(|| ErrorKind::InvalidRecord(format!("bad hit count {:?}", hits)))?;
    Ok((parse(encoded)?, hits))
}

/// Reads a whole data file, calling `f` with every coverage point and its hit count.
///
/// Returns the number of points read. A file without the [`SIGNATURE`] line contributes no points; this is logged
/// but not an error. Coverage points of an unsupported metric type are skipped with a warning.
///
/// # Errors
///
/// * Returns [`InvalidDataLine`] (caused by the decoding error) if a line cannot be decoded.
/// * Returns [`Io`] on I/O failure.
///
/// [`SIGNATURE`]: ./constant.SIGNATURE.html
/// [`InvalidDataLine`]: ../error/enum.ErrorKind.html#variant.InvalidDataLine
/// [`Io`]: ../error/enum.ErrorKind.html#variant.Io
pub fn read_data<R, F>(reader: R, path: &Path, mut f: F) -> Result<usize>
where
    R: BufRead,
    F: FnMut(Record, u64),
{
    let mut lines = reader.lines();
    match lines.next() {
        Some(first) => {
            let first = first?;
            if first.trim() != SIGNATURE {
                warn!("{}: not a coverage data file, first line is {:?}; skipped", path.display(), first);
                return Ok(0);
            }
        },
        None => {
            warn!("{}: empty coverage data file; skipped", path.display());
            return Ok(0);
        },
    }

    let mut count = 0;
    for (index, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // +2: one for the signature, one for 1-based numbering.
        let line_number = index + 2;
        match parse_data_line(line) {
            Ok((record, hits)) => {
                f(record, hits);
                count += 1;
            },
            Err(ref e) if e.kind().is_skippable_record() => {
                warn!("{}:{}: skipping coverage point, {}", path.display(), line_number, e);
            },
            Err(e) => bail!(Error::with_chain(e, ErrorKind::InvalidDataLine(path.to_owned(), line_number))),
        }
    }
    debug!("{}: read {} coverage points", path.display(), count);
    Ok(count)
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Encoding

/// The encoded form of a record, produced by [`encode()`].
///
/// [`encode()`]: ./fn.encode.html
#[derive(Copy, Clone, Debug)]
pub struct Encoded<'a> {
    identity: &'a Identity,
    attributes: &'a Attributes,
}

/// Encodes a record given as its two halves. Optional fields are written only if present.
pub fn encode<'a>(identity: &'a Identity, attributes: &'a Attributes) -> Encoded<'a> {
    Encoded { identity, attributes }
}

impl<'a> fmt::Display for Encoded<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let id = self.identity;
        let attr = self.attributes;
        write!(fmt, "{0}f{1}{2}{0}l{1}{3}{0}n{1}{4}", KEY_START, VALUE_START, id.path, id.line, id.column)?;
        if let Some(ref type_tag) = attr.type_tag {
            write!(fmt, "{}t{}{}", KEY_START, VALUE_START, type_tag)?;
        }
        write!(fmt, "{}page{}{}{}/{}", KEY_START, VALUE_START, METRIC_PREFIX, id.metric, id.module)?;
        if let Some(ref comment) = attr.comment {
            write!(fmt, "{}o{}{}", KEY_START, VALUE_START, comment)?;
        }
        if let Some(ref block) = attr.block {
            write!(fmt, "{}S{}", KEY_START, VALUE_START)?;
            write_block(fmt, block)?;
        }
        write!(fmt, "{}h{}{}", KEY_START, VALUE_START, id.hierarchy)
    }
}

fn write_block(fmt: &mut fmt::Formatter, block: &[Span]) -> fmt::Result {
    for (i, span) in block.iter().enumerate() {
        if i != 0 {
            fmt.write_str(",")?;
        }
        write!(fmt, "{}", span)?;
    }
    Ok(())
}

impl fmt::Display for Record {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&encode(&self.identity, &self.attributes), fmt)
    }
}

/// Writes the signature line of a data file.
pub fn write_header<W: Write>(mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", SIGNATURE)
}

/// Writes one coverage point line of a data file.
pub fn write_data_line<W: Write>(mut writer: W, identity: &Identity, attributes: &Attributes, hits: u64) -> io::Result<()> {
    writeln!(writer, "C '{}' {}", encode(identity, attributes), hits)
}

//}}}
