//! Merging coverage data files into one table of hit counts.
//!
//! Every data file is decoded into its own [`HitTable`] on the rayon thread pool. The per-file tables are then
//! combined one after another on the calling thread. Since combining only sums hit counts keyed by [`Identity`], the
//! result does not depend on the order of the files.
//!
//! [`HitTable`]: ./struct.HitTable.html
//! [`Identity`]: ../record/struct.Identity.html

use codec;
use error::*;
use record::{Attributes, Identity, Record};

use rayon::prelude::*;

use std::collections::btree_map::{self, BTreeMap, Entry as MapEntry};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::iter::FromIterator;
use std::path::Path;

//----------------------------------------------------------------------------------------------------------------------
//{{{ HitTable

/// The merged state of one coverage point.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Entry {
    /// The non-identity fields of the point.
    pub attributes: Attributes,
    /// Sum of hit counts over all merged data files.
    pub hits: u64,
}

impl Entry {
    /// Checks whether the point has never been hit.
    pub fn is_miss(&self) -> bool {
        self.hits == 0
    }
}

/// Mapping from coverage point identity to the summed hit count.
///
/// Iteration is ordered by identity, which makes every output derived from the table deterministic.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct HitTable {
    entries: BTreeMap<Identity, Entry>,
}

impl HitTable {
    /// Creates an empty table.
    pub fn new() -> HitTable {
        HitTable::default()
    }

    /// Reads a single data file into a new table.
    ///
    /// A file with an unrecognized signature produces an empty table.
    ///
    /// # Errors
    ///
    /// * Returns [`MissingDataFile`] if the file does not exist.
    /// * Returns [`InvalidDataLine`] if any line cannot be decoded.
    /// * Returns [`Io`] on I/O failure.
    ///
    /// [`MissingDataFile`]: ../error/enum.ErrorKind.html#variant.MissingDataFile
    /// [`InvalidDataLine`]: ../error/enum.ErrorKind.html#variant.InvalidDataLine
    /// [`Io`]: ../error/enum.ErrorKind.html#variant.Io
    pub fn open<P: AsRef<Path>>(path: P) -> Result<HitTable> {
        let path = path.as_ref();
        debug!("open coverage data file {:?}", path);
        ensure!(path.is_file(), ErrorKind::MissingDataFile(path.to_owned()));
        let file = File::open(path).chain_err(|| format!("Cannot open {}", path.display()))?;

        let mut table = HitTable::new();
        codec::read_data(BufReader::new(file), path, |record, hits| table.add(record, hits))?;
        Ok(table)
    }

    /// Adds `hits` to the coverage point described by `record`.
    pub fn add(&mut self, record: Record, hits: u64) {
        self.add_entry(record.identity, Entry { attributes: record.attributes, hits });
    }

    /// Adds an entry to the table.
    ///
    /// If the identity is already present, the hit counts are summed. Should the two entries disagree on the
    /// attributes, the smaller one is kept so that the outcome is independent of the order of insertion.
    pub fn add_entry(&mut self, identity: Identity, entry: Entry) {
        match self.entries.entry(identity) {
            MapEntry::Vacant(slot) => {
                slot.insert(entry);
            },
            MapEntry::Occupied(mut slot) => {
                if entry.attributes < slot.get().attributes {
                    trace!("attributes of {:?} differ between data files", slot.key());
                    slot.get_mut().attributes = entry.attributes;
                }
                let existing = slot.get_mut();
                existing.hits = existing.hits.saturating_add(entry.hits);
            },
        }
    }

    /// Moves every entry of `other` into this table.
    pub fn absorb(&mut self, other: HitTable) {
        if self.entries.is_empty() {
            self.entries = other.entries;
            return;
        }
        for (identity, entry) in other.entries {
            self.add_entry(identity, entry);
        }
    }

    /// Finds the entry of a coverage point.
    pub fn get(&self, identity: &Identity) -> Option<&Entry> {
        self.entries.get(identity)
    }

    /// Number of distinct coverage points.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the table has no coverage points.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all coverage points in identity order.
    pub fn iter(&self) -> btree_map::Iter<Identity, Entry> {
        self.entries.iter()
    }

    /// Writes the table in the data file format, in identity order.
    pub fn write_dat<W: Write>(&self, mut writer: W) -> io::Result<()> {
        codec::write_header(&mut writer)?;
        for (identity, entry) in &self.entries {
            codec::write_data_line(&mut writer, identity, &entry.attributes, entry.hits)?;
        }
        writer.flush()
    }
}

impl<'a> IntoIterator for &'a HitTable {
    type Item = (&'a Identity, &'a Entry);
    type IntoIter = btree_map::Iter<'a, Identity, Entry>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for HitTable {
    type Item = (Identity, Entry);
    type IntoIter = btree_map::IntoIter<Identity, Entry>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(Identity, Entry)> for HitTable {
    fn from_iter<I: IntoIterator<Item = (Identity, Entry)>>(iter: I) -> HitTable {
        let mut table = HitTable::new();
        for (identity, entry) in iter {
            table.add_entry(identity, entry);
        }
        table
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ merge

/// Reads all data files in parallel and merges them into one table.
///
/// The files are decoded on the global rayon thread pool. The per-file tables are combined sequentially afterwards.
///
/// # Errors
///
/// Fails if any file is missing or cannot be decoded; see [`HitTable::open()`]. A missing data file is never
/// silently skipped, since that would distort the coverage percentages.
///
/// [`HitTable::open()`]: ./struct.HitTable.html#method.open
pub fn merge<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<HitTable> {
    let tables = paths
        .par_iter()
        .map(|path| HitTable::open(path))
        .collect::<Result<Vec<_>>>()?;

    let mut merged = HitTable::new();
    for table in tables {
        merged.absorb(table);
    }
    debug!("merged {} data files into {} coverage points", paths.len(), merged.len());
    Ok(merged)
}

//}}}

#[cfg(test)]
mod tests {
    use super::*;
    use record::MetricType;

    use tempfile::{tempdir, TempDir};

    use std::fs;
    use std::path::PathBuf;

    fn encoded(path: &str, line: u32, metric: &str, module: &str) -> String {
        format!(
            "\x01f\x02{}\x01l\x02{}\x01n\x021\x01page\x02v_{}/{}\x01h\x02top.{}",
            path, line, metric, module, module
        )
    }

    fn write_data(dir: &TempDir, name: &str, points: &[(String, u64)]) -> PathBuf {
        let mut content = format!("{}\n", codec::SIGNATURE);
        for &(ref record, hits) in points {
            content.push_str(&format!("C '{}' {}\n", record, hits));
        }
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn identity(path: &str, line: u32, metric: MetricType, module: &str) -> Identity {
        Identity {
            path: path.to_owned(),
            line,
            column: 1,
            metric,
            module: module.to_owned(),
            hierarchy: format!("top.{}", module),
        }
    }

    #[test]
    fn test_hits_are_additive() {
        let dir = tempdir().unwrap();
        let a = write_data(&dir, "a.dat", &[(encoded("a.v", 10, "branch", "m"), 0), (encoded("a.v", 11, "line", "m"), 4)]);
        let b = write_data(&dir, "b.dat", &[(encoded("a.v", 10, "branch", "m"), 2), (encoded("a.v", 11, "line", "m"), 5)]);

        let table = merge(&[a, b]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&identity("a.v", 10, MetricType::Branch, "m")).unwrap().hits, 2);
        assert_eq!(table.get(&identity("a.v", 11, MetricType::Line, "m")).unwrap().hits, 9);
    }

    #[test]
    fn test_duplicates_within_one_file_are_summed() {
        let dir = tempdir().unwrap();
        let record = encoded("a.v", 3, "toggle", "m");
        let a = write_data(&dir, "a.dat", &[(record.clone(), 1), (record, 6)]);
        let table = HitTable::open(&a).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&identity("a.v", 3, MetricType::Toggle, "m")).unwrap().hits, 7);
    }

    #[test]
    fn test_hits_saturate() {
        let mut table = HitTable::new();
        let id = identity("a.v", 1, MetricType::Line, "m");
        table.add_entry(id.clone(), Entry { attributes: Attributes::default(), hits: u64::max_value() - 1 });
        table.add_entry(id.clone(), Entry { attributes: Attributes::default(), hits: 5 });
        assert_eq!(table.get(&id).unwrap().hits, u64::max_value());
    }

    #[test]
    fn test_conflicting_attributes_keep_the_smaller() {
        let id = identity("a.v", 1, MetricType::Branch, "m");
        let small = Attributes { comment: Some("a".to_owned()), ..Attributes::default() };
        let large = Attributes { comment: Some("b".to_owned()), ..Attributes::default() };

        let mut forward = HitTable::new();
        forward.add_entry(id.clone(), Entry { attributes: large.clone(), hits: 1 });
        forward.add_entry(id.clone(), Entry { attributes: small.clone(), hits: 2 });
        let mut backward = HitTable::new();
        backward.add_entry(id.clone(), Entry { attributes: small.clone(), hits: 2 });
        backward.add_entry(id.clone(), Entry { attributes: large, hits: 1 });

        assert_eq!(forward, backward);
        assert_eq!(*forward.get(&id).unwrap(), Entry { attributes: small, hits: 3 });
    }

    #[test]
    fn test_merge_is_order_independent() {
        let dir = tempdir().unwrap();
        let with_comment = "\x01f\x02a.v\x01l\x025\x01n\x021\x01page\x02v_expr/m\x01o\x02zzz\x01h\x02top.m".to_owned();
        let files = vec![
            write_data(&dir, "1.dat", &[(encoded("a.v", 5, "expr", "m"), 1), (encoded("b.v", 1, "line", "n"), 0)]),
            write_data(&dir, "2.dat", &[(with_comment, 3)]),
            write_data(&dir, "3.dat", &[(encoded("b.v", 1, "line", "n"), 8), (encoded("c.v", 2, "toggle", "k"), 0)]),
        ];

        let forward = merge(&files).unwrap();
        let mut reversed_files = files.clone();
        reversed_files.reverse();
        let reversed = merge(&reversed_files).unwrap();
        let rotated = merge(&[files[1].clone(), files[2].clone(), files[0].clone()]).unwrap();

        assert_eq!(forward, reversed);
        assert_eq!(forward, rotated);
        assert_eq!(forward.get(&identity("a.v", 5, MetricType::Expr, "m")).unwrap().hits, 4);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let good = write_data(&dir, "good.dat", &[(encoded("a.v", 1, "line", "m"), 1)]);
        let missing = dir.path().join("missing.dat");
        let err = merge(&[good, missing.clone()]).unwrap_err();
        match *err.kind() {
            ErrorKind::MissingDataFile(ref path) => assert_eq!(*path, missing),
            ref kind => panic!("unexpected error {:?}", kind),
        }
    }

    #[test]
    fn test_unrecognized_file_contributes_nothing() {
        let dir = tempdir().unwrap();
        let good = write_data(&dir, "good.dat", &[(encoded("a.v", 1, "line", "m"), 1)]);
        let other = dir.path().join("other.dat");
        fs::write(&other, format!("not coverage\nC '{}' 100\n", encoded("a.v", 1, "line", "m"))).unwrap();

        let table = merge(&[good, other]).unwrap();
        assert_eq!(table.get(&identity("a.v", 1, MetricType::Line, "m")).unwrap().hits, 1);
    }

    #[test]
    fn test_write_dat_round_trip() {
        let dir = tempdir().unwrap();
        let block = "\x01f\x02a.v\x01l\x025\x01n\x021\x01t\x02branch\x01page\x02v_branch/m\x01S\x025-7,9\x01h\x02top.m";
        let input = write_data(&dir, "in.dat", &[(block.to_owned(), 2), (encoded("a.v", 1, "line", "m"), 0)]);
        let table = HitTable::open(&input).unwrap();

        let mut output = Vec::new();
        table.write_dat(&mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        let expected = format!(
            "{}\nC '{}' 0\nC '{}' 2\n",
            codec::SIGNATURE,
            encoded("a.v", 1, "line", "m"),
            block,
        );
        assert_eq!(output, expected);

        let reparsed = dir.path().join("out.dat");
        fs::write(&reparsed, output).unwrap();
        assert_eq!(HitTable::open(&reparsed).unwrap(), table);
    }
}
