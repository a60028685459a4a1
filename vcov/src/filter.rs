//! Applying ignore rules to a merged table.

use ignore::IgnoreRules;
use merge::{Entry, HitTable};
use span;

/// Removes ignored coverage points from the table.
///
/// 1. Every point in a source file matching an ignore pattern is removed, whether it was hit or not.
/// 2. A point which has been hit is always kept. Line exclusions only ever hide *missed* code.
/// 3. A missed point spanning a block loses its excluded lines, and is removed if no line is left. A missed point
///    without a block is removed if its line is excluded.
///
/// Removed points count neither towards the total nor towards the misses.
pub fn filter(table: HitTable, rules: &IgnoreRules) -> HitTable {
    if rules.is_empty() {
        return table;
    }

    let before = table.len();
    let filtered = table
        .into_iter()
        .filter_map(|(identity, entry)| {
            if rules.is_file_ignored(&identity.path) {
                return None;
            }
            if !entry.is_miss() {
                return Some((identity, entry));
            }
            let excluded = rules.excluded_lines(&identity.path);
            if excluded.is_empty() {
                return Some((identity, entry));
            }
            let Entry { mut attributes, hits } = entry;
            match attributes.block.take() {
                Some(block) => {
                    let remaining = span::expand(&block).filter(|line| !excluded.contains(line));
                    let remaining = span::compress(remaining);
                    if remaining.is_empty() {
                        return None;
                    }
                    attributes.block = Some(remaining);
                },
                None => {
                    if excluded.contains(&identity.line) {
                        return None;
                    }
                },
            }
            Some((identity, Entry { attributes, hits }))
        })
        .collect::<HitTable>();

    debug!("filter removed {} of {} coverage points", before - filtered.len(), before);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use record::{Attributes, Identity, MetricType};
    use span::Span;

    fn identity(path: &str, line: u32, metric: MetricType) -> Identity {
        Identity {
            path: path.to_owned(),
            line,
            column: 0,
            metric,
            module: "m".to_owned(),
            hierarchy: "top.m".to_owned(),
        }
    }

    fn entry(block: Option<Vec<Span>>, hits: u64) -> Entry {
        Entry {
            attributes: Attributes { block, ..Attributes::default() },
            hits,
        }
    }

    #[test]
    fn test_block_is_narrowed() {
        let mut table = HitTable::new();
        table.add_entry(identity("a.v", 5, MetricType::Branch), entry(Some(vec![Span { start: 5, end: 7 }]), 0));
        let rules = IgnoreRules::resolve(&["a.v:6"]).unwrap();

        let filtered = filter(table, &rules);
        let kept = filtered.get(&identity("a.v", 5, MetricType::Branch)).unwrap();
        assert_eq!(kept.attributes.block, Some(vec![Span::single(5), Span::single(7)]));
    }

    #[test]
    fn test_fully_excluded_block_is_removed() {
        let mut table = HitTable::new();
        table.add_entry(identity("a.v", 5, MetricType::Expr), entry(Some(vec![Span { start: 5, end: 7 }]), 0));
        table.add_entry(identity("a.v", 8, MetricType::Line), entry(None, 0));
        table.add_entry(identity("a.v", 9, MetricType::Line), entry(None, 0));
        let rules = IgnoreRules::resolve(&["a.v:5-8"]).unwrap();

        let filtered = filter(table, &rules);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.get(&identity("a.v", 9, MetricType::Line)).is_some());
    }

    #[test]
    fn test_hit_points_are_never_excluded() {
        let mut table = HitTable::new();
        table.add_entry(identity("a.v", 5, MetricType::Toggle), entry(None, 3));
        table.add_entry(identity("a.v", 6, MetricType::Branch), entry(Some(vec![Span { start: 6, end: 9 }]), 1));
        let rules = IgnoreRules::resolve(&["a.v:1-100"]).unwrap();

        let filtered = filter(table.clone(), &rules);
        assert_eq!(filtered, table);
    }

    #[test]
    fn test_ignored_files_are_removed_even_if_hit() {
        let mut table = HitTable::new();
        table.add_entry(identity("/w/gen/regs.v", 1, MetricType::Line), entry(None, 10));
        table.add_entry(identity("/w/gen/regs.v", 2, MetricType::Line), entry(None, 0));
        table.add_entry(identity("/w/rtl/alu.v", 1, MetricType::Line), entry(None, 0));
        let rules = IgnoreRules::resolve(&["*/gen/*.v"]).unwrap();

        let filtered = filter(table, &rules);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.iter().all(|(id, _)| id.path == "/w/rtl/alu.v"));
    }

    #[test]
    fn test_relative_exclusion_on_absolute_path() {
        let mut table = HitTable::new();
        table.add_entry(identity("/w/rtl/alu.v", 4, MetricType::Line), entry(None, 0));
        let rules = IgnoreRules::resolve(&["rtl/alu.v:4"]).unwrap();
        assert!(filter(table, &rules).is_empty());
    }
}
