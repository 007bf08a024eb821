use serde::Serialize;
use similar::{capture_diff_slices, Algorithm, DiffOp};

/// Column width used when none is configured.
pub const DEFAULT_COLUMN_WIDTH: usize = 80;

/// One aligned row of a side-by-side diff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffRow {
    /// The line is present, unchanged, on both sides.
    Same { text: String },
    /// The line at this position was replaced.
    Changed { previous: String, current: String },
    /// The line exists only on the previous side.
    Removed { previous: String },
    /// The line exists only on the current side.
    Added { current: String },
}

impl DiffRow {
    fn columns(&self) -> (&str, char, &str) {
        match self {
            Self::Same { text } => (text, '|', text),
            Self::Changed { previous, current } => (previous, '*', current),
            Self::Removed { previous } => (previous, '<', ""),
            Self::Added { current } => ("", '>', current),
        }
    }
}

/// An aligned previous/current comparison of two line lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SideBySide {
    pub rows: Vec<DiffRow>,
}

impl SideBySide {
    /// Returns `true` if both sides were identical.
    pub fn is_unchanged(&self) -> bool {
        self.rows
            .iter()
            .all(|r| matches!(r, DiffRow::Same { .. }))
    }

    /// Number of rows that differ.
    pub fn changes(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| !matches!(r, DiffRow::Same { .. }))
            .count()
    }

    /// Lay the rows out as `previous  <marker>  current`, each side fitted to
    /// `width` characters. Markers: `|` same, `*` changed, `<` removed,
    /// `>` added.
    pub fn render(&self, width: usize) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let (left, marker, right) = row.columns();
            let line = format!(
                "    {}   {}   {}",
                fit(left, width),
                marker,
                fit(right, width)
            );
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

/// Align `previous` against `current` line by line.
///
/// A deletion immediately followed by an insertion is paired up row by row
/// into [`DiffRow::Changed`]; leftovers on either side stay unpaired.
pub fn side_by_side<S: AsRef<str>>(previous: &[S], current: &[S]) -> SideBySide {
    let old: Vec<&str> = previous.iter().map(AsRef::as_ref).collect();
    let new: Vec<&str> = current.iter().map(AsRef::as_ref).collect();

    let mut rows = Vec::with_capacity(old.len().max(new.len()));
    let mut removed: Vec<&str> = Vec::new();
    let mut added: Vec<&str> = Vec::new();

    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        match op {
            DiffOp::Equal { old_index, len, .. } => {
                flush(&mut rows, &mut removed, &mut added);
                rows.extend(old[old_index..old_index + len].iter().map(|l| DiffRow::Same {
                    text: l.to_string(),
                }));
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                if !added.is_empty() {
                    flush(&mut rows, &mut removed, &mut added);
                }
                removed.extend_from_slice(&old[old_index..old_index + old_len]);
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                added.extend_from_slice(&new[new_index..new_index + new_len]);
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                if !added.is_empty() {
                    flush(&mut rows, &mut removed, &mut added);
                }
                removed.extend_from_slice(&old[old_index..old_index + old_len]);
                added.extend_from_slice(&new[new_index..new_index + new_len]);
            }
        }
    }
    flush(&mut rows, &mut removed, &mut added);

    SideBySide { rows }
}

fn flush(rows: &mut Vec<DiffRow>, removed: &mut Vec<&str>, added: &mut Vec<&str>) {
    for k in 0..removed.len().max(added.len()) {
        rows.push(match (removed.get(k), added.get(k)) {
            (Some(previous), Some(current)) => DiffRow::Changed {
                previous: previous.to_string(),
                current: current.to_string(),
            },
            (Some(previous), None) => DiffRow::Removed {
                previous: previous.to_string(),
            },
            (None, Some(current)) => DiffRow::Added {
                current: current.to_string(),
            },
            (None, None) => unreachable!("k is below the longer length"),
        });
    }
    removed.clear();
    added.clear();
}

/// Truncate or right-pad `text` to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        let mut s = text.to_string();
        s.extend(std::iter::repeat(' ').take(width - len));
        s
    } else if width > 3 {
        let mut s: String = text.chars().take(width - 3).collect();
        s.push_str("...");
        s
    } else {
        text.chars().take(width).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_lists() {
        let lines = ["Hash(06000000)", "Name(os)"];
        let diff = side_by_side(&lines, &lines);
        assert!(diff.is_unchanged());
        assert_eq!(diff.changes(), 0);
        assert_eq!(diff.rows.len(), 2);
    }

    #[test]
    fn replaced_line_pairs_up() {
        let old = ["Hash(05000000)", "Node(<code f>)", "Hash(00000000)"];
        let new = ["Hash(05000000)", "Node(<code g>)", "Hash(00000000)"];
        let diff = side_by_side(&old, &new);
        assert_eq!(diff.changes(), 1);
        assert_eq!(
            diff.rows[1],
            DiffRow::Changed {
                previous: "Node(<code f>)".into(),
                current: "Node(<code g>)".into(),
            }
        );
    }

    #[test]
    fn uneven_replacement() {
        let old = ["a", "b", "z"];
        let new = ["a", "c", "d", "e", "z"];
        let diff = side_by_side(&old, &new);
        assert_eq!(diff.rows.first(), Some(&DiffRow::Same { text: "a".into() }));
        assert_eq!(diff.rows.last(), Some(&DiffRow::Same { text: "z".into() }));
        assert_eq!(diff.rows.len(), 5);
        assert_eq!(diff.changes(), 3);
    }

    #[test]
    fn pure_insertions_and_deletions() {
        let empty: [&str; 0] = [];
        let lines = ["x", "y"];
        let grown = side_by_side(&empty, &lines);
        assert!(grown
            .rows
            .iter()
            .all(|r| matches!(r, DiffRow::Added { .. })));
        let shrunk = side_by_side(&lines, &empty);
        assert!(shrunk
            .rows
            .iter()
            .all(|r| matches!(r, DiffRow::Removed { .. })));
    }

    #[test]
    fn render_columns() {
        let diff = side_by_side(&["same", "old"], &["same", "new"]);
        let text = diff.render(6);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "    same     |   same");
        assert_eq!(lines[1], "    old      *   new");
    }

    #[test]
    fn render_truncates_long_lines() {
        let long = "NamedNode(a_rather_long_member_name=<function pkg.mod.helper>)";
        let diff = side_by_side(&[long], &["short"]);
        let text = diff.render(20);
        let first = text.lines().next().unwrap();
        assert!(first.contains("NamedNode(a_rathe..."));
        assert!(first.ends_with("short"));
    }

    #[test]
    fn fit_exact() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 5), "ab...");
        assert_eq!(fit("abcdef", 2), "ab");
    }

    #[test]
    fn serializes_rows() {
        let diff = side_by_side(&["a"], &["b"]);
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["rows"][0]["kind"], "changed");
        assert_eq!(json["rows"][0]["previous"], "a");
    }
}
