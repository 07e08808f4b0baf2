//! Ordering of free-form version strings.
//!
//! A version is split into segments: runs of digits, runs of anything that is
//! neither a digit nor a period, and single periods. Segments are compared
//! pairwise; numbers beat periods, and both beat text, so `1.2.0` is newer
//! than `1.2rc1`. When one version runs out of segments, a trailing text
//! segment on the longer one marks a pre-release (`1.5b3 < 1.5`) while a
//! trailing period or number marks a newer release (`1.5 < 1.5.1`).

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Number(&'a str),
    Period,
    Text(&'a str),
}

impl Segment<'_> {
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Number,
    Period,
    Text,
}

fn classify(ch: char) -> CharClass {
    match ch {
        '.' => CharClass::Period,
        '0'..='9' => CharClass::Number,
        _ => CharClass::Text,
    }
}

/// Iterator over the segments of a version string.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chars = self.rest.char_indices();
        let (_, first) = chars.next()?;
        let class = classify(first);

        let end = if class == CharClass::Period {
            first.len_utf8()
        } else {
            chars
                .find(|&(_, ch)| classify(ch) != class)
                .map_or(self.rest.len(), |(idx, _)| idx)
        };

        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;

        Some(match class {
            CharClass::Number => Segment::Number(run),
            CharClass::Period => Segment::Period,
            CharClass::Text => Segment::Text(run),
        })
    }
}

/// Split a version string into segments. `""` yields nothing and `"1..2"`
/// yields two adjacent periods for the empty component.
#[must_use]
pub fn segments(version: &str) -> Segments<'_> {
    Segments { rest: version }
}

// Digit runs that do not fit in a u64 compare as zero.
fn numeric_value(digits: &str) -> u64 {
    digits.parse().unwrap_or(0)
}

fn compare_segments(a: Segment<'_>, b: Segment<'_>) -> Ordering {
    match (a, b) {
        (Segment::Number(a), Segment::Number(b)) => numeric_value(a).cmp(&numeric_value(b)),
        (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
        (Segment::Period, Segment::Period) => Ordering::Equal,
        (Segment::Text(_), _) => Ordering::Less,
        (_, Segment::Text(_)) => Ordering::Greater,
        (Segment::Number(_), Segment::Period) => Ordering::Greater,
        (Segment::Period, Segment::Number(_)) => Ordering::Less,
    }
}

/// Compare two version strings.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = segments(a);
    let mut right = segments(b);

    loop {
        match (left.next(), right.next()) {
            (Some(a), Some(b)) => {
                let ordering = compare_segments(a, b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (None, None) => return Ordering::Equal,
            (Some(extra), None) => {
                return if extra.is_text() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
            (None, Some(extra)) => {
                return if extra.is_text() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
            }
        }
    }
}

#[must_use]
pub fn is_newer_version(candidate: &str, current: &str) -> bool {
    compare_versions(candidate, current) == Ordering::Greater
}
