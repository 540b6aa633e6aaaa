//! Catalog alignment
//!
//! Pairs two sorted catalogs of table names with a single two-pointer
//! merge-join. Names are compared ordinally (byte-wise); no case folding or
//! quoting normalisation happens across engines.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Which engine a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Strictly ascending, duplicate-free list of table names from one engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog(Vec<String>);

impl Catalog {
    /// Build a catalog from raw engine output, sorting and dropping duplicates.
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort_unstable();
        names.dedup();
        Self(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One row of the alignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "presence", content = "table", rename_all = "lowercase")]
pub enum AlignedPair {
    /// Table exists only on the left engine
    Left(String),
    /// Table exists only on the right engine
    Right(String),
    /// Table exists on both engines under the same name
    Both(String),
}

impl AlignedPair {
    pub fn left(&self) -> Option<&str> {
        match self {
            AlignedPair::Left(name) | AlignedPair::Both(name) => Some(name),
            AlignedPair::Right(_) => None,
        }
    }

    pub fn right(&self) -> Option<&str> {
        match self {
            AlignedPair::Right(name) | AlignedPair::Both(name) => Some(name),
            AlignedPair::Left(_) => None,
        }
    }

    /// The populated name, whichever side it is on
    pub fn name(&self) -> &str {
        match self {
            AlignedPair::Left(name) | AlignedPair::Right(name) | AlignedPair::Both(name) => name,
        }
    }
}

/// Counts of each kind of pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentSummary {
    pub matched: usize,
    pub left_only: usize,
    pub right_only: usize,
}

impl AlignmentSummary {
    pub fn of(pairs: &[AlignedPair]) -> Self {
        pairs.iter().fold(Self::default(), |mut acc, pair| {
            match pair {
                AlignedPair::Both(_) => acc.matched += 1,
                AlignedPair::Left(_) => acc.left_only += 1,
                AlignedPair::Right(_) => acc.right_only += 1,
            }
            acc
        })
    }
}

/// Align two catalogs. Output length is `left.len() + right.len() - matches`.
pub fn align(left: &Catalog, right: &Catalog) -> Vec<AlignedPair> {
    align_sorted(left.names(), right.names())
}

/// Merge-join two name slices.
///
/// Both slices must be strictly ascending. Unsorted input is a caller bug:
/// it trips a debug assertion and otherwise yields an unspecified pairing.
pub fn align_sorted(left: &[String], right: &[String]) -> Vec<AlignedPair> {
    debug_assert!(left.windows(2).all(|w| w[0] < w[1]), "left catalog not sorted");
    debug_assert!(right.windows(2).all(|w| w[0] < w[1]), "right catalog not sorted");

    let mut pairs = Vec::with_capacity(left.len().max(right.len()));
    let (mut i, mut j) = (0, 0);

    while i < left.len() || j < right.len() {
        let ordering = match (left.get(i), right.get(j)) {
            (Some(l), Some(r)) => l.cmp(r),
            (Some(_), None) => Ordering::Less,
            (None, _) => Ordering::Greater,
        };

        match ordering {
            Ordering::Equal => {
                pairs.push(AlignedPair::Both(left[i].clone()));
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                pairs.push(AlignedPair::Left(left[i].clone()));
                i += 1;
            }
            Ordering::Greater => {
                pairs.push(AlignedPair::Right(right[j].clone()));
                j += 1;
            }
        }
    }

    pairs
}
