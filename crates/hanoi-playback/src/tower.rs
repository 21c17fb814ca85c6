//! Towers and the discs stacked on them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Disc size. Larger numbers are larger discs.
pub type Disc = u32;

/// One of the three pegs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerId {
    A,
    B,
    C,
}

impl TowerId {
    /// All towers, left to right.
    pub const ALL: [TowerId; 3] = [TowerId::A, TowerId::B, TowerId::C];
}

impl fmt::Display for TowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TowerId::A => "A",
            TowerId::B => "B",
            TowerId::C => "C",
        })
    }
}

/// A complete tower configuration.
///
/// Each tower lists its discs bottom to top, so in a legal configuration every
/// tower is strictly decreasing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Towers {
    #[serde(rename = "A")]
    pub a: Vec<Disc>,
    #[serde(rename = "B")]
    pub b: Vec<Disc>,
    #[serde(rename = "C")]
    pub c: Vec<Disc>,
}

impl Towers {
    /// Starting configuration: `discs` discs on tower A, largest at the bottom.
    pub fn initial(discs: Disc) -> Self {
        Self {
            a: (1..=discs).rev().collect(),
            b: Vec::new(),
            c: Vec::new(),
        }
    }

    /// Discs on a tower, bottom to top.
    pub fn get(&self, tower: TowerId) -> &[Disc] {
        match tower {
            TowerId::A => &self.a,
            TowerId::B => &self.b,
            TowerId::C => &self.c,
        }
    }

    fn get_mut(&mut self, tower: TowerId) -> &mut Vec<Disc> {
        match tower {
            TowerId::A => &mut self.a,
            TowerId::B => &mut self.b,
            TowerId::C => &mut self.c,
        }
    }

    /// The disc on top of a tower, if any.
    pub fn top(&self, tower: TowerId) -> Option<Disc> {
        self.get(tower).last().copied()
    }

    /// Total number of discs across all towers.
    pub fn disc_count(&self) -> usize {
        TowerId::ALL.iter().map(|&t| self.get(t).len()).sum()
    }

    /// Whether every tower is strictly decreasing from bottom to top.
    pub fn is_well_ordered(&self) -> bool {
        TowerId::ALL
            .iter()
            .all(|&t| self.get(t).windows(2).all(|w| w[0] > w[1]))
    }

    /// Move the top disc of `from` onto `to`.
    ///
    /// Returns the moved disc, or `None` (leaving the towers untouched) if
    /// `from` is empty or the disc would land on a smaller one.
    pub fn apply(&mut self, from: TowerId, to: TowerId) -> Option<Disc> {
        let disc = self.top(from)?;
        if from == to || self.top(to).is_some_and(|top| top < disc) {
            return None;
        }
        self.get_mut(from).pop();
        self.get_mut(to).push(disc);
        Some(disc)
    }
}
