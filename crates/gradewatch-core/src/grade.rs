//! Ordered grade states

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Indicator tier, ordered from `None` (lowest) to `S` (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    None,
    E,
    D,
    C,
    B,
    A,
    S,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown grade: {0:?}")]
pub struct ParseGradeError(pub String);

impl Grade {
    /// All grades in ascending order
    pub const ALL: [Grade; 7] = [
        Grade::None,
        Grade::E,
        Grade::D,
        Grade::C,
        Grade::B,
        Grade::A,
        Grade::S,
    ];

    /// Position in the ordering (`None` = 0, `S` = 6)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Grade at `index`, clamped to `S` for anything past the top.
    pub fn from_index(index: usize) -> Grade {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::None => "None",
            Grade::E => "E",
            Grade::D => "D",
            Grade::C => "C",
            Grade::B => "B",
            Grade::A => "A",
            Grade::S => "S",
        }
    }

    /// One step up, saturating at `S`
    pub fn next_up(self) -> Grade {
        Self::from_index(self.index() + 1)
    }

    pub fn is_none(self) -> bool {
        self == Grade::None
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = ParseGradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseGradeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_matches_index() {
        for pair in Grade::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].index() + 1, pair[1].index());
        }
        assert_eq!(Grade::None.index(), 0);
        assert_eq!(Grade::S.index(), 6);
    }

    #[test]
    fn test_from_index_clamps() {
        assert_eq!(Grade::from_index(3), Grade::C);
        assert_eq!(Grade::from_index(42), Grade::S);
        assert_eq!(Grade::S.next_up(), Grade::S);
        assert_eq!(Grade::None.next_up(), Grade::E);
    }

    #[test]
    fn test_parse() {
        assert_eq!("s".parse::<Grade>(), Ok(Grade::S));
        assert_eq!("None".parse::<Grade>(), Ok(Grade::None));
        assert!("F".parse::<Grade>().is_err());
    }
}
