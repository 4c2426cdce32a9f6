use crate::{LifeError, Result};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Largest possible neighbor count in the Moore neighborhood.
pub const MAX_NEIGHBORS: u8 = 8;

/// Bit `n` is set iff neighbor count `n` is in the set.
type NeighborMask = u16;

/// A Life-like rule in B/S notation.
///
/// Birth and survival counts are kept as bitmasks, so membership checks are a
/// shift and a mask. The rule is immutable once built and is shared read-only
/// by every worker during a step.
///
/// ```rust
/// use gridlife::RuleSet;
///
/// let rule: RuleSet = "B36/S23".parse().unwrap();
/// assert!(rule.is_birth(6));
/// assert_eq!(rule.to_string(), "B36/S23");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleSet {
    birth: NeighborMask,
    survival: NeighborMask,
}

impl RuleSet {
    /// Conway's Game of Life, B3/S23.
    pub const fn conway() -> Self {
        Self {
            birth: 1 << 3,
            survival: (1 << 2) | (1 << 3),
        }
    }

    /// Builds a rule from explicit neighbor counts.
    ///
    /// Duplicates are allowed and collapse into one entry.
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::InvalidRuleFormat`] if any count is greater than 8.
    pub fn new(
        birth: impl IntoIterator<Item = u8>,
        survival: impl IntoIterator<Item = u8>,
    ) -> Result<Self> {
        Ok(Self {
            birth: Self::to_mask(birth)?,
            survival: Self::to_mask(survival)?,
        })
    }

    /// Parses a `B<digits>/S<digits>` string.
    ///
    /// The birth segment must come first. Either segment may be empty after
    /// its letter, so `B/S` is a valid rule where nothing is ever born or
    /// survives.
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::InvalidRuleFormat`] naming the offending segment or
    /// character when the string is not exactly two `/`-separated segments,
    /// a segment has the wrong prefix, or a character is not a digit in 0..=8.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let mut parts = text.split('/');
        let (Some(birth), Some(survival), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(LifeError::InvalidRuleFormat(text.to_string()));
        };

        Ok(Self {
            birth: Self::parse_segment(birth, 'B')?,
            survival: Self::parse_segment(survival, 'S')?,
        })
    }

    fn parse_segment(segment: &str, prefix: char) -> Result<NeighborMask> {
        let digits = segment
            .strip_prefix(prefix)
            .ok_or_else(|| LifeError::InvalidRuleFormat(segment.to_string()))?;

        let mut mask = 0;
        for ch in digits.chars() {
            match ch.to_digit(10) {
                Some(n) if n <= MAX_NEIGHBORS as u32 => mask |= 1 << n,
                _ => return Err(LifeError::InvalidRuleFormat(ch.to_string())),
            }
        }
        Ok(mask)
    }

    fn to_mask(counts: impl IntoIterator<Item = u8>) -> Result<NeighborMask> {
        let mut mask = 0;
        for n in counts {
            if n > MAX_NEIGHBORS {
                return Err(LifeError::InvalidRuleFormat(n.to_string()));
            }
            mask |= 1 << n;
        }
        Ok(mask)
    }

    /// Whether a dead cell with `neighbors` live neighbors comes alive.
    #[inline]
    pub fn is_birth(&self, neighbors: u8) -> bool {
        neighbors <= MAX_NEIGHBORS && (self.birth >> neighbors) & 1 != 0
    }

    /// Whether a live cell with `neighbors` live neighbors stays alive.
    #[inline]
    pub fn is_survival(&self, neighbors: u8) -> bool {
        neighbors <= MAX_NEIGHBORS && (self.survival >> neighbors) & 1 != 0
    }

    /// State of a cell in the next generation.
    #[inline]
    pub fn next_state(&self, alive: bool, neighbors: u8) -> bool {
        if alive {
            self.is_survival(neighbors)
        } else {
            self.is_birth(neighbors)
        }
    }

    /// Birth counts in ascending order.
    pub fn birth_counts(&self) -> impl Iterator<Item = u8> {
        Self::counts(self.birth)
    }

    /// Survival counts in ascending order.
    pub fn survival_counts(&self) -> impl Iterator<Item = u8> {
        Self::counts(self.survival)
    }

    fn counts(mask: NeighborMask) -> impl Iterator<Item = u8> {
        (0..=MAX_NEIGHBORS).filter(move |&n| (mask >> n) & 1 != 0)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::conway()
    }
}

impl FromStr for RuleSet {
    type Err = LifeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Canonical form with digits ascending, so saved files are diff-stable.
impl Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "B")?;
        for n in self.birth_counts() {
            write!(f, "{}", n)?;
        }
        write!(f, "/S")?;
        for n in self.survival_counts() {
            write!(f, "{}", n)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conway() {
        let rule = RuleSet::parse("B3/S23").unwrap();
        assert!(rule.is_birth(3));
        assert!(!rule.is_birth(2));
        assert!(rule.is_survival(2));
        assert!(rule.is_survival(3));
        assert!(!rule.is_survival(4));
        assert_eq!(rule, RuleSet::conway());
        assert_eq!(rule, RuleSet::default());
    }

    #[test]
    fn test_empty_segments() {
        let rule = RuleSet::parse("B/S").unwrap();
        for n in 0..=MAX_NEIGHBORS {
            assert!(!rule.is_birth(n));
            assert!(!rule.is_survival(n));
        }
        assert_eq!(rule.to_string(), "B/S");
    }

    #[test]
    fn test_format_is_sorted_and_deduplicated() {
        let rule = RuleSet::parse("B6336/S3202").unwrap();
        assert_eq!(rule.to_string(), "B36/S023");
    }

    #[test]
    fn test_roundtrip_all_masks() {
        // every birth mask paired with a few survival masks
        for birth in 0..1u16 << 9 {
            for survival in [0u16, 0b1_0000_0000, 0b0_0000_1100, 0b1_1111_1111] {
                let rule = RuleSet { birth, survival };
                let reparsed = RuleSet::parse(&rule.to_string()).unwrap();
                assert_eq!(rule, reparsed);
                for n in 0..=MAX_NEIGHBORS {
                    assert_eq!(rule.is_birth(n), reparsed.is_birth(n));
                    assert_eq!(rule.is_survival(n), reparsed.is_survival(n));
                }
            }
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for text in ["", "B3", "B3/S23/C1", "S23/B3", "C3/S23", "B3/23", "b3/s23"] {
            let err = RuleSet::parse(text).unwrap_err();
            assert!(
                matches!(err, LifeError::InvalidRuleFormat(_)),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_rejects_bad_digit_naming_it() {
        match RuleSet::parse("B39/S23").unwrap_err() {
            LifeError::InvalidRuleFormat(token) => assert_eq!(token, "9"),
            err => panic!("unexpected error {err:?}"),
        }
        match RuleSet::parse("B3/S2x").unwrap_err() {
            LifeError::InvalidRuleFormat(token) => assert_eq!(token, "x"),
            err => panic!("unexpected error {err:?}"),
        }
    }

    #[test]
    fn test_programmatic() {
        let rule = RuleSet::new([3, 6, 3], [2, 3]).unwrap();
        assert_eq!(rule.to_string(), "B36/S23");
        assert_eq!(rule.birth_counts().collect::<Vec<_>>(), vec![3, 6]);
        assert!(RuleSet::new([9], []).is_err());
    }

    #[test]
    fn test_out_of_range_count_is_never_a_member() {
        let rule = RuleSet::parse("B012345678/S012345678").unwrap();
        assert!(!rule.is_birth(9));
        assert!(!rule.is_survival(200));
    }
}
