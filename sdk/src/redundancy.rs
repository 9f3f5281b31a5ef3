//! Erasure-coding redundancy schemes and their four ordered thresholds.

use std::fmt;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum RedundancyAlgorithm {
    #[default]
    ReedSolomon,
}

/// The erasure parameters a segment was uploaded with.
///
/// `required` pieces reconstruct the segment, dropping to `repair` or fewer
/// healthy pieces triggers repair, `optimal` is the target piece count after
/// repair, and `total` is the most pieces that may ever be placed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct RedundancyScheme {
    pub algorithm: RedundancyAlgorithm,
    /// Size in bytes of one encoded share.
    pub share_size: u32,
    pub required: u16,
    pub repair: u16,
    pub optimal: u16,
    pub total: u16,
}

impl RedundancyScheme {
    pub fn new(required: u16, repair: u16, optimal: u16, total: u16) -> Self {
        Self {
            required,
            repair,
            optimal,
            total,
            ..Self::default()
        }
    }

    /// `required <= repair < optimal <= total`, as guaranteed after
    /// threshold adjustment. Declared schemes straight from the catalog may
    /// not satisfy this yet.
    pub fn thresholds_ordered(&self) -> bool {
        self.required <= self.repair && self.repair < self.optimal && self.optimal <= self.total
    }
}

impl fmt::Display for RedundancyScheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.required, self.repair, self.optimal, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_threshold_tuple() {
        assert_eq!(RedundancyScheme::new(29, 35, 80, 110).to_string(), "29/35/80/110");
    }

    #[test]
    fn test_thresholds_ordered() {
        assert!(RedundancyScheme::new(3, 4, 6, 6).thresholds_ordered());
        assert!(!RedundancyScheme::new(3, 6, 6, 6).thresholds_ordered());
        assert!(!RedundancyScheme::new(3, 4, 6, 5).thresholds_ordered());
    }
}
