//! Operator override tables for repair thresholds and repair targets,
//! parsed from the config surface.
//!
//! Two entry forms are accepted, comma-separated and mixable:
//! `K-V` maps `required = K` shares to the override value `V`, and the
//! legacy `K/R/O/T-V` form carries a full threshold tuple but matches on
//! `required = K` only; the other three numbers are validated and ignored.

use crate::result::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Which threshold a table overrides; repair-threshold overrides must leave
/// room above `required`, target overrides need not.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OverrideKind {
    RepairThreshold,
    RepairTarget,
}

/// Sparse `required -> override` mapping.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RepairOverrides {
    values: BTreeMap<u16, u16>,
}

impl RepairOverrides {
    pub fn parse(input: &str, kind: OverrideKind) -> Result<Self> {
        let mut values = BTreeMap::new();
        for entry in input.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (key_part, value_part) = entry.split_once('-').ok_or_else(|| {
                Error::InvalidConfig(format!("override entry {:?} is missing '-'", entry))
            })?;
            let required = parse_key(key_part)?;
            let value: u16 = value_part.parse().map_err(|_| {
                Error::InvalidConfig(format!(
                    "override value {:?} is not a valid integer",
                    value_part
                ))
            })?;
            if value == 0 {
                return Err(Error::InvalidConfig(format!(
                    "override value for {} shares must be positive",
                    required
                )));
            }
            if kind == OverrideKind::RepairThreshold && value <= required {
                return Err(Error::InvalidConfig(format!(
                    "repair threshold override {} must exceed {} shares",
                    value, required
                )));
            }
            if values.insert(required, value).is_some() {
                return Err(Error::InvalidConfig(format!(
                    "duplicate override for {} shares",
                    required
                )));
            }
        }
        Ok(Self { values })
    }

    /// The override for this share count, if one is configured.
    pub fn get(&self, required: u16) -> Option<u16> {
        self.values.get(&required).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn parse_key(key_part: &str) -> Result<u16> {
    let components: Vec<&str> = key_part.split('/').collect();
    if components.len() != 1 && components.len() != 4 {
        return Err(Error::InvalidConfig(format!(
            "override key {:?} must be K or K/R/O/T",
            key_part
        )));
    }
    // Every component must be a valid integer, even the ignored legacy ones.
    for component in &components {
        component.parse::<u16>().map_err(|_| {
            Error::InvalidConfig(format!(
                "override key component {:?} is not a valid integer",
                component
            ))
        })?;
    }
    let required: u16 = components[0].parse().unwrap();
    if required == 0 {
        return Err(Error::InvalidConfig(
            "override key must start at 1 share".to_string(),
        ));
    }
    Ok(required)
}

impl fmt::Display for RepairOverrides {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for (required, value) in &self.values {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}-{}", required, value)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_form() {
        let overrides =
            RepairOverrides::parse("2-5,3-6", OverrideKind::RepairThreshold).unwrap();
        assert_eq!(overrides.get(2), Some(5));
        assert_eq!(overrides.get(3), Some(6));
        assert_eq!(overrides.get(4), None);
    }

    #[test]
    fn test_parse_legacy_form_matches_on_required_only() {
        let overrides =
            RepairOverrides::parse("29/35/80/110-52", OverrideKind::RepairThreshold).unwrap();
        assert_eq!(overrides.get(29), Some(52));
        assert_eq!(overrides.get(35), None);
    }

    #[test]
    fn test_parse_mixed_and_empty_entries() {
        let overrides =
            RepairOverrides::parse(" 2-5, ,3/4/6/8-7,", OverrideKind::RepairThreshold).unwrap();
        assert_eq!(overrides.get(2), Some(5));
        assert_eq!(overrides.get(3), Some(7));
    }

    #[test]
    fn test_parse_rejects_bad_entries() {
        for input in [
            "2",        // no value
            "0-5",      // required starts at 1
            "2-0",      // value must be positive
            "-2-5",     // negative
            "2-x",      // non-integer value
            "a-5",      // non-integer key
            "2/3-5",    // wrong legacy arity
            "2/3/x/5-6", // non-integer legacy component
            "2-5,2-6",  // duplicate key
        ] {
            assert!(
                RepairOverrides::parse(input, OverrideKind::RepairThreshold).is_err(),
                "expected {:?} to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_threshold_value_must_exceed_required() {
        assert_matches!(
            RepairOverrides::parse("4-4", OverrideKind::RepairThreshold),
            Err(Error::InvalidConfig(_))
        );
        // Target overrides carry no such bound.
        let targets = RepairOverrides::parse("4-4", OverrideKind::RepairTarget).unwrap();
        assert_eq!(targets.get(4), Some(4));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let input = "3/4/6/8-7,2-5";
        let overrides = RepairOverrides::parse(input, OverrideKind::RepairThreshold).unwrap();
        let serialized = overrides.to_string();
        assert_eq!(serialized, "2-5,3-7");
        let reparsed =
            RepairOverrides::parse(&serialized, OverrideKind::RepairThreshold).unwrap();
        assert_eq!(reparsed, overrides);
    }
}
