//! Threshold adjustment: the redundancy scheme a segment was uploaded with
//! is not necessarily the one repair decisions should use. Operator override
//! tables and placement EC rules produce the effective scheme for one scan.

use crate::overrides::RepairOverrides;
use satellite_sdk::placement::PlacementDefinition;
use satellite_sdk::redundancy::RedundancyScheme;

/// Applies overrides to `scheme` and normalizes the result so that
/// `optimal > repair` and `total >= optimal`. `required` and `share_size`
/// pass through untouched.
///
/// A placement EC rule beats the repair-threshold override table.
pub fn adjust(
    scheme: RedundancyScheme,
    threshold_overrides: &RepairOverrides,
    target_overrides: &RepairOverrides,
    placement: Option<&PlacementDefinition>,
) -> RedundancyScheme {
    let mut adjusted = scheme;

    if let Some(repair) = threshold_overrides.get(scheme.required) {
        adjusted.repair = repair;
    }
    if let Some(optimal) = target_overrides.get(scheme.required) {
        adjusted.optimal = optimal;
    }
    if let Some(ec_override) = placement.and_then(|def| def.ec_repair_override.as_ref()) {
        let repair = ec_override.repair_for(scheme.required);
        if repair > 0 {
            adjusted.repair = repair;
        }
    }

    if adjusted.optimal <= adjusted.repair {
        adjusted.optimal = adjusted.repair.saturating_add(1);
    }
    if adjusted.total < adjusted.optimal {
        adjusted.total = adjusted.optimal;
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideKind;
    use satellite_sdk::placement::EcRepairOverride;

    fn thresholds(input: &str) -> RepairOverrides {
        RepairOverrides::parse(input, OverrideKind::RepairThreshold).unwrap()
    }

    fn targets(input: &str) -> RepairOverrides {
        RepairOverrides::parse(input, OverrideKind::RepairTarget).unwrap()
    }

    fn none() -> RepairOverrides {
        RepairOverrides::default()
    }

    #[test]
    fn test_no_overrides_is_identity() {
        let scheme = RedundancyScheme::new(3, 4, 6, 6);
        assert_eq!(adjust(scheme, &none(), &none(), None), scheme);
    }

    #[test]
    fn test_threshold_override_replaces_repair() {
        let scheme = RedundancyScheme::new(3, 4, 9, 9);
        let adjusted = adjust(scheme, &thresholds("3-6"), &none(), None);
        assert_eq!(adjusted.repair, 6);
        assert_eq!(adjusted.optimal, 9);
        assert_eq!(adjusted.required, 3);
    }

    #[test]
    fn test_target_override_replaces_optimal() {
        let scheme = RedundancyScheme::new(3, 4, 6, 10);
        let adjusted = adjust(scheme, &none(), &targets("3-8"), None);
        assert_eq!(adjusted.optimal, 8);
        assert_eq!(adjusted.total, 10);
    }

    #[test]
    fn test_placement_beats_threshold_override() {
        let scheme = RedundancyScheme::new(3, 4, 9, 9);
        let placement = PlacementDefinition {
            ec_repair_override: Some(EcRepairOverride::Fixed(7)),
            ..PlacementDefinition::default()
        };
        let adjusted = adjust(scheme, &thresholds("3-6"), &none(), Some(&placement));
        assert_eq!(adjusted.repair, 7);
    }

    #[test]
    fn test_optimal_bumped_above_repair() {
        let scheme = RedundancyScheme::new(3, 4, 6, 6);
        let adjusted = adjust(scheme, &thresholds("3-8"), &none(), None);
        assert_eq!(adjusted.repair, 8);
        assert_eq!(adjusted.optimal, 9);
        assert_eq!(adjusted.total, 9);
    }

    #[test]
    fn test_total_raised_to_optimal() {
        let scheme = RedundancyScheme::new(3, 4, 6, 6);
        let adjusted = adjust(scheme, &none(), &targets("3-10"), None);
        assert_eq!(adjusted.optimal, 10);
        assert_eq!(adjusted.total, 10);
    }

    #[test]
    fn test_thresholds_ordered_after_adjustment() {
        let thresholds = thresholds("2-9,3-6,5-11");
        let targets = targets("2-3,5-4");
        let placement = PlacementDefinition {
            ec_repair_override: Some(EcRepairOverride::Margin(6)),
            ..PlacementDefinition::default()
        };
        for required in 1..6u16 {
            for repair in required..10 {
                for optimal in repair + 1..12 {
                    let scheme = RedundancyScheme::new(required, repair, optimal, optimal + 2);
                    for placement in [None, Some(&placement)] {
                        let adjusted = adjust(scheme, &thresholds, &targets, placement);
                        assert!(
                            adjusted.optimal > adjusted.repair
                                && adjusted.total >= adjusted.optimal,
                            "unordered thresholds from {} -> {}",
                            scheme,
                            adjusted
                        );
                        assert_eq!(adjusted.required, scheme.required);
                        assert_eq!(adjusted.share_size, scheme.share_size);
                    }
                }
            }
        }
    }
}
