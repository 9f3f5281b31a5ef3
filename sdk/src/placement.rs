//! Placement rules: which nodes may hold pieces of a segment, plus the
//! per-placement knobs that feed into repair-threshold adjustment.

use crate::node::{CountryCode, Node};
use crate::node_id::NodeId;
use std::collections::HashMap;
use std::fmt;

/// Small-integer tag stored on every segment, selecting a placement rule.
#[repr(transparent)]
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Placement(pub u16);

/// Placement 0 carries no geofencing and admits every node.
pub const DEFAULT_PLACEMENT: Placement = Placement(0);

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node predicate, dispatched by value.
#[derive(Clone, Debug, Default)]
pub enum NodeFilter {
    /// Matches every node.
    #[default]
    Any,
    /// Matches nodes inside the listed countries.
    Countries(Vec<CountryCode>),
    /// Matches nodes outside the listed countries.
    ExcludeCountries(Vec<CountryCode>),
    /// Matches nodes carrying the tag with exactly this value.
    TagValue {
        signer: NodeId,
        name: String,
        value: Vec<u8>,
    },
    /// Matches nodes satisfying every inner filter.
    All(Vec<NodeFilter>),
}

impl NodeFilter {
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            NodeFilter::Any => true,
            NodeFilter::Countries(countries) => countries.contains(&node.country),
            NodeFilter::ExcludeCountries(countries) => !countries.contains(&node.country),
            NodeFilter::TagValue {
                signer,
                name,
                value,
            } => node.tag_value(signer, name) == Some(value.as_slice()),
            NodeFilter::All(filters) => filters.iter().all(|filter| filter.matches(node)),
        }
    }
}

/// Per-placement override of the repair threshold, applied against the
/// segment's `required` share count.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EcRepairOverride {
    /// Repair at or below this fixed piece count.
    Fixed(u16),
    /// Repair when fewer than `required + margin` pieces remain healthy.
    Margin(u16),
}

impl EcRepairOverride {
    pub fn repair_for(&self, required: u16) -> u16 {
        match self {
            EcRepairOverride::Fixed(repair) => *repair,
            EcRepairOverride::Margin(margin) => required.saturating_add(*margin),
        }
    }
}

/// Everything a placement tag resolves to.
#[derive(Clone, Debug, Default)]
pub struct PlacementDefinition {
    pub filter: NodeFilter,
    pub ec_repair_override: Option<EcRepairOverride>,
    /// Single-datacenter placements opt out of network-bucket declumping;
    /// every piece would count as clumped otherwise.
    pub no_declumping: bool,
}

/// Placement tag -> definition, with a permissive fallback for unknown tags.
#[derive(Clone, Debug, Default)]
pub struct PlacementRules {
    placements: HashMap<Placement, PlacementDefinition>,
}

impl PlacementRules {
    pub fn add(&mut self, placement: Placement, definition: PlacementDefinition) {
        self.placements.insert(placement, definition);
    }

    pub fn get(&self, placement: Placement) -> Option<&PlacementDefinition> {
        self.placements.get(&placement)
    }
}
