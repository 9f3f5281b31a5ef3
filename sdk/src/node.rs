//! Storage-node records as the repair subsystem sees them: identity,
//! liveness, network locality, and lifecycle flags.

use crate::node_id::NodeId;
use std::error;
use std::fmt;
use std::str::FromStr;

/// ISO-3166 alpha-2 country code, stored uppercase. The default value is
/// "unset" and matches no country.
#[derive(Serialize, Deserialize, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CountryCode([u8; 2]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCountryCodeError {
    WrongSize,
    Invalid,
}

impl fmt::Display for ParseCountryCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParseCountryCodeError: {:?}", self)
    }
}

impl error::Error for ParseCountryCodeError {}

impl FromStr for CountryCode {
    type Err = ParseCountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseCountryCodeError::WrongSize);
        }
        if !bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            return Err(ParseCountryCodeError::Invalid);
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }
}

impl CountryCode {
    pub fn is_unset(&self) -> bool {
        self.0 == [0u8; 2]
    }
}

impl fmt::Debug for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_unset() {
            write!(f, "??")
        } else {
            write!(f, "{}{}", self.0[0] as char, self.0[1] as char)
        }
    }
}

/// An operator-signed attribute attached to a node via the overlay.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct NodeTag {
    pub signer: NodeId,
    pub name: String,
    pub value: Vec<u8>,
}

/// Snapshot of one storage node. The all-default record (zero id) is the
/// "unknown node" sentinel handed out for ids the fleet view has never seen.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub online: bool,
    /// Milliseconds since the epoch of the last successful contact.
    pub last_contact: u64,
    /// Coarse network bucket (e.g. the /24 for IPv4); two pieces sharing a
    /// bucket count as clumped.
    pub network: String,
    pub country: CountryCode,
    pub tags: Vec<NodeTag>,
    pub disqualified: bool,
    pub suspended: bool,
    pub exited: bool,
    pub exiting: bool,
}

impl Node {
    /// A node may be counted on to serve pieces iff it is online and has not
    /// left the fleet through disqualification, suspension, or graceful exit.
    pub fn is_reliable(&self) -> bool {
        self.online && !self.disqualified && !self.suspended && !self.exited
    }

    pub fn is_unknown(&self) -> bool {
        self.id.is_zero()
    }

    pub fn tag_value(&self, signer: &NodeId, name: &str) -> Option<&[u8]> {
        self.tags
            .iter()
            .find(|tag| tag.signer == *signer && tag.name == name)
            .map(|tag| tag.value.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online_node() -> Node {
        Node {
            id: NodeId::new_rand(),
            online: true,
            network: "203.0.113.0".to_string(),
            ..Node::default()
        }
    }

    #[test]
    fn test_country_code_parse() {
        let us: CountryCode = "us".parse().unwrap();
        assert_eq!(us, "US".parse().unwrap());
        assert_eq!(us.to_string(), "US");
        assert!(matches!(
            "usa".parse::<CountryCode>(),
            Err(ParseCountryCodeError::WrongSize)
        ));
        assert!(matches!(
            "u1".parse::<CountryCode>(),
            Err(ParseCountryCodeError::Invalid)
        ));
        assert!(CountryCode::default().is_unset());
    }

    #[test]
    fn test_is_reliable() {
        let node = online_node();
        assert!(node.is_reliable());

        let offline = Node {
            online: false,
            ..node.clone()
        };
        assert!(!offline.is_reliable());

        let disqualified = Node {
            disqualified: true,
            ..node.clone()
        };
        assert!(!disqualified.is_reliable());

        let suspended = Node {
            suspended: true,
            ..node.clone()
        };
        assert!(!suspended.is_reliable());

        let exited = Node {
            exited: true,
            ..node.clone()
        };
        assert!(!exited.is_reliable());

        // An exit merely in progress still serves pieces
        let exiting = Node {
            exiting: true,
            ..node
        };
        assert!(exiting.is_reliable());
    }

    #[test]
    fn test_unknown_sentinel() {
        assert!(Node::default().is_unknown());
        assert!(!Node::default().is_reliable());
        assert!(!online_node().is_unknown());
    }

    #[test]
    fn test_tag_value() {
        let signer = NodeId::new_rand();
        let mut node = online_node();
        node.tags.push(NodeTag {
            signer,
            name: "soc2".to_string(),
            value: b"true".to_vec(),
        });
        assert_eq!(node.tag_value(&signer, "soc2"), Some(&b"true"[..]));
        assert_eq!(node.tag_value(&signer, "hipaa"), None);
        assert_eq!(node.tag_value(&NodeId::new_rand(), "soc2"), None);
    }
}
