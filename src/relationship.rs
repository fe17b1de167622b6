use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A [verification relationship](https://w3c.github.io/did-core/#dfn-verification-relationship),
/// plus the `verificationMethod` bucket.
///
/// `verificationMethod` is not a relationship of its own in the document
/// model: it marks embedded material that is defined in the document's
/// `verificationMethod` array so other relationships can refer to it.
///
/// Variant order is the order relationship arrays are decoded and emitted in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum VerificationRelationship {
    VerificationMethod,
    Authentication,
    AssertionMethod,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl VerificationRelationship {
    /// Every relationship, in document order.
    pub const ALL: [VerificationRelationship; 6] = [
        Self::VerificationMethod,
        Self::Authentication,
        Self::AssertionMethod,
        Self::KeyAgreement,
        Self::CapabilityInvocation,
        Self::CapabilityDelegation,
    ];

    /// Property name of the relationship in a DID Document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerificationMethod => "verificationMethod",
            Self::Authentication => "authentication",
            Self::AssertionMethod => "assertionMethod",
            Self::KeyAgreement => "keyAgreement",
            Self::CapabilityInvocation => "capabilityInvocation",
            Self::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

impl fmt::Display for VerificationRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationRelationship {
    type Err = Error;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|rel| rel.as_str() == name)
            .copied()
            .ok_or_else(|| Error::UnsupportedVerificationRelationship(name.to_string()))
    }
}

impl TryFrom<String> for VerificationRelationship {
    type Error = Error;
    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::from_str(&name)
    }
}

impl From<VerificationRelationship> for String {
    fn from(rel: VerificationRelationship) -> String {
        rel.as_str().to_string()
    }
}

/// How a material appears inside a relationship array.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Full verification method object.
    Embedded,
    /// Bare DID URL pointing at a method defined elsewhere.
    Reference,
}

/// Relationships a material participates in, and how.
pub type UsageMap = BTreeMap<VerificationRelationship, Representation>;

/// Union `other` into `usage`; entries of `other` win on conflict.
pub(crate) fn merge_usage(usage: &mut UsageMap, other: &UsageMap) {
    for (rel, repr) in other {
        usage.insert(*rel, *repr);
    }
}
