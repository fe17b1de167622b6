//! Registry of the elliptic curves verification material can use.
//!
//! The set of curves is closed: every lookup goes through [`Curve`], and
//! adding a curve means adding a variant here.
use std::fmt;
use std::str::FromStr;

use p256::elliptic_curve::sec1::ToEncodedPoint;

use crate::error::{DecodingError, Error};
use crate::relationship::VerificationRelationship;

/// Size in bytes of a single curve coordinate.
pub const COORDINATE_SIZE: usize = 32;

/// SEC1 tag of an uncompressed point.
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// A supported curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    P256,
    Ed25519,
}

/// Naming scheme for [`curve_to_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTarget {
    /// `crv` value in a JWK
    Jwk,
    /// Lower-case name used by elliptic curve libraries
    Elliptic,
}

const P256_RELATIONSHIPS: &[VerificationRelationship] = &VerificationRelationship::ALL;

// Ed25519 keys sign; key agreement uses X25519 keys instead.
const ED25519_RELATIONSHIPS: &[VerificationRelationship] = &[
    VerificationRelationship::VerificationMethod,
    VerificationRelationship::Authentication,
    VerificationRelationship::AssertionMethod,
    VerificationRelationship::CapabilityInvocation,
    VerificationRelationship::CapabilityDelegation,
];

impl Curve {
    pub const ALL: [Curve; 2] = [Curve::P256, Curve::Ed25519];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::Ed25519 => "Ed25519",
        }
    }

    pub fn jwk_name(&self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::Ed25519 => "Ed25519",
        }
    }

    pub fn elliptic_curve_name(&self) -> &'static str {
        match self {
            Self::P256 => "p256",
            Self::Ed25519 => "ed25519",
        }
    }

    /// JWK `kty` for keys on this curve.
    pub fn key_type(&self) -> &'static str {
        match self {
            Self::P256 => "EC",
            Self::Ed25519 => "OKP",
        }
    }

    /// Verification method `type` used for `publicKeyMultibase` keys.
    pub fn multibase_type(&self) -> &'static str {
        match self {
            Self::P256 => "P256Key2021",
            Self::Ed25519 => "ED25519Key2020",
        }
    }

    /// Length of the canonical key form stored in the document model.
    pub fn raw_key_length(&self) -> usize {
        match self {
            Self::P256 => 1 + 2 * COORDINATE_SIZE,
            Self::Ed25519 => COORDINATE_SIZE,
        }
    }

    /// Length of the compact (compressed point) key form.
    pub fn compact_key_length(&self) -> usize {
        match self {
            Self::P256 => 1 + COORDINATE_SIZE,
            Self::Ed25519 => COORDINATE_SIZE,
        }
    }

    pub fn supported_relationships(&self) -> &'static [VerificationRelationship] {
        match self {
            Self::P256 => P256_RELATIONSHIPS,
            Self::Ed25519 => ED25519_RELATIONSHIPS,
        }
    }

    pub fn supports(&self, rel: VerificationRelationship) -> bool {
        self.supported_relationships().contains(&rel)
    }

    /// Look up the curve whose multibase verification method type is `type_`.
    pub fn from_multibase_type(type_: &str) -> Result<Self, Error> {
        Self::ALL
            .iter()
            .find(|curve| curve.multibase_type() == type_)
            .copied()
            .ok_or_else(|| Error::UnsupportedCurve(type_.to_string()))
    }

    /// Bring public key bytes into the canonical raw form.
    ///
    /// P-256 keys are accepted as 65-byte uncompressed or 33-byte compressed
    /// SEC1 points, must lie on the curve, and are always returned
    /// uncompressed. Ed25519 keys must be 32 bytes.
    pub fn normalize_public_key(&self, bytes: &[u8]) -> Result<Vec<u8>, DecodingError> {
        match self {
            Self::P256 if bytes.len() == self.compact_key_length() => decompress_p256(bytes),
            Self::P256
                if bytes.len() == self.raw_key_length()
                    && bytes[0] == UNCOMPRESSED_POINT_TAG =>
            {
                encode_p256(bytes, false)
            }
            Self::Ed25519 if bytes.len() == self.raw_key_length() => Ok(bytes.to_vec()),
            _ => Err(DecodingError::InvalidKeyLength {
                curve: self.display_name(),
                expected: self.raw_key_length(),
                found: bytes.len(),
            }),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Curve {
    type Err = Error;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        curve_from_name(name)
    }
}

/// Look up a curve by its JWK name (`P-256`, `Ed25519`) or its elliptic
/// curve name (`p256`, `ed25519`). Matching is exact and case-sensitive.
pub fn curve_from_name(name: &str) -> Result<Curve, Error> {
    Curve::ALL
        .iter()
        .find(|curve| curve.jwk_name() == name || curve.elliptic_curve_name() == name)
        .copied()
        .ok_or_else(|| Error::UnsupportedCurve(name.to_string()))
}

pub fn curve_to_name(curve: Curve, target: NameTarget) -> &'static str {
    match target {
        NameTarget::Jwk => curve.jwk_name(),
        NameTarget::Elliptic => curve.elliptic_curve_name(),
    }
}

// Parse a SEC1 point, rejecting points not on the curve, and re-encode it.
fn encode_p256(bytes: &[u8], compress: bool) -> Result<Vec<u8>, DecodingError> {
    let pk = p256::PublicKey::from_sec1_bytes(bytes)?;
    Ok(pk.to_encoded_point(compress).as_bytes().to_vec())
}

/// Expand a compressed P-256 point to its uncompressed SEC1 encoding.
pub(crate) fn decompress_p256(bytes: &[u8]) -> Result<Vec<u8>, DecodingError> {
    encode_p256(bytes, false)
}

/// Compress a P-256 point to its 33-byte SEC1 encoding.
pub(crate) fn compress_p256(bytes: &[u8]) -> Result<Vec<u8>, DecodingError> {
    encode_p256(bytes, true)
}
