//! Key formats and key-derived identifiers.
use std::fmt;

use crate::curve::Curve;
use crate::error::Error;
use crate::jwk::encode_json_web_key;
use crate::multicodec::encode_multibase_key;
#[cfg(feature = "generate")]
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Verification method `type` for keys given as `publicKeyJwk`.
pub const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

/// How the public key of an embedded verification method is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFormat {
    /// `publicKeyJwk`, type `JsonWebKey2020`
    JsonWebKey2020,
    /// `publicKeyMultibase`, with a curve-specific type
    Multibase,
}

impl KeyFormat {
    /// Verification method `type` for a key on `curve` in this format.
    pub fn type_name(&self, curve: Curve) -> &'static str {
        match self {
            Self::JsonWebKey2020 => JSON_WEB_KEY_2020,
            Self::Multibase => curve.multibase_type(),
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonWebKey2020 => f.write_str("JsonWebKey2020"),
            Self::Multibase => f.write_str("Multibase"),
        }
    }
}

/// Derive a relative DID URL for a key from its content.
///
/// JWK keys are identified by their RFC 7638 thumbprint, multibase keys by
/// their multibase string.
pub fn derive_identification_fragment(
    format: KeyFormat,
    curve: Curve,
    key_material: &[u8],
) -> Result<String, Error> {
    let fragment = match format {
        KeyFormat::JsonWebKey2020 => encode_json_web_key(curve, key_material)?.thumbprint()?,
        KeyFormat::Multibase => encode_multibase_key(curve, key_material)?,
    };
    Ok(format!("#{}", fragment))
}

/// Freshly generated key: the public half as raw bytes, and the secret key.
///
/// The secret key is wiped when the value is dropped.
#[cfg(feature = "generate")]
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct GeneratedKey {
    #[zeroize(skip)]
    pub curve: Curve,
    #[zeroize(skip)]
    pub public_key: Vec<u8>,
    pub secret_key: Vec<u8>,
}

#[cfg(feature = "generate")]
impl fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedKey")
            .field("curve", &self.curve)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Generate a key pair on `curve` using the operating system's RNG.
#[cfg(feature = "generate")]
pub fn generate_key(curve: Curve) -> GeneratedKey {
    use rand::rngs::OsRng;
    match curve {
        Curve::P256 => {
            use p256::elliptic_curve::sec1::ToEncodedPoint;
            let secret = p256::SecretKey::random(&mut OsRng);
            let public_key = secret.public_key().to_encoded_point(false).as_bytes().to_vec();
            GeneratedKey {
                curve,
                public_key,
                secret_key: secret.to_bytes().to_vec(),
            }
        }
        Curve::Ed25519 => {
            let secret = ed25519_dalek::SigningKey::generate(&mut OsRng);
            GeneratedKey {
                curve,
                public_key: secret.verifying_key().to_bytes().to_vec(),
                secret_key: secret.to_bytes().to_vec(),
            }
        }
    }
}
