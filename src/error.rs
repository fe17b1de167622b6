//! Error types for `did-doc`
use base64::DecodeError as Base64Error;
use thiserror::Error;

/// Error type for `did-doc`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Wire document failed structural validation
    #[error("SchemaError at {path}: {message}")]
    Schema { path: String, message: String },
    /// Curve or verification method type is not supported
    #[error("UnsupportedCurveError: {0}")]
    UnsupportedCurve(String),
    /// Property name is not a verification relationship
    #[error("Unsupported verification relationship: {0}")]
    UnsupportedVerificationRelationship(String),
    /// Key material of a supported type could not be decoded
    #[error(transparent)]
    Decoding(#[from] DecodingError),
    /// Embedded material cannot be serialized without a controller
    #[error("Missing controller for embedded verification method: {}", .0.as_deref().unwrap_or("<no id>"))]
    MissingController(Option<String>),
    /// String does not follow the DID syntax
    #[error("Invalid DID: '{0}'")]
    InvalidDid(String),
    /// Replacement would put the same key material in the document twice
    #[error("Key material already present at index {0}")]
    DuplicateKeyMaterial(usize),
    /// No verification method or service at the given index
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),
    /// Error serializing or parsing JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Malformed key material for a recognized verification method type.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodingError {
    /// Missing elliptic curve point in JWK
    #[error("Missing coordinate '{0}' in JWK")]
    MissingPoint(&'static str),
    /// Verification method has neither `publicKeyJwk` nor `publicKeyMultibase`
    #[error("Missing {0} in verification method")]
    MissingPublicKey(&'static str),
    /// Key bytes do not have the length the curve requires
    #[error("Invalid key length for {curve}: expected {expected} bytes, found {found}")]
    InvalidKeyLength {
        curve: &'static str,
        expected: usize,
        found: usize,
    },
    /// Multibase payload too short to carry a multicodec prefix
    #[error("Multibase key payload too short: {0} bytes")]
    MultibaseKeyLength(usize),
    /// Multibase key is not base58btc encoded
    #[error("Expected base58btc multibase key, found {0:?}")]
    MultibaseBase(multibase::Base),
    /// Error decoding Base64
    #[error(transparent)]
    Base64(#[from] Base64Error),
    /// Error parsing multibase
    #[error(transparent)]
    Multibase(#[from] multibase::Error),
    /// Error from the `elliptic-curve` crate
    #[error(transparent)]
    EC(#[from] p256::elliptic_curve::Error),
}
