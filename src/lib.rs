//! The `did-doc` library models [DID Documents][did-core] and converts them
//! to and from their JSON representation.
//!
//! A [`DidDocument`] holds a subject, its controllers, a list of
//! verification materials and a list of services. Each material is either:
//! - embedded ([`EmbeddedMaterial`]), carrying a P-256 or Ed25519 public key
//!   written as a [JSON Web Key][jwk] or as a multibase string; or
//! - referenced ([`ReferencedMaterial`]), known only by its DID URL.
//!
//! Every material records which [verification relationships][vr] it takes
//! part in, and whether it appears there in full or by reference. Entries of
//! a document that describe the same key are merged into one material when
//! the document is decoded.
//!
//! [did-core]: <https://www.w3.org/TR/did-core/>
//! [jwk]: <https://www.rfc-editor.org/rfc/rfc7517>
//! [vr]: <https://www.w3.org/TR/did-core/#verification-relationships>
//!
//! # Basic Usage
//!
//! ```
//! use did_doc::{
//!     Curve, DidDocument, EmbeddedMaterial, KeyFormat, Representation, SerializeMode,
//!     VerificationRelationship,
//! };
//! use serde_json::json;
//!
//! let mut doc = DidDocument::from_json(r#"{
//!     "@context": ["https://www.w3.org/ns/did/v1"],
//!     "id": "did:web:example.com"
//! }"#).unwrap();
//!
//! let key = [
//!     0xd7, 0x5a, 0x98, 0x01, 0x82, 0xb1, 0x0a, 0xb7, 0xd5, 0x4b, 0xfe, 0xd3, 0xc9, 0x64,
//!     0x07, 0x3a, 0x0e, 0xe1, 0x72, 0xf3, 0xda, 0xa6, 0x23, 0x25, 0xaf, 0x02, 0x1a, 0x68,
//!     0xf7, 0x07, 0x51, 0x1a,
//! ];
//! let mut material = EmbeddedMaterial::new(Curve::Ed25519, KeyFormat::Multibase, &key)
//!     .unwrap()
//!     .with_usage(VerificationRelationship::Authentication, Representation::Embedded);
//! material.controller = Some(doc.id().to_string());
//! doc.add_verification_method(material);
//!
//! let value = doc.serialize(SerializeMode::Json).unwrap();
//! assert_eq!(value["authentication"][0]["publicKeyMultibase"],
//!     json!("z6MktwupdmLXVVqTzCw4i46r4uGyosGXRnR3XjN4Zq7oMMsw"));
//! ```
//!
//! # Features
//!
//! - `generate` (default): key pair generation for new verification methods,
//!   see [`EmbeddedMaterial::generate`].
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

#[macro_use]
extern crate derive_builder;

pub mod curve;
pub mod de;
pub mod did;
pub mod error;
pub mod jwk;
pub mod key;
pub mod material;
pub mod multicodec;
pub mod one_or_many;
pub mod relationship;
pub mod schema;
pub mod ser;

pub use curve::Curve;
pub use de::{decode_verification_relationship, deserialize};
pub use did::{validate_did, DidDocument, Service};
pub use error::{DecodingError, Error};
pub use jwk::JWK;
#[cfg(feature = "generate")]
pub use key::GeneratedKey;
pub use key::KeyFormat;
pub use material::{
    DidMaterial, EmbeddedMaterial, EmbeddedMaterialBuilder, ReferencedMaterial,
    VerificationMaterial,
};
pub use one_or_many::OneOrMany;
pub use relationship::{Representation, UsageMap, VerificationRelationship};
pub use ser::{serialize, SerializeMode, TYPE_DID_JSON, TYPE_DID_LD_JSON};
