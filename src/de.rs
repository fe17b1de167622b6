//! Decoding of wire-format DID Documents into [`DidDocument`].
use serde_json::Value;

use crate::curve::Curve;
use crate::did::DidDocument;
use crate::error::{DecodingError, Error};
use crate::jwk::decode_jwk;
use crate::key::{KeyFormat, JSON_WEB_KEY_2020};
use crate::material::{DidMaterial, EmbeddedMaterial, ReferencedMaterial};
use crate::multicodec::decode_multibase_key;
use crate::relationship::{Representation, VerificationRelationship};
use crate::schema::{parse_document, ValueOrReference, VerificationMethodMap};

/// Rewrite `<document id>#fragment` to the relative `#fragment`.
pub fn collapse_reference(id: &str, document_id: &str) -> String {
    match id.strip_prefix(document_id) {
        Some(fragment) if fragment.starts_with('#') => fragment.to_string(),
        _ => id.to_string(),
    }
}

fn decode_verification_method_map(
    vm: &VerificationMethodMap,
    rel: VerificationRelationship,
    document_id: &str,
) -> Result<EmbeddedMaterial, Error> {
    let (curve, format, key) = if vm.type_ == JSON_WEB_KEY_2020 {
        let jwk = vm
            .public_key_jwk
            .as_ref()
            .ok_or(DecodingError::MissingPublicKey("publicKeyJwk"))?;
        let (curve, key) = decode_jwk(jwk)?;
        (curve, KeyFormat::JsonWebKey2020, key)
    } else {
        let curve = Curve::from_multibase_type(&vm.type_)?;
        let encoded = vm
            .public_key_multibase
            .as_ref()
            .ok_or(DecodingError::MissingPublicKey("publicKeyMultibase"))?;
        let key = decode_multibase_key(curve, encoded)?;
        (curve, KeyFormat::Multibase, key)
    };
    if !curve.supports(rel) {
        log::warn!("{} key {} used for {}", curve, vm.id, rel);
    }
    let mut material =
        EmbeddedMaterial::new(curve, format, &key)?.with_usage(rel, Representation::Embedded);
    material.id = Some(collapse_reference(&vm.id, document_id));
    material.controller = Some(vm.controller.clone());
    Ok(material)
}

/// Decode one entry of the `rel` array of the document `document_id`.
///
/// A bare string becomes a reference, an object becomes embedded material
/// whose curve is picked by its `type`.
pub fn decode_verification_relationship(
    entry: &ValueOrReference,
    rel: VerificationRelationship,
    document_id: &str,
) -> Result<DidMaterial, Error> {
    match entry {
        ValueOrReference::Reference(id) => {
            let id = collapse_reference(id, document_id);
            log::trace!("{}: reference {}", rel, id);
            Ok(ReferencedMaterial::new(&id)?.with_usage(rel).into())
        }
        ValueOrReference::Value(vm) => {
            log::trace!("{}: embedded {} of type {}", rel, vm.id, vm.type_);
            Ok(decode_verification_method_map(vm, rel, document_id)?.into())
        }
    }
}

/// Validate and decode a wire-format DID Document.
///
/// Relationship arrays are read in document order and entries describing the
/// same verification method are merged into one material. Any failure aborts
/// the whole decode.
pub fn deserialize(value: &Value) -> Result<DidDocument, Error> {
    let wire = parse_document(value)?;
    let mut document = DidDocument::new(&wire.id)?;
    if let Some(controller) = &wire.controller {
        document.set_controller(controller)?;
    }

    let mut materials = Vec::new();
    for rel in VerificationRelationship::ALL {
        for entry in wire.relationship(rel).into_iter().flatten() {
            materials.push(decode_verification_relationship(entry, rel, &wire.id)?);
        }
    }
    let decoded = materials.len();
    for material in materials {
        document.add_verification_method(material);
    }
    document.normalize_usage();
    log::debug!(
        "decoded {}: {} entries merged into {} verification methods",
        wire.id,
        decoded,
        document.verification_material().len()
    );

    if let Some(services) = wire.service {
        document.set_services(services);
    }
    Ok(document)
}

impl DidDocument {
    /// See [`deserialize`].
    pub fn deserialize(value: &Value) -> Result<Self, Error> {
        deserialize(value)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(json)?;
        deserialize(&value)
    }

    pub fn from_json_bytes(json: &[u8]) -> Result<Self, Error> {
        let value: Value = serde_json::from_slice(json)?;
        deserialize(&value)
    }
}
