//! Encoding of a [`DidDocument`] into its wire format.
use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Value};

use crate::did::{DidDocument, DEFAULT_CONTEXT, MULTIKEY_CONTEXT, PUBLIC_KEY_JWK_IRI};
use crate::error::Error;
use crate::key::KeyFormat;
use crate::material::{DidMaterial, VerificationMaterial};
use crate::one_or_many::OneOrMany;
use crate::relationship::{Representation, VerificationRelationship};
use crate::schema::{ValueOrReference, WireDocument};

/// Media type of a DID Document in plain JSON.
pub const TYPE_DID_JSON: &str = "application/did+json";
/// Media type of a DID Document in JSON-LD.
pub const TYPE_DID_LD_JSON: &str = "application/did+ld+json";

/// Representation to produce when serializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SerializeMode {
    /// JSON-LD, with an `@context` matching the key formats in use.
    #[default]
    JsonLd,
    /// Plain JSON, without `@context`.
    Json,
}

impl SerializeMode {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::JsonLd => TYPE_DID_LD_JSON,
            Self::Json => TYPE_DID_JSON,
        }
    }
}

impl fmt::Display for SerializeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_type())
    }
}

// Formats of the embedded materials that end up in the output.
fn embedded_formats(document: &DidDocument) -> impl Iterator<Item = KeyFormat> + '_ {
    document
        .verification_material()
        .iter()
        .filter_map(DidMaterial::as_embedded)
        .filter(|material| !material.usage().is_empty())
        .map(|material| material.format)
}

/// Entries emitted for one material, keyed by relationship.
fn material_entries(
    material: &DidMaterial,
) -> Result<Vec<(VerificationRelationship, ValueOrReference)>, Error> {
    let mut entries = Vec::new();
    match material {
        DidMaterial::Embedded(embedded) => {
            if embedded.controller.is_none() {
                return Err(Error::MissingController(embedded.id.clone()));
            }
            if embedded.usage().is_empty() {
                log::warn!(
                    "skipping verification method {:?}: not used in any relationship",
                    embedded.id
                );
                return Ok(entries);
            }
            // Referenced usages point at the full form in verificationMethod.
            if embedded.is_used_in_relationship(VerificationRelationship::VerificationMethod)
                || embedded.is_referenced()
            {
                entries.push((
                    VerificationRelationship::VerificationMethod,
                    embedded.serialize(Representation::Embedded)?,
                ));
            }
            for (rel, repr) in embedded.usage() {
                if *rel != VerificationRelationship::VerificationMethod {
                    entries.push((*rel, embedded.serialize(*repr)?));
                }
            }
        }
        DidMaterial::Referenced(reference) => {
            for rel in reference.usage().keys() {
                entries.push((*rel, reference.serialize(Representation::Reference)?));
            }
        }
    }
    Ok(entries)
}

/// Encode `document` in the requested representation.
///
/// Relationship arrays keep the order of the document's materials. Fails if
/// an embedded material that must be written in full has no controller.
pub fn serialize(document: &DidDocument, mode: SerializeMode) -> Result<Value, Error> {
    let mut wire = WireDocument {
        id: document.id().to_string(),
        controller: OneOrMany::compact(document.controller().iter().cloned().collect()),
        ..Default::default()
    };
    if mode == SerializeMode::JsonLd {
        wire.context = Some(OneOrMany::Many(document.contexts()));
    }

    let mut relationships: BTreeMap<VerificationRelationship, Vec<ValueOrReference>> =
        BTreeMap::new();
    for material in document.verification_material() {
        for (rel, entry) in material_entries(material)? {
            relationships.entry(rel).or_default().push(entry);
        }
    }
    for (rel, entries) in relationships {
        *wire.relationship_mut(rel) = Some(entries);
    }

    if !document.services().is_empty() {
        wire.service = Some(document.services().to_vec());
    }
    log::trace!("serialized {} as {}", document.id(), mode);
    Ok(serde_json::to_value(wire)?)
}

impl DidDocument {
    /// JSON-LD contexts needed by this document: the DID core context, then
    /// the JWK and multikey contexts if any serialized embedded key uses that
    /// format.
    pub fn contexts(&self) -> Vec<Value> {
        let mut contexts = vec![Value::String(DEFAULT_CONTEXT.to_string())];
        if embedded_formats(self).any(|format| format == KeyFormat::JsonWebKey2020) {
            contexts.push(json!({
                "publicKeyJwk": {
                    "@id": PUBLIC_KEY_JWK_IRI,
                    "@type": "@json"
                }
            }));
        }
        if embedded_formats(self).any(|format| format == KeyFormat::Multibase) {
            contexts.push(Value::String(MULTIKEY_CONTEXT.to_string()));
        }
        contexts
    }

    /// See [`serialize`].
    pub fn serialize(&self, mode: SerializeMode) -> Result<Value, Error> {
        serialize(self, mode)
    }

    pub fn to_json_string(&self, mode: SerializeMode) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.serialize(mode)?)?)
    }

    pub fn to_json_string_pretty(&self, mode: SerializeMode) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(&self.serialize(mode)?)?)
    }
}
