use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::material::{DidMaterial, VerificationMaterial};
use crate::one_or_many::OneOrMany;
use crate::relationship::{UsageMap, VerificationRelationship};

// ***********************************************
// * Data Structures for Decentralized Identifiers
// * https://www.w3.org/TR/did-core/
// ***********************************************

pub const DEFAULT_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Context defining `publicKeyMultibase`.
pub const MULTIKEY_CONTEXT: &str = "https://w3id.org/security/multikey/v1";

/// IRI of the `publicKeyJwk` term.
pub const PUBLIC_KEY_JWK_IRI: &str = "https://w3id.org/security#publicKeyJwk";

/// Method used for subject ids of freshly generated documents.
pub const GENERATED_DID_PREFIX: &str = "did:example:";

/// DID Service.
///
/// Passed through verbatim; properties beyond `id`, `type` and
/// `serviceEndpoint` are kept in `property_set`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: OneOrMany<String>,
    pub service_endpoint: OneOrMany<String>,
    #[serde(flatten)]
    pub property_set: BTreeMap<String, Value>,
}

/// Check `did` against the DID syntax:
///
/// ```text
/// did                = "did:" method-name ":" method-specific-id
/// method-name        = 1*method-char
/// method-char        = %x61-7A / DIGIT
/// method-specific-id = *( *idchar ":" ) 1*idchar
/// idchar             = ALPHA / DIGIT / "." / "-" / "_" / pct-encoded
/// ```
pub fn validate_did(did: &str) -> Result<(), Error> {
    let invalid = || Error::InvalidDid(did.to_string());
    let rest = did.strip_prefix("did:").ok_or_else(invalid)?;
    let (method, id) = rest.split_once(':').ok_or_else(invalid)?;
    if method.is_empty()
        || !method
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return Err(invalid());
    }
    if id.is_empty() || id.ends_with(':') {
        return Err(invalid());
    }
    let bytes = id.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3).ok_or_else(invalid)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return Err(invalid());
                }
                i += 3;
            }
            b if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b':') => i += 1,
            _ => return Err(invalid()),
        }
    }
    Ok(())
}

/// A DID Document held in memory for editing.
///
/// No two embedded materials share key bytes: adding material that matches an
/// existing entry merges their usage instead.
#[derive(Debug, Clone)]
pub struct DidDocument {
    id: String,
    controller: BTreeSet<String>,
    verification_material: Vec<DidMaterial>,
    services: Vec<Service>,
}

impl DidDocument {
    pub fn new(id: &str) -> Result<Self, Error> {
        validate_did(id)?;
        Ok(Self {
            id: id.to_string(),
            controller: BTreeSet::new(),
            verification_material: Vec::new(),
            services: Vec::new(),
        })
    }

    /// Create an empty document with a random subject id.
    pub fn generate() -> Self {
        let id = format!(
            "{}{}",
            GENERATED_DID_PREFIX,
            uuid::Uuid::new_v4().simple()
        );
        Self {
            id,
            controller: BTreeSet::new(),
            verification_material: Vec::new(),
            services: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: &str) -> Result<(), Error> {
        validate_did(id)?;
        self.id = id.to_string();
        Ok(())
    }

    pub fn controller(&self) -> &BTreeSet<String> {
        &self.controller
    }

    pub fn set_controller<I, S>(&mut self, controller: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let controller = controller
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<String>>();
        for did in &controller {
            validate_did(did)?;
        }
        self.controller = controller;
        Ok(())
    }

    pub fn verification_material(&self) -> &[DidMaterial] {
        &self.verification_material
    }

    /// Materials taking part in `rel`, in document order.
    pub fn materials_for(
        &self,
        rel: VerificationRelationship,
    ) -> impl Iterator<Item = &DidMaterial> + '_ {
        self.verification_material
            .iter()
            .filter(move |material| material.is_used_in_relationship(rel))
    }

    /// Add a verification method, merging it into an existing entry for the
    /// same key or id. Returns the index the material ends up at.
    pub fn add_verification_method(&mut self, material: impl Into<DidMaterial>) -> usize {
        let material = material.into();
        match self
            .verification_material
            .iter()
            .position(|existing| existing.same_entity(&material))
        {
            Some(index) => {
                log::debug!(
                    "merging verification method {:?} into entry {}",
                    material.id(),
                    index
                );
                self.verification_material[index].merge(material);
                self.fold_duplicate_key(index)
            }
            None => {
                self.verification_material.push(material);
                self.verification_material.len() - 1
            }
        }
    }

    // A reference upgraded to embedded material by a merge can carry the same
    // key as another entry; fold it into that entry.
    fn fold_duplicate_key(&mut self, index: usize) -> usize {
        let duplicate = match &self.verification_material[index] {
            DidMaterial::Embedded(embedded) => self
                .verification_material
                .iter()
                .enumerate()
                .find(|(i, other)| *i != index && other.as_embedded() == Some(embedded))
                .map(|(i, _)| i),
            DidMaterial::Referenced(_) => None,
        };
        match duplicate {
            Some(target) => {
                let material = self.verification_material.remove(index);
                let target = if target > index { target - 1 } else { target };
                self.verification_material[target].merge(material);
                target
            }
            None => index,
        }
    }

    pub fn remove_verification_method(&mut self, index: usize) -> Option<DidMaterial> {
        if index < self.verification_material.len() {
            Some(self.verification_material.remove(index))
        } else {
            None
        }
    }

    /// Replace the material at `index`, returning the old one.
    ///
    /// Fails if the replacement describes the same method as another entry.
    pub fn replace_verification_method(
        &mut self,
        index: usize,
        material: impl Into<DidMaterial>,
    ) -> Result<DidMaterial, Error> {
        let material = material.into();
        if index >= self.verification_material.len() {
            return Err(Error::IndexOutOfBounds(index));
        }
        if let Some(other) = self
            .verification_material
            .iter()
            .enumerate()
            .position(|(i, existing)| i != index && existing.same_entity(&material))
        {
            return Err(Error::DuplicateKeyMaterial(other));
        }
        Ok(std::mem::replace(
            &mut self.verification_material[index],
            material,
        ))
    }

    /// Change which relationships the material at `index` takes part in.
    pub fn set_usage(&mut self, index: usize, usage: UsageMap) -> Result<(), Error> {
        self.verification_material
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds(index))?
            .set_usage(usage);
        Ok(())
    }

    /// Drop the `verificationMethod` marker from materials that take part in
    /// another relationship.
    pub(crate) fn normalize_usage(&mut self) {
        for material in &mut self.verification_material {
            let usage = material.usage();
            if usage.len() > 1 && usage.contains_key(&VerificationRelationship::VerificationMethod)
            {
                let mut usage = usage.clone();
                usage.remove(&VerificationRelationship::VerificationMethod);
                material.set_usage(usage);
            }
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn add_service(&mut self, service: Service) {
        self.services.push(service);
    }

    pub fn remove_service(&mut self, index: usize) -> Option<Service> {
        if index < self.services.len() {
            Some(self.services.remove(index))
        } else {
            None
        }
    }

    pub fn replace_service(&mut self, index: usize, service: Service) -> Result<Service, Error> {
        let slot = self
            .services
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds(index))?;
        Ok(std::mem::replace(slot, service))
    }

    pub(crate) fn set_services(&mut self, services: Vec<Service>) {
        self.services = services;
    }
}
