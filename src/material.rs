//! Verification material: one verification method of a DID Document, either
//! embedded with its key or referenced by id.
use crate::curve::Curve;
use crate::error::Error;
use crate::jwk::{encode_json_web_key, JWK};
use crate::key::{derive_identification_fragment, KeyFormat};
use crate::multicodec::encode_multibase_key;
use crate::relationship::{merge_usage, Representation, UsageMap, VerificationRelationship};
use crate::schema::{ValueOrReference, VerificationMethodMap};

/// Behaviour shared by every kind of verification material.
pub trait VerificationMaterial {
    /// Explicit id, if any.
    fn id(&self) -> Option<&str>;

    fn usage(&self) -> &UsageMap;

    fn set_usage(&mut self, usage: UsageMap);

    /// Encode this material as it should appear in a relationship array.
    fn serialize(&self, representation: Representation) -> Result<ValueOrReference, Error>;

    fn is_used_in_relationship(&self, rel: VerificationRelationship) -> bool {
        self.usage().contains_key(&rel)
    }

    /// Whether any relationship refers to this material by id.
    fn is_referenced(&self) -> bool {
        self.usage()
            .values()
            .any(|repr| *repr == Representation::Reference)
    }
}

/// Verification method carrying its public key.
///
/// The key is always held in the curve's raw form (uncompressed point for
/// P-256). Equality only looks at the key bytes.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct EmbeddedMaterial {
    #[builder(default)]
    pub id: Option<String>,
    #[builder(default)]
    pub controller: Option<String>,
    curve: Curve,
    pub format: KeyFormat,
    key_material: Vec<u8>,
    #[builder(default)]
    usage: UsageMap,
}

impl EmbeddedMaterialBuilder {
    fn validate(&self) -> Result<(), String> {
        // validate is called before defaults are assigned.
        let (curve, key) = match (&self.curve, &self.key_material) {
            (Some(curve), Some(key)) => (curve, key),
            _ => return Ok(()),
        };
        match curve.normalize_public_key(key) {
            Ok(normalized) if normalized == *key => Ok(()),
            Ok(_) => Err(format!("{} key material must be in raw form", curve)),
            Err(err) => Err(err.to_string()),
        }
    }
}

impl EmbeddedMaterial {
    /// Create material for a public key, normalizing it to the raw form.
    pub fn new(curve: Curve, format: KeyFormat, key_material: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            id: None,
            controller: None,
            curve,
            format,
            key_material: curve.normalize_public_key(key_material)?,
            usage: UsageMap::new(),
        })
    }

    /// Generate a fresh key pair and wrap its public key.
    ///
    /// The secret key is returned alongside and is never stored in the
    /// material.
    #[cfg(feature = "generate")]
    pub fn generate(curve: Curve, format: KeyFormat) -> (Self, crate::key::GeneratedKey) {
        let key = crate::key::generate_key(curve);
        let material = Self {
            id: None,
            controller: None,
            curve,
            format,
            key_material: key.public_key.clone(),
            usage: UsageMap::new(),
        };
        (material, key)
    }

    pub fn with_usage(mut self, rel: VerificationRelationship, repr: Representation) -> Self {
        self.usage.insert(rel, repr);
        self
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn key_material(&self) -> &[u8] {
        &self.key_material
    }

    /// Replace the public key, keeping id, controller and usage.
    pub fn set_key(&mut self, curve: Curve, key_material: &[u8]) -> Result<(), Error> {
        self.key_material = curve.normalize_public_key(key_material)?;
        self.curve = curve;
        Ok(())
    }

    pub fn usage_mut(&mut self) -> &mut UsageMap {
        &mut self.usage
    }

    pub fn type_name(&self) -> &'static str {
        self.format.type_name(self.curve)
    }

    pub fn to_jwk(&self) -> Result<JWK, Error> {
        Ok(encode_json_web_key(self.curve, &self.key_material)?)
    }

    pub fn to_multibase(&self) -> Result<String, Error> {
        Ok(encode_multibase_key(self.curve, &self.key_material)?)
    }

    pub fn identification_fragment(&self) -> Result<String, Error> {
        derive_identification_fragment(self.format, self.curve, &self.key_material)
    }

    /// Explicit id, or the key-derived fragment if none was set.
    pub fn resolved_id(&self) -> Result<String, Error> {
        match &self.id {
            Some(id) => Ok(id.clone()),
            None => self.identification_fragment(),
        }
    }

    /// Full verification method map.
    pub fn to_verification_method_map(&self) -> Result<VerificationMethodMap, Error> {
        let controller = self
            .controller
            .clone()
            .ok_or_else(|| Error::MissingController(self.id.clone()))?;
        let (public_key_jwk, public_key_multibase) = match self.format {
            KeyFormat::JsonWebKey2020 => (Some(self.to_jwk()?), None),
            KeyFormat::Multibase => (None, Some(self.to_multibase()?)),
        };
        Ok(VerificationMethodMap {
            id: self.resolved_id()?,
            type_: self.type_name().to_string(),
            controller,
            public_key_jwk,
            public_key_multibase,
        })
    }
}

impl PartialEq for EmbeddedMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.key_material == other.key_material
    }
}

impl Eq for EmbeddedMaterial {}

impl VerificationMaterial for EmbeddedMaterial {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn usage(&self) -> &UsageMap {
        &self.usage
    }

    fn set_usage(&mut self, usage: UsageMap) {
        self.usage = usage;
    }

    fn serialize(&self, representation: Representation) -> Result<ValueOrReference, Error> {
        match representation {
            Representation::Reference => Ok(ValueOrReference::Reference(self.resolved_id()?)),
            Representation::Embedded => {
                Ok(ValueOrReference::Value(self.to_verification_method_map()?))
            }
        }
    }
}

/// Verification method given only by its id.
#[derive(Debug, Clone)]
pub struct ReferencedMaterial {
    id: String,
    usage: UsageMap,
}

impl ReferencedMaterial {
    pub fn new(id: &str) -> Result<Self, Error> {
        if id.is_empty() {
            return Err(Error::InvalidDid(id.to_string()));
        }
        Ok(Self {
            id: id.to_string(),
            usage: UsageMap::new(),
        })
    }

    pub fn with_usage(mut self, rel: VerificationRelationship) -> Self {
        self.usage.insert(rel, Representation::Reference);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl PartialEq for ReferencedMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ReferencedMaterial {}

impl VerificationMaterial for ReferencedMaterial {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn usage(&self) -> &UsageMap {
        &self.usage
    }

    /// References can only be used as references.
    fn set_usage(&mut self, usage: UsageMap) {
        self.usage = usage
            .into_keys()
            .map(|rel| (rel, Representation::Reference))
            .collect();
    }

    fn serialize(&self, _representation: Representation) -> Result<ValueOrReference, Error> {
        Ok(ValueOrReference::Reference(self.id.clone()))
    }
}

/// One verification method of a document.
#[derive(Debug, Clone)]
pub enum DidMaterial {
    Embedded(EmbeddedMaterial),
    Referenced(ReferencedMaterial),
}

impl DidMaterial {
    pub fn as_embedded(&self) -> Option<&EmbeddedMaterial> {
        match self {
            Self::Embedded(material) => Some(material),
            Self::Referenced(_) => None,
        }
    }

    pub fn as_referenced(&self) -> Option<&ReferencedMaterial> {
        match self {
            Self::Embedded(_) => None,
            Self::Referenced(material) => Some(material),
        }
    }

    /// Whether `self` and `other` describe the same verification method.
    ///
    /// Embedded materials match on key bytes and references on id. Materials
    /// of different kinds match when their ids are equal.
    pub fn same_entity(&self, other: &DidMaterial) -> bool {
        match (self, other) {
            (Self::Embedded(a), Self::Embedded(b)) => a == b,
            (Self::Referenced(a), Self::Referenced(b)) => a == b,
            (a, b) => a.id().is_some() && a.id() == b.id(),
        }
    }

    /// Fold `other` into `self`, which keeps its place and identity.
    ///
    /// Usage maps are unioned with `other` winning on conflict. A reference
    /// merged with embedded material becomes that embedded material, so key
    /// bytes are never lost.
    pub fn merge(&mut self, other: DidMaterial) {
        let mut usage = self.usage().clone();
        merge_usage(&mut usage, other.usage());
        let upgrade = match (&*self, other) {
            (Self::Referenced(_), Self::Embedded(embedded)) => Some(embedded),
            _ => None,
        };
        if let Some(embedded) = upgrade {
            *self = Self::Embedded(embedded);
        }
        self.set_usage(usage);
    }

    fn as_material(&self) -> &dyn VerificationMaterial {
        match self {
            Self::Embedded(material) => material,
            Self::Referenced(material) => material,
        }
    }

    fn as_material_mut(&mut self) -> &mut dyn VerificationMaterial {
        match self {
            Self::Embedded(material) => material,
            Self::Referenced(material) => material,
        }
    }
}

impl PartialEq for DidMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.same_entity(other)
    }
}

impl VerificationMaterial for DidMaterial {
    fn id(&self) -> Option<&str> {
        self.as_material().id()
    }

    fn usage(&self) -> &UsageMap {
        self.as_material().usage()
    }

    fn set_usage(&mut self, usage: UsageMap) {
        self.as_material_mut().set_usage(usage)
    }

    fn serialize(&self, representation: Representation) -> Result<ValueOrReference, Error> {
        self.as_material().serialize(representation)
    }
}

impl From<EmbeddedMaterial> for DidMaterial {
    fn from(material: EmbeddedMaterial) -> Self {
        Self::Embedded(material)
    }
}

impl From<ReferencedMaterial> for DidMaterial {
    fn from(material: ReferencedMaterial) -> Self {
        Self::Referenced(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ED25519_PK: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
    const P256_PK: &str = "04c1e349cb61ec70248ce801034c3834e1b88ebe1161cb25af38741f785fcfc4c47bc96708ef80952b53f8d2555fe72b841ed04588628b1d378a594939500ec9c9";

    fn ed25519(format: KeyFormat) -> EmbeddedMaterial {
        let mut material =
            EmbeddedMaterial::new(Curve::Ed25519, format, &hex::decode(ED25519_PK).unwrap())
                .unwrap();
        material.controller = Some("did:web:example.com".to_string());
        material
    }

    #[test]
    fn serialize_jwk() {
        let mut material = ed25519(KeyFormat::JsonWebKey2020);
        material.id = Some("#key-1".to_string());
        let entry = material.serialize(Representation::Embedded).unwrap();
        assert_eq!(
            serde_json::to_value(entry).unwrap(),
            json!({
                "id": "#key-1",
                "type": "JsonWebKey2020",
                "controller": "did:web:example.com",
                "publicKeyJwk": {
                    "crv": "Ed25519",
                    "kty": "OKP",
                    "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
                }
            })
        );
    }

    #[test]
    fn serialize_multibase_derives_id() {
        let material = ed25519(KeyFormat::Multibase);
        let entry = material.serialize(Representation::Embedded).unwrap();
        assert_eq!(
            serde_json::to_value(entry).unwrap(),
            json!({
                "id": "#z6MktwupdmLXVVqTzCw4i46r4uGyosGXRnR3XjN4Zq7oMMsw",
                "type": "ED25519Key2020",
                "controller": "did:web:example.com",
                "publicKeyMultibase": "z6MktwupdmLXVVqTzCw4i46r4uGyosGXRnR3XjN4Zq7oMMsw"
            })
        );
    }

    #[test]
    fn serialize_reference_is_id() {
        let material = ed25519(KeyFormat::JsonWebKey2020);
        assert_eq!(
            material.serialize(Representation::Reference).unwrap(),
            ValueOrReference::Reference("#kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k".to_string())
        );
        let reference = ReferencedMaterial::new("#key-1")
            .unwrap()
            .with_usage(VerificationRelationship::Authentication);
        assert_eq!(
            reference.serialize(Representation::Embedded).unwrap(),
            ValueOrReference::Reference("#key-1".to_string())
        );
    }

    #[test]
    fn serialize_requires_controller() {
        let mut material = ed25519(KeyFormat::JsonWebKey2020);
        material.controller = None;
        material.id = Some("#key-1".to_string());
        let err = material.serialize(Representation::Embedded).unwrap_err();
        assert!(matches!(err, Error::MissingController(Some(ref id)) if id == "#key-1"));
        // The compact form does not need a controller.
        material.serialize(Representation::Reference).unwrap();
    }

    #[test]
    fn builder_requires_raw_key() {
        let pk = hex::decode(P256_PK).unwrap();
        let material = EmbeddedMaterialBuilder::default()
            .id("#key-1")
            .controller("did:web:example.com")
            .curve(Curve::P256)
            .format(KeyFormat::Multibase)
            .key_material(pk.clone())
            .build()
            .unwrap();
        assert_eq!(material.key_material(), &pk[..]);
        assert!(material.usage().is_empty());

        let compressed = crate::multicodec::compact_public_key(Curve::P256, &pk).unwrap();
        assert!(EmbeddedMaterialBuilder::default()
            .curve(Curve::P256)
            .format(KeyFormat::Multibase)
            .key_material(compressed)
            .build()
            .is_err());
    }

    #[test]
    fn new_normalizes_compressed_keys() {
        let pk = hex::decode(P256_PK).unwrap();
        let compressed = crate::multicodec::compact_public_key(Curve::P256, &pk).unwrap();
        let material =
            EmbeddedMaterial::new(Curve::P256, KeyFormat::JsonWebKey2020, &compressed).unwrap();
        assert_eq!(material.key_material(), &pk[..]);
    }

    #[test]
    fn equality() {
        let mut a = ed25519(KeyFormat::JsonWebKey2020);
        let mut b = ed25519(KeyFormat::Multibase);
        a.id = Some("#a".to_string());
        b.id = Some("#b".to_string());
        assert_eq!(a, b);

        let r1 = ReferencedMaterial::new("#a").unwrap();
        let r2 = ReferencedMaterial::new("#a")
            .unwrap()
            .with_usage(VerificationRelationship::KeyAgreement);
        assert_eq!(r1, r2);
        assert!(ReferencedMaterial::new("").is_err());

        assert!(DidMaterial::from(a.clone()).same_entity(&DidMaterial::from(r1)));
        let unrelated = ReferencedMaterial::new("#c").unwrap();
        assert!(!DidMaterial::from(a).same_entity(&DidMaterial::from(unrelated)));
    }

    #[test]
    fn merge_unions_usage() {
        let mut existing = DidMaterial::from(
            ed25519(KeyFormat::JsonWebKey2020)
                .with_usage(VerificationRelationship::Authentication, Representation::Embedded),
        );
        existing.merge(DidMaterial::from(
            ed25519(KeyFormat::JsonWebKey2020)
                .with_usage(VerificationRelationship::AssertionMethod, Representation::Embedded),
        ));
        assert!(existing.is_used_in_relationship(VerificationRelationship::Authentication));
        assert!(existing.is_used_in_relationship(VerificationRelationship::AssertionMethod));
    }

    #[test]
    fn merge_upgrades_reference() {
        let mut existing = DidMaterial::from(
            ReferencedMaterial::new("#key-1")
                .unwrap()
                .with_usage(VerificationRelationship::Authentication),
        );
        let mut embedded = ed25519(KeyFormat::JsonWebKey2020)
            .with_usage(VerificationRelationship::AssertionMethod, Representation::Embedded);
        embedded.id = Some("#key-1".to_string());
        existing.merge(DidMaterial::from(embedded));
        let merged = existing.as_embedded().unwrap();
        assert_eq!(merged.id.as_deref(), Some("#key-1"));
        assert_eq!(merged.usage().len(), 2);
        assert!(existing.is_referenced());
    }

    #[test]
    fn reference_usage_is_always_reference() {
        let mut reference = ReferencedMaterial::new("#key-1").unwrap();
        let mut usage = UsageMap::new();
        usage.insert(
            VerificationRelationship::Authentication,
            Representation::Embedded,
        );
        reference.set_usage(usage);
        assert_eq!(
            reference.usage()[&VerificationRelationship::Authentication],
            Representation::Reference
        );
    }
}
