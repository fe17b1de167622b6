//! Wire format of a DID Document, and the structural checks run on raw JSON
//! before it is decoded.
//!
//! Validation happens on the untyped [`Value`] so that a failure can name the
//! offending location as a JSON pointer. Once a value passes, it is converted
//! into [`WireDocument`], which the decoder consumes.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::did::Service;
use crate::error::Error;
use crate::jwk::JWK;
use crate::one_or_many::OneOrMany;
use crate::relationship::VerificationRelationship;

/// Embedded verification method map.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethodMap {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<JWK>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}

/// Entry of a verification relationship array.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ValueOrReference {
    /// DID URL of a method defined elsewhere.
    Reference(String),
    /// Embedded verification method.
    Value(VerificationMethodMap),
}

/// DID Document as it appears on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    #[serde(rename = "@context")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<OneOrMany<Value>>,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<OneOrMany<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<ValueOrReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<ValueOrReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<ValueOrReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<ValueOrReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_invocation: Option<Vec<ValueOrReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_delegation: Option<Vec<ValueOrReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,
}

impl WireDocument {
    pub fn relationship(&self, rel: VerificationRelationship) -> Option<&Vec<ValueOrReference>> {
        match rel {
            VerificationRelationship::VerificationMethod => self.verification_method.as_ref(),
            VerificationRelationship::Authentication => self.authentication.as_ref(),
            VerificationRelationship::AssertionMethod => self.assertion_method.as_ref(),
            VerificationRelationship::KeyAgreement => self.key_agreement.as_ref(),
            VerificationRelationship::CapabilityInvocation => self.capability_invocation.as_ref(),
            VerificationRelationship::CapabilityDelegation => self.capability_delegation.as_ref(),
        }
    }

    pub fn relationship_mut(
        &mut self,
        rel: VerificationRelationship,
    ) -> &mut Option<Vec<ValueOrReference>> {
        match rel {
            VerificationRelationship::VerificationMethod => &mut self.verification_method,
            VerificationRelationship::Authentication => &mut self.authentication,
            VerificationRelationship::AssertionMethod => &mut self.assertion_method,
            VerificationRelationship::KeyAgreement => &mut self.key_agreement,
            VerificationRelationship::CapabilityInvocation => &mut self.capability_invocation,
            VerificationRelationship::CapabilityDelegation => &mut self.capability_delegation,
        }
    }
}

fn schema_error(path: &str, message: impl Into<String>) -> Error {
    Error::Schema {
        path: if path.is_empty() { "/".to_string() } else { path.to_string() },
        message: message.into(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fetch an optional property; `null` counts as absent.
fn optional<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn expect_string(value: &Value, path: &str) -> Result<(), Error> {
    match value {
        Value::String(_) => Ok(()),
        other => Err(schema_error(
            path,
            format!("expected string, found {}", type_name(other)),
        )),
    }
}

fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, Error> {
    value.as_object().ok_or_else(|| {
        schema_error(path, format!("expected object, found {}", type_name(value)))
    })
}

fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, Error> {
    value.as_array().ok_or_else(|| {
        schema_error(path, format!("expected array, found {}", type_name(value)))
    })
}

fn required_string(object: &Map<String, Value>, key: &str, path: &str) -> Result<(), Error> {
    let path = format!("{}/{}", path, key);
    match optional(object, key) {
        Some(value) => expect_string(value, &path),
        None => Err(schema_error(&path, "missing required property")),
    }
}

fn optional_string(object: &Map<String, Value>, key: &str, path: &str) -> Result<(), Error> {
    match optional(object, key) {
        Some(value) => expect_string(value, &format!("{}/{}", path, key)),
        None => Ok(()),
    }
}

/// A string, or an array of strings.
fn expect_strings(value: &Value, path: &str) -> Result<(), Error> {
    match value {
        Value::String(_) => Ok(()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| expect_string(item, &format!("{}/{}", path, i))),
        other => Err(schema_error(
            path,
            format!("expected string or array of strings, found {}", type_name(other)),
        )),
    }
}

fn validate_context(value: &Value, path: &str) -> Result<(), Error> {
    match value {
        Value::String(_) => Ok(()),
        Value::Array(items) => items.iter().enumerate().try_for_each(|(i, item)| match item {
            Value::String(_) | Value::Object(_) => Ok(()),
            other => Err(schema_error(
                &format!("{}/{}", path, i),
                format!("expected string or object, found {}", type_name(other)),
            )),
        }),
        other => Err(schema_error(
            path,
            format!("expected string or array, found {}", type_name(other)),
        )),
    }
}

fn validate_jwk(value: &Value, path: &str) -> Result<(), Error> {
    let jwk = expect_object(value, path)?;
    required_string(jwk, "crv", path)?;
    required_string(jwk, "kty", path)?;
    // Missing coordinates are a decoding failure, not a schema failure.
    optional_string(jwk, "x", path)?;
    optional_string(jwk, "y", path)
}

fn validate_verification_method(value: &Value, path: &str) -> Result<(), Error> {
    match value {
        Value::String(reference) if reference.is_empty() => {
            Err(schema_error(path, "empty verification method reference"))
        }
        Value::String(_) => Ok(()),
        Value::Object(method) => {
            required_string(method, "id", path)?;
            if method.get("id").and_then(Value::as_str) == Some("") {
                return Err(schema_error(
                    &format!("{}/id", path),
                    "empty verification method id",
                ));
            }
            required_string(method, "type", path)?;
            required_string(method, "controller", path)?;
            if let Some(jwk) = optional(method, "publicKeyJwk") {
                validate_jwk(jwk, &format!("{}/publicKeyJwk", path))?;
            }
            optional_string(method, "publicKeyMultibase", path)
        }
        other => Err(schema_error(
            path,
            format!("expected string or object, found {}", type_name(other)),
        )),
    }
}

fn validate_service(value: &Value, path: &str) -> Result<(), Error> {
    let service = expect_object(value, path)?;
    required_string(service, "id", path)?;
    for key in ["type", "serviceEndpoint"] {
        let key_path = format!("{}/{}", path, key);
        match optional(service, key) {
            Some(value) => expect_strings(value, &key_path)?,
            None => return Err(schema_error(&key_path, "missing required property")),
        }
    }
    Ok(())
}

/// Check the structure of a DID Document without interpreting key material.
pub fn validate_document(value: &Value) -> Result<(), Error> {
    let document = expect_object(value, "")?;
    if let Some(context) = optional(document, "@context") {
        validate_context(context, "/@context")?;
    }
    required_string(document, "id", "")?;
    if let Some(controller) = optional(document, "controller") {
        expect_strings(controller, "/controller")?;
    }
    for rel in VerificationRelationship::ALL {
        let path = format!("/{}", rel);
        if let Some(entries) = optional(document, rel.as_str()) {
            for (i, entry) in expect_array(entries, &path)?.iter().enumerate() {
                validate_verification_method(entry, &format!("{}/{}", path, i))?;
            }
        }
    }
    if let Some(services) = optional(document, "service") {
        for (i, service) in expect_array(services, "/service")?.iter().enumerate() {
            validate_service(service, &format!("/service/{}", i))?;
        }
    }
    Ok(())
}

/// Validate `value` and convert it into the typed wire representation.
pub fn parse_document(value: &Value) -> Result<WireDocument, Error> {
    validate_document(value)?;
    WireDocument::deserialize(value).map_err(|err| schema_error("", err.to_string()))
}
