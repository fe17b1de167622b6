use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::curve::{curve_from_name, Curve, COORDINATE_SIZE, UNCOMPRESSED_POINT_TAG};
use crate::error::{DecodingError, Error};

// RFC 7517 - JSON Web Key (JWK)
// RFC 7518 - JSON Web Algorithms (JWA)
// RFC 7638 - JSON Web Key (JWK) Thumbprint
// RFC 8037 - CFRG ECDH and Signatures in JOSE

/// Public JSON Web Key for one of the supported curves.
///
/// Coordinates are kept in their base64url form; they are only decoded when
/// the key is turned back into raw bytes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct JWK {
    #[serde(rename = "crv")]
    pub curve: String,
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "x")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_coordinate: Option<String>,
    #[serde(rename = "y")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_coordinate: Option<String>,
}

impl JWK {
    pub fn thumbprint(&self) -> Result<String, Error> {
        // JWK parameters for thumbprint hashing must be in lexicographical order, and without
        // string escaping.
        // https://datatracker.ietf.org/doc/html/rfc7638#section-3.1
        let curve = curve_from_name(&self.curve)?;
        let x = self
            .x_coordinate
            .as_ref()
            .ok_or(DecodingError::MissingPoint("x"))?;
        let json_string = match curve {
            Curve::P256 => {
                let y = self
                    .y_coordinate
                    .as_ref()
                    .ok_or(DecodingError::MissingPoint("y"))?;
                format!(
                    r#"{{"crv":"{}","kty":"{}","x":"{}","y":"{}"}}"#,
                    curve.jwk_name(),
                    curve.key_type(),
                    x,
                    y
                )
            }
            Curve::Ed25519 => format!(
                r#"{{"crv":"{}","kty":"{}","x":"{}"}}"#,
                curve.jwk_name(),
                curve.key_type(),
                x
            ),
        };
        let hash = Sha256::digest(json_string.as_bytes());
        Ok(base64url_encode(&hash))
    }
}

pub(crate) fn base64url_encode(data: &[u8]) -> String {
    base64::encode_config(data, base64::URL_SAFE_NO_PAD)
}

fn decode_coordinate(
    curve: Curve,
    name: &'static str,
    value: Option<&String>,
) -> Result<Vec<u8>, DecodingError> {
    let value = value.ok_or(DecodingError::MissingPoint(name))?;
    let bytes = base64::decode_config(value, base64::URL_SAFE_NO_PAD)?;
    if bytes.len() != COORDINATE_SIZE {
        return Err(DecodingError::InvalidKeyLength {
            curve: curve.display_name(),
            expected: COORDINATE_SIZE,
            found: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Encode raw public key bytes as a JWK.
///
/// P-256 keys must be in uncompressed SEC1 form; both coordinates are emitted.
/// Ed25519 keys are emitted as the single `x` value.
pub fn encode_json_web_key(curve: Curve, key_material: &[u8]) -> Result<JWK, DecodingError> {
    let key = curve.normalize_public_key(key_material)?;
    let (x, y) = match curve {
        Curve::P256 => {
            let (x, y) = key[1..].split_at(COORDINATE_SIZE);
            (base64url_encode(x), Some(base64url_encode(y)))
        }
        Curve::Ed25519 => (base64url_encode(&key), None),
    };
    Ok(JWK {
        curve: curve.jwk_name().to_string(),
        key_type: curve.key_type().to_string(),
        x_coordinate: Some(x),
        y_coordinate: y,
    })
}

/// Decode a JWK into its curve and raw public key bytes.
pub fn decode_jwk(jwk: &JWK) -> Result<(Curve, Vec<u8>), Error> {
    let curve = curve_from_name(&jwk.curve)?;
    let x = decode_coordinate(curve, "x", jwk.x_coordinate.as_ref())?;
    let key = match curve {
        Curve::P256 => {
            let y = decode_coordinate(curve, "y", jwk.y_coordinate.as_ref())?;
            let mut key = Vec::with_capacity(curve.raw_key_length());
            key.push(UNCOMPRESSED_POINT_TAG);
            key.extend_from_slice(&x);
            key.extend_from_slice(&y);
            key
        }
        Curve::Ed25519 => x,
    };
    Ok((curve, curve.normalize_public_key(&key)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // RFC 8037 appendix A.3
    const ED25519_PK: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
    // RFC 7518 appendix C
    const P256_PK: &str = "04c1e349cb61ec70248ce801034c3834e1b88ebe1161cb25af38741f785fcfc4c47bc96708ef80952b53f8d2555fe72b841ed04588628b1d378a594939500ec9c9";

    #[test]
    fn encode_ed25519() {
        let pk = hex::decode(ED25519_PK).unwrap();
        let jwk = encode_json_web_key(Curve::Ed25519, &pk).unwrap();
        assert_eq!(
            serde_json::to_value(&jwk).unwrap(),
            json!({
                "crv": "Ed25519",
                "kty": "OKP",
                "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
            })
        );
    }

    #[test]
    fn encode_p256() {
        let pk = hex::decode(P256_PK).unwrap();
        let jwk = encode_json_web_key(Curve::P256, &pk).unwrap();
        assert_eq!(
            serde_json::to_value(&jwk).unwrap(),
            json!({
                "crv": "P-256",
                "kty": "EC",
                "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
                "y": "e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck"
            })
        );
    }

    #[test]
    fn decode_inverts_encode() {
        for (curve, pk) in [(Curve::Ed25519, ED25519_PK), (Curve::P256, P256_PK)] {
            let pk = hex::decode(pk).unwrap();
            let jwk = encode_json_web_key(curve, &pk).unwrap();
            let (decoded_curve, decoded) = decode_jwk(&jwk).unwrap();
            assert_eq!(decoded_curve, curve);
            assert_eq!(decoded, pk);
        }
    }

    #[test]
    fn decode_missing_coordinate() {
        let jwk: JWK = serde_json::from_value(json!({
            "crv": "P-256",
            "kty": "EC",
            "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ"
        }))
        .unwrap();
        let err = decode_jwk(&jwk).unwrap_err();
        assert!(matches!(
            err,
            Error::Decoding(DecodingError::MissingPoint("y"))
        ));
    }

    #[test]
    fn decode_unknown_curve() {
        let jwk: JWK = serde_json::from_value(json!({
            "crv": "secp256k1",
            "kty": "EC",
            "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
            "y": "e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck"
        }))
        .unwrap();
        let err = decode_jwk(&jwk).unwrap_err();
        assert_eq!(err.to_string(), "UnsupportedCurveError: secp256k1");
    }

    #[test]
    fn decode_off_curve_point() {
        let zero = base64url_encode(&[0u8; COORDINATE_SIZE]);
        let jwk = JWK {
            curve: "P-256".to_string(),
            key_type: "EC".to_string(),
            x_coordinate: Some(zero.clone()),
            y_coordinate: Some(zero),
        };
        assert!(matches!(
            decode_jwk(&jwk).unwrap_err(),
            Error::Decoding(DecodingError::EC(_))
        ));
    }

    #[test]
    fn decode_truncated_coordinate() {
        let jwk: JWK = serde_json::from_value(json!({
            "crv": "Ed25519",
            "kty": "OKP",
            "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIa"
        }))
        .unwrap();
        assert!(matches!(
            decode_jwk(&jwk).unwrap_err(),
            Error::Decoding(DecodingError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn jwk_thumbprint() {
        // https://tools.ietf.org/html/rfc8037#appendix-A.3
        let key: JWK = serde_json::from_value(json!({
            "crv": "Ed25519",
            "kty": "OKP",
            "x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
        }))
        .unwrap();
        let thumbprint = key.thumbprint().unwrap();
        assert_eq!(thumbprint, "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k");

        // This EC JWK is from RFC 7518, its thumbprint is not.
        // https://datatracker.ietf.org/doc/html/rfc7518#appendix-C
        let key: JWK = serde_json::from_value(json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
            "y": "e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck",
        }))
        .unwrap();
        let thumbprint = key.thumbprint().unwrap();
        assert_eq!(thumbprint, "Vy57XrArUrW0NbpI12tEzDHABxMwrTh6HHXRenSpnCo");
    }
}
