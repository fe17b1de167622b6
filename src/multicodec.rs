use multibase::Base;

use crate::curve::{compress_p256, Curve};
use crate::error::DecodingError;

/// Multicodec public key codes, as unsigned varints.
///
/// See: <https://github.com/multiformats/multicodec/blob/master/table.csv>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Ed25519Pub = 0xed,
    P256Pub = 0x1200,
}

const ED25519_PUB_PREFIX: [u8; 2] = [0xed, 0x01];
const P256_PUB_PREFIX: [u8; 2] = [0x80, 0x24];

impl Codec {
    pub fn for_curve(curve: Curve) -> Self {
        match curve {
            Curve::P256 => Self::P256Pub,
            Curve::Ed25519 => Self::Ed25519Pub,
        }
    }

    /// Varint encoding of the code, as it appears in front of key bytes.
    pub fn prefix(&self) -> [u8; 2] {
        match self {
            Self::Ed25519Pub => ED25519_PUB_PREFIX,
            Self::P256Pub => P256_PUB_PREFIX,
        }
    }
}

/// Compact form of a raw key: compressed point for P-256, the key itself for
/// Ed25519.
pub fn compact_public_key(curve: Curve, key_material: &[u8]) -> Result<Vec<u8>, DecodingError> {
    let key = curve.normalize_public_key(key_material)?;
    match curve {
        Curve::P256 => compress_p256(&key),
        Curve::Ed25519 => Ok(key),
    }
}

/// Encode a raw public key as a base58btc multibase string with its
/// multicodec prefix.
pub fn encode_multibase_key(curve: Curve, key_material: &[u8]) -> Result<String, DecodingError> {
    let compact = compact_public_key(curve, key_material)?;
    let mut data = Vec::with_capacity(2 + compact.len());
    data.extend_from_slice(&Codec::for_curve(curve).prefix());
    data.extend_from_slice(&compact);
    Ok(multibase::encode(Base::Base58Btc, data))
}

/// Decode a multibase public key asserted to be on `curve` into raw key bytes.
///
/// The two prefix bytes are skipped without checking them against the
/// curve's codec; a mismatch is only logged.
pub fn decode_multibase_key(curve: Curve, encoded: &str) -> Result<Vec<u8>, DecodingError> {
    let (base, data) = multibase::decode(encoded)?;
    if base != Base::Base58Btc {
        return Err(DecodingError::MultibaseBase(base));
    }
    if data.len() < 2 {
        return Err(DecodingError::MultibaseKeyLength(data.len()));
    }
    let (prefix, compact) = data.split_at(2);
    if prefix != Codec::for_curve(curve).prefix() {
        log::warn!(
            "multicodec prefix {:02x?} does not match {} public key",
            prefix,
            curve
        );
    }
    curve.normalize_public_key(compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519_PK: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
    const ED25519_MULTIBASE: &str = "z6MktwupdmLXVVqTzCw4i46r4uGyosGXRnR3XjN4Zq7oMMsw";
    const P256_PK: &str = "04c1e349cb61ec70248ce801034c3834e1b88ebe1161cb25af38741f785fcfc4c47bc96708ef80952b53f8d2555fe72b841ed04588628b1d378a594939500ec9c9";
    const P256_MULTIBASE: &str = "zDnaevi97m59H9ZSXM83JUPqd1v26bw7C6SDVDTx6ABj6kQKm";

    #[test]
    fn codec_prefix_is_varint_of_code() {
        for codec in [Codec::Ed25519Pub, Codec::P256Pub] {
            let code = codec as u16;
            let prefix = codec.prefix();
            assert_eq!(prefix[0], (code as u8 & 0x7f) | 0x80);
            assert_eq!(prefix[1] as u16, code >> 7);
        }
    }

    #[test]
    fn encode_ed25519() {
        let pk = hex::decode(ED25519_PK).unwrap();
        assert_eq!(
            encode_multibase_key(Curve::Ed25519, &pk).unwrap(),
            ED25519_MULTIBASE
        );
    }

    #[test]
    fn encode_p256_compresses() {
        let pk = hex::decode(P256_PK).unwrap();
        assert_eq!(compact_public_key(Curve::P256, &pk).unwrap().len(), 33);
        assert_eq!(
            encode_multibase_key(Curve::P256, &pk).unwrap(),
            P256_MULTIBASE
        );
    }

    #[test]
    fn decode_inverts_encode() {
        let pk = hex::decode(ED25519_PK).unwrap();
        assert_eq!(
            decode_multibase_key(Curve::Ed25519, ED25519_MULTIBASE).unwrap(),
            pk
        );
        let pk = hex::decode(P256_PK).unwrap();
        assert_eq!(
            decode_multibase_key(Curve::P256, P256_MULTIBASE).unwrap(),
            pk
        );
    }

    #[test]
    fn decode_truncated() {
        let short = multibase::encode(Base::Base58Btc, [0xed]);
        assert!(matches!(
            decode_multibase_key(Curve::Ed25519, &short).unwrap_err(),
            DecodingError::MultibaseKeyLength(1)
        ));
        let truncated = multibase::encode(Base::Base58Btc, [0xed, 0x01, 0xd7, 0x5a]);
        assert!(matches!(
            decode_multibase_key(Curve::Ed25519, &truncated).unwrap_err(),
            DecodingError::InvalidKeyLength { found: 2, .. }
        ));
    }

    #[test]
    fn decode_rejects_other_bases() {
        let hex_key = multibase::encode(Base::Base16Lower, [0xed, 0x01]);
        assert!(matches!(
            decode_multibase_key(Curve::Ed25519, &hex_key).unwrap_err(),
            DecodingError::MultibaseBase(Base::Base16Lower)
        ));
    }

    #[test_log::test]
    fn decode_does_not_check_prefix() {
        // An Ed25519 key carrying the P-256 prefix still decodes.
        let mut data = P256_PUB_PREFIX.to_vec();
        data.extend_from_slice(&hex::decode(ED25519_PK).unwrap());
        let encoded = multibase::encode(Base::Base58Btc, data);
        assert_eq!(
            decode_multibase_key(Curve::Ed25519, &encoded).unwrap(),
            hex::decode(ED25519_PK).unwrap()
        );
    }
}
