//! Base58check encodings of Tezos identifiers and their binary forms.
//!
//! Every human-readable Tezos identifier is `base58check(prefix || payload)`,
//! where the prefix bytes are chosen so that the resulting string starts with
//! a recognizable tag (`tz1`, `KT1`, `edpk`, `expr`, ...).
//!
//! Michelson data uses a different, more compact binary form for the same
//! values (e.g. a 22-byte address), which is what gets packed and what nodes
//! return in optimized responses. This module converts between the two.

use bs58::{decode::Error as Base58Error, encode};
use std::fmt;

/// Base58check prefix of some identifier kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Prefix {
    /// Human-readable tag the encoded string starts with.
    pub tag: &'static str,
    /// Raw bytes prepended before encoding.
    pub bytes: &'static [u8],
    /// Length of the payload in bytes.
    pub payload_len: usize,
}

macro_rules! prefixes {
    ($($(#[$attr:meta])* $name:ident = $tag:literal, [$($b:literal),+], $len:literal;)+) => {
        $(
            $(#[$attr])*
            pub const $name: Prefix = Prefix { tag: $tag, bytes: &[$($b),+], payload_len: $len };
        )+
    };
}

prefixes! {
    /// ed25519 public key hash
    TZ1 = "tz1", [6, 161, 159], 20;
    /// secp256k1 public key hash
    TZ2 = "tz2", [6, 161, 161], 20;
    /// p256 public key hash
    TZ3 = "tz3", [6, 161, 164], 20;
    /// BLS12-381 public key hash
    TZ4 = "tz4", [6, 161, 166], 20;
    /// Originated contract hash
    KT1 = "KT1", [2, 90, 121], 20;
    /// Smart rollup hash
    SR1 = "sr1", [6, 124, 117], 20;
    /// ed25519 public key
    EDPK = "edpk", [13, 15, 37, 217], 32;
    /// secp256k1 public key
    SPPK = "sppk", [3, 254, 226, 86], 33;
    /// p256 public key
    P2PK = "p2pk", [3, 178, 139, 127], 33;
    /// BLS12-381 public key
    BLPK = "BLpk", [6, 149, 135, 204], 48;
    /// ed25519 signature
    EDSIG = "edsig", [9, 245, 205, 134, 18], 64;
    /// secp256k1 signature
    SPSIG = "spsig1", [13, 115, 101, 19, 63], 64;
    /// p256 signature
    P2SIG = "p2sig", [54, 240, 44, 52], 64;
    /// Generic signature
    SIG = "sig", [4, 130, 43], 64;
    /// BLS12-381 signature
    BLSIG = "BLsig", [40, 171, 64, 207], 96;
    /// Chain identifier
    NET = "Net", [87, 82, 0], 4;
    /// Script expression hash (big-map keys)
    EXPR = "expr", [13, 44, 64, 27], 32;
}

/// Entrypoint that is encoded as no entrypoint at all.
pub const DEFAULT_ENTRYPOINT: &str = "default";
/// Longest entrypoint name accepted by the protocol, in bytes.
pub const MAX_ENTRYPOINT_LEN: usize = 31;

const KEY_HASHES: [Prefix; 4] = [TZ1, TZ2, TZ3, TZ4];
const PUBLIC_KEYS: [Prefix; 4] = [EDPK, SPPK, P2PK, BLPK];
const SIGNATURES: [Prefix; 5] = [EDSIG, SPSIG, P2SIG, SIG, BLSIG];

/// Failures of base58 and binary conversions.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum EncodingError {
    /// String is not valid base58check.
    InvalidBase58(String),
    /// Decoded string does not start with any expected prefix.
    UnknownPrefix(String),
    /// Payload has wrong length for its prefix.
    InvalidLength {
        /// Expected payload length
        expected: usize,
        /// Actual payload length
        got: usize,
    },
    /// Binary form starts with an unknown tag byte.
    UnknownTag(u8),
    /// Entrypoint suffix is not valid UTF-8.
    InvalidEntrypoint,
    /// Entrypoint name is longer than [`MAX_ENTRYPOINT_LEN`].
    EntrypointTooLong(usize),
}

impl std::error::Error for EncodingError {}
impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase58(s) => write!(f, "Invalid base58check string: {s}"),
            Self::UnknownPrefix(s) => write!(f, "Unknown prefix of {s}"),
            Self::InvalidLength { expected, got } => {
                write!(f, "Invalid payload length: expected {expected}, got {got}")
            }
            Self::UnknownTag(tag) => write!(f, "Unknown binary tag 0x{tag:02x}"),
            Self::InvalidEntrypoint => f.write_str("Entrypoint is not valid UTF-8"),
            Self::EntrypointTooLong(len) => write!(
                f,
                "Entrypoint of {len} bytes is longer than {MAX_ENTRYPOINT_LEN}"
            ),
        }
    }
}

impl From<Base58Error> for EncodingError {
    fn from(value: Base58Error) -> Self {
        Self::InvalidBase58(value.to_string())
    }
}

impl Prefix {
    pub fn encode(&self, payload: &[u8]) -> Result<String, EncodingError> {
        //! Encode a payload with this prefix.
        if payload.len() != self.payload_len {
            return Err(EncodingError::InvalidLength {
                expected: self.payload_len,
                got: payload.len(),
            });
        }
        let mut data = self.bytes.to_vec();
        data.extend_from_slice(payload);
        Ok(encode(data).with_check().into_string())
    }

    pub fn decode(&self, text: &str) -> Result<Vec<u8>, EncodingError> {
        //! Decode a string, checking that it was encoded with this prefix.
        let data = bs58::decode(text).with_check(None).into_vec()?;
        let payload = data
            .strip_prefix(self.bytes)
            .ok_or_else(|| EncodingError::UnknownPrefix(text.to_string()))?;
        if payload.len() != self.payload_len {
            return Err(EncodingError::InvalidLength {
                expected: self.payload_len,
                got: payload.len(),
            });
        }
        Ok(payload.to_vec())
    }

    fn matches(&self, text: &str) -> bool {
        text.starts_with(self.tag)
    }
}

fn pick<'a>(choices: &'a [Prefix], text: &str) -> Result<(usize, &'a Prefix), EncodingError> {
    choices
        .iter()
        .enumerate()
        .find(|(_, p)| p.matches(text))
        .ok_or_else(|| EncodingError::UnknownPrefix(text.to_string()))
}

pub fn expr_hash(packed: &[u8]) -> String {
    //! Script expression hash of packed data: the `expr...` key nodes use
    //! to index big-map entries.
    let digest = crate::utils::blake2_256(&[packed]);
    EXPR.encode(&digest).expect("digest has a fixed length")
}

pub fn key_hash_to_bytes(text: &str) -> Result<Vec<u8>, EncodingError> {
    //! `tz1...` → `tag || 20 bytes`.
    let (tag, prefix) = pick(&KEY_HASHES, text)?;
    let mut out = vec![tag as u8];
    out.extend(prefix.decode(text)?);
    Ok(out)
}

pub fn key_hash_from_bytes(data: &[u8]) -> Result<String, EncodingError> {
    //! `tag || 20 bytes` → `tz1...`.
    let (&tag, payload) = data.split_first().ok_or(EncodingError::InvalidLength {
        expected: 21,
        got: 0,
    })?;
    KEY_HASHES
        .get(tag as usize)
        .ok_or(EncodingError::UnknownTag(tag))?
        .encode(payload)
}

pub fn address_to_bytes(text: &str) -> Result<Vec<u8>, EncodingError> {
    //! Address with optional `%entrypoint` → 22-byte binary form followed by
    //! entrypoint bytes.
    //!
    //! `%default` is the same as no entrypoint and adds no suffix.
    let (address, entrypoint) = match text.split_once('%') {
        Some((a, e)) => (a, Some(e)),
        None => (text, None),
    };
    let mut out = if KT1.matches(address) {
        let mut out = vec![0x01];
        out.extend(KT1.decode(address)?);
        out.push(0x00);
        out
    } else if SR1.matches(address) {
        let mut out = vec![0x03];
        out.extend(SR1.decode(address)?);
        out.push(0x00);
        out
    } else {
        let mut out = vec![0x00];
        out.extend(key_hash_to_bytes(address)?);
        out
    };
    if let Some(entrypoint) = entrypoint.filter(|e| *e != DEFAULT_ENTRYPOINT) {
        if entrypoint.len() > MAX_ENTRYPOINT_LEN {
            return Err(EncodingError::EntrypointTooLong(entrypoint.len()));
        }
        out.extend_from_slice(entrypoint.as_bytes());
    }
    Ok(out)
}

pub fn address_from_bytes(data: &[u8]) -> Result<String, EncodingError> {
    //! Binary address (with optional entrypoint suffix) → readable address.
    if data.len() < 22 {
        return Err(EncodingError::InvalidLength {
            expected: 22,
            got: data.len(),
        });
    }
    let (body, entrypoint) = data.split_at(22);
    let address = match body[0] {
        0x00 => key_hash_from_bytes(&body[1..])?,
        0x01 => KT1.encode(&body[1..21])?,
        0x03 => SR1.encode(&body[1..21])?,
        tag => return Err(EncodingError::UnknownTag(tag)),
    };
    if entrypoint.is_empty() {
        Ok(address)
    } else {
        let entrypoint =
            std::str::from_utf8(entrypoint).map_err(|_| EncodingError::InvalidEntrypoint)?;
        Ok(format!("{address}%{entrypoint}"))
    }
}

pub fn public_key_to_bytes(text: &str) -> Result<Vec<u8>, EncodingError> {
    //! `edpk...` → `tag || key bytes`.
    let (tag, prefix) = pick(&PUBLIC_KEYS, text)?;
    let mut out = vec![tag as u8];
    out.extend(prefix.decode(text)?);
    Ok(out)
}

pub fn public_key_from_bytes(data: &[u8]) -> Result<String, EncodingError> {
    //! `tag || key bytes` → `edpk...`.
    let (&tag, payload) = data.split_first().ok_or(EncodingError::InvalidLength {
        expected: 33,
        got: 0,
    })?;
    PUBLIC_KEYS
        .get(tag as usize)
        .ok_or(EncodingError::UnknownTag(tag))?
        .encode(payload)
}

pub fn signature_to_bytes(text: &str) -> Result<Vec<u8>, EncodingError> {
    //! Any signature → raw signature bytes.
    let (_, prefix) = pick(&SIGNATURES, text)?;
    prefix.decode(text)
}

pub fn signature_from_bytes(data: &[u8]) -> Result<String, EncodingError> {
    //! Raw signature bytes → generic `sig...` (or `BLsig...` for 96 bytes).
    if data.len() == BLSIG.payload_len {
        BLSIG.encode(data)
    } else {
        SIG.encode(data)
    }
}

pub fn chain_id_to_bytes(text: &str) -> Result<Vec<u8>, EncodingError> {
    //! `Net...` → 4 bytes.
    NET.decode(text)
}

pub fn chain_id_from_bytes(data: &[u8]) -> Result<String, EncodingError> {
    //! 4 bytes → `Net...`.
    NET.encode(data)
}

/// A validated Tezos address: implicit account, originated contract or
/// smart rollup, optionally targeting an entrypoint (`KT1...%name`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        //! Readable form.
        &self.0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        //! 22-byte binary form (plus entrypoint suffix, if any).
        address_to_bytes(&self.0).expect("Validated on construction")
    }

    pub fn is_contract(&self) -> bool {
        //! Whether this is an originated contract.
        self.0.starts_with(KT1.tag)
    }
}

impl std::str::FromStr for Address {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        address_to_bytes(s)?;
        Ok(Self(s.to_string()))
    }
}
impl TryFrom<String> for Address {
    type Error = EncodingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
