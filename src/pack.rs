//! This module implements canonical packing of Michelson data.
//!
//! Packing is what Michelson's `PACK` instruction does: it turns a typed
//! value into a byte string. The same bytes are hashed to build big-map keys,
//! so the encoding here must match the one of the node exactly.
//!
//! Theory
//! ------
//!
//! Normalization
//! *************
//!
//! Many values have several readable spellings, but only one packed form.
//! Before encoding, a value is normalized against its type:
//!
//! - addresses, key hashes, keys, signatures and chain ids written as base58
//!   strings are replaced with their binary forms;
//! - timestamps written as RFC3339 strings are replaced with the number of
//!   seconds since epoch;
//! - pairs written as `Pair a b c` or `{a; b; c}` are rewritten as nested
//!   binary pairs `Pair a (Pair b c)`.
//!
//! Values without a type are encoded as given.
//!
//! Encoding algorithm
//! ******************
//!
//! Packed data is `0x05` followed by the binary Micheline encoding of the
//! normalized value. Each node starts with a tag byte:
//!
//! | tag    | node                                                        |
//! |--------|-------------------------------------------------------------|
//! | `0x00` | integer, as signed zarith                                   |
//! | `0x01` | string: 4-byte big-endian length, then UTF-8 bytes          |
//! | `0x02` | sequence: 4-byte length of the payload, then items          |
//! | `0x03` | primitive, no arguments, no annotations                     |
//! | `0x04` | primitive, no arguments, annotations                        |
//! | `0x05` | primitive, 1 argument, no annotations                       |
//! | `0x06` | primitive, 1 argument, annotations                          |
//! | `0x07` | primitive, 2 arguments, no annotations                      |
//! | `0x08` | primitive, 2 arguments, annotations                         |
//! | `0x09` | primitive, any arguments: 4-byte length of arguments payload, arguments, annotations |
//! | `0x0A` | bytes: 4-byte length, then raw bytes                        |
//!
//! Primitives are written as one byte: their index in the protocol table.
//! Annotations are joined with spaces and written as a length-prefixed string.
//!
//! Zarith integers put the sign into bit 6 of the first byte and the six
//! lowest bits of the magnitude into bits 0..6. Every next byte carries seven
//! more bits. Bit 7 is set on every byte but the last.
//!
//! Encoding examples
//! *****************
//!
//! | data, type                 | packed                     |
//! |----------------------------|----------------------------|
//! | `2`, `nat`                 | `05 00 02`                 |
//! | `-1`, `int`                | `05 00 41`                 |
//! | `64`, `nat`                | `05 00 80 01`              |
//! | `"a"`, `string`            | `05 01 00000001 61`        |
//! | `Unit`, `unit`             | `05 03 0b`                 |
//! | `Pair 1 2`, `pair nat nat` | `05 07 07 00 01 00 02`     |
//!
//! ```rust
//! use tezos_devkit::micheline::Micheline;
//! use tezos_devkit::pack::pack;
//!
//! let packed = pack(&Micheline::int(2), Some(&Micheline::prim("nat"))).unwrap();
//! assert_eq!(&packed[..], &[0x05, 0x00, 0x02]);
//! ```

use crate::encoding::{self, EncodingError};
use crate::micheline::{split_comb, Micheline};
pub use bytes::{BufMut, Bytes, BytesMut};
use itertools::Itertools;
use num::bigint::Sign;
use num::{BigInt, BigUint, Zero};

/// First byte of every packed value.
pub const PACK_PREFIX: u8 = 0x05;

/// Michelson primitives in the order of their binary opcodes.
pub const PRIMITIVES: [&str; 157] = [
    "parameter", "storage", "code", "False", "Elt", "Left", "None", "Pair", "Right", "Some",
    "True", "Unit", "PACK", "UNPACK", "BLAKE2B", "SHA256", "SHA512", "ABS", "ADD", "AMOUNT",
    "AND", "BALANCE", "CAR", "CDR", "CHECK_SIGNATURE", "COMPARE", "CONCAT", "CONS",
    "CREATE_ACCOUNT", "CREATE_CONTRACT", "IMPLICIT_ACCOUNT", "DIP", "DROP", "DUP", "EDIV",
    "EMPTY_MAP", "EMPTY_SET", "EQ", "EXEC", "FAILWITH", "GE", "GET", "GT", "HASH_KEY", "IF",
    "IF_CONS", "IF_LEFT", "IF_NONE", "INT", "LAMBDA", "LE", "LEFT", "LOOP", "LSL", "LSR", "LT",
    "MAP", "MEM", "MUL", "NEG", "NEQ", "NIL", "NONE", "NOT", "NOW", "OR", "PAIR", "PUSH",
    "RIGHT", "SIZE", "SOME", "SOURCE", "SENDER", "SELF", "STEPS_TO_QUOTA", "SUB", "SWAP",
    "TRANSFER_TOKENS", "SET_DELEGATE", "UNIT", "UPDATE", "XOR", "ITER", "LOOP_LEFT", "ADDRESS",
    "CONTRACT", "ISNAT", "CAST", "RENAME", "bool", "contract", "int", "key", "key_hash",
    "lambda", "list", "map", "big_map", "nat", "option", "or", "pair", "set", "signature",
    "string", "bytes", "mutez", "timestamp", "unit", "operation", "address", "SLICE", "DIG",
    "DUG", "EMPTY_BIG_MAP", "APPLY", "chain_id", "CHAIN_ID", "LEVEL", "SELF_ADDRESS", "never",
    "NEVER", "UNPAIR", "VOTING_POWER", "TOTAL_VOTING_POWER", "KECCAK", "SHA3",
    "PAIRING_CHECK", "bls12_381_g1", "bls12_381_g2", "bls12_381_fr", "sapling_state",
    "sapling_transaction_deprecated", "SAPLING_EMPTY_STATE", "SAPLING_VERIFY_UPDATE", "ticket",
    "TICKET_DEPRECATED", "READ_TICKET", "SPLIT_TICKET", "JOIN_TICKETS", "GET_AND_UPDATE",
    "chest", "chest_key", "OPEN_CHEST", "VIEW", "view", "constant", "SUB_MUTEZ",
    "tx_rollup_l2_address", "MIN_BLOCK_TIME", "sapling_transaction", "EMIT", "Lambda_rec",
    "LAMBDA_REC", "TICKET", "BYTES", "NAT",
];

/// Packing failures.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PackError {
    /// Primitive is not in the protocol table.
    UnknownPrimitive(String),
    /// Data does not match its type.
    TypeMismatch {
        /// Type the data was packed against
        expected: String,
        /// What was found instead
        got: String,
    },
    /// Type descriptor is malformed.
    InvalidType(String),
    /// Values of this type cannot be packed.
    NotPackable(String),
    /// Timestamp string is not RFC3339.
    InvalidTimestamp(String),
    /// Base58 identifier could not be converted.
    Encoding(EncodingError),
    /// Node payload does not fit a 4-byte length prefix.
    TooLong(usize),
}

impl std::error::Error for PackError {}
impl std::fmt::Display for PackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPrimitive(p) => write!(f, "Unknown primitive: {p}"),
            Self::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {expected}, got {got}")
            }
            Self::InvalidType(t) => write!(f, "Invalid type: {t}"),
            Self::NotPackable(t) => write!(f, "Values of type {t} cannot be packed"),
            Self::InvalidTimestamp(t) => write!(f, "Invalid timestamp: {t}"),
            Self::Encoding(e) => write!(f, "Invalid identifier: {e}"),
            Self::TooLong(len) => write!(f, "Payload of {len} bytes is too long"),
        }
    }
}

impl From<EncodingError> for PackError {
    fn from(value: EncodingError) -> Self {
        Self::Encoding(value)
    }
}

/// Convenience alias for a result of fallible packing.
pub type PackResult<T> = Result<T, PackError>;

/// Binary Micheline encoding.
pub trait Encodable {
    /// Write binary form to the output buffer.
    fn encode(&self, out: &mut dyn BufMut) -> PackResult<()>;
}

impl Encodable for Micheline {
    fn encode(&self, out: &mut dyn BufMut) -> PackResult<()> {
        match self {
            Self::Int(value) => {
                out.put_u8(0x00);
                write_zarith(value, out);
            }
            Self::String(value) => {
                out.put_u8(0x01);
                put_sized(out, value.as_bytes())?;
            }
            Self::Bytes(value) => {
                out.put_u8(0x0a);
                put_sized(out, value)?;
            }
            Self::Seq(items) => {
                out.put_u8(0x02);
                let mut buf = BytesMut::new();
                for item in items {
                    item.encode(&mut buf)?;
                }
                put_sized(out, &buf)?;
            }
            Self::Prim { prim, args, annots } => {
                let code = primitive_code(prim)?;
                let annots = annots.iter().join(" ");
                if args.len() <= 2 {
                    out.put_u8(0x03 + 2 * args.len() as u8 + u8::from(!annots.is_empty()));
                    out.put_u8(code);
                    for arg in args {
                        arg.encode(out)?;
                    }
                    if !annots.is_empty() {
                        put_sized(out, annots.as_bytes())?;
                    }
                } else {
                    out.put_u8(0x09);
                    out.put_u8(code);
                    let mut buf = BytesMut::new();
                    for arg in args {
                        arg.encode(&mut buf)?;
                    }
                    put_sized(out, &buf)?;
                    put_sized(out, annots.as_bytes())?;
                }
            }
        }
        Ok(())
    }
}

pub fn primitive_code(prim: &str) -> PackResult<u8> {
    //! Binary opcode of a primitive.
    PRIMITIVES
        .iter()
        .position(|&p| p == prim)
        .map(|i| i as u8)
        .ok_or_else(|| PackError::UnknownPrimitive(prim.to_string()))
}

fn put_sized(out: &mut dyn BufMut, data: &[u8]) -> PackResult<()> {
    let len = u32::try_from(data.len()).map_err(|_| PackError::TooLong(data.len()))?;
    out.put_u32(len);
    out.put_slice(data);
    Ok(())
}

fn low_bits(value: &BigUint, mask: u32) -> u8 {
    (value.iter_u32_digits().next().unwrap_or(0) & mask) as u8
}

fn write_zarith(value: &BigInt, out: &mut dyn BufMut) {
    let mut rest = value.magnitude().clone();
    let mut byte = low_bits(&rest, 0x3f);
    if value.sign() == Sign::Minus {
        byte |= 0x40;
    }
    rest >>= 6;
    while !rest.is_zero() {
        out.put_u8(byte | 0x80);
        byte = low_bits(&rest, 0x7f);
        rest >>= 7;
    }
    out.put_u8(byte);
}

pub fn pack(data: &Micheline, ty: Option<&Micheline>) -> PackResult<Bytes> {
    //! Pack data, normalizing it against the type if one is given.
    //!
    //! The result is a pure function of its inputs.
    let normalized;
    let data = match ty {
        Some(ty) => {
            normalized = normalize(data, ty)?;
            &normalized
        }
        None => data,
    };
    let mut buf = BytesMut::new();
    buf.put_u8(PACK_PREFIX);
    data.encode(&mut buf)?;
    Ok(buf.freeze())
}

fn mismatch(ty: &Micheline, data: &Micheline) -> PackError {
    PackError::TypeMismatch {
        expected: ty.prim_name().unwrap_or("?").to_string(),
        got: data.kind(),
    }
}

fn type_arg(ty: &Micheline, index: usize) -> PackResult<&Micheline> {
    ty.args()
        .get(index)
        .ok_or_else(|| PackError::InvalidType(format!("{} needs argument {index}", ty.kind())))
}

fn convert_string<F>(data: &Micheline, ty: &Micheline, convert: F) -> PackResult<Micheline>
where
    F: FnOnce(&str) -> Result<Vec<u8>, EncodingError>,
{
    match data {
        Micheline::String(s) => Ok(Micheline::Bytes(convert(s)?)),
        Micheline::Bytes(_) => Ok(data.clone()),
        _ => Err(mismatch(ty, data)),
    }
}

fn normalize_prim<F>(data: &Micheline, ty: &Micheline, names: &[&str], f: F) -> PackResult<Micheline>
where
    F: FnOnce(&str, &[Micheline]) -> PackResult<Vec<Micheline>>,
{
    match data {
        Micheline::Prim { prim, args, annots } if names.contains(&prim.as_str()) => {
            Ok(Micheline::Prim {
                prim: prim.clone(),
                args: f(prim, args)?,
                annots: annots.clone(),
            })
        }
        _ => Err(mismatch(ty, data)),
    }
}

fn normalize_items(data: &Micheline, ty: &Micheline, item_ty: &Micheline) -> PackResult<Micheline> {
    match data {
        Micheline::Seq(items) => Ok(Micheline::Seq(
            items
                .iter()
                .map(|item| normalize(item, item_ty))
                .collect::<PackResult<_>>()?,
        )),
        _ => Err(mismatch(ty, data)),
    }
}

fn normalize(data: &Micheline, ty: &Micheline) -> PackResult<Micheline> {
    let name = ty
        .prim_name()
        .ok_or_else(|| PackError::InvalidType(ty.kind()))?;
    match (name, data) {
        ("int", Micheline::Int(_)) => Ok(data.clone()),
        ("nat" | "mutez", Micheline::Int(n)) if n.sign() != Sign::Minus => Ok(data.clone()),
        ("string", Micheline::String(_)) => Ok(data.clone()),
        (
            "bytes" | "bls12_381_g1" | "bls12_381_g2" | "chest" | "chest_key"
            | "sapling_transaction" | "sapling_transaction_deprecated",
            Micheline::Bytes(_),
        ) => Ok(data.clone()),
        ("bls12_381_fr", Micheline::Int(_) | Micheline::Bytes(_)) => Ok(data.clone()),
        ("bool", Micheline::Prim { prim, args, .. })
            if (prim == "True" || prim == "False") && args.is_empty() =>
        {
            Ok(data.clone())
        }
        ("unit", Micheline::Prim { prim, args, .. }) if prim == "Unit" && args.is_empty() => {
            Ok(data.clone())
        }
        ("address" | "contract", _) => convert_string(data, ty, encoding::address_to_bytes),
        ("key_hash", _) => convert_string(data, ty, encoding::key_hash_to_bytes),
        ("key", _) => convert_string(data, ty, encoding::public_key_to_bytes),
        ("signature", _) => convert_string(data, ty, encoding::signature_to_bytes),
        ("chain_id", _) => convert_string(data, ty, encoding::chain_id_to_bytes),
        ("timestamp", Micheline::Int(_)) => Ok(data.clone()),
        ("timestamp", Micheline::String(s)) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|t| Micheline::int(t.timestamp()))
            .map_err(|_| PackError::InvalidTimestamp(s.clone())),
        ("option", _) => {
            let inner = type_arg(ty, 0)?;
            normalize_prim(data, ty, &["Some", "None"], |prim, args| match (prim, args) {
                ("None", []) => Ok(vec![]),
                ("Some", [value]) => Ok(vec![normalize(value, inner)?]),
                _ => Err(mismatch(ty, data)),
            })
        }
        ("or", _) => {
            let (left, right) = (type_arg(ty, 0)?, type_arg(ty, 1)?);
            normalize_prim(data, ty, &["Left", "Right"], |prim, args| match (prim, args) {
                ("Left", [value]) => Ok(vec![normalize(value, left)?]),
                ("Right", [value]) => Ok(vec![normalize(value, right)?]),
                _ => Err(mismatch(ty, data)),
            })
        }
        ("pair", _) => {
            let (left_ty, right_ty) = split_comb(ty, "pair")
                .ok_or_else(|| PackError::InvalidType("pair needs two arguments".to_string()))?;
            let (left, right) = split_comb(data, "Pair").ok_or_else(|| mismatch(ty, data))?;
            Ok(Micheline::pair(
                normalize(left, left_ty)?,
                normalize(&right, &right_ty)?,
            ))
        }
        ("list" | "set", _) => normalize_items(data, ty, type_arg(ty, 0)?),
        ("map", Micheline::Seq(items)) => {
            let (key_ty, value_ty) = (type_arg(ty, 0)?, type_arg(ty, 1)?);
            let items = items
                .iter()
                .map(|item| {
                    normalize_prim(item, ty, &["Elt"], |_, args| match args {
                        [key, value] => Ok(vec![normalize(key, key_ty)?, normalize(value, value_ty)?]),
                        _ => Err(mismatch(ty, item)),
                    })
                })
                .collect::<PackResult<_>>()?;
            Ok(Micheline::Seq(items))
        }
        ("lambda", Micheline::Seq(_) | Micheline::Prim { .. }) => Ok(data.clone()),
        ("operation" | "big_map" | "sapling_state" | "ticket" | "never", _) => {
            Err(PackError::NotPackable(name.to_string()))
        }
        (name, _) if primitive_code(name).is_err() => Err(PackError::UnknownPrimitive(name.to_string())),
        _ => Err(mismatch(ty, data)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rustc_hex::ToHex;

    fn packed_hex(data: &Micheline, ty: Option<&Micheline>) -> String {
        pack(data, ty).unwrap().to_hex()
    }

    #[test]
    fn test_primitive_codes() {
        assert_eq!(primitive_code("parameter").unwrap(), 0x00);
        assert_eq!(primitive_code("Pair").unwrap(), 0x07);
        assert_eq!(primitive_code("nat").unwrap(), 0x62);
        assert_eq!(primitive_code("string").unwrap(), 0x68);
        assert_eq!(primitive_code("ticket").unwrap(), 0x87);
        assert_eq!(primitive_code("EMIT").unwrap(), 0x97);
        assert_eq!(primitive_code("NAT").unwrap(), 0x9c);
        assert_eq!(
            primitive_code("pear").unwrap_err(),
            PackError::UnknownPrimitive("pear".to_string())
        );
    }

    #[test]
    fn test_zarith() {
        let cases: [(i64, &str); 7] = [
            (0, "050000"),
            (2, "050002"),
            (-1, "050041"),
            (63, "05003f"),
            (64, "05008001"),
            (-64, "0500c001"),
            (1_000_000, "050080897a"),
        ];
        for (value, expected) in cases {
            assert_eq!(packed_hex(&Micheline::int(value), None), expected, "{value}");
        }
    }

    #[test]
    fn test_annotations() {
        let ty = Micheline::prim("nat").with_annots(["%n"]);
        assert_eq!(packed_hex(&ty, None), "05046200000002256e");
    }
}
