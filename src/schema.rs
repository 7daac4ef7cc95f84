//! Schema-driven decoding of Micheline data into native-shaped values.
//!
//! A [`Schema`] is built from a Michelson type and turns raw trees returned by
//! a node into [`Value`]s: numbers become integers, base58 identifiers become
//! strings whatever form the node used, and combs of pairs become records.
//!
//! Pairs are flattened: every leaf of a right (or left) comb of un-annotated
//! `pair`s becomes a record field, named after its field annotation or, when
//! there is none, after its position. `or` types are flattened the same way
//! into labelled variants.
//!
//! ```rust
//! use tezos_devkit::micheline::Micheline;
//! use tezos_devkit::schema::{Schema, Value};
//!
//! let ty: Micheline = serde_json::from_str(
//!     r#"{"prim": "pair", "args": [{"prim": "nat", "annots": ["%n"]}, {"prim": "string"}]}"#,
//! ).unwrap();
//! let data = Micheline::pair(Micheline::int(3), Micheline::string("x"));
//! let value = Schema::new(ty).execute(&data).unwrap();
//! assert_eq!(
//!     value,
//!     Value::Record(vec![
//!         ("n".to_string(), Value::Int(3.into())),
//!         ("1".to_string(), Value::String("x".to_string())),
//!     ])
//! );
//! ```

use crate::encoding::{self, EncodingError};
use crate::micheline::{split_comb, Micheline};
use num::bigint::Sign;
use num::BigInt;
use rustc_hex::ToHex;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Decoded Michelson value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// `unit`
    Unit,
    /// `bool`
    Bool(bool),
    /// `int`, `nat`, `mutez`, `bls12_381_fr`, `sapling_state` id
    Int(BigInt),
    /// `string` and every base58 identifier; `timestamp` in RFC3339 form
    String(String),
    /// `bytes` and other opaque binary values
    Bytes(Vec<u8>),
    /// `option`
    Option(Option<Box<Value>>),
    /// Flattened comb of `pair`s, in field order
    Record(Vec<(String, Value)>),
    /// Flattened branch of `or`s: label and payload
    Variant(String, Box<Value>),
    /// `list` or `set`
    List(Vec<Value>),
    /// `map` or `big_map` literal
    Map(Vec<(Value, Value)>),
    /// `big_map` reference by id
    BigMap(BigInt),
    /// `lambda` code, kept as is
    Lambda(Micheline),
}

impl Value {
    pub fn get(&self, field: &str) -> Option<&Value> {
        //! Record field by name.
        match self {
            Self::Record(fields) => fields.iter().find(|(k, _)| k == field).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        //! String payload, if any.
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        //! Integer payload, if any.
        match self {
            Self::Int(i) | Self::BigMap(i) => Some(i),
            _ => None,
        }
    }
}

struct MapEntry<'a>(&'a Value, &'a Value);

impl Serialize for MapEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("key", self.0)?;
        map.serialize_entry("value", self.1)?;
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unit | Self::Option(None) => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) | Self::BigMap(i) => serializer.serialize_str(&i.to_string()),
            Self::String(s) => serializer.serialize_str(s),
            Self::Bytes(b) => serializer.serialize_str(&b.to_hex::<String>()),
            Self::Option(Some(v)) => v.serialize(serializer),
            Self::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Variant(label, v) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(label, v)?;
                map.end()
            }
            Self::List(items) => items.serialize(serializer),
            Self::Map(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for (k, v) in entries {
                    seq.serialize_element(&MapEntry(k, v))?;
                }
                seq.end()
            }
            Self::Lambda(code) => code.serialize(serializer),
        }
    }
}

/// Decoding failures.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SchemaError {
    /// Type descriptor is malformed or unsupported.
    InvalidType(String),
    /// Data does not match the schema.
    Mismatch {
        /// Type being decoded
        expected: String,
        /// What was found instead
        got: String,
    },
    /// Identifier in binary form could not be converted.
    Encoding(EncodingError),
    /// Script has no `storage` section.
    MissingStorage,
}

impl std::error::Error for SchemaError {}
impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidType(t) => write!(f, "Invalid type: {t}"),
            Self::Mismatch { expected, got } => {
                write!(f, "Cannot decode {got} as {expected}")
            }
            Self::Encoding(e) => write!(f, "Invalid identifier: {e}"),
            Self::MissingStorage => f.write_str("Script has no storage section"),
        }
    }
}

impl From<EncodingError> for SchemaError {
    fn from(value: EncodingError) -> Self {
        Self::Encoding(value)
    }
}

/// Convenience alias for a result of fallible decoding.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Decoder for values of a single Michelson type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    ty: Micheline,
}

impl Schema {
    pub fn new(ty: Micheline) -> Self {
        //! Build a schema for the given type.
        Self { ty }
    }

    pub fn from_script_code(code: &Micheline) -> SchemaResult<Self> {
        //! Build a schema of contract storage from the `code` part of a script.
        match code {
            Micheline::Seq(sections) => sections
                .iter()
                .find(|s| s.is_prim("storage"))
                .and_then(|s| s.args().first())
                .map(|ty| Self::new(ty.clone()))
                .ok_or(SchemaError::MissingStorage),
            other => Err(SchemaError::InvalidType(other.kind())),
        }
    }

    pub fn ty(&self) -> &Micheline {
        //! Underlying type.
        &self.ty
    }

    pub fn execute(&self, data: &Micheline) -> SchemaResult<Value> {
        //! Decode data of this schema's type.
        decode(data, &self.ty)
    }
}

fn mismatch(ty: &Micheline, data: &Micheline) -> SchemaError {
    SchemaError::Mismatch {
        expected: ty.prim_name().unwrap_or("?").to_string(),
        got: data.kind(),
    }
}

fn type_arg(ty: &Micheline, index: usize) -> SchemaResult<&Micheline> {
    ty.args()
        .get(index)
        .ok_or_else(|| SchemaError::InvalidType(format!("{} needs argument {index}", ty.kind())))
}

fn identifier<F>(data: &Micheline, ty: &Micheline, from_bytes: F) -> SchemaResult<Value>
where
    F: FnOnce(&[u8]) -> Result<String, EncodingError>,
{
    match data {
        Micheline::String(s) => Ok(Value::String(s.clone())),
        Micheline::Bytes(b) => Ok(Value::String(from_bytes(b)?)),
        _ => Err(mismatch(ty, data)),
    }
}

fn decode_items(data: &Micheline, ty: &Micheline) -> SchemaResult<Value> {
    let item_ty = type_arg(ty, 0)?;
    match data {
        Micheline::Seq(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| decode(item, item_ty))
                .collect::<SchemaResult<_>>()?,
        )),
        _ => Err(mismatch(ty, data)),
    }
}

fn decode_map(data: &Micheline, ty: &Micheline) -> SchemaResult<Value> {
    let (key_ty, value_ty) = (type_arg(ty, 0)?, type_arg(ty, 1)?);
    let Micheline::Seq(items) = data else {
        return Err(mismatch(ty, data));
    };
    items
        .iter()
        .map(|item| match item {
            Micheline::Prim { prim, args, .. } if prim == "Elt" && args.len() == 2 => {
                Ok((decode(&args[0], key_ty)?, decode(&args[1], value_ty)?))
            }
            _ => Err(mismatch(ty, item)),
        })
        .collect::<SchemaResult<_>>()
        .map(Value::Map)
}

fn is_flattened(ty: &Micheline, prim: &str) -> bool {
    ty.is_prim(prim) && ty.field_annot().is_none()
}

fn collect_fields(
    data: &Micheline,
    ty: &Micheline,
    fields: &mut Vec<(String, Value)>,
) -> SchemaResult<()> {
    let (left_ty, right_ty) = split_comb(ty, "pair")
        .ok_or_else(|| SchemaError::InvalidType("pair needs two arguments".to_string()))?;
    let (left, right) = split_comb(data, "Pair").ok_or_else(|| mismatch(ty, data))?;
    for (value, value_ty) in [(left, left_ty), (&right, &right_ty)] {
        if is_flattened(value_ty, "pair") {
            collect_fields(value, value_ty, fields)?;
        } else {
            let label = value_ty
                .field_annot()
                .map_or_else(|| fields.len().to_string(), str::to_string);
            fields.push((label, decode(value, value_ty)?));
        }
    }
    Ok(())
}

fn count_branches(ty: &Micheline) -> usize {
    match ty.args() {
        [left, right] if ty.is_prim("or") => {
            let size = |t: &Micheline| {
                if is_flattened(t, "or") {
                    count_branches(t)
                } else {
                    1
                }
            };
            size(left) + size(right)
        }
        _ => 1,
    }
}

fn decode_or(data: &Micheline, ty: &Micheline, offset: usize) -> SchemaResult<Value> {
    let (left_ty, right_ty) = (type_arg(ty, 0)?, type_arg(ty, 1)?);
    let (branch_ty, payload, offset) = match data {
        Micheline::Prim { prim, args, .. } if prim == "Left" && args.len() == 1 => {
            (left_ty, &args[0], offset)
        }
        Micheline::Prim { prim, args, .. } if prim == "Right" && args.len() == 1 => {
            let skipped = if is_flattened(left_ty, "or") {
                count_branches(left_ty)
            } else {
                1
            };
            (right_ty, &args[0], offset + skipped)
        }
        _ => return Err(mismatch(ty, data)),
    };
    if is_flattened(branch_ty, "or") {
        decode_or(payload, branch_ty, offset)
    } else {
        let label = branch_ty
            .field_annot()
            .map_or_else(|| offset.to_string(), str::to_string);
        Ok(Value::Variant(label, Box::new(decode(payload, branch_ty)?)))
    }
}

fn decode_timestamp(data: &Micheline, ty: &Micheline) -> SchemaResult<Value> {
    match data {
        Micheline::String(s) => Ok(Value::String(s.clone())),
        Micheline::Int(seconds) => {
            let seconds = i64::try_from(seconds).map_err(|_| mismatch(ty, data))?;
            chrono::DateTime::from_timestamp(seconds, 0)
                .map(|t| Value::String(t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)))
                .ok_or_else(|| mismatch(ty, data))
        }
        _ => Err(mismatch(ty, data)),
    }
}

fn decode(data: &Micheline, ty: &Micheline) -> SchemaResult<Value> {
    let name = ty
        .prim_name()
        .ok_or_else(|| SchemaError::InvalidType(ty.kind()))?;
    match (name, data) {
        ("int", Micheline::Int(i)) => Ok(Value::Int(i.clone())),
        ("nat" | "mutez", Micheline::Int(i)) if i.sign() != Sign::Minus => {
            Ok(Value::Int(i.clone()))
        }
        ("string", Micheline::String(s)) => Ok(Value::String(s.clone())),
        (
            "bytes" | "bls12_381_g1" | "bls12_381_g2" | "chest" | "chest_key"
            | "sapling_transaction" | "sapling_transaction_deprecated",
            Micheline::Bytes(b),
        ) => Ok(Value::Bytes(b.clone())),
        ("bls12_381_fr", Micheline::Int(i)) => Ok(Value::Int(i.clone())),
        ("bls12_381_fr", Micheline::Bytes(b)) => Ok(Value::Bytes(b.clone())),
        ("sapling_state", Micheline::Int(i)) => Ok(Value::Int(i.clone())),
        ("bool", Micheline::Prim { prim, .. }) if prim == "True" => Ok(Value::Bool(true)),
        ("bool", Micheline::Prim { prim, .. }) if prim == "False" => Ok(Value::Bool(false)),
        ("unit", Micheline::Prim { prim, .. }) if prim == "Unit" => Ok(Value::Unit),
        ("address" | "contract", _) => identifier(data, ty, encoding::address_from_bytes),
        ("key_hash", _) => identifier(data, ty, encoding::key_hash_from_bytes),
        ("key", _) => identifier(data, ty, encoding::public_key_from_bytes),
        ("signature", _) => identifier(data, ty, encoding::signature_from_bytes),
        ("chain_id", _) => identifier(data, ty, encoding::chain_id_from_bytes),
        ("timestamp", _) => decode_timestamp(data, ty),
        ("option", Micheline::Prim { prim, args, .. }) => match (prim.as_str(), args.as_slice()) {
            ("None", []) => Ok(Value::Option(None)),
            ("Some", [value]) => Ok(Value::Option(Some(Box::new(decode(value, type_arg(ty, 0)?)?)))),
            _ => Err(mismatch(ty, data)),
        },
        ("pair", _) => {
            let mut fields = vec![];
            collect_fields(data, ty, &mut fields)?;
            Ok(Value::Record(fields))
        }
        ("or", _) => decode_or(data, ty, 0),
        ("list" | "set", _) => decode_items(data, ty),
        ("map", _) => decode_map(data, ty),
        ("big_map", Micheline::Int(id)) => Ok(Value::BigMap(id.clone())),
        ("big_map", _) => decode_map(data, ty),
        ("lambda", Micheline::Seq(_) | Micheline::Prim { .. }) => Ok(Value::Lambda(data.clone())),
        ("ticket", _) => {
            let content_ty = type_arg(ty, 0)?;
            let ticket_ty = Micheline::prim_with_args(
                "pair",
                vec![
                    Micheline::prim("address").with_annots(["%ticketer"]),
                    content_ty.clone().with_annots(["%value"]),
                    Micheline::prim("nat").with_annots(["%amount"]),
                ],
            );
            decode(data, &ticket_ty)
        }
        ("operation" | "never", _) => Err(SchemaError::InvalidType(name.to_string())),
        _ => Err(mismatch(ty, data)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ty(json: &str) -> Micheline {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_or_labels() {
        let t = ty(r#"{"prim":"or","args":[
            {"prim":"nat"},
            {"prim":"or","args":[{"prim":"string","annots":["%s"]},{"prim":"unit"}]}
        ]}"#);
        let schema = Schema::new(t);
        assert_eq!(
            schema.execute(&ty(r#"{"prim":"Left","args":[{"int":"1"}]}"#)).unwrap(),
            Value::Variant("0".to_string(), Box::new(Value::Int(1.into())))
        );
        assert_eq!(
            schema
                .execute(&ty(r#"{"prim":"Right","args":[{"prim":"Left","args":[{"string":"a"}]}]}"#))
                .unwrap(),
            Value::Variant("s".to_string(), Box::new(Value::String("a".to_string())))
        );
        assert_eq!(
            schema
                .execute(&ty(r#"{"prim":"Right","args":[{"prim":"Right","args":[{"prim":"Unit"}]}]}"#))
                .unwrap(),
            Value::Variant("2".to_string(), Box::new(Value::Unit))
        );
    }

    #[test]
    fn test_count_branches() {
        let nested = ty(r#"{"prim":"or","args":[
            {"prim":"or","args":[{"prim":"nat"},{"prim":"int"}]},
            {"prim":"or","args":[{"prim":"nat"},{"prim":"int"}],"annots":["%named"]}
        ]}"#);
        assert_eq!(count_branches(&nested), 3);
    }

    #[test]
    fn test_timestamp() {
        let t = Micheline::prim("timestamp");
        assert_eq!(
            decode(&Micheline::int(60), &t).unwrap(),
            Value::String("1970-01-01T00:01:00Z".to_string())
        );
        assert_eq!(
            decode(&Micheline::string("2024-01-01T00:00:00Z"), &t).unwrap(),
            Value::String("2024-01-01T00:00:00Z".to_string())
        );
    }
}
