//! Micheline: the tree notation of Michelson values and types.
//!
//! Values and type descriptors share a single representation:
//!
//! - integers (`{"int": "42"}`),
//! - strings (`{"string": "foo"}`),
//! - byte strings (`{"bytes": "0a0b"}`),
//! - primitive applications (`{"prim": "Pair", "args": [...], "annots": [...]}`),
//! - sequences (`[...]`).
//!
//! The JSON form above is what Tezos nodes accept and return, and [`Micheline`]
//! (de)serializes to exactly that form, omitting empty `args` and `annots`.
//!
//! ```rust
//! use tezos_devkit::micheline::Micheline;
//!
//! let key: Micheline = serde_json::from_str(r#"{"int": "2"}"#).unwrap();
//! assert_eq!(key, Micheline::int(2));
//! let ty: Micheline = serde_json::from_str(r#"{"prim": "nat", "annots": []}"#).unwrap();
//! assert_eq!(ty, Micheline::prim("nat"));
//! assert_eq!(serde_json::to_string(&Micheline::string("mystr")).unwrap(), r#"{"string":"mystr"}"#);
//! ```

use num::BigInt;
use serde::{Deserialize, Serialize};

/// A Micheline expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Repr", into = "Repr")]
pub enum Micheline {
    /// Arbitrary precision integer.
    Int(BigInt),
    /// String literal.
    String(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Primitive application: data constructor, type or instruction.
    Prim {
        /// Primitive name (`Pair`, `nat`, `DUP`, ...)
        prim: String,
        /// Arguments, possibly empty.
        args: Vec<Micheline>,
        /// Annotations, including their sigil (`%foo`, `:bar`, `@baz`).
        annots: Vec<String>,
    },
    /// Sequence of expressions.
    Seq(Vec<Micheline>),
}

#[serde_with::serde_as]
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Repr {
    Int {
        #[serde_as(as = "serde_with::DisplayFromStr")]
        int: BigInt,
    },
    String {
        string: String,
    },
    Bytes {
        #[serde_as(as = "serde_with::hex::Hex")]
        bytes: Vec<u8>,
    },
    Prim {
        prim: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Micheline>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        annots: Vec<String>,
    },
    Seq(Vec<Micheline>),
}

impl From<Repr> for Micheline {
    fn from(value: Repr) -> Self {
        match value {
            Repr::Int { int } => Self::Int(int),
            Repr::String { string } => Self::String(string),
            Repr::Bytes { bytes } => Self::Bytes(bytes),
            Repr::Prim { prim, args, annots } => Self::Prim { prim, args, annots },
            Repr::Seq(items) => Self::Seq(items),
        }
    }
}

impl From<Micheline> for Repr {
    fn from(value: Micheline) -> Self {
        match value {
            Micheline::Int(int) => Self::Int { int },
            Micheline::String(string) => Self::String { string },
            Micheline::Bytes(bytes) => Self::Bytes { bytes },
            Micheline::Prim { prim, args, annots } => Self::Prim { prim, args, annots },
            Micheline::Seq(items) => Self::Seq(items),
        }
    }
}

impl Micheline {
    pub fn int<T: Into<BigInt>>(value: T) -> Self {
        //! Integer literal.
        Self::Int(value.into())
    }

    pub fn string<S: Into<String>>(value: S) -> Self {
        //! String literal.
        Self::String(value.into())
    }

    pub fn bytes<B: Into<Vec<u8>>>(value: B) -> Self {
        //! Bytes literal.
        Self::Bytes(value.into())
    }

    pub fn prim<S: Into<String>>(name: S) -> Self {
        //! Primitive without arguments and annotations.
        Self::prim_with_args(name, vec![])
    }

    pub fn prim_with_args<S: Into<String>>(name: S, args: Vec<Micheline>) -> Self {
        //! Primitive with arguments and without annotations.
        Self::Prim {
            prim: name.into(),
            args,
            annots: vec![],
        }
    }

    #[must_use]
    pub fn with_annots<S: Into<String>, I: IntoIterator<Item = S>>(self, annots: I) -> Self {
        //! Replace annotations of a primitive. Other nodes are returned unchanged.
        match self {
            Self::Prim { prim, args, .. } => Self::Prim {
                prim,
                args,
                annots: annots.into_iter().map(Into::into).collect(),
            },
            other => other,
        }
    }

    pub fn pair(left: Micheline, right: Micheline) -> Self {
        //! `Pair left right` data constructor.
        Self::prim_with_args("Pair", vec![left, right])
    }

    pub fn unit() -> Self {
        //! `Unit` data constructor.
        Self::prim("Unit")
    }

    pub fn prim_name(&self) -> Option<&str> {
        //! Name of the primitive, if this node is one.
        match self {
            Self::Prim { prim, .. } => Some(prim),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Micheline] {
        //! Primitive arguments (empty for other nodes).
        match self {
            Self::Prim { args, .. } => args,
            _ => &[],
        }
    }

    pub fn annots(&self) -> &[String] {
        //! Primitive annotations (empty for other nodes).
        match self {
            Self::Prim { annots, .. } => annots,
            _ => &[],
        }
    }

    pub fn field_annot(&self) -> Option<&str> {
        //! First field annotation (`%name`) without its sigil.
        self.annots().iter().find_map(|a| a.strip_prefix('%'))
    }

    pub fn is_prim(&self, name: &str) -> bool {
        //! Check whether this is a primitive with the given name.
        self.prim_name() == Some(name)
    }

    pub(crate) fn kind(&self) -> String {
        // Short description used in error messages.
        match self {
            Self::Int(_) => "int literal".to_string(),
            Self::String(_) => "string literal".to_string(),
            Self::Bytes(_) => "bytes literal".to_string(),
            Self::Prim { prim, .. } => format!("primitive {prim}"),
            Self::Seq(_) => "sequence".to_string(),
        }
    }
}

/// Split the right comb of a pair into its head and tail.
///
/// Accepts `Pair a b`, n-ary `Pair a b c ...` and sequences `{a; b; c}` for
/// values, and the same shapes of `pair` for types. The tail of an n-ary comb
/// is rebuilt as a binary node with the same primitive name. Returns [`None`]
/// if the node is not a comb of at least two elements.
pub(crate) fn split_comb<'a>(node: &'a Micheline, prim: &str) -> Option<(&'a Micheline, Micheline)> {
    let items = match node {
        Micheline::Prim { prim: p, args, .. } if p == prim => args.as_slice(),
        Micheline::Seq(items) if prim == "Pair" => items.as_slice(),
        _ => return None,
    };
    match items {
        [] | [_] => None,
        [head, tail] => Some((head, tail.clone())),
        [head, rest @ ..] => Some((head, Micheline::prim_with_args(prim, rest.to_vec()))),
    }
}
