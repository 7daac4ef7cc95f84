//! Big-map value lookup.
//!
//! Nodes index big-map entries by the script expression hash of the packed
//! key, so a lookup is:
//!
//! 1. pack the key against the key type,
//! 2. hash the packed bytes into an `expr...` expression,
//! 3. fetch the entry bound to this expression,
//! 4. decode it against the value type, if one was given.
//!
//! Missing keys are reported by the node as 404 and end up as
//! [`BigMapValue::Absent`], which is distinct from a present value that
//! happens to be empty (`None`, `{}`, ...).

use crate::encoding::expr_hash;
use crate::micheline::Micheline;
use crate::pack::{pack, PackResult};
use crate::schema::Value;

/// Outcome of a big-map lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BigMapValue {
    /// Value as returned by the node (no value type given).
    Raw(Micheline),
    /// Value decoded against the value type.
    Decoded(Value),
    /// No entry for this key.
    Absent,
}

impl BigMapValue {
    pub const fn is_absent(&self) -> bool {
        //! Whether the key was missing.
        matches!(self, Self::Absent)
    }

    pub const fn raw(&self) -> Option<&Micheline> {
        //! Raw tree, if the lookup was done without a value type.
        match self {
            Self::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    pub const fn decoded(&self) -> Option<&Value> {
        //! Decoded value, if the lookup was done with a value type.
        match self {
            Self::Decoded(value) => Some(value),
            _ => None,
        }
    }
}

pub fn key_expression(key: &Micheline, key_type: &Micheline) -> PackResult<String> {
    //! Script expression hash (`expr...`) under which a key is stored.
    Ok(expr_hash(&pack(key, Some(key_type))?))
}

#[cfg(feature = "http")]
pub async fn lookup(
    node: &crate::network::TezosNode,
    big_map_id: &num::BigUint,
    key: &Micheline,
    key_type: &Micheline,
    value_type: Option<&Micheline>,
) -> crate::network::AResult<BigMapValue> {
    //! Resolve a key of a big map into its value.
    //!
    //! Performs exactly one RPC request. Only a 404 from the node becomes
    //! [`BigMapValue::Absent`]; any other failure is returned as is.
    let expr = key_expression(key, key_type)?;
    tracing::debug!(%big_map_id, %expr, "Big map lookup");
    let Some(raw) = node.fetch_big_map_value(big_map_id, &expr).await? else {
        return Ok(BigMapValue::Absent);
    };
    match value_type {
        Some(ty) => {
            let schema = crate::schema::Schema::new(ty.clone());
            Ok(BigMapValue::Decoded(schema.execute(&raw)?))
        }
        None => Ok(BigMapValue::Raw(raw)),
    }
}
