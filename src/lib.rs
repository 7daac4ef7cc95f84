#![doc(html_root_url = "https://docs.rs/tezos-devkit/0.1.0-beta.1")]
#![warn(rust_2018_idioms, missing_docs)]
#![deny(dead_code, unused_imports, unused_mut)]

//! Rust library to aid coding Tezos dapps: contract calls and originations,
//! storage and big-map reads, on-chain views, Michelson packing and hashing.
//!
//! The library talks to a node over its HTTP RPC and leaves signing to a
//! [`Wallet`](wallet::Wallet) implementation of your choice.
//!
//! ## Usage
//!
//! The most common read is a big-map lookup. Keys are packed against the key
//! type and hashed into the `expr...` identifier the node indexes entries by:
//!
//! ```rust
//! use tezos_devkit::big_map::key_expression;
//! use tezos_devkit::Micheline;
//!
//! let expr = key_expression(&Micheline::int(2), &Micheline::prim("nat")).unwrap();
//! assert_eq!(expr, "expruDuAZnFKqmLoisJqUGqrNzXTvw7PJM2rYk97JErM5FHCerQqgn");
//! ```
//!
//! With the `http` feature (enabled by default) the whole lookup is one call:
//!
//! ```rust,no_run
//! use tezos_devkit::dapp::Dapp;
//! use tezos_devkit::network::TezosNode;
//! use tezos_devkit::{BigMapValue, Micheline};
//!
//! # async fn lookup() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let dapp = Dapp::new(TezosNode::ghostnet());
//! let value = dapp
//!     .get_big_map_value(
//!         &225028u32.into(),
//!         &Micheline::int(2),
//!         &Micheline::prim("nat"),
//!         Some(&Micheline::prim("string")),
//!     )
//!     .await?;
//! match value {
//!     BigMapValue::Decoded(value) => println!("{}", serde_json::to_string(&value)?),
//!     BigMapValue::Absent => println!("no such key"),
//!     BigMapValue::Raw(raw) => println!("{raw:?}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Examples
//!
//! You can check out sample usage of this crate in the `demos/` folder in the
//! project repo.
//!
//! ### MSRV
//!
//! `tezos-devkit` promises to maintain a reasonable MSRV policy. MSRV will not be
//! bumped unless necessary, and such MSRV bumps will only happen in minor or major
//! releases as soon as the first non-beta release goes live.
//!
//! Currently it requires rust `1.75.0` or higher to build.
//!
//! ## License
//!
//! This project is licensed under the GNU General Public License v3.

pub mod big_map;
#[cfg(feature = "http")]
pub mod dapp;
pub mod encoding;
pub mod micheline;
#[cfg(feature = "http")]
pub mod network;
pub mod pack;
pub mod schema;
mod tez;
mod utils;
#[cfg(feature = "http")]
pub mod wallet;

pub use big_map::BigMapValue;
pub use encoding::Address;
pub use micheline::Micheline;
pub use pack::pack;
pub use schema::{Schema, Value};
pub use tez::Tez;
pub use utils::{blake2_256, blake2b};
