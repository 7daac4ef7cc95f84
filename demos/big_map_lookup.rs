//! Network communication requires `http` crate feature.
//!
//! This example reads a big map on ghostnet: once raw, once decoded, and
//! once for a key that is not there. Run with `RUST_LOG=tezos_devkit=debug`
//! to see every RPC request.

use tezos_devkit::dapp::Dapp;
use tezos_devkit::network::{AResult, TezosNode};
use tezos_devkit::{BigMapValue, Micheline};
use tracing_subscriber::EnvFilter;

const BIG_MAP_ID: u32 = 225028;

async fn show(dapp: &Dapp, key: u32, value_type: Option<&Micheline>) -> AResult<()> {
    let value = dapp
        .get_big_map_value(
            &BIG_MAP_ID.into(),
            &Micheline::int(key),
            &Micheline::prim("nat"),
            value_type,
        )
        .await?;
    match value {
        BigMapValue::Raw(raw) => println!("{key}: raw {}", serde_json::to_string(&raw)?),
        BigMapValue::Decoded(value) => {
            println!("{key}: decoded {}", serde_json::to_string(&value)?)
        }
        BigMapValue::Absent => println!("{key}: absent"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> AResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dapp = Dapp::new(TezosNode::ghostnet());
    show(&dapp, 2, None).await?;
    show(&dapp, 2, Some(&Micheline::prim("string"))).await?;
    show(&dapp, 3, Some(&Micheline::prim("string"))).await?;
    Ok(())
}
