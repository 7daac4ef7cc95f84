//! Packing and hashing Michelson data offline.
//!
//! The same key packs differently depending on its type: an address packed as
//! `address` is stored in binary form, while packed as `string` it is not.

use rustc_hex::ToHex;
use tezos_devkit::big_map::key_expression;
use tezos_devkit::{blake2b, pack, Micheline};

fn demo_pack() {
    let key = Micheline::string("tz1Lc2qBKEWCBeDU8npG6zCeCqpmaegRi6Jg");
    for ty in ["address", "string"] {
        let ty = Micheline::prim(ty);
        let packed = pack(&key, Some(&ty)).expect("Key fits the type");
        println!("Packed as {ty:?}: {}", packed.to_hex::<String>());
        println!("  blake2b: {}", blake2b(&packed).to_hex::<String>());
        println!(
            "  expr: {}",
            key_expression(&key, &ty).expect("Key fits the type")
        );
    }

    let error = pack(&key, Some(&Micheline::prim("nat"))).unwrap_err();
    println!("Packed as nat: {error}");
}

fn main() {
    demo_pack();
}
