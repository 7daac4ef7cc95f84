use rustc_hex::{FromHex, ToHex};
use tezos_devkit::big_map::key_expression;
use tezos_devkit::encoding::expr_hash;
use tezos_devkit::pack::{pack, PackError};
use tezos_devkit::{blake2b, Micheline};

fn decode_hex(hex: &str) -> Vec<u8> {
    hex.from_hex().unwrap()
}

fn nat() -> Micheline {
    Micheline::prim("nat")
}

fn packed_hex(data: &Micheline, ty: &Micheline) -> String {
    pack(data, Some(ty)).unwrap().to_hex()
}

#[test]
fn test_pack_nat() {
    assert_eq!(
        &pack(&Micheline::int(2), Some(&nat())).unwrap()[..],
        &decode_hex("050002")[..]
    );
    // Same result on every call.
    assert_eq!(
        pack(&Micheline::int(2), Some(&nat())).unwrap(),
        pack(&Micheline::int(2), Some(&nat())).unwrap()
    );
}

#[test]
fn test_hash_packed() {
    let packed = pack(&Micheline::int(2), Some(&nat())).unwrap();
    assert_eq!(
        blake2b(&packed).to_hex::<String>(),
        "5d2525095b5382da2c9c295a739a189382cfaa2ebfa54e320d15bc6f178d6820"
    );
    assert_eq!(
        expr_hash(&packed),
        "expruDuAZnFKqmLoisJqUGqrNzXTvw7PJM2rYk97JErM5FHCerQqgn"
    );
}

#[test]
fn test_pack_string() {
    assert_eq!(
        packed_hex(&Micheline::string("mystr"), &Micheline::prim("string")),
        "0501000000056d79737472"
    );
    // Untyped packing encodes the tree as is.
    assert_eq!(
        pack(&Micheline::string("mystr"), None).unwrap().to_hex::<String>(),
        "0501000000056d79737472"
    );
}

#[test]
fn test_type_mismatch() {
    assert!(matches!(
        pack(&Micheline::string("2"), Some(&nat())),
        Err(PackError::TypeMismatch { .. })
    ));
    assert!(matches!(
        pack(&Micheline::int(-1), Some(&nat())),
        Err(PackError::TypeMismatch { .. })
    ));
    assert!(key_expression(&Micheline::string("2"), &nat()).is_err());
}

#[test]
fn test_not_packable() {
    let ty = Micheline::prim_with_args("big_map", vec![nat(), nat()]);
    assert_eq!(
        pack(&Micheline::int(1), Some(&ty)),
        Err(PackError::NotPackable("big_map".to_string()))
    );
}

#[test]
fn test_pack_pairs() {
    let ty = Micheline::prim_with_args("pair", vec![nat(), nat()]);
    assert_eq!(
        packed_hex(&Micheline::pair(Micheline::int(1), Micheline::int(2)), &ty),
        "05070700010002"
    );

    // N-ary pairs pack as right combs, for data and type alike.
    let nested = Micheline::pair(
        Micheline::int(1),
        Micheline::pair(Micheline::int(2), Micheline::int(3)),
    );
    let flat = Micheline::prim_with_args(
        "Pair",
        vec![Micheline::int(1), Micheline::int(2), Micheline::int(3)],
    );
    let seq = Micheline::Seq(vec![Micheline::int(1), Micheline::int(2), Micheline::int(3)]);
    let flat_ty = Micheline::prim_with_args("pair", vec![nat(), nat(), nat()]);
    let nested_ty = Micheline::prim_with_args(
        "pair",
        vec![nat(), Micheline::prim_with_args("pair", vec![nat(), nat()])],
    );
    let expected = packed_hex(&nested, &nested_ty);
    assert_eq!(expected, "0507070001070700020003");
    assert_eq!(packed_hex(&flat, &flat_ty), expected);
    assert_eq!(packed_hex(&flat, &nested_ty), expected);
    assert_eq!(packed_hex(&seq, &flat_ty), expected);
}

#[test]
fn test_pack_address() {
    let key = Micheline::string("tz1Lc2qBKEWCBeDU8npG6zCeCqpmaegRi6Jg");
    assert_eq!(
        packed_hex(&key, &Micheline::prim("address")),
        "050a0000001600000a9768ec413f25958a5a85269a11290493be68d2"
    );
    let bytes = Micheline::bytes(decode_hex("00000a9768ec413f25958a5a85269a11290493be68d2"));
    assert_eq!(
        packed_hex(&bytes, &Micheline::prim("address")),
        packed_hex(&key, &Micheline::prim("address"))
    );
    assert!(pack(&Micheline::string("tz1notanaddress"), Some(&Micheline::prim("address"))).is_err());
}

#[test]
fn test_pack_timestamp() {
    let ty = Micheline::prim("timestamp");
    assert_eq!(packed_hex(&Micheline::string("1970-01-01T00:00:00Z"), &ty), "050000");
    assert_eq!(packed_hex(&Micheline::string("1970-01-01T00:01:00Z"), &ty), "05003c");
    assert_eq!(packed_hex(&Micheline::int(60), &ty), "05003c");
    assert!(matches!(
        pack(&Micheline::string("yesterday"), Some(&ty)),
        Err(PackError::InvalidTimestamp(_))
    ));
}

#[test]
fn test_pack_option_and_list() {
    let option = Micheline::prim_with_args("option", vec![nat()]);
    let some = Micheline::prim_with_args("Some", vec![Micheline::int(1)]);
    assert_eq!(packed_hex(&some, &option), "0505090001");
    assert_eq!(packed_hex(&Micheline::prim("None"), &option), "050306");

    let list = Micheline::prim_with_args("list", vec![nat()]);
    let items = Micheline::Seq(vec![Micheline::int(1), Micheline::int(2)]);
    assert_eq!(packed_hex(&items, &list), "05020000000400010002");
}

#[test]
fn test_pack_identifiers() {
    let cases = [
        (
            "key_hash",
            "tz1Lc2qBKEWCBeDU8npG6zCeCqpmaegRi6Jg",
            "050a00000015000a9768ec413f25958a5a85269a11290493be68d2".to_string(),
        ),
        (
            "key",
            "edpkteDwHwoNPB18tKToFKeSCykvr1ExnoMV5nawTJy9Y9nLTfQ541",
            format!("050a00000021{}", "00".repeat(33)),
        ),
        (
            "signature",
            "sigMzJ4GVAvXEd2RjsKGfG2H9QvqTSKCZsuB2KiHbZRGFz72XgF6KaKADznh674fQgBatxw3xdHqTtMHUZAGRprxy64wg1aq",
            format!("050a00000040{}", "00".repeat(64)),
        ),
        (
            "signature",
            "edsigtXomBKi5CTRf5cjATJWSyaRvhfYNHqSUGrn4SdbYRcGwQrUGjzEfQDTuqHhuA8b2d8NarZjz8TRf65WkpQmo423BtomS8Q",
            format!("050a00000040{}", "00".repeat(64)),
        ),
        (
            "chain_id",
            "NetXdQprcVkpaWU",
            "050a000000047a06a770".to_string(),
        ),
        (
            "contract",
            "KT1VR4Rc3ovru3ogpaRu9qtubNLiHQUq54c6%set_n",
            "050a0000001b01e4848e26de37cbac31a73bb1b8bdc5fa2af2b2c5007365745f6e".to_string(),
        ),
        (
            "contract",
            "KT1VR4Rc3ovru3ogpaRu9qtubNLiHQUq54c6%default",
            "050a0000001601e4848e26de37cbac31a73bb1b8bdc5fa2af2b2c500".to_string(),
        ),
    ];
    for (ty, text, expected) in cases {
        assert_eq!(
            packed_hex(&Micheline::string(text), &Micheline::prim(ty)),
            expected,
            "{text} as {ty}"
        );
    }
}

#[test]
fn test_pack_long_entrypoint() {
    let address = format!("KT1VR4Rc3ovru3ogpaRu9qtubNLiHQUq54c6%{}", "e".repeat(32));
    assert!(matches!(
        pack(&Micheline::string(address), Some(&Micheline::prim("address"))),
        Err(PackError::Encoding(_))
    ));
}

#[test]
fn test_pack_or_and_map() {
    let or = Micheline::prim_with_args("or", vec![nat(), Micheline::prim("string")]);
    let left = Micheline::prim_with_args("Left", vec![Micheline::int(1)]);
    assert_eq!(packed_hex(&left, &or), "0505050001");
    let right = Micheline::prim_with_args("Right", vec![Micheline::string("a")]);
    assert_eq!(packed_hex(&right, &or), "050508010000000161");
    // Branch payload is checked against its own type.
    let wrong = Micheline::prim_with_args("Left", vec![Micheline::string("a")]);
    assert!(pack(&wrong, Some(&or)).is_err());

    let map = Micheline::prim_with_args("map", vec![Micheline::prim("string"), nat()]);
    let items = Micheline::Seq(vec![Micheline::prim_with_args(
        "Elt",
        vec![Micheline::string("a"), Micheline::int(1)],
    )]);
    assert_eq!(packed_hex(&items, &map), "05020000000a07040100000001610001");
    let bad_item = Micheline::Seq(vec![Micheline::int(1)]);
    assert!(matches!(
        pack(&bad_item, Some(&map)),
        Err(PackError::TypeMismatch { .. })
    ));
}
