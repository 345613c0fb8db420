//! Packing a small `BASE` table, split into its subtables.

use pretty_assertions::assert_eq;
use table_repack::{
    repack, repack_with_tag, types::Tag, GraphBuilder, Link, ObjectId, ObjectLinks, OffsetLen,
};

const BASE: Tag = Tag::new(b"BASE");

/// The subtables of the table, with all offsets zeroed.
///
/// The order is deliberately not the order they are written in: the
/// vertical axis comes before the horizontal one, and the vertical
/// `BaseValues` and one of its coordinates are at the end.
fn subtables() -> Vec<Vec<u8>> {
    vec![
        // 0: header: version 1.0, horizAxisOffset, vertAxisOffset
        vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        // 1: vertical Axis: baseTagListOffset, baseScriptListOffset
        vec![0x00, 0x00, 0x00, 0x00],
        // 2: vertical BaseTagList: ['ideo']
        vec![0x00, 0x01, b'i', b'd', b'e', b'o'],
        // 3: vertical BaseScriptList: ['hani']
        vec![0x00, 0x01, b'h', b'a', b'n', b'i', 0x00, 0x00],
        // 4: vertical BaseScript: baseValuesOffset, no minmax, no langsys
        vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        // 5: horizontal Axis
        vec![0x00, 0x00, 0x00, 0x00],
        // 6: horizontal BaseTagList: ['hang', 'romn']
        vec![0x00, 0x02, b'h', b'a', b'n', b'g', b'r', b'o', b'm', b'n'],
        // 7: horizontal BaseScriptList: ['latn']
        vec![0x00, 0x01, b'l', b'a', b't', b'n', 0x00, 0x00],
        // 8: horizontal BaseScript
        vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        // 9: horizontal BaseValues: default index 1, two coords
        vec![0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00],
        // 10: BaseCoord format 1, -120
        vec![0x00, 0x01, 0xff, 0x88],
        // 11: BaseCoord format 1, 0
        vec![0x00, 0x01, 0x00, 0x00],
        // 12: not referenced by anything
        vec![0xde, 0xad, 0xbe, 0xef],
        // 13: vertical BaseValues: default index 0, one coord
        vec![0x00, 0x00, 0x00, 0x01, 0x00, 0x00],
        // 14: BaseCoord format 1, -200
        vec![0x00, 0x01, 0xff, 0x38],
    ]
}

fn links() -> Vec<ObjectLinks> {
    let raw: [&[(u32, u8, u32)]; 15] = [
        &[(4, 2, 5), (6, 2, 1)],
        &[(0, 2, 2), (2, 2, 3)],
        &[],
        &[(6, 2, 4)],
        &[(0, 2, 13)],
        &[(0, 2, 6), (2, 2, 7)],
        &[],
        &[(6, 2, 8)],
        &[(0, 2, 9)],
        &[(4, 2, 10), (6, 2, 11)],
        &[],
        &[],
        &[],
        &[(4, 2, 14)],
        &[],
    ];
    raw.iter()
        .map(|links| ObjectLinks::from_raw(links).unwrap())
        .collect()
}

/// Derived by hand from the placement order: depth-first by link position,
/// unreferenced subtables last.
#[rustfmt::skip]
const EXPECTED: &[u8] = &[
    // header
    0x00, 0x01, 0x00, 0x00, 0x00, 0x08, 0x00, 0x34,
    // horizontal Axis @ 8
    0x00, 0x04, 0x00, 0x0e,
    // BaseTagList @ 12
    0x00, 0x02, b'h', b'a', b'n', b'g', b'r', b'o', b'm', b'n',
    // BaseScriptList @ 22
    0x00, 0x01, b'l', b'a', b't', b'n', 0x00, 0x08,
    // BaseScript @ 30
    0x00, 0x06, 0x00, 0x00, 0x00, 0x00,
    // BaseValues @ 36
    0x00, 0x01, 0x00, 0x02, 0x00, 0x08, 0x00, 0x0c,
    // BaseCoords @ 44, 48
    0x00, 0x01, 0xff, 0x88,
    0x00, 0x01, 0x00, 0x00,
    // vertical Axis @ 52
    0x00, 0x04, 0x00, 0x0a,
    // BaseTagList @ 56
    0x00, 0x01, b'i', b'd', b'e', b'o',
    // BaseScriptList @ 62
    0x00, 0x01, b'h', b'a', b'n', b'i', 0x00, 0x08,
    // BaseScript @ 70
    0x00, 0x06, 0x00, 0x00, 0x00, 0x00,
    // BaseValues @ 76
    0x00, 0x00, 0x00, 0x01, 0x00, 0x06,
    // BaseCoord @ 82
    0x00, 0x01, 0xff, 0x38,
    // unreferenced @ 86
    0xde, 0xad, 0xbe, 0xef,
];

#[test]
fn pack_base_table() {
    let _ = env_logger::builder().is_test(true).try_init();
    let packed = repack(&subtables(), &links()).unwrap();
    assert_eq!(packed, EXPECTED);
}

#[test]
fn pack_base_table_with_tag() {
    let packed = repack_with_tag(BASE, &subtables(), &links()).unwrap();
    assert_eq!(packed, EXPECTED);
}

#[test]
fn placeholders_are_overwritten() {
    let mut subtables = subtables();
    let links = links();
    for (bytes, links) in subtables.iter_mut().zip(&links) {
        for link in &links.links {
            let start = link.position as usize;
            bytes[start..start + link.width.width()].fill(0xff);
        }
    }
    assert_eq!(repack(&subtables, &links).unwrap(), EXPECTED);
}

#[test]
fn reversed_link_lists() {
    let mut links = links();
    links.iter_mut().for_each(|links| links.links.reverse());
    assert_eq!(repack(&subtables(), &links).unwrap(), EXPECTED);
}

#[test]
fn builder_matches_slices() {
    let mut builder = GraphBuilder::with_tag(BASE);
    let ids = subtables()
        .into_iter()
        .map(|bytes| builder.add_object(bytes))
        .collect::<Vec<_>>();
    for (from, links) in ids.iter().zip(links()) {
        for Link {
            position,
            width,
            target,
            ..
        } in links.links
        {
            builder.add_link(*from, position, width, target);
        }
    }
    let graph = builder.build().unwrap();
    assert_eq!(graph.len(), 15);
    assert_eq!(graph.tag(), Some(BASE));
    assert_eq!(graph.pack().unwrap(), EXPECTED);
}

#[test]
fn vertical_axis_out_of_reach() {
    let mut subtables = subtables();
    // the last horizontal coordinate pushes the vertical axis out of reach
    subtables[11].resize(70_000, 0);
    let Err(err) = repack_with_tag(BASE, &subtables, &links()) else {
        panic!("vertical axis should be out of range");
    };
    assert_eq!(
        err.to_string(),
        "Packing 'BASE' failed with 1 overflows",
        "{err:?}"
    );
    let table_repack::RepackError::OffsetOverflow(err) = err else {
        unreachable!()
    };
    let overflow = &err.overflows()[0];
    assert_eq!(overflow.parent, ObjectId::ROOT);
    assert_eq!(overflow.child, ObjectId::new(1));
    assert_eq!(overflow.offset_len, OffsetLen::Offset16);
    assert_eq!(overflow.distance, 48 + 70_000);
}
