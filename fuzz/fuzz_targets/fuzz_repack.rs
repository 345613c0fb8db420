#![no_main]
//! Fuzzes repacking of arbitrary object graphs.
//!
//! Packing may fail, but it must never panic, and a successful packing must
//! preserve the total size and write every offset where it was asked to.

use libfuzzer_sys::{arbitrary, fuzz_target};
use table_repack::{Link, ObjectLinks, OffsetLen, RepackError};

const OBJECT_LIMIT: usize = 512;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzLink {
    position: u8,
    width: u8,
    target: u16,
    signed: bool,
}

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzObject {
    bytes: Vec<u8>,
    links: Vec<FuzzLink>,
    virtual_links: Vec<u16>,
}

fn to_links(object: &FuzzObject) -> Result<ObjectLinks, RepackError> {
    let links = object
        .links
        .iter()
        .map(|link| {
            let width = OffsetLen::try_from(link.width)?;
            let position = link.position as u32;
            let target = link.target as u32;
            Ok(if link.signed {
                Link::new_signed(position, width, target)
            } else {
                Link::new(position, width, target)
            })
        })
        .collect::<Result<Vec<_>, RepackError>>()?;
    Ok(ObjectLinks::new(links)
        .with_virtual_links(object.virtual_links.iter().map(|id| (*id as u32).into())))
}

fuzz_target!(|objects: Vec<FuzzObject>| {
    if objects.len() > OBJECT_LIMIT {
        return;
    }
    let Ok(links) = objects.iter().map(to_links).collect::<Result<Vec<_>, _>>() else {
        return;
    };
    let bytes = objects.iter().map(|obj| obj.bytes.as_slice()).collect::<Vec<_>>();

    if let Ok(packed) = table_repack::repack(&bytes, &links) {
        assert_eq!(packed.len(), bytes.iter().map(|b| b.len()).sum::<usize>());
        if let Some(root) = bytes.first() {
            let root_links = &links[0].links;
            let untouched = (0..root.len()).filter(|i| {
                !root_links.iter().any(|link| {
                    let start = link.position as usize;
                    (start..start + link.width.width()).contains(i)
                })
            });
            for i in untouched {
                assert_eq!(packed[i], root[i]);
            }
        }
    }
});
