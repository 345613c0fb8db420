//! Packing graphs of font subtables
//!
//! Font tables are usually made up of many subtables, which refer to one
//! another through offsets. Each subtable can be encoded without knowing
//! where it will end up, with its offsets left as placeholders; this crate
//! takes the resulting collection of objects and the links between them,
//! chooses an order, concatenates them, and fills in every offset.
//!
//! The order is a depth-first traversal starting from the root (the first
//! object), visiting the targets of each object's links in order of their
//! position within that object. Objects that cannot be reached from the
//! root are written last, in their original order.
//!
//! Offsets are unsigned distances measured from the start of the object that
//! contains them, unless a link is explicitly [signed](Link::new_signed).
//! If any offset cannot be represented in its field, packing fails with a
//! [`PackingError`] describing every offending link; offsets are never
//! promoted to a wider type.
//!
//! # Example
//!
//! ```
//! use table_repack::{Link, ObjectLinks, OffsetLen};
//!
//! let objects = [
//!     vec![0x00u8, 0x01, 0x00, 0x00], // version, then an Offset16 to the child
//!     vec![0xcau8, 0xfe],
//! ];
//! let links = [
//!     ObjectLinks::new([Link::new(2, OffsetLen::Offset16, 1)]),
//!     ObjectLinks::default(),
//! ];
//!
//! let packed = table_repack::repack(&objects, &links).unwrap();
//! assert_eq!(packed, [0x00, 0x01, 0x00, 0x04, 0xca, 0xfe]);
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod builder;
mod error;
mod graph;
mod offset;

pub use builder::GraphBuilder;
pub use error::{Overflow, PackingError, RepackError};
pub use graph::Graph;
pub use offset::{Link, ObjectId, ObjectLinks, OffsetLen};

/// Public re-export of the font-types crate.
pub extern crate font_types as types;

use font_types::Tag;

/// Pack `objects` into a single buffer, resolving all `links`.
///
/// `links` must contain exactly one entry per object; the entry at index
/// `i` describes the offsets contained in `objects[i]`.
pub fn repack<B: AsRef<[u8]>>(
    objects: &[B],
    links: &[ObjectLinks],
) -> Result<Vec<u8>, RepackError> {
    Graph::new(objects, links)?.pack()
}

/// As [`repack`], for the table identified by `tag`.
///
/// The output is identical; the tag is used in log messages and in any
/// [`PackingError`].
pub fn repack_with_tag<B: AsRef<[u8]>>(
    tag: Tag,
    objects: &[B],
    links: &[ObjectLinks],
) -> Result<Vec<u8>, RepackError> {
    Graph::new(objects, links)?.with_tag(tag).pack()
}
