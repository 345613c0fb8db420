//! Errors that occur during repacking

use std::sync::Arc;

use font_types::Tag;

use crate::{
    graph::Graph,
    offset::{ObjectId, OffsetLen},
};

/// A record of an offset that could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overflow {
    /// The object containing the offset
    pub parent: ObjectId,
    /// The object the offset points to
    pub child: ObjectId,
    /// The distance from the start of `parent` to the start of `child`
    pub distance: i64,
    pub offset_len: OffsetLen,
    pub is_signed: bool,
}

/// A packing could not be found that satisfied all offsets.
///
/// Offsets are never promoted to a wider type, and no extension tables are
/// inserted; the caller is expected to restructure the graph (for instance
/// by splitting a large subtable, or by using a wider offset) and try again.
#[derive(Clone, Debug)]
pub struct PackingError {
    pub(crate) graph: Arc<Graph>,
    pub(crate) overflows: Vec<Overflow>,
}

/// An error occured while repacking a graph
#[derive(Debug)]
pub enum RepackError {
    /// The number of link lists does not match the number of objects
    MismatchedLinkLists { objects: usize, link_lists: usize },
    /// A link points to an object that does not exist
    InvalidReference {
        object: ObjectId,
        target: ObjectId,
        count: usize,
    },
    /// A link does not fit inside the object that contains it
    InvalidLinkPosition {
        object: ObjectId,
        position: u32,
        width: OffsetLen,
        size: usize,
    },
    /// Two links in the same object share bytes
    OverlappingLinks { object: ObjectId, position: u32 },
    /// A raw offset width other than 2, 3 or 4
    InvalidWidth(u8),
    /// At least one resolved offset did not fit in its field
    OffsetOverflow(PackingError),
}

impl PackingError {
    /// Every offset that could not be resolved, in object order.
    pub fn overflows(&self) -> &[Overflow] {
        &self.overflows
    }

    /// The tag of the table being packed, if one was provided.
    pub fn tag(&self) -> Option<Tag> {
        self.graph.tag()
    }

    /// The order in which objects were placed when packing failed.
    pub fn order(&self) -> &[ObjectId] {
        self.graph.order()
    }

    /// Write a graphviz file representing the failed packing to the provided path.
    ///
    /// Has the same semantics as [`std::fs::write`].
    #[cfg(feature = "dot2")]
    pub fn write_graph_viz(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        self.graph.write_graph_viz(path)
    }
}

impl std::fmt::Display for RepackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepackError::MismatchedLinkLists {
                objects,
                link_lists,
            } => write!(
                f,
                "expected one link list per object, found {link_lists} lists for {objects} objects"
            ),
            RepackError::InvalidReference {
                object,
                target,
                count,
            } => write!(
                f,
                "{object} links to {target}, but only {count} objects exist"
            ),
            RepackError::InvalidLinkPosition {
                object,
                position,
                width,
                size,
            } => write!(
                f,
                "{width} at position {position} does not fit in {object} ({size} bytes)"
            ),
            RepackError::OverlappingLinks { object, position } => {
                write!(f, "link at position {position} in {object} overlaps another link")
            }
            RepackError::InvalidWidth(width) => {
                write!(f, "invalid offset width {width}, expected 2, 3 or 4")
            }
            RepackError::OffsetOverflow(error) => error.fmt(f),
        }
    }
}

impl std::fmt::Display for PackingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tag() {
            Some(tag) => write!(
                f,
                "Packing '{tag}' failed with {} overflows",
                self.overflows.len()
            ),
            None => write!(
                f,
                "Table packing failed with {} overflows",
                self.overflows.len()
            ),
        }
    }
}

impl std::error::Error for PackingError {}

impl std::error::Error for RepackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepackError::OffsetOverflow(error) => Some(error),
            _ => None,
        }
    }
}

impl From<PackingError> for RepackError {
    fn from(src: PackingError) -> RepackError {
        RepackError::OffsetOverflow(src)
    }
}
