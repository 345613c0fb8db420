//! A graph for resolving offsets between objects

use std::{collections::BTreeMap, sync::Arc};

use font_types::Tag;
use indexmap::IndexSet;

use crate::{
    error::{Overflow, PackingError, RepackError},
    offset::{Link, ObjectId, ObjectLinks},
};

#[cfg(feature = "dot2")]
mod graphviz;

/// The bytes of a single object, along with its validated links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TableData {
    pub(crate) bytes: Vec<u8>,
    /// real links, keyed on their position in `bytes`
    pub(crate) links: BTreeMap<u32, Link>,
    #[cfg_attr(not(feature = "dot2"), allow(dead_code))]
    pub(crate) virtual_links: Vec<ObjectId>,
}

impl TableData {
    /// Validate the links of the object `id`, in a graph of `count` objects.
    fn new(
        id: ObjectId,
        bytes: &[u8],
        links: &ObjectLinks,
        count: usize,
    ) -> Result<Self, RepackError> {
        let check_target = |target: ObjectId| {
            if target.to_usize() >= count {
                Err(RepackError::InvalidReference {
                    object: id,
                    target,
                    count,
                })
            } else {
                Ok(())
            }
        };

        let mut real_links = BTreeMap::new();
        for link in &links.links {
            check_target(link.target)?;
            if link.byte_range().end > bytes.len() as u64 {
                return Err(RepackError::InvalidLinkPosition {
                    object: id,
                    position: link.position,
                    width: link.width,
                    size: bytes.len(),
                });
            }
            if real_links.insert(link.position, *link).is_some() {
                return Err(RepackError::OverlappingLinks {
                    object: id,
                    position: link.position,
                });
            }
        }

        // with links sorted by position, any overlap is between neighbours
        let mut prev_end = 0;
        for link in real_links.values() {
            let range = link.byte_range();
            if range.start < prev_end {
                return Err(RepackError::OverlappingLinks {
                    object: id,
                    position: link.position,
                });
            }
            prev_end = range.end;
        }

        for target in &links.virtual_links {
            check_target(*target)?;
        }

        Ok(TableData {
            bytes: bytes.to_vec(),
            links: real_links,
            virtual_links: links.virtual_links.clone(),
        })
    }
}

/// A graph of subtables, starting at a single root.
///
/// The root is always the first object; every other object is identified
/// by its index in the input.
pub struct Graph {
    /// the actual data for each table
    objects: Vec<TableData>,
    order: Vec<ObjectId>,
    /// start of each object in the output, indexed by object
    positions: Vec<u64>,
    tag: Option<Tag>,
}

impl Graph {
    /// Build a graph from a sequence of objects and one link list per object.
    ///
    /// Every link is validated: its target must exist, it must lie within
    /// its object, and it must not overlap another link.
    pub fn new<B: AsRef<[u8]>>(
        objects: &[B],
        links: &[ObjectLinks],
    ) -> Result<Self, RepackError> {
        if objects.len() != links.len() {
            return Err(RepackError::MismatchedLinkLists {
                objects: objects.len(),
                link_lists: links.len(),
            });
        }
        let count = objects.len();
        let objects = objects
            .iter()
            .zip(links)
            .enumerate()
            .map(|(i, (bytes, links))| {
                TableData::new(ObjectId::new(i as u32), bytes.as_ref(), links, count)
            })
            .collect::<Result<_, _>>()?;
        Ok(Graph {
            objects,
            order: Vec::new(),
            positions: Vec::new(),
            tag: None,
        })
    }

    /// Associate this graph with a table tag, used in diagnostics.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    /// The number of objects in the graph.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The order in which objects are written.
    ///
    /// This is empty until the graph has been sorted.
    pub fn order(&self) -> &[ObjectId] {
        &self.order
    }

    /// Sort the graph and write it out, resolving all offsets.
    ///
    /// Fails if any offset cannot be represented; in this case no bytes
    /// are produced.
    pub fn pack(mut self) -> Result<Vec<u8>, RepackError> {
        self.sort_depth_first();
        match self.serialize() {
            Ok(bytes) => {
                if let Some(tag) = self.tag {
                    log::info!("packed '{tag}': {} objects, {} bytes", self.len(), bytes.len());
                }
                Ok(bytes)
            }
            Err(overflows) => {
                self.debug_overflows(&overflows);
                Err(PackingError {
                    graph: Arc::new(self),
                    overflows,
                }
                .into())
            }
        }
    }

    /// Determine the write order.
    ///
    /// This is a depth-first pre-order traversal from the root, where the
    /// children of each object are visited in order of link position.
    /// Objects that are not reachable from the root are appended afterwards,
    /// in their original order.
    fn sort_depth_first(&mut self) {
        log::trace!("sorting {} objects", self.objects.len());
        let mut placed = IndexSet::with_capacity(self.objects.len());

        if !self.objects.is_empty() {
            let mut stack = vec![ObjectId::ROOT];
            while let Some(id) = stack.pop() {
                if !placed.insert(id) {
                    continue;
                }
                // reversed, so that the first link is popped first
                stack.extend(
                    self.objects[id.to_usize()]
                        .links
                        .values()
                        .rev()
                        .map(|link| link.target)
                        .filter(|target| !placed.contains(target)),
                );
            }
        }

        if placed.len() < self.objects.len() {
            log::debug!(
                "{} of {} objects are unreachable from the root",
                self.objects.len() - placed.len(),
                self.objects.len()
            );
            placed.extend((0..self.objects.len()).map(|i| ObjectId::new(i as u32)));
        }

        self.order = placed.into_iter().collect();
        self.positions = vec![0; self.objects.len()];
        let mut current_pos = 0u64;
        for id in &self.order {
            self.positions[id.to_usize()] = current_pos;
            current_pos += self.objects[id.to_usize()].bytes.len() as u64;
        }
    }

    /// The signed distance from the start of `parent` to the target of `link`.
    ///
    /// Only valid once the graph is sorted.
    fn distance(&self, parent: ObjectId, link: &Link) -> i64 {
        self.positions[link.target.to_usize()] as i64 - self.positions[parent.to_usize()] as i64
    }

    fn overflow(&self, parent: ObjectId, link: &Link) -> Overflow {
        Overflow {
            parent,
            child: link.target,
            distance: self.distance(parent, link),
            offset_len: link.width,
            is_signed: link.is_signed,
        }
    }

    /// Every offset that cannot be resolved in the current order.
    #[cfg_attr(not(any(test, feature = "dot2")), allow(dead_code))]
    pub(crate) fn find_overflows(&self) -> Vec<Overflow> {
        self.order
            .iter()
            .flat_map(|&id| {
                self.objects[id.to_usize()]
                    .links
                    .values()
                    .filter(move |link| link.encode(self.distance(id, link)).is_none())
                    .map(move |link| self.overflow(id, link))
            })
            .collect()
    }

    /// Write out the sorted graph.
    ///
    /// On failure, returns every offset that could not be written.
    fn serialize(&self) -> Result<Vec<u8>, Vec<Overflow>> {
        let total_len = self.objects.iter().map(|obj| obj.bytes.len()).sum();
        let mut out = Vec::with_capacity(total_len);

        // first pass: write out bytes
        for id in &self.order {
            out.extend_from_slice(&self.objects[id.to_usize()].bytes);
        }

        // second pass: write offsets
        let mut overflows = Vec::new();
        for id in &self.order {
            let table_head = self.positions[id.to_usize()];
            for link in self.objects[id.to_usize()].links.values() {
                let buffer_pos = (table_head + link.position as u64) as usize;
                let written = link
                    .encode(self.distance(*id, link))
                    .and_then(|raw| link.width.write_be(out.get_mut(buffer_pos..)?, raw));
                if written.is_none() {
                    overflows.push(self.overflow(*id, link));
                }
            }
        }

        if overflows.is_empty() {
            Ok(out)
        } else {
            Err(overflows)
        }
    }

    fn debug_overflows(&self, overflows: &[Overflow]) {
        match self.tag {
            Some(tag) => log::debug!("packing '{tag}' failed with {} overflows", overflows.len()),
            None => log::debug!("packing failed with {} overflows", overflows.len()),
        }
        for overflow in overflows {
            log::debug!(
                "{} -> {} type {}{} dist {}",
                overflow.parent,
                overflow.child,
                overflow.offset_len,
                if overflow.is_signed { " (signed)" } else { "" },
                overflow.distance
            );
        }
    }

    #[cfg(feature = "dot2")]
    pub(crate) fn write_graph_viz(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        // if this is set then we prune the generated graph
        const PRUNE_GRAPH_ENV_VAR: &str = "REPACK_PRUNE_GRAPH";
        let try_trim_graph = std::env::var_os(PRUNE_GRAPH_ENV_VAR).is_some();
        graphviz::GraphVizGraph::from_graph(self, try_trim_graph).write_to_file(path)
    }
}

//NOTE: objects are omitted, they're way too verbose to be useful
impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("len", &self.objects.len())
            .field("tag", &self.tag)
            .field("order", &self.order)
            .finish()
    }
}
