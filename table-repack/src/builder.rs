//! Assembling a graph one object at a time

use font_types::Tag;

use crate::{
    error::RepackError,
    graph::Graph,
    offset::{Link, ObjectId, ObjectLinks, OffsetLen},
};

/// An incremental builder for a [`Graph`].
///
/// Objects are identified by the order in which they are added; the first
/// object added is the root.
///
/// ```
/// use table_repack::{GraphBuilder, OffsetLen};
///
/// let mut builder = GraphBuilder::default();
/// let root = builder.add_object([0x00u8, 0x01, 0x00, 0x00]);
/// let child = builder.add_object(*b"data");
/// builder.add_link(root, 2, OffsetLen::Offset16, child);
///
/// let bytes = builder.repack().unwrap();
/// assert_eq!(bytes, [0x00, 0x01, 0x00, 0x04, b'd', b'a', b't', b'a']);
/// ```
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
    objects: Vec<Vec<u8>>,
    links: Vec<ObjectLinks>,
    tag: Option<Tag>,
}

impl GraphBuilder {
    /// Create a builder for the table with the given tag.
    pub fn with_tag(tag: Tag) -> Self {
        GraphBuilder {
            tag: Some(tag),
            ..Default::default()
        }
    }

    /// Add the bytes of an object, returning its id.
    pub fn add_object(&mut self, bytes: impl Into<Vec<u8>>) -> ObjectId {
        let id = ObjectId::new(self.objects.len() as u32);
        self.objects.push(bytes.into());
        if self.links.len() < self.objects.len() {
            self.links.push(ObjectLinks::default());
        }
        id
    }

    /// Record an offset in `from`, at `position`, pointing to `to`.
    ///
    /// Either object may be added later; links are not validated until the
    /// graph is built.
    pub fn add_link(
        &mut self,
        from: ObjectId,
        position: u32,
        width: OffsetLen,
        to: ObjectId,
    ) -> &mut Self {
        self.push_link(from, Link::new(position, width, to.to_u32()))
    }

    /// As [`add_link`](Self::add_link), but the offset may point backwards.
    pub fn add_signed_link(
        &mut self,
        from: ObjectId,
        position: u32,
        width: OffsetLen,
        to: ObjectId,
    ) -> &mut Self {
        self.push_link(from, Link::new_signed(position, width, to.to_u32()))
    }

    /// Record that `from` depends on `to`, without writing an offset.
    pub fn add_virtual_link(&mut self, from: ObjectId, to: ObjectId) -> &mut Self {
        self.links_mut(from).virtual_links.push(to);
        self
    }

    fn push_link(&mut self, from: ObjectId, link: Link) -> &mut Self {
        self.links_mut(from).links.push(link);
        self
    }

    // `from` may not have been added yet
    fn links_mut(&mut self, from: ObjectId) -> &mut ObjectLinks {
        let idx = from.to_usize();
        if idx >= self.links.len() {
            self.links.resize_with(idx + 1, Default::default);
        }
        &mut self.links[idx]
    }

    /// The number of objects added so far.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Validate all links and produce a [`Graph`].
    pub fn build(&self) -> Result<Graph, RepackError> {
        let graph = Graph::new(&self.objects, &self.links)?;
        Ok(match self.tag {
            Some(tag) => graph.with_tag(tag),
            None => graph,
        })
    }

    /// Build and pack the graph in one step.
    pub fn repack(&self) -> Result<Vec<u8>, RepackError> {
        self.build()?.pack()
    }
}
