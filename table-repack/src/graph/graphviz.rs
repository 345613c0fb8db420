//! Support for generating graphviz files from our object graph

use std::collections::BTreeSet;

use super::Graph;
use crate::offset::{ObjectId, OffsetLen};

pub struct GraphVizGraph<'a> {
    graph: &'a Graph,
    nodes: Vec<ObjectId>,
    edges: Vec<GraphVizEdge>,
}

impl<'a> GraphVizGraph<'a> {
    pub(crate) fn from_graph(graph: &'a Graph, prune_non_overflows: bool) -> Self {
        let mut edges = Vec::new();

        // if we are pruning we only keep the endpoints of overflowing offsets
        let nodes: BTreeSet<_> = if !prune_non_overflows {
            graph.order.iter().copied().collect()
        } else {
            graph
                .find_overflows()
                .iter()
                .flat_map(|overflow| [overflow.parent, overflow.child])
                .collect()
        };

        for parent_id in &nodes {
            let table = &graph.objects[parent_id.to_usize()];
            for link in table.links.values() {
                if !nodes.contains(&link.target) {
                    continue;
                }
                let len = graph.distance(*parent_id, link);
                edges.push(GraphVizEdge {
                    source: *parent_id,
                    target: link.target,
                    len,
                    type_: Some(link.width),
                    overflows: link.encode(len).is_none(),
                });
            }
            for target in &table.virtual_links {
                if nodes.contains(target) {
                    edges.push(GraphVizEdge {
                        source: *parent_id,
                        target: *target,
                        len: 0,
                        type_: None,
                        overflows: false,
                    });
                }
            }
        }

        GraphVizGraph {
            graph,
            edges,
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Write out this graph as a graphviz file to the provided path.
    ///
    /// Overwrites any existing file at this location.
    pub fn write_to_file(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let mut buf = Vec::new();
        dot2::render(self, &mut buf).map_err(|e| std::io::Error::other(format!("{e:?}")))?;
        std::fs::write(path, &buf)
    }
}

#[derive(Clone, Debug)]
pub struct GraphVizEdge {
    source: ObjectId,
    target: ObjectId,
    len: i64,
    /// `None` for virtual links
    type_: Option<OffsetLen>,
    overflows: bool,
}

impl<'a> dot2::GraphWalk<'a> for GraphVizGraph<'a> {
    type Node = ObjectId;
    type Edge = GraphVizEdge;
    type Subgraph = ();

    fn nodes(&'a self) -> dot2::Nodes<'a, Self::Node> {
        self.nodes.as_slice().into()
    }

    fn edges(&'a self) -> dot2::Edges<'a, Self::Edge> {
        self.edges.as_slice().into()
    }

    fn source(&'a self, edge: &Self::Edge) -> Self::Node {
        edge.source
    }

    fn target(&'a self, edge: &Self::Edge) -> Self::Node {
        edge.target
    }
}

impl<'a> dot2::Labeller<'a> for GraphVizGraph<'a> {
    type Node = ObjectId;
    type Edge = GraphVizEdge;
    type Subgraph = ();

    fn graph_id(&'a self) -> dot2::Result<dot2::Id<'a>> {
        match self.graph.tag {
            Some(tag) if tag.to_string().bytes().all(|b| b.is_ascii_alphanumeric()) => {
                dot2::Id::new(format!("Packing_{tag}"))
            }
            _ => dot2::Id::new("TablePacking"),
        }
    }

    fn node_id(&'a self, n: &Self::Node) -> dot2::Result<dot2::Id<'a>> {
        dot2::Id::new(format!("N{}", n.to_u32()))
    }

    fn node_label<'b>(&'b self, n: &Self::Node) -> dot2::Result<dot2::label::Text<'b>> {
        let obj = &self.graph.objects[n.to_usize()];
        let position = self.graph.positions[n.to_usize()];
        let name = format!("{n} ({}B @{position})", obj.bytes.len());
        Ok(dot2::label::Text::LabelStr(name.into()))
    }

    fn edge_label(&'a self, e: &Self::Edge) -> dot2::label::Text<'a> {
        let label = match e.type_ {
            Some(_) => e.len.to_string(),
            None => String::from("virtual"),
        };
        dot2::label::Text::LabelStr(label.into())
    }

    fn edge_color(&'a self, e: &Self::Edge) -> Option<dot2::label::Text<'a>> {
        if e.overflows {
            return Some(dot2::label::Text::LabelStr("firebrick".into()));
        }
        None
    }

    fn edge_style(&'a self, e: &Self::Edge) -> dot2::Style {
        match (e.type_, e.overflows) {
            (None, _) => dot2::Style::Dashed,
            (Some(_), true) => dot2::Style::Bold,
            (Some(_), false) => dot2::Style::Solid,
        }
    }
}
