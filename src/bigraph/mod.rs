//! Bare bigraphs: the value syntax that bigraph runners evaluate into.
//!
//! A bare bigraph is a place graph of [`Node`]s, each carrying the names
//! of the links on its ports, juxtaposed by [`Bigraph::Merge`] inside one
//! region or by [`Bigraph::Parallel`] across regions. [`Edge`]s are first
//! class so that combinators can link them to nodes from either side.

mod display;
pub mod parse;

pub use parse::{parse, ParseError};

use crate::effects::semantics::grow;
use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Node {
    pub control: ArcStr,
    pub ports: Vec<ArcStr>,
    pub child: Option<Box<Bigraph>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub name: ArcStr,
    pub nodes: Vec<Node>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub enum Bigraph {
    Node(Node),
    Edge(Edge),
    Merge(Vec<Self>),
    Parallel(Vec<Self>),
}

impl Clone for Bigraph {
    fn clone(&self) -> Self {
        grow(|| match self {
            Self::Node(node) => Self::Node(node.clone()),
            Self::Edge(edge) => Self::Edge(edge.clone()),
            Self::Merge(parts) => Self::Merge(parts.clone()),
            Self::Parallel(parts) => Self::Parallel(parts.clone()),
        })
    }
}

impl Drop for Bigraph {
    fn drop(&mut self) {
        match self {
            Self::Node(node) => {
                if let Some(child) = node.child.take() {
                    grow(move || drop(child));
                }
            }
            Self::Edge(edge) => {
                let nodes = std::mem::take(&mut edge.nodes);
                grow(move || drop(nodes));
            }
            Self::Merge(parts) | Self::Parallel(parts) => {
                let parts = std::mem::take(parts);
                grow(move || drop(parts));
            }
        }
    }
}

impl Node {
    pub fn new(control: impl Into<ArcStr>) -> Self {
        Self {
            control: control.into(),
            ports: Vec::new(),
            child: None,
        }
    }

    pub fn link(self, edge: &Edge) -> Self {
        self.link_port(edge.name.clone())
    }

    pub fn link_port(mut self, port: ArcStr) -> Self {
        self.ports.push(port);
        self
    }

    /// Places `inner` inside this node, next to whatever it already holds.
    pub fn nest(mut self, inner: Bigraph) -> Self {
        self.child = Some(Box::new(match self.child.take() {
            Some(existing) => Bigraph::merge(*existing, inner),
            None => inner,
        }));
        self
    }

    fn place(&self) -> Place {
        let mut children: Vec<Place> = match &self.child {
            Some(child) => child.regions().into_iter().flatten().collect(),
            None => Vec::new(),
        };
        children.sort();
        Place::Node {
            control: self.control.clone(),
            ports: self.ports.clone(),
            children,
        }
    }
}

impl Edge {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    pub fn link(mut self, node: Node) -> Self {
        let node = node.link(&self);
        self.nodes.push(node);
        self
    }

    fn place(&self) -> Place {
        let mut nodes: Vec<Place> = self.nodes.iter().map(Node::place).collect();
        nodes.sort();
        Place::Edge {
            name: self.name.clone(),
            nodes,
        }
    }
}

impl Bigraph {
    pub fn merge(left: Self, right: Self) -> Self {
        Self::Merge(vec![left, right])
    }

    pub fn parallel(left: Self, right: Self) -> Self {
        Self::Parallel(vec![left, right])
    }

    pub fn merge_all(mut parts: Vec<Self>) -> Self {
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            Self::Merge(parts)
        }
    }

    pub fn parallel_all(mut parts: Vec<Self>) -> Self {
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            Self::Parallel(parts)
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Self::Edge(edge) => Some(edge),
            _ => None,
        }
    }

    /// Canonical form: bigraphs with equal unfoldings denote the same
    /// place and link structure.
    pub fn unfold(&self) -> Unfolded {
        Unfolded {
            regions: self.regions(),
        }
    }

    fn regions(&self) -> Vec<Vec<Place>> {
        grow(|| match self {
            Self::Node(node) => vec![vec![node.place()]],
            Self::Edge(edge) => vec![vec![edge.place()]],
            Self::Merge(parts) => {
                let mut region: Vec<Place> = parts
                    .iter()
                    .flat_map(|part| part.regions())
                    .flatten()
                    .collect();
                region.sort();
                vec![region]
            }
            Self::Parallel(parts) => parts.iter().flat_map(|part| part.regions()).collect(),
        })
    }
}

impl From<Node> for Bigraph {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Edge> for Bigraph {
    fn from(edge: Edge) -> Self {
        Self::Edge(edge)
    }
}

/// One entry of a region in an [`Unfolded`] bigraph.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Place {
    Node {
        control: ArcStr,
        ports: Vec<ArcStr>,
        children: Vec<Place>,
    },
    Edge {
        name: ArcStr,
        nodes: Vec<Place>,
    },
}

impl Drop for Place {
    fn drop(&mut self) {
        let inner = match self {
            Self::Node { children, .. } => std::mem::take(children),
            Self::Edge { nodes, .. } => std::mem::take(nodes),
        };
        if !inner.is_empty() {
            grow(move || drop(inner));
        }
    }
}

/// Ordered regions, each holding a sorted multiset of places.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unfolded {
    pub regions: Vec<Vec<Place>>,
}

impl Unfolded {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Compares two fully evaluated bigraphs.
pub fn bare_equal(a: &Bigraph, b: &Bigraph) -> bool {
    a.unfold() == b.unfold()
}
