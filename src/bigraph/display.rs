//! Printing in the syntax accepted by [`super::parse`]. The empty merge (a
//! single barren region) prints as `1`, the empty parallel product (no
//! regions) as `ε`. Edges print as `/name[nodes]` for inspection only; the
//! parser has no edge syntax.

use super::{Bigraph, Edge, Node};
use crate::effects::semantics::grow;
use std::fmt::{self, Display, Write};

impl Bigraph {
    pub fn pretty(&self, f: &mut impl Write) -> fmt::Result {
        grow(|| match self {
            Self::Node(node) => node.pretty(f),
            Self::Edge(edge) => edge.pretty(f),
            Self::Merge(parts) if parts.is_empty() => write!(f, "1"),
            Self::Parallel(parts) if parts.is_empty() => write!(f, "ε"),
            Self::Merge(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    // `|` binds tighter than `||`
                    if let Self::Parallel(_) = part {
                        write!(f, "(")?;
                        part.pretty(f)?;
                        write!(f, ")")?;
                    } else {
                        part.pretty(f)?;
                    }
                }
                Ok(())
            }
            Self::Parallel(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " || ")?;
                    }
                    part.pretty(f)?;
                }
                Ok(())
            }
        })
    }
}

impl Node {
    pub fn pretty(&self, f: &mut impl Write) -> fmt::Result {
        grow(|| self.pretty_node(f))
    }

    fn pretty_node(&self, f: &mut impl Write) -> fmt::Result {
        write!(f, "{}", self.control)?;
        if !self.ports.is_empty() {
            write!(f, "{{")?;
            for (i, port) in self.ports.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", port)?;
            }
            write!(f, "}}")?;
        }
        match self.child.as_deref() {
            None => Ok(()),
            Some(Bigraph::Node(child)) => {
                write!(f, ".")?;
                child.pretty(f)
            }
            Some(child) => {
                write!(f, ".(")?;
                child.pretty(f)?;
                write!(f, ")")
            }
        }
    }
}

impl Edge {
    pub fn pretty(&self, f: &mut impl Write) -> fmt::Result {
        write!(f, "/{}", self.name)?;
        if !self.nodes.is_empty() {
            write!(f, "[")?;
            for (i, node) in self.nodes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                node.pretty(f)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl Display for Bigraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pretty(f)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pretty(f)
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pretty(f)
    }
}
