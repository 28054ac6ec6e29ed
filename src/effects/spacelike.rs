//! Effect syntax for bigraph combinators.
//!
//! The bare combinators (`merge`, `parallel`, `link`, `nest`) build bare
//! bigraphs. Contextual bigraphs are morphisms between interfaces; they are
//! kept as effect terms over named free variables, so composing them is a
//! matter of substitution, and the global combinators (`compose`, `ground`)
//! operate on whole contextual bigraphs.

use super::algebra::{bound_rows, named_rows, Field, Signature, SymbolTable, ValueSyntax};
use super::error::SyntaxError;
use super::syntax::{operations_of, Kind, Operation, Term};
use crate::bigraph::Edge;
use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

pub static MERGE: LazyLock<Operation> = LazyLock::new(|| Operation::new("merge", Kind::Base));
pub static PARALLEL: LazyLock<Operation> =
    LazyLock::new(|| Operation::new("parallel", Kind::Base));
pub static LINK: LazyLock<Operation> = LazyLock::new(|| Operation::new("link", Kind::Base));
pub static NEST: LazyLock<Operation> = LazyLock::new(|| Operation::new("nest", Kind::Node));

/// Simplifies a contextual bigraph to a bare bigraph, after substituting
/// its inner interface with bare bigraphs.
pub static GROUND: LazyLock<Operation> = LazyLock::new(|| Operation::new("ground", Kind::Base));
/// Hierarchical (categorical) composition of contextual bigraphs along an
/// interface.
pub static COMPOSE: LazyLock<Operation> = LazyLock::new(|| Operation::new("compose", Kind::Ctx));

pub static HORIZONTAL_LOCAL: LazyLock<Signature> = LazyLock::new(|| {
    Signature::new("HorizontalLocal")
        .with_op(&MERGE)
        .with_op(&PARALLEL)
        .with_op(&LINK)
});

pub static VERTICAL_LOCAL: LazyLock<Signature> =
    LazyLock::new(|| Signature::new("VerticalLocal").with_op(&NEST));

/// Combinators on bare bigraphs.
pub static SPACELIKE_LOCAL: LazyLock<Signature> = LazyLock::new(|| {
    Signature::new("SpacelikeLocal")
        .with_child(HORIZONTAL_LOCAL.clone())
        .with_child(VERTICAL_LOCAL.clone())
});

pub static VERTICAL_GLOBAL: LazyLock<Signature> = LazyLock::new(|| {
    Signature::new("VerticalGlobal")
        .with_op(&GROUND)
        .with_op(&COMPOSE)
});

/// Combinators on entire contextual bigraphs.
pub static SPACELIKE_GLOBAL: LazyLock<Signature> =
    LazyLock::new(|| Signature::new("SpacelikeGlobal").with_child(VERTICAL_GLOBAL.clone()));

/// Free variable -> the term it stands for.
pub type Binding = IndexMap<Operation, Term>;

/// A contextual bigraph.
///
/// Interfaces are free variables: `inner_sites` and `inner_links` are the
/// holes the bigraph can be plugged with, `outer_sites` and `outer_links` are
/// what it offers to an enclosing bigraph. `root` combines the outer sites.
/// Each outer site's content is a term in `bound_sites`, over the inner
/// interface only, so interfaces can be matched syntactically without
/// evaluating anything. `bound_edges` ties links to concrete edges, and
/// `bound_terms` holds the internal layers accumulated by composition, which
/// grounding evaluates in order before `bound_sites` and `root`.
#[derive(Clone, Debug)]
pub struct CtxBigraph {
    name: ArcStr,
    inner_sites: SymbolTable,
    inner_links: SymbolTable,
    outer_sites: SymbolTable,
    outer_links: SymbolTable,
    root: Term,
    bound_sites: Binding,
    bound_edges: IndexMap<Operation, Edge>,
    bound_terms: Vec<Binding>,
}

impl CtxBigraph {
    pub fn builder(name: impl Into<ArcStr>, root: Term) -> CtxBigraphBuilder {
        CtxBigraphBuilder {
            ctx: CtxBigraph {
                name: name.into(),
                inner_sites: SymbolTable::new(),
                inner_links: SymbolTable::new(),
                outer_sites: SymbolTable::new(),
                outer_links: SymbolTable::new(),
                root,
                bound_sites: Binding::new(),
                bound_edges: IndexMap::new(),
                bound_terms: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    pub fn inner_sites(&self) -> &SymbolTable {
        &self.inner_sites
    }

    pub fn inner_links(&self) -> &SymbolTable {
        &self.inner_links
    }

    pub fn outer_sites(&self) -> &SymbolTable {
        &self.outer_sites
    }

    pub fn outer_links(&self) -> &SymbolTable {
        &self.outer_links
    }

    pub fn root(&self) -> &Term {
        &self.root
    }

    pub fn bound_sites(&self) -> &Binding {
        &self.bound_sites
    }

    pub fn bound_edges(&self) -> &IndexMap<Operation, Edge> {
        &self.bound_edges
    }

    pub fn bound_terms(&self) -> &[Binding] {
        &self.bound_terms
    }

    /// Internal layers followed by `bound_sites`, in evaluation order.
    pub fn layers(&self) -> impl Iterator<Item = &Binding> {
        self.bound_terms
            .iter()
            .chain(std::iter::once(&self.bound_sites))
    }

    pub fn closed(&self) -> bool {
        self.outer_links.is_empty()
    }

    fn interfaces(&self) -> [&SymbolTable; 4] {
        [
            &self.inner_sites,
            &self.inner_links,
            &self.outer_sites,
            &self.outer_links,
        ]
    }

    fn validate(self) -> Result<Self, SyntaxError> {
        let mut names = IndexSet::new();
        for name in self.interfaces().into_iter().flat_map(|table| table.keys()) {
            if !names.insert(name) {
                return Err(SyntaxError::DuplicateInterfaceName {
                    bigraph: self.name.clone(),
                    name: name.clone(),
                });
            }
        }

        for (site, op) in &self.outer_sites {
            if !self.bound_sites.contains_key(op) {
                return Err(SyntaxError::UnboundOuterSite {
                    bigraph: self.name.clone(),
                    site: site.clone(),
                });
            }
        }

        let sig = SPACELIKE_LOCAL.operations();
        if let Some(op) = self
            .root
            .operations()
            .into_iter()
            .find(|op| !sig.contains(op) && !self.bound_sites.contains_key(op))
        {
            return Err(SyntaxError::FreeVariableInRoot {
                bigraph: self.name.clone(),
                name: op.name().clone(),
            });
        }

        let interface_args: IndexSet<&Operation> = self
            .interfaces()
            .into_iter()
            .flat_map(|table| table.values())
            .chain(self.bound_edges.keys())
            .collect();
        let mut bound_args: IndexSet<&Operation> = IndexSet::new();
        for (layer_index, layer) in self.layers().enumerate() {
            if let Some(op) = operations_of(layer.values()).into_iter().find(|op| {
                !sig.contains(op) && !interface_args.contains(op) && !bound_args.contains(op)
            }) {
                return Err(SyntaxError::FreeVariableInLayer {
                    bigraph: self.name.clone(),
                    layer: layer_index,
                    name: op.name().clone(),
                });
            }
            bound_args = layer.keys().collect();
        }

        Ok(self)
    }
}

pub struct CtxBigraphBuilder {
    ctx: CtxBigraph,
}

impl CtxBigraphBuilder {
    pub fn inner_sites(mut self, sites: SymbolTable) -> Self {
        self.ctx.inner_sites = sites;
        self
    }

    pub fn inner_links(mut self, links: SymbolTable) -> Self {
        self.ctx.inner_links = links;
        self
    }

    pub fn outer_sites(mut self, sites: SymbolTable) -> Self {
        self.ctx.outer_sites = sites;
        self
    }

    pub fn outer_links(mut self, links: SymbolTable) -> Self {
        self.ctx.outer_links = links;
        self
    }

    pub fn bound_sites(mut self, sites: Binding) -> Self {
        self.ctx.bound_sites = sites;
        self
    }

    pub fn bound_edges(mut self, edges: IndexMap<Operation, Edge>) -> Self {
        self.ctx.bound_edges = edges;
        self
    }

    pub fn bound_terms(mut self, layers: Vec<Binding>) -> Self {
        self.ctx.bound_terms = layers;
        self
    }

    pub fn build(self) -> Result<CtxBigraph, SyntaxError> {
        self.ctx.validate()
    }
}

impl ValueSyntax for CtxBigraph {
    fn type_name(&self) -> &'static str {
        "CtxBigraph"
    }

    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("name", Field::Name(&self.name)),
            ("inner_sites", Field::Binding(named_rows(&self.inner_sites))),
            ("inner_links", Field::Binding(named_rows(&self.inner_links))),
            ("outer_sites", Field::Binding(named_rows(&self.outer_sites))),
            ("outer_links", Field::Binding(named_rows(&self.outer_links))),
            ("bound_sites", Field::Binding(bound_rows(&self.bound_sites))),
            ("bound_edges", Field::Binding(bound_rows(&self.bound_edges))),
            (
                "bound_terms",
                Field::Layers(self.bound_terms.iter().map(bound_rows).collect()),
            ),
            ("root", Field::Term(&self.root)),
        ]
    }
}

impl fmt::Display for CtxBigraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Interface (object) between contextual bigraphs (morphisms).
///
/// Sites and links are coupled by name, like imports in a module system,
/// rather than by position. `sites` maps the outer bigraph's inner sites to
/// the inner bigraph's outer sites; `links` maps the inner bigraph's outer
/// links to the outer bigraph's inner links.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigraphInterface {
    #[serde(default)]
    pub sites: IndexMap<ArcStr, ArcStr>,
    #[serde(default)]
    pub links: IndexMap<ArcStr, ArcStr>,
}

impl BigraphInterface {
    pub fn new(
        sites: impl IntoIterator<Item = (ArcStr, ArcStr)>,
        links: impl IntoIterator<Item = (ArcStr, ArcStr)>,
    ) -> Self {
        Self {
            sites: sites.into_iter().collect(),
            links: links.into_iter().collect(),
        }
    }

    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }
}

impl ValueSyntax for BigraphInterface {
    fn type_name(&self) -> &'static str {
        "BigraphInterface"
    }

    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("sites", Field::Binding(named_rows(&self.sites))),
            ("links", Field::Binding(named_rows(&self.links))),
        ]
    }
}

impl fmt::Display for BigraphInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
