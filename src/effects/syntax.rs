use super::semantics::grow;
use super::spacelike::{BigraphInterface, CtxBigraph};
use crate::bigraph::{Bigraph, Edge, Node};
use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Dynamic type of a [`Value`], used for dispatching co-operations and as the
/// declared result of an [`Operation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Any,
    Int,
    Str,
    Base,
    Node,
    Edge,
    Ctx,
    Interface,
    Map,
}

impl Kind {
    pub fn matches(self, value: &Value) -> bool {
        value.kind().refines(self)
    }

    /// Whether every value of kind `self` is also of kind `other`.
    pub fn refines(self, other: Kind) -> bool {
        match (self, other) {
            (_, Self::Any) => true,
            (Self::Node | Self::Edge, Self::Base) => true,
            (a, b) => a == b,
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "Any",
            Self::Int => "Int",
            Self::Str => "Str",
            Self::Base => "Base",
            Self::Node => "Node",
            Self::Edge => "Edge",
            Self::Ctx => "CtxBigraph",
            Self::Interface => "BigraphInterface",
            Self::Map => "Map",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Str(ArcStr),
    Bigraph(Bigraph),
    Ctx(Arc<CtxBigraph>),
    Interface(Arc<BigraphInterface>),
    Map(Arc<IndexMap<ArcStr, Value>>),
}

impl Value {
    pub fn map<K: Into<ArcStr>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Int(_) => Kind::Int,
            Self::Str(_) => Kind::Str,
            Self::Bigraph(Bigraph::Node(_)) => Kind::Node,
            Self::Bigraph(Bigraph::Edge(_)) => Kind::Edge,
            Self::Bigraph(_) => Kind::Base,
            Self::Ctx(_) => Kind::Ctx,
            Self::Interface(_) => Kind::Interface,
            Self::Map(_) => Kind::Map,
        }
    }

    pub fn as_bigraph(&self) -> Option<&Bigraph> {
        match self {
            Self::Bigraph(bigraph) => Some(bigraph),
            _ => None,
        }
    }

    pub fn as_ctx(&self) -> Option<&CtxBigraph> {
        match self {
            Self::Ctx(ctx) => Some(ctx),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Str(s) => write!(f, "{:?}", s.as_str()),
            Self::Bigraph(bigraph) => write!(f, "{}", bigraph),
            Self::Ctx(ctx) => write!(f, "CtxBigraph({})", ctx.name()),
            Self::Interface(interface) => write!(
                f,
                "BigraphInterface({} sites, {} links)",
                interface.sites.len(),
                interface.links.len()
            ),
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}': {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<Bigraph> for Value {
    fn from(value: Bigraph) -> Self {
        Self::Bigraph(value)
    }
}

impl From<Node> for Value {
    fn from(value: Node) -> Self {
        Self::Bigraph(Bigraph::Node(value))
    }
}

impl From<Edge> for Value {
    fn from(value: Edge) -> Self {
        Self::Bigraph(Bigraph::Edge(value))
    }
}

impl From<CtxBigraph> for Value {
    fn from(value: CtxBigraph) -> Self {
        Self::Ctx(Arc::new(value))
    }
}

impl From<BigraphInterface> for Value {
    fn from(value: BigraphInterface) -> Self {
        Self::Interface(Arc::new(value))
    }
}

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(0);

/// An effect symbol. Two operations are equal only if one was cloned from the
/// other, so operations sharing a name stay distinct. Nullary operations
/// serve as named free variables.
#[derive(Clone)]
pub struct Operation(Arc<OperationData>);

struct OperationData {
    id: u64,
    name: ArcStr,
    result: Kind,
}

impl Operation {
    pub fn new(name: impl Into<ArcStr>, result: Kind) -> Self {
        Self(Arc::new(OperationData {
            id: NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            result,
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &ArcStr {
        &self.0.name
    }

    pub fn result(&self) -> Kind {
        self.0.result
    }

    /// Builds the effect term `self(args...)` without interpreting it.
    pub fn call(&self, args: impl IntoIterator<Item = Term>) -> Term {
        Term::Call(self.clone(), args.into_iter().collect())
    }

    /// The term referring to this operation as a free variable.
    pub fn var(&self) -> Term {
        Term::Call(self.clone(), Vec::new())
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Operation {}

impl Hash for Operation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0.name, self.0.id)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

#[derive(Debug)]
pub enum Term {
    Value(Value),
    Call(Operation, Vec<Term>),
}

impl Clone for Term {
    fn clone(&self) -> Self {
        grow(|| match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Call(op, args) => Self::Call(op.clone(), args.clone()),
        })
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        if let Self::Call(_, args) = self {
            if !args.is_empty() {
                let args = std::mem::take(args);
                grow(move || drop(args));
            }
        }
    }
}

impl Term {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Call(..) => None,
        }
    }

    pub fn into_value(mut self) -> Option<Value> {
        match &mut self {
            Self::Value(value) => Some(std::mem::replace(value, Value::Int(0))),
            Self::Call(..) => None,
        }
    }

    /// Static result kind.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Value(value) => value.kind(),
            Self::Call(op, _) => op.result(),
        }
    }

    /// Every operation occurring in the term, in order of first occurrence.
    pub fn operations(&self) -> IndexSet<Operation> {
        let mut ops = IndexSet::new();
        self.collect_operations(&mut ops);
        ops
    }

    fn collect_operations(&self, ops: &mut IndexSet<Operation>) {
        if let Self::Call(op, args) = self {
            ops.insert(op.clone());
            grow(|| {
                for arg in args {
                    arg.collect_operations(ops);
                }
            });
        }
    }

    /// Replaces every occurrence of a bound free variable.
    pub fn substitute(&self, bindings: &IndexMap<Operation, Term>) -> Self {
        grow(|| match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Call(op, args) if args.is_empty() => match bindings.get(op) {
                Some(term) => term.clone(),
                None => self.clone(),
            },
            Self::Call(op, args) => Self::Call(
                op.clone(),
                args.iter().map(|arg| arg.substitute(bindings)).collect(),
            ),
        })
    }
}

pub fn operations_of<'a>(terms: impl IntoIterator<Item = &'a Term>) -> IndexSet<Operation> {
    let mut ops = IndexSet::new();
    for term in terms {
        term.collect_operations(&mut ops);
    }
    ops
}

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        grow(|| match self {
            Self::Value(value) => write!(f, "{}", value),
            Self::Call(op, args) => {
                write!(f, "{}(", op)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        })
    }
}

macro_rules! term_from_value {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for Term {
                fn from(value: $source) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

term_from_value!(Value, i64, &str, Bigraph, Node, Edge, CtxBigraph, BigraphInterface);
