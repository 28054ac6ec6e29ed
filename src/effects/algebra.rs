//! Signatures of effect algebras, and value syntax for user types that no
//! backend provides.

use super::syntax::{Kind, Operation, Term};
use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use std::fmt::Display;

/// Symbol -> operation.
pub type SymbolTable = IndexMap<ArcStr, Operation>;

/// Fresh nullary operations, one per name, usable as free variables.
pub fn variables<N: Into<ArcStr>>(names: impl IntoIterator<Item = N>, kind: Kind) -> SymbolTable {
    names
        .into_iter()
        .map(|name| {
            let name = name.into();
            (name.clone(), Operation::new(name, kind))
        })
        .collect()
}

/// A namespace of operations. Sub-signatures factor out parts of it, which
/// orders signatures by inclusion.
#[derive(Clone, Debug)]
pub struct Signature {
    name: &'static str,
    ops: SymbolTable,
    children: Vec<Signature>,
}

impl Signature {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ops: SymbolTable::new(),
            children: Vec::new(),
        }
    }

    pub fn with_op(mut self, op: &Operation) -> Self {
        self.ops.insert(op.name().clone(), op.clone());
        self
    }

    pub fn with_child(mut self, child: Signature) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn children(&self) -> &[Signature] {
        &self.children
    }

    /// Whether `op` belongs to this signature's own residual part.
    pub fn defines(&self, op: &Operation) -> bool {
        self.ops.values().any(|own| own == op)
    }

    /// View the signature as a symbol table.
    ///
    /// With `inheritance`, operations of sub-signatures are included, and a
    /// signature's own symbols shadow those of its sub-signatures. Without it,
    /// only the residual operations defined here are returned. Symbols in
    /// `ignore` are left out either way.
    pub fn as_dict(&self, inheritance: bool, ignore: &[ArcStr]) -> SymbolTable {
        let mut table: SymbolTable = self
            .ops
            .iter()
            .filter(|(symbol, _)| !ignore.contains(symbol))
            .map(|(symbol, op)| (symbol.clone(), op.clone()))
            .collect();
        if !inheritance {
            return table;
        }
        let mut shadowed = ignore.to_vec();
        shadowed.extend(self.ops.keys().cloned());
        for child in &self.children {
            for (symbol, op) in child.as_dict(true, &shadowed) {
                table.entry(symbol).or_insert(op);
            }
        }
        table
    }

    pub fn operations(&self) -> IndexSet<Operation> {
        self.as_dict(true, &[]).into_values().collect()
    }

    /// Publishes every operation of this signature into `env`.
    pub fn export_ops(&self, env: &mut SymbolTable) {
        env.extend(self.as_dict(true, &[]));
    }
}

/// One field of a value-syntax type, as seen by [`ValueSyntax::describe`].
pub enum Field<'a> {
    Name(&'a str),
    Binding(Vec<(String, String)>),
    Layers(Vec<Vec<(String, String)>>),
    Term(&'a Term),
}

/// A user value type that runners dispatch on.
pub trait ValueSyntax {
    fn type_name(&self) -> &'static str;

    fn fields(&self) -> Vec<(&'static str, Field<'_>)>;

    /// Multi-line listing: names first, then bindings, then terms.
    fn describe(&self) -> String {
        let (i1, i2) = (" ".repeat(2), " ".repeat(4));
        let fields = self.fields();
        let mut lines = vec![format!("{}:", self.type_name())];

        for (field, value) in &fields {
            if let Field::Name(name) = value {
                lines.push(format!("{i1}{field}: {name}"));
            }
        }
        for (field, value) in &fields {
            match value {
                Field::Binding(rows) if !rows.is_empty() => {
                    lines.push(format!("{i1}{field}:"));
                    lines.extend(rows.iter().map(|(k, v)| format!("{i2}{k}: {v}")));
                }
                Field::Layers(layers) => {
                    for (j, rows) in layers.iter().enumerate() {
                        lines.push(format!("{i1}{field}[{j}]:"));
                        lines.extend(rows.iter().map(|(k, v)| format!("{i2}{k}: {v}")));
                    }
                }
                _ => {}
            }
        }
        for (field, value) in &fields {
            if let Field::Term(term) = value {
                lines.push(format!("{i1}{field}:"));
                lines.push(format!("{i2}{term}"));
            }
        }
        lines.join("\n")
    }
}

/// Rows for a binding keyed by name; names are quoted.
pub fn named_rows<V: Display>(table: &IndexMap<ArcStr, V>) -> Vec<(String, String)> {
    table
        .iter()
        .map(|(name, value)| (format!("'{}'", name), value.to_string()))
        .collect()
}

/// Rows for a binding keyed by operation.
pub fn bound_rows<V: Display>(table: &IndexMap<Operation, V>) -> Vec<(String, String)> {
    table
        .iter()
        .map(|(op, value)| (op.to_string(), value.to_string()))
        .collect()
}
