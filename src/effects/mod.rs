//! Algebraic effects over bigraph combinators.
//!
//! Programs are [`Term`]s built from [`Operation`]s. They stay syntax until
//! an [`Interpretation`] (usually obtained from a runner) gives the
//! operations meaning.

pub mod algebra;
pub mod error;
pub mod semantics;
pub mod spacelike;
pub mod syntax;

pub use algebra::{variables, Signature, SymbolTable, ValueSyntax};
pub use error::{EvalError, SyntaxError};
pub use semantics::{
    coproduct, current_handler, evaluate, evaluate_with, handler, CoOperation, EvalOptions,
    Interpretation,
};
pub use spacelike::{
    BigraphInterface, Binding, CtxBigraph, CtxBigraphBuilder, COMPOSE, GROUND, LINK, MERGE, NEST,
    PARALLEL,
};
pub use syntax::{Kind, Operation, Term, Value};

/// Every bigraph combinator, by symbol.
pub fn exported_ops() -> SymbolTable {
    let mut env = SymbolTable::new();
    spacelike::SPACELIKE_LOCAL.export_ops(&mut env);
    spacelike::SPACELIKE_GLOBAL.export_ops(&mut env);
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_ops_are_the_combinators() {
        let env = exported_ops();
        let mut symbols: Vec<_> = env.keys().map(|k| k.as_str()).collect();
        symbols.sort();
        assert_eq!(
            symbols,
            ["compose", "ground", "link", "merge", "nest", "parallel"]
        );
        assert_eq!(env["nest"], *NEST);
    }
}
