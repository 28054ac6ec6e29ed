use crate::effects::algebra::{Signature, SymbolTable};
use crate::effects::error::EvalError;
use crate::effects::semantics::{evaluate, CoOperation, Interpretation};
use crate::effects::spacelike::Binding;
use crate::effects::syntax::Term;
use arcstr::ArcStr;
use indexmap::IndexMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunnerError {
    MissingRunner {
        signature: &'static str,
        symbol: ArcStr,
    },
    AmbiguousRunner {
        signature: &'static str,
        symbol: ArcStr,
    },
    MissingCoOperation {
        signature: &'static str,
        symbol: ArcStr,
    },
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRunner { signature, symbol } => {
                write!(f, "no runner for `{}` of signature `{}`", symbol, signature)
            }
            Self::AmbiguousRunner { signature, symbol } => write!(
                f,
                "more than one runner for `{}` of signature `{}`",
                symbol, signature
            ),
            Self::MissingCoOperation { signature, symbol } => write!(
                f,
                "the runner of `{}` does not implement `{}`",
                signature, symbol
            ),
        }
    }
}

impl std::error::Error for RunnerError {}

/// A runner (affine handler) for a [`Signature`]: co-operations for the
/// signature's own operations, with sub-runners covering its
/// sub-signatures.
#[derive(Clone, Debug)]
pub struct Runner {
    signature: Signature,
    coops: IndexMap<ArcStr, CoOperation>,
    children: Vec<Runner>,
}

impl Runner {
    pub fn new(signature: &Signature) -> Self {
        Self {
            signature: signature.clone(),
            coops: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn coop(mut self, symbol: &str, coop: CoOperation) -> Self {
        self.coops.insert(symbol.into(), coop);
        self
    }

    pub fn with_child(mut self, child: Runner) -> Self {
        self.children.push(child);
        self
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    fn descendants(&self) -> Vec<&Runner> {
        let mut runners = vec![self];
        for child in &self.children {
            runners.extend(child.descendants());
        }
        runners
    }

    /// Pairs every operation of the signature (see [`Signature::as_dict`])
    /// with the co-operation of the one runner whose signature defines it.
    pub fn as_dict(&self, inheritance: bool) -> Result<Interpretation, RunnerError> {
        let runners = self.descendants();
        let mut intp = Interpretation::new();
        for (symbol, op) in self.signature.as_dict(inheritance, &[]) {
            let owners: Vec<&Runner> = runners
                .iter()
                .copied()
                .filter(|runner| runner.signature.defines(&op))
                .collect();
            let runner = match owners.as_slice() {
                [runner] => *runner,
                [] => {
                    return Err(RunnerError::MissingRunner {
                        signature: self.signature.name(),
                        symbol,
                    })
                }
                _ => {
                    return Err(RunnerError::AmbiguousRunner {
                        signature: self.signature.name(),
                        symbol,
                    })
                }
            };
            let Some(coop) = runner.coops.get(&symbol) else {
                return Err(RunnerError::MissingCoOperation {
                    signature: runner.signature.name(),
                    symbol,
                });
            };
            intp.insert(op, coop.clone());
        }
        Ok(intp)
    }
}

/// Substitutes free variables of `term` and evaluates the result under
/// `intp`. Interface variables in `args` are bound by name to `vals`;
/// variables bound by a previous layer are taken from `env`.
pub fn substitute_term<V: Clone + Into<Term>>(
    term: &Term,
    args: &SymbolTable,
    vals: &IndexMap<ArcStr, V>,
    env: Option<&Binding>,
    intp: &Interpretation,
) -> Result<Term, EvalError> {
    let bindings = bindings(args, vals, env);
    evaluate(&term.substitute(&bindings), intp)
}

/// [`substitute_term`] for every term of `prog`.
pub fn substitute<V: Clone + Into<Term>>(
    prog: &Binding,
    args: &SymbolTable,
    vals: &IndexMap<ArcStr, V>,
    env: Option<&Binding>,
    intp: &Interpretation,
) -> Result<Binding, EvalError> {
    let bindings = bindings(args, vals, env);
    prog.iter()
        .map(|(var, term)| Ok((var.clone(), evaluate(&term.substitute(&bindings), intp)?)))
        .collect()
}

fn bindings<V: Clone + Into<Term>>(
    args: &SymbolTable,
    vals: &IndexMap<ArcStr, V>,
    env: Option<&Binding>,
) -> Binding {
    let mut bindings: Binding = args
        .iter()
        .filter_map(|(name, var)| vals.get(name).map(|val| (var.clone(), val.clone().into())))
        .collect();
    if let Some(env) = env {
        bindings.extend(env.iter().map(|(var, term)| (var.clone(), term.clone())));
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::algebra::variables;
    use crate::effects::syntax::{Kind, Operation, Value};

    fn concat() -> (Operation, CoOperation) {
        let op = Operation::new("concat", Kind::Str);
        let coop = CoOperation::new().case([Kind::Str, Kind::Str], |args| match args {
            [Value::Str(a), Value::Str(b)] => Ok(Value::Str(arcstr::format!("{}{}", a, b))),
            _ => Err(EvalError::BadArguments("concat".into())),
        });
        (op, coop)
    }

    #[test]
    fn runners_resolve_operations_through_sub_runners() {
        let (op, coop) = concat();
        let leaf = Signature::new("Leaf").with_op(&op);
        let top = Signature::new("Top").with_child(leaf.clone());

        let runner = Runner::new(&top).with_child(Runner::new(&leaf).coop("concat", coop));
        let intp = runner.as_dict(true).unwrap();
        assert!(intp.contains(&op));
        assert!(runner.as_dict(false).unwrap().is_empty());
    }

    #[test]
    fn missing_and_ambiguous_runners_are_reported() {
        let (op, coop) = concat();
        let leaf = Signature::new("Leaf").with_op(&op);
        let top = Signature::new("Top").with_child(leaf.clone());

        let error = Runner::new(&top).as_dict(true).unwrap_err();
        assert_eq!(
            error,
            RunnerError::MissingRunner {
                signature: "Top",
                symbol: "concat".into()
            }
        );

        let error = Runner::new(&top)
            .with_child(Runner::new(&leaf))
            .as_dict(true)
            .unwrap_err();
        assert!(matches!(error, RunnerError::MissingCoOperation { signature: "Leaf", .. }));

        let error = Runner::new(&top)
            .with_child(Runner::new(&leaf).coop("concat", coop.clone()))
            .with_child(Runner::new(&leaf).coop("concat", coop))
            .as_dict(true)
            .unwrap_err();
        assert!(matches!(error, RunnerError::AmbiguousRunner { .. }));
    }

    #[test]
    fn substitution_binds_names_then_environment() {
        let (op, coop) = concat();
        let intp = Interpretation::new().with(op.clone(), coop);
        let args = variables(["a"], Kind::Str);
        let layer_var = Operation::new("b", Kind::Str);
        let out = Operation::new("out", Kind::Str);

        let prog = Binding::from([(out.clone(), op.call([args["a"].var(), layer_var.var()]))]);
        let vals = IndexMap::from([(ArcStr::from("a"), Value::from("x"))]);
        let env = Binding::from([(layer_var, Term::from("y"))]);

        let result = substitute(&prog, &args, &vals, Some(&env), &intp).unwrap();
        assert_eq!(result[&out].to_string(), "\"xy\"");

        let partial = substitute(&prog, &args, &vals, None, &intp).unwrap();
        assert_eq!(partial[&out].to_string(), "concat(\"x\", b())");
    }
}
