//! Interpretation of effect terms.
//!
//! An [`Interpretation`] assigns co-operations to operations. Evaluating a
//! term replaces each call whose arguments are values matching one of the
//! co-operation's dispatch cases by the co-operation's result. Any other call
//! is kept as an effect term, so a partially interpreted program is still a
//! valid program for a later runner.

use super::error::EvalError;
use super::syntax::{Kind, Operation, Term, Value};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

pub type CoFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

#[derive(Clone)]
struct Case {
    kinds: Vec<Kind>,
    func: CoFn,
}

impl Case {
    fn matches(&self, args: &[Value]) -> bool {
        self.kinds.len() == args.len()
            && self.kinds.iter().zip(args).all(|(kind, arg)| kind.matches(arg))
    }
}

/// Multiple-dispatch table for one operation. Cases are tried in order.
#[derive(Clone, Default)]
pub struct CoOperation {
    cases: Vec<Case>,
}

impl CoOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case<const N: usize>(
        mut self,
        kinds: [Kind; N],
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        self.cases.push(Case {
            kinds: kinds.to_vec(),
            func: Arc::new(func),
        });
        self
    }

    pub fn constant(value: Value) -> Self {
        Self::new().case([], move |_| Ok(value.clone()))
    }

    /// `None` when no case accepts the arguments.
    pub fn dispatch(&self, args: &[Value]) -> Option<Result<Value, EvalError>> {
        self.cases
            .iter()
            .find(|case| case.matches(args))
            .map(|case| (case.func)(args))
    }

    /// Appends the cases of `fallback` after the cases of `self`.
    pub fn or_else(mut self, fallback: &CoOperation) -> Self {
        self.cases.extend(fallback.cases.iter().cloned());
        self
    }

    pub fn signatures(&self) -> impl Iterator<Item = &[Kind]> {
        self.cases.iter().map(|case| case.kinds.as_slice())
    }
}

impl fmt::Debug for CoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.signatures()).finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Interpretation {
    coops: IndexMap<Operation, CoOperation>,
}

impl Interpretation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interprets each nullary operation as a fixed value.
    pub fn constants(bindings: impl IntoIterator<Item = (Operation, Value)>) -> Self {
        Self {
            coops: bindings
                .into_iter()
                .map(|(op, value)| (op, CoOperation::constant(value)))
                .collect(),
        }
    }

    pub fn insert(&mut self, op: Operation, coop: CoOperation) {
        self.coops.insert(op, coop);
    }

    pub fn with(mut self, op: Operation, coop: CoOperation) -> Self {
        self.insert(op, coop);
        self
    }

    pub fn get(&self, op: &Operation) -> Option<&CoOperation> {
        self.coops.get(op)
    }

    pub fn contains(&self, op: &Operation) -> bool {
        self.coops.contains_key(op)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.coops.keys()
    }

    pub fn len(&self) -> usize {
        self.coops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coops.is_empty()
    }

    /// Interprets one call whose arguments are already evaluated.
    pub fn apply(&self, op: &Operation, args: Vec<Term>) -> Result<Term, EvalError> {
        let Some(coop) = self.coops.get(op) else {
            return Ok(Term::Call(op.clone(), args));
        };
        let values: Option<Vec<Value>> = args.iter().map(|arg| arg.as_value().cloned()).collect();
        let Some(values) = values else {
            return Ok(Term::Call(op.clone(), args));
        };
        match coop.dispatch(&values) {
            Some(result) => {
                let value = result?;
                tracing::trace!(operation = %op, result = %value, "interpreted");
                Ok(Term::Value(value))
            }
            None => {
                tracing::trace!(operation = %op, "no dispatch case, keeping effect term");
                Ok(Term::Call(op.clone(), args))
            }
        }
    }
}

/// Combines two interpretations. Where both interpret an operation, the cases
/// of `inner` are tried before those of `outer`.
pub fn coproduct(outer: &Interpretation, inner: &Interpretation) -> Interpretation {
    let mut coops = outer.coops.clone();
    for (op, coop) in &inner.coops {
        let combined = match outer.coops.get(op) {
            Some(fallback) => coop.clone().or_else(fallback),
            None => coop.clone(),
        };
        coops.insert(op.clone(), combined);
    }
    Interpretation { coops }
}

/// Stack growth used while walking deeply nested terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    pub red_zone: usize,
    pub stack_size: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            red_zone: 64 * 1024,
            stack_size: 32 * 1024 * 1024,
        }
    }
}

/// Runs `f` on a fresh stack segment when the current one is nearly used up.
pub(crate) fn grow<R>(f: impl FnOnce() -> R) -> R {
    let options = EvalOptions::default();
    stacker::maybe_grow(options.red_zone, options.stack_size, f)
}

pub fn evaluate(term: &Term, intp: &Interpretation) -> Result<Term, EvalError> {
    evaluate_with(term, intp, EvalOptions::default())
}

pub fn evaluate_with(
    term: &Term,
    intp: &Interpretation,
    options: EvalOptions,
) -> Result<Term, EvalError> {
    stacker::maybe_grow(options.red_zone, options.stack_size, || match term {
        Term::Value(value) => Ok(Term::Value(value.clone())),
        Term::Call(op, args) => {
            let args = args
                .iter()
                .map(|arg| evaluate_with(arg, intp, options))
                .collect::<Result<Vec<_>, _>>()?;
            intp.apply(op, args)
        }
    })
}

thread_local! {
    static HANDLERS: RefCell<Vec<Interpretation>> = const { RefCell::new(Vec::new()) };
}

struct HandlerGuard;

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        HANDLERS.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}

/// Runs `body` with `intp` installed on top of the handlers already in scope.
pub fn handler<R>(intp: &Interpretation, body: impl FnOnce() -> R) -> R {
    let combined = HANDLERS.with_borrow(|stack| match stack.last() {
        Some(outer) => coproduct(outer, intp),
        None => intp.clone(),
    });
    HANDLERS.with_borrow_mut(|stack| stack.push(combined));
    let _guard = HandlerGuard;
    body()
}

/// The interpretation currently in scope, if any.
pub fn current_handler() -> Option<Interpretation> {
    HANDLERS.with_borrow(|stack| stack.last().cloned())
}

impl Operation {
    /// Calls the operation under the handlers in scope. Without a handler the
    /// call is returned as an effect term.
    pub fn perform(&self, args: impl IntoIterator<Item = Term>) -> Result<Term, EvalError> {
        let term = self.call(args);
        match current_handler() {
            Some(intp) => evaluate(&term, &intp),
            None => Ok(term),
        }
    }
}
