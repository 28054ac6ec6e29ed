use super::syntax::Term;
use crate::runners::RunnerError;
use arcstr::ArcStr;
use std::fmt;

/// A contextual bigraph whose parts do not fit together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxError {
    DuplicateInterfaceName {
        bigraph: ArcStr,
        name: ArcStr,
    },
    UnboundOuterSite {
        bigraph: ArcStr,
        site: ArcStr,
    },
    FreeVariableInRoot {
        bigraph: ArcStr,
        name: ArcStr,
    },
    FreeVariableInLayer {
        bigraph: ArcStr,
        layer: usize,
        name: ArcStr,
    },
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateInterfaceName { bigraph, name } => {
                write!(f, "`{}`: interface name `{}` is used more than once", bigraph, name)
            }
            Self::UnboundOuterSite { bigraph, site } => {
                write!(f, "`{}`: outer site `{}` has no bound term", bigraph, site)
            }
            Self::FreeVariableInRoot { bigraph, name } => write!(
                f,
                "`{}`: root refers to `{}`, which is not an outer site",
                bigraph, name
            ),
            Self::FreeVariableInLayer {
                bigraph,
                layer,
                name,
            } => write!(
                f,
                "`{}`: layer {} refers to `{}`, which is neither an interface variable nor bound by the previous layer",
                bigraph, layer, name
            ),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Failure of a co-operation while evaluating a term.
#[derive(Clone, Debug)]
pub enum EvalError {
    BadArguments(ArcStr),
    NotABigraph(ArcStr),
    NotClosed(ArcStr),
    MissingArgument { bigraph: ArcStr, name: ArcStr },
    UnmatchedSite(ArcStr),
    UnmatchedLink(ArcStr),
    Stuck(Term),
    Syntax(SyntaxError),
    Runner(RunnerError),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadArguments(op) => write!(f, "`{}` was dispatched on arguments it cannot take", op),
            Self::NotABigraph(name) => write!(f, "argument `{}` is not a bare bigraph", name),
            Self::NotClosed(bigraph) => {
                write!(f, "`{}` has outer links and cannot be grounded", bigraph)
            }
            Self::MissingArgument { bigraph, name } => {
                write!(f, "`{}`: no value given for inner name `{}`", bigraph, name)
            }
            Self::UnmatchedSite(site) => {
                write!(f, "site `{}` has no counterpart across the interface", site)
            }
            Self::UnmatchedLink(link) => {
                write!(f, "link `{}` has no counterpart across the interface", link)
            }
            Self::Stuck(term) => write!(f, "evaluation got stuck at `{}`", term),
            Self::Syntax(error) => write!(f, "{}", error),
            Self::Runner(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<SyntaxError> for EvalError {
    fn from(error: SyntaxError) -> Self {
        Self::Syntax(error)
    }
}

impl From<RunnerError> for EvalError {
    fn from(error: RunnerError) -> Self {
        Self::Runner(error)
    }
}
