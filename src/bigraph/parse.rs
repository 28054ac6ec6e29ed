//! Text syntax for bare bigraphs.
//!
//! ```text
//! parallel := merge ("||" merge)*
//! merge    := nest ("|" nest)*
//! nest     := unit | node ("." nest)? | "(" parallel ")"
//! unit     := "1" | "ε"
//! node     := name ("{" name ("," name)* "}")?
//! ```

use super::{Bigraph, Node};
use crate::effects::semantics::grow;
use crate::location::{FileName, Span, Spanning};
use arcstr::ArcStr;
use std::fmt;
use std::sync::Arc;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, delimited, not, opt, preceded, separated, terminated};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};
use winnow::ModalResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    span: Span,
    message: String,
}

impl ParseError {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn to_report(&self, source_code: Arc<str>) -> miette::Report {
        miette::miette!(
            labels = self.span.labels("here".to_owned()),
            "Invalid bigraph expression.\n\n{}",
            self.message
        )
        .with_source_code(source_code)
    }
}

impl Spanning for ParseError {
    fn span(&self) -> Span {
        self.span.clone()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span.start() {
            Some(point) => write!(
                f,
                "{}:{}: {}",
                point.row + 1,
                point.column + 1,
                self.message
            ),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

pub fn parse(source: &str) -> Result<Bigraph, ParseError> {
    parse_in(source, FileName::INLINE)
}

pub fn parse_in(source: &str, file: FileName) -> Result<Bigraph, ParseError> {
    delimited(multispace0, parallel, multispace0)
        .parse(source)
        .map_err(|error| {
            let offset = error.offset();
            let width = source[offset..].chars().next().map_or(0, char::len_utf8);
            let message = error.inner().to_string();
            ParseError {
                span: Span::from_offsets(source, offset, offset + width, file),
                message: if message.is_empty() {
                    "unexpected input".to_owned()
                } else {
                    message
                },
            }
        })
}

fn name(input: &mut &str) -> ModalResult<ArcStr> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '\''),
    )
        .take()
        .map(ArcStr::from)
        .context(StrContext::Label("name"))
        .parse_next(input)
}

fn ports(input: &mut &str) -> ModalResult<Vec<ArcStr>> {
    delimited(
        '{',
        cut_err(separated(0.., delimited(multispace0, name, multispace0), ',')),
        cut_err((multispace0, '}'))
            .context(StrContext::Expected(StrContextValue::CharLiteral('}'))),
    )
    .parse_next(input)
}

fn node(input: &mut &str) -> ModalResult<Node> {
    let control = name.parse_next(input)?;
    let ports = opt(ports).parse_next(input)?;
    Ok(Node {
        control,
        ports: ports.unwrap_or_default(),
        child: None,
    })
}

fn nested_node(input: &mut &str) -> ModalResult<Bigraph> {
    let node = node.parse_next(input)?;
    let inner = opt(preceded((multispace0, '.', multispace0), cut_err(nest))).parse_next(input)?;
    Ok(Bigraph::Node(match inner {
        Some(inner) => node.nest(inner),
        None => node,
    }))
}

fn group(input: &mut &str) -> ModalResult<Bigraph> {
    delimited(
        ('(', multispace0),
        cut_err(parallel),
        cut_err((multispace0, ')'))
            .context(StrContext::Expected(StrContextValue::CharLiteral(')'))),
    )
    .parse_next(input)
}

// `1` is one barren region, `ε` no regions at all
fn unit(input: &mut &str) -> ModalResult<Bigraph> {
    terminated(
        alt((
            '1'.value(Bigraph::Merge(Vec::new())),
            'ε'.value(Bigraph::Parallel(Vec::new())),
        )),
        not(one_of(|c: char| c.is_alphanumeric() || c == '_' || c == '\'')),
    )
    .parse_next(input)
}

fn nest(input: &mut &str) -> ModalResult<Bigraph> {
    grow(|| {
        alt((unit, nested_node, group))
            .context(StrContext::Label("bigraph"))
            .parse_next(input)
    })
}

fn merge(input: &mut &str) -> ModalResult<Bigraph> {
    let parts: Vec<Bigraph> =
        separated(1.., nest, (multispace0, '|', not('|'), multispace0)).parse_next(input)?;
    Ok(Bigraph::merge_all(parts))
}

fn parallel(input: &mut &str) -> ModalResult<Bigraph> {
    let parts: Vec<Bigraph> =
        separated(1.., merge, (multispace0, "||", multispace0)).parse_next(input)?;
    Ok(Bigraph::parallel_all(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigraph::bare_equal;

    #[test]
    fn single_node_with_links() {
        let bigraph = parse("v1{e0, e1}").unwrap();
        let node = bigraph.as_node().unwrap();
        assert_eq!(node.control.as_str(), "v1");
        assert_eq!(node.ports, vec![ArcStr::from("e0"), ArcStr::from("e1")]);
        assert!(node.child.is_none());
    }

    #[test]
    fn nesting_binds_tighter_than_juxtaposition() {
        let parsed = parse("A.B | C || D").unwrap();
        let expected = Bigraph::parallel(
            Bigraph::merge(
                Node::new("A").nest(Node::new("B").into()).into(),
                Node::new("C").into(),
            ),
            Node::new("D").into(),
        );
        assert!(bare_equal(&parsed, &expected));
        assert_eq!(parsed.unfold().regions.len(), 2);
    }

    #[test]
    fn groups_nest_several_places() {
        let parsed = parse("A.(B | C.D)").unwrap();
        let expected = Node::new("A").nest(Bigraph::merge(
            Node::new("B").into(),
            Node::new("C").nest(Node::new("D").into()).into(),
        ));
        assert!(bare_equal(&parsed, &expected.into()));
    }

    #[test]
    fn unclosed_group_is_reported_at_the_end() {
        let source = "A.(B | C";
        let error = parse(source).unwrap_err();
        assert_eq!(error.span().start().map(|p| p.offset), Some(8));
        let report = format!("{:?}", error.to_report(Arc::from(source)));
        assert!(report.contains("Invalid bigraph expression"));
    }

    #[test]
    fn dangling_merge_is_rejected() {
        assert!(parse("A |").is_err());
        assert!(parse("A ||").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn errors_next_to_wide_characters_are_reported() {
        let error = parse("A€").unwrap_err();
        assert_eq!(
            error.span().points().map(|(s, e)| (s.offset, e.offset)),
            Some((1, 4))
        );
        let error = parse("→").unwrap_err();
        assert_eq!(error.span().start().map(|p| (p.offset, p.column)), Some((0, 0)));
        let report = format!("{:?}", error.to_report(Arc::from("→")));
        assert!(report.contains("Invalid bigraph expression"));
    }

    #[test]
    fn units_are_not_node_names() {
        assert!(matches!(&parse("ε"), Ok(Bigraph::Parallel(parts)) if parts.is_empty()));
        assert!(matches!(&parse("A.1"), Ok(Bigraph::Node(node)) if node.child.is_some()));
        let named = parse("εx").unwrap();
        assert_eq!(named.as_node().map(|node| node.control.as_str()), Some("εx"));
    }

    #[test]
    fn deep_nesting_parses() {
        let depth = 50_000;
        let source = "A.".repeat(depth) + "A";
        let bigraph = parse(&source).unwrap();

        let mut levels = 0;
        let mut current = bigraph.as_node();
        while let Some(node) = current {
            levels += 1;
            current = node.child.as_deref().and_then(Bigraph::as_node);
        }
        assert_eq!(levels, depth + 1);
    }
}
