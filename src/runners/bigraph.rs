//! Runners for bigraph combinator effects, backed by [`crate::bigraph`].

use super::algebra::{substitute, substitute_term, Runner};
use crate::bigraph::{Bigraph, Edge};
use crate::effects::algebra::SymbolTable;
use crate::effects::error::EvalError;
use crate::effects::semantics::{coproduct, evaluate, CoOperation, Interpretation};
use crate::effects::spacelike::{
    BigraphInterface, Binding, CtxBigraph, HORIZONTAL_LOCAL, SPACELIKE_GLOBAL, SPACELIKE_LOCAL,
    VERTICAL_GLOBAL, VERTICAL_LOCAL,
};
use crate::effects::syntax::{Kind, Operation, Term, Value};
use arcstr::ArcStr;
use indexmap::IndexMap;
use tracing::debug;

pub use crate::bigraph::bare_equal;

/// Evaluates bare bigraph combinators.
pub fn bigraph_local() -> Runner {
    Runner::new(&SPACELIKE_LOCAL)
        .with_child(bigraph_horizontal_local())
        .with_child(bigraph_vertical_local())
}

pub fn bigraph_horizontal_local() -> Runner {
    Runner::new(&HORIZONTAL_LOCAL)
        .coop(
            "merge",
            CoOperation::new().case([Kind::Base, Kind::Base], |args| match args {
                [Value::Bigraph(left), Value::Bigraph(right)] => {
                    Ok(Bigraph::merge(left.clone(), right.clone()).into())
                }
                _ => Err(EvalError::BadArguments("merge".into())),
            }),
        )
        .coop(
            "parallel",
            CoOperation::new().case([Kind::Base, Kind::Base], |args| match args {
                [Value::Bigraph(left), Value::Bigraph(right)] => {
                    Ok(Bigraph::parallel(left.clone(), right.clone()).into())
                }
                _ => Err(EvalError::BadArguments("parallel".into())),
            }),
        )
        .coop(
            "link",
            CoOperation::new()
                .case([Kind::Node, Kind::Edge], |args| match args {
                    [Value::Bigraph(Bigraph::Node(node)), Value::Bigraph(Bigraph::Edge(edge))] => {
                        Ok(node.clone().link(edge).into())
                    }
                    _ => Err(EvalError::BadArguments("link".into())),
                })
                .case([Kind::Edge, Kind::Node], |args| match args {
                    [Value::Bigraph(Bigraph::Edge(edge)), Value::Bigraph(Bigraph::Node(node))] => {
                        Ok(edge.clone().link(node.clone()).into())
                    }
                    _ => Err(EvalError::BadArguments("link".into())),
                }),
        )
}

pub fn bigraph_vertical_local() -> Runner {
    Runner::new(&VERTICAL_LOCAL).coop(
        "nest",
        CoOperation::new().case([Kind::Node, Kind::Base], |args| match args {
            [Value::Bigraph(Bigraph::Node(node)), Value::Bigraph(inner)] => {
                Ok(node.clone().nest(inner.clone()).into())
            }
            _ => Err(EvalError::BadArguments("nest".into())),
        }),
    )
}

/// Evaluates combinators on whole contextual bigraphs.
pub fn bigraph_global() -> Runner {
    Runner::new(&SPACELIKE_GLOBAL).with_child(bigraph_vertical_global())
}

pub fn bigraph_vertical_global() -> Runner {
    Runner::new(&VERTICAL_GLOBAL)
        .coop(
            "ground",
            CoOperation::new().case([Kind::Ctx, Kind::Map], |args| match args {
                [Value::Ctx(prog), Value::Map(vals)] => Ok(ground(prog, vals)?.into()),
                _ => Err(EvalError::BadArguments("ground".into())),
            }),
        )
        .coop(
            "compose",
            CoOperation::new().case([Kind::Ctx, Kind::Interface, Kind::Ctx], |args| {
                match args {
                    [Value::Ctx(outer), Value::Interface(interface), Value::Ctx(inner)] => {
                        Ok(compose(outer, interface, inner)?.into())
                    }
                    _ => Err(EvalError::BadArguments("compose".into())),
                }
            }),
        )
}

fn edge_constants(edges: &IndexMap<Operation, Edge>) -> Interpretation {
    Interpretation::constants(
        edges
            .iter()
            .map(|(var, edge)| (var.clone(), Value::from(edge.clone()))),
    )
}

/// Reduces a closed contextual bigraph to a bare bigraph, plugging its inner
/// interface with `vals`.
pub fn ground(prog: &CtxBigraph, vals: &IndexMap<ArcStr, Value>) -> Result<Bigraph, EvalError> {
    if let Some((name, _)) = vals.iter().find(|(_, val)| val.as_bigraph().is_none()) {
        return Err(EvalError::NotABigraph(name.clone()));
    }
    if !prog.closed() {
        return Err(EvalError::NotClosed(prog.name().clone()));
    }
    let args: SymbolTable = prog
        .inner_sites()
        .iter()
        .chain(prog.inner_links())
        .map(|(name, var)| (name.clone(), var.clone()))
        .collect();
    if let Some(name) = args.keys().find(|name| !vals.contains_key(*name)) {
        return Err(EvalError::MissingArgument {
            bigraph: prog.name().clone(),
            name: name.clone(),
        });
    }

    debug!(
        bigraph = %prog.name(),
        layers = prog.layers().count(),
        "grounding contextual bigraph"
    );
    let intp = coproduct(
        &edge_constants(prog.bound_edges()),
        &bigraph_local().as_dict(true)?,
    );

    // each layer only sees the results of the one before
    let mut env = Binding::new();
    for layer in prog.layers() {
        env = substitute(layer, &args, vals, Some(&env), &intp)?;
    }
    let root = substitute_term(prog.root(), &args, vals, Some(&env), &intp)?;
    match root.as_value().and_then(Value::as_bigraph) {
        Some(bigraph) => Ok(bigraph.clone()),
        None => Err(EvalError::Stuck(root)),
    }
}

// outside-in: an outer link of `inner` becomes an inner link of `outer`
fn match_link<'a>(
    outer: &'a CtxBigraph,
    interface: &BigraphInterface,
    link: &ArcStr,
) -> Result<&'a Operation, EvalError> {
    interface
        .links
        .get(link)
        .and_then(|name| outer.inner_links().get(name))
        .ok_or_else(|| EvalError::UnmatchedLink(link.clone()))
}

// inside-out: an inner site of `outer` is filled by an outer site of `inner`
fn match_site<'a>(
    inner: &'a CtxBigraph,
    interface: &BigraphInterface,
    site: &ArcStr,
) -> Result<&'a Term, EvalError> {
    interface
        .sites
        .get(site)
        .and_then(|name| inner.outer_sites().get(name))
        .and_then(|var| inner.bound_sites().get(var))
        .ok_or_else(|| EvalError::UnmatchedSite(site.clone()))
}

fn relabel(prefix: &ArcStr, table: &SymbolTable) -> SymbolTable {
    table
        .iter()
        .map(|(name, var)| (arcstr::format!("{}.{}", prefix, name), var.clone()))
        .collect()
}

fn bind_edges(layer: &Binding, edges: &Interpretation) -> Result<Binding, EvalError> {
    layer
        .iter()
        .map(|(var, term)| Ok((var.clone(), evaluate(term, edges)?)))
        .collect()
}

/// Composes `outer` after `inner` along `interface`.
///
/// The composite keeps the inner interface of `inner` and the outer interface
/// of `outer`, with names prefixed by the name of the bigraph they come from.
/// Its internal layers are those of `inner`, then one binding each inner site
/// of `outer` to the matching outer site term of `inner`, then those of
/// `outer`. Links bound to edges on either side are resolved in every layer.
pub fn compose(
    outer: &CtxBigraph,
    interface: &BigraphInterface,
    inner: &CtxBigraph,
) -> Result<CtxBigraph, EvalError> {
    let bound_links: Binding = inner
        .outer_links()
        .iter()
        .map(|(link, var)| Ok((var.clone(), match_link(outer, interface, link)?.var())))
        .collect::<Result<_, EvalError>>()?;

    let mut site_layer = Binding::new();
    for (site, var) in outer.inner_sites() {
        let term = match_site(inner, interface, site)?;
        site_layer.insert(var.clone(), term.substitute(&bound_links));
    }

    let mut bound_edges = inner.bound_edges().clone();
    bound_edges.extend(outer.bound_edges().iter().map(|(k, v)| (k.clone(), v.clone())));
    let edges = edge_constants(&bound_edges);

    let bound_terms = inner
        .bound_terms()
        .iter()
        .chain(std::iter::once(&site_layer))
        .chain(outer.bound_terms())
        .map(|layer| bind_edges(layer, &edges))
        .collect::<Result<Vec<_>, _>>()?;

    let composite = CtxBigraph::builder(
        arcstr::format!("{}*{}", outer.name(), inner.name()),
        outer.root().clone(),
    )
    .inner_sites(relabel(inner.name(), inner.inner_sites()))
    .inner_links(relabel(inner.name(), inner.inner_links()))
    .outer_sites(relabel(outer.name(), outer.outer_sites()))
    .outer_links(relabel(outer.name(), outer.outer_links()))
    .bound_sites(bind_edges(outer.bound_sites(), &edges)?)
    .bound_edges(bound_edges)
    .bound_terms(bound_terms)
    .build()?;

    debug!(
        composite = %composite.name(),
        layers = composite.layers().count(),
        "composed contextual bigraphs"
    );
    Ok(composite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigraph::{parse, Node};
    use crate::effects::algebra::variables;
    use crate::effects::semantics::{handler, Interpretation};
    use crate::effects::spacelike::{GROUND, LINK, MERGE, NEST, PARALLEL};
    use crate::effects::syntax::Term;

    fn local_runners() -> Vec<(&'static str, Interpretation)> {
        // equivalent ways of building the same interpretation
        vec![
            ("spacelike", bigraph_local().as_dict(true).unwrap()),
            (
                "horizontal+vertical",
                coproduct(
                    &bigraph_horizontal_local().as_dict(false).unwrap(),
                    &bigraph_vertical_local().as_dict(false).unwrap(),
                ),
            ),
        ]
    }

    fn big(source: &str) -> Term {
        Term::from(parse(source).unwrap())
    }

    /// Checks one operation against its intended meaning: without a handler
    /// it builds a term, with a handler it falls back to a term on
    /// `failing` arguments and otherwise agrees with `expected`.
    fn check_semantics(
        intp: &Interpretation,
        op: &Operation,
        valid: Vec<(Term, Term)>,
        expected: Vec<Bigraph>,
        failing: Vec<(Term, Term)>,
    ) {
        let static_kinds: Vec<Kind> = valid
            .iter()
            .map(|(a, b)| {
                let term = op.perform([a.clone(), b.clone()]).unwrap();
                assert!(matches!(term, Term::Call(..)));
                term.kind()
            })
            .collect();

        handler(intp, || {
            for (a, b) in &failing {
                let term = op.perform([a.clone(), b.clone()]).unwrap();
                assert!(matches!(term, Term::Call(..)), "{} should not reduce", term);
            }
            for (((a, b), expected), kind) in valid.iter().zip(&expected).zip(static_kinds) {
                let result = op.perform([a.clone(), b.clone()]).unwrap();
                let value = result.as_value().expect("valid arguments reduce");
                assert!(value.kind().refines(kind));
                assert!(bare_equal(value.as_bigraph().unwrap(), expected));
            }
        });
    }

    #[test]
    fn runners_cover_the_local_signature() {
        for (label, intp) in local_runners() {
            let mut names: Vec<_> = intp.operations().map(|op| op.name().to_string()).collect();
            names.sort();
            assert_eq!(names, ["link", "merge", "nest", "parallel"], "{}", label);
        }
    }

    #[test]
    fn untyped_combinators() {
        let (a, b) = (parse("A").unwrap(), parse("B").unwrap());
        let a_node = a.as_node().unwrap().clone();
        let cases = [
            (&*MERGE, Bigraph::merge(a.clone(), b.clone())),
            (&*PARALLEL, Bigraph::parallel(a.clone(), b.clone())),
            (&*NEST, Bigraph::Node(a_node.nest(b.clone()))),
        ];
        for (label, intp) in local_runners() {
            for (op, expected) in &cases {
                tracing::debug!(runner = label, operation = %op, "checking");
                check_semantics(
                    &intp,
                    op,
                    vec![(big("A"), big("B"))],
                    vec![expected.clone()],
                    vec![
                        (big("A"), Term::from(1_i64)),
                        (Term::from(2_i64), big("B")),
                        (Term::from(1_i64), Term::from(2_i64)),
                    ],
                );
            }
        }
    }

    #[test]
    fn link_dispatches_on_argument_kinds() {
        let (a, b) = (Node::new("A"), Node::new("B"));
        let (e, f) = (Edge::new("e"), Edge::new("f"));
        for (_, intp) in local_runners() {
            check_semantics(
                &intp,
                &LINK,
                vec![
                    (a.clone().into(), e.clone().into()),
                    (f.clone().into(), b.clone().into()),
                ],
                vec![
                    a.clone().link(&e).into(),
                    f.clone().link(b.clone()).into(),
                ],
                vec![
                    (a.clone().into(), b.clone().into()),
                    (b.clone().into(), a.clone().into()),
                    (e.clone().into(), f.clone().into()),
                    (f.clone().into(), e.clone().into()),
                ],
            );
        }
    }

    #[test]
    fn grounding_requires_a_closed_bigraph() {
        let outer_sites = variables(["q"], Kind::Base);
        let outer_links = variables(["y"], Kind::Edge);
        let open = CtxBigraph::builder("Open", outer_sites["q"].var())
            .bound_sites(Binding::from([(
                outer_sites["q"].clone(),
                LINK.call([big("A"), outer_links["y"].var()]),
            )]))
            .outer_sites(outer_sites)
            .outer_links(outer_links)
            .build()
            .unwrap();

        let error = ground(&open, &IndexMap::new()).unwrap_err();
        assert!(matches!(error, EvalError::NotClosed(name) if name.as_str() == "Open"));
    }

    #[test]
    fn grounding_plugs_inner_sites() {
        let inner = variables(["p"], Kind::Base);
        let outer = variables(["q"], Kind::Base);
        let ctx = CtxBigraph::builder("C", outer["q"].var())
            .bound_sites(Binding::from([(
                outer["q"].clone(),
                NEST.call([big("A"), inner["p"].var()]),
            )]))
            .inner_sites(inner)
            .outer_sites(outer)
            .build()
            .unwrap();

        let error = ground(&ctx, &IndexMap::new()).unwrap_err();
        assert!(matches!(error, EvalError::MissingArgument { .. }));

        let bad = IndexMap::from([(ArcStr::from("p"), Value::Int(3))]);
        assert!(matches!(ground(&ctx, &bad), Err(EvalError::NotABigraph(_))));

        let vals = IndexMap::from([(ArcStr::from("p"), Value::from(parse("B | C").unwrap()))]);
        let result = ground(&ctx, &vals).unwrap();
        assert!(bare_equal(&result, &parse("A.(C | B)").unwrap()));

        // the same, as an effect interpreted by the global runner
        let global = bigraph_global().as_dict(true).unwrap();
        let term = GROUND.call([Term::from(ctx), Term::from(Value::Map(vals.into()))]);
        let result = evaluate(&term, &global).unwrap();
        assert!(bare_equal(
            result.as_value().and_then(Value::as_bigraph).unwrap(),
            &parse("A.(B | C)").unwrap()
        ));
    }

    #[test]
    fn composing_checks_the_interface() {
        let inner_outer = variables(["q"], Kind::Base);
        let inner = CtxBigraph::builder("F", inner_outer["q"].var())
            .bound_sites(Binding::from([(inner_outer["q"].clone(), big("B"))]))
            .outer_sites(inner_outer)
            .build()
            .unwrap();

        let sites = variables(["p"], Kind::Base);
        let outer_outer = variables(["r"], Kind::Base);
        let outer = CtxBigraph::builder("H", outer_outer["r"].var())
            .bound_sites(Binding::from([(
                outer_outer["r"].clone(),
                MERGE.call([big("A"), sites["p"].var()]),
            )]))
            .inner_sites(sites)
            .outer_sites(outer_outer)
            .build()
            .unwrap();

        let wrong = BigraphInterface::new([("p".into(), "nope".into())], []);
        let error = compose(&outer, &wrong, &inner).unwrap_err();
        assert!(matches!(error, EvalError::UnmatchedSite(site) if site.as_str() == "p"));

        let right = BigraphInterface::new([("p".into(), "q".into())], []);
        let composite = compose(&outer, &right, &inner).unwrap();
        assert_eq!(composite.name().as_str(), "H*F");
        assert!(composite.inner_sites().is_empty());
        assert!(composite.outer_sites().contains_key("H.r"));
        assert_eq!(composite.bound_terms().len(), 1);

        let grounded = ground(&composite, &IndexMap::new()).unwrap();
        assert!(bare_equal(&grounded, &parse("A | B").unwrap()));
    }

    #[test]
    fn composing_requires_every_open_link_to_be_matched() {
        let q = variables(["q"], Kind::Base);
        let y = variables(["y"], Kind::Edge);
        let inner = CtxBigraph::builder("F", q["q"].var())
            .bound_sites(Binding::from([(
                q["q"].clone(),
                LINK.call([big("B"), y["y"].var()]),
            )]))
            .outer_sites(q)
            .outer_links(y)
            .build()
            .unwrap();

        let p = variables(["p"], Kind::Base);
        let x = variables(["x"], Kind::Edge);
        let r = variables(["r"], Kind::Base);
        let outer = CtxBigraph::builder("H", r["r"].var())
            .bound_sites(Binding::from([(
                r["r"].clone(),
                NEST.call([big("A"), p["p"].var()]),
            )]))
            .bound_edges(IndexMap::from([(x["x"].clone(), Edge::new("e"))]))
            .inner_sites(p)
            .inner_links(x)
            .outer_sites(r)
            .build()
            .unwrap();

        let sites = [(ArcStr::from("p"), ArcStr::from("q"))];
        let unlinked = BigraphInterface::new(sites.clone(), []);
        let error = compose(&outer, &unlinked, &inner).unwrap_err();
        assert!(matches!(error, EvalError::UnmatchedLink(link) if link.as_str() == "y"));

        let misnamed = BigraphInterface::new(sites.clone(), [("y".into(), "z".into())]);
        assert!(matches!(
            compose(&outer, &misnamed, &inner),
            Err(EvalError::UnmatchedLink(_))
        ));

        let linked = BigraphInterface::new(sites, [("y".into(), "x".into())]);
        let composite = compose(&outer, &linked, &inner).unwrap();
        let grounded = ground(&composite, &IndexMap::new()).unwrap();
        assert!(bare_equal(&grounded, &parse("A.B{e}").unwrap()));
    }

    #[test]
    fn grounding_a_layer_that_does_not_reduce_is_stuck() {
        let q = variables(["q"], Kind::Base);
        let ctx = CtxBigraph::builder("S", q["q"].var())
            .bound_sites(Binding::from([(
                q["q"].clone(),
                NEST.call([Term::from(Edge::new("e")), big("A")]),
            )]))
            .outer_sites(q)
            .build()
            .unwrap();

        let error = ground(&ctx, &IndexMap::new()).unwrap_err();
        assert!(matches!(&error, EvalError::Stuck(term) if term.to_string().starts_with("nest(")));
    }

    #[test]
    fn deep_layers_build_and_ground() {
        let depth = 10_000;
        let q = variables(["q"], Kind::Base);
        let edge = Term::from(Edge::new("e"));
        let mut term = big("A");
        for _ in 0..depth {
            term = LINK.call([term, edge.clone()]);
        }

        let ctx = CtxBigraph::builder("Deep", q["q"].var())
            .bound_sites(Binding::from([(q["q"].clone(), term)]))
            .outer_sites(q)
            .build()
            .unwrap();
        assert_eq!(ctx.root().operations().len(), 1);

        let result = ground(&ctx, &IndexMap::new()).unwrap();
        assert_eq!(result.as_node().map(|node| node.ports.len()), Some(depth));
    }
}
