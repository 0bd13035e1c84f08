//! The RDFa sequence: a recursive walk over the markup tree that produces quads.
//!
//! Based on [RDFa in XHTML: Syntax and Processing], section 5.5 "Sequence".
//!
//! The walk is generic over [`Hooks`]. The larger override points delegate by
//! default to the free function of the same name in this module, so a variant
//! can wrap the default behavior instead of replacing it.
//!
//! [RDFa in XHTML: Syntax and Processing]: http://www.w3.org/TR/rdfa-syntax/

use std::borrow::Cow;
use std::rc::Rc;

use itertools::Itertools;
use oxiri::Iri;
use oxrdf::vocab::rdf;

use crate::node::Element;
use crate::resolve::{self, expand_curie, resolve_reference, resolve_reference_list};
use crate::scope::Scope;
use crate::term::{Quad, Term, Variable};

/// A possibly rewritten element and the quads produced for its subtree.
pub type Walked<'e> = (Cow<'e, Element>, Vec<Quad>);

/// The evaluation context handed from an element to its children.
///
/// Never mutated: each recursion step either passes it on unchanged or
/// derives a new one.
#[derive(Clone, Debug)]
pub struct Context<M> {
    pub base: Rc<Iri<String>>,
    // “The parent subject.
    pub subject: Term,
    // “The parent object.
    pub object: Option<Term>,
    // “A list of incomplete triples, split by direction.
    pub pending_forward: Rc<[Term]>,
    pub pending_reverse: Rc<[Term]>,
    // “The language. Note that there is no default language.
    pub language: Option<Rc<str>>,
    /// State owned by the [`Hooks`] variant, derived per subtree.
    pub mode: M,
}

impl<M> Context<M> {
    /// The initial context: the base is the parent subject.
    pub fn new(base: Iri<String>, mode: M) -> Self {
        Self {
            subject: Term::iri(base.as_str()),
            base: Rc::new(base),
            object: None,
            pending_forward: Rc::default(),
            pending_reverse: Rc::default(),
            language: None,
            mode,
        }
    }
}

/// Where a quad produced for an element came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// `typeof`
    Type,
    /// `rel`/`rev` with a known object
    Relation,
    /// `property` with a literal value
    Property,
    /// an incomplete triple of the parent, completed by this element
    Chained,
}

/// The resolved `rel`, `rev`, `typeof` and `property` values of an element.
#[derive(Clone, Debug, Default)]
pub struct TermLists {
    pub rel: Vec<Term>,
    pub rev: Vec<Term>,
    pub types: Vec<Term>,
    pub properties: Vec<Term>,
}

impl TermLists {
    pub fn norel(&self) -> bool {
        self.rel.is_empty() && self.rev.is_empty()
    }
}

pub struct SubjectObject<'e> {
    pub element: Cow<'e, Element>,
    pub subject: Option<Term>,
    pub object: Option<Term>,
    /// The element contributes nothing; children see the parent's context.
    pub skip: bool,
}

pub struct LiteralObject<'e> {
    pub element: Cow<'e, Element>,
    pub quads: Vec<Quad>,
    /// The element content was captured as an XML literal and must not be walked.
    pub xml_literal: bool,
}

/// The override points of the walk.
///
/// A variant implements the methods it needs; the others keep the plain
/// RDFa behavior.
pub trait Hooks: Sized {
    type Mode: Clone;

    fn walk<'e>(
        &mut self,
        element: &'e Element,
        ctx: &Context<Self::Mode>,
        scope: &mut Scope,
    ) -> Walked<'e> {
        walk(self, element, ctx, scope)
    }

    fn subject_object<'e>(
        &mut self,
        element: Cow<'e, Element>,
        terms: &TermLists,
        ctx: &Context<Self::Mode>,
        scope: &mut Scope,
    ) -> SubjectObject<'e> {
        subject_object(self, element, terms, ctx, scope)
    }

    fn literal_object<'e>(
        &mut self,
        element: Cow<'e, Element>,
        subject: &Term,
        properties: &[Term],
        language: Option<&str>,
        ctx: &Context<Self::Mode>,
        scope: &mut Scope,
    ) -> LiteralObject<'e> {
        literal_object(self, element, subject, properties, language, ctx, scope)
    }

    fn create_literal(
        &mut self,
        element: &Element,
        language: Option<&str>,
        datatype: Option<&str>,
        content: Option<&str>,
        ctx: &Context<Self::Mode>,
        scope: &mut Scope,
    ) -> Option<(Term, bool)> {
        create_literal(self, element, language, datatype, content, ctx, scope)
    }

    fn transform_literal<'e>(
        &mut self,
        element: Cow<'e, Element>,
        _content: Option<&str>,
        literal: Term,
        _ctx: &Context<Self::Mode>,
        _scope: &mut Scope,
    ) -> (Cow<'e, Element>, Term) {
        (element, literal)
    }

    /// Creates the variable for `?name`; the empty name allocates a fresh one.
    fn create_variable(
        &mut self,
        name: &str,
        _ctx: &Context<Self::Mode>,
        scope: &mut Scope,
    ) -> Variable {
        if name.is_empty() {
            scope.fresh("v")
        } else {
            scope.by_name(name)
        }
    }

    /// Receives the quads of one element before its children are walked,
    /// and returns the ones to report.
    fn handle_quads(
        &mut self,
        _element: &Element,
        quads: Vec<(Quad, Origin)>,
        _ctx: &Context<Self::Mode>,
    ) -> Vec<Quad> {
        quads.into_iter().map(|(quad, _)| quad).collect()
    }

    /// Visits the element children of `parent` in document order.
    fn walk_children(
        &mut self,
        parent: &Element,
        _ctx: &Context<Self::Mode>,
        visit: &mut dyn FnMut(&mut Self, &Element) -> Vec<Quad>,
    ) -> Vec<Quad> {
        let mut quads = Vec::new();
        for child in parent.element_children() {
            quads.extend(visit(self, child));
        }
        quads
    }
}

/// Plain RDFa: collects the quads, nothing else.
#[derive(Debug, Default)]
pub struct QuadCollector;

impl Hooks for QuadCollector {
    type Mode = ();
}

/// Extracts the quads encoded in the tree.
pub fn statements(root: &Element, base: &str) -> Result<Vec<Quad>, crate::Error> {
    let base = crate::parse_base(base)?;
    let mut scope = Scope::new(base.as_str());
    let ctx = Context::new(base, ());
    let (_, quads) = QuadCollector.walk(root, &ctx, &mut scope);
    tracing::debug!("extracted {} quads", quads.len());
    Ok(quads)
}

/// One step of the sequence, for `element` and its subtree.
pub fn walk<'e, H: Hooks>(
    hooks: &mut H,
    element: &'e Element,
    ctx: &Context<H::Mode>,
    scope: &mut Scope,
) -> Walked<'e> {
    tracing::trace!(
        "<{} {}>",
        element.name(),
        element
            .attributes()
            .map(|(n, v)| format!("@{n}='{v}'"))
            .join(" ")
    );

    // 2. URI mappings
    let namespaces = resolve::namespaces(element);
    let pushed_namespaces = namespaces.mappings().next().is_some();
    if pushed_namespaces {
        scope.push_namespaces(namespaces);
    }

    // 3. [current language]
    let language: Option<Rc<str>> = element
        .nonempty_attr("lang")
        .map(Rc::from)
        .or_else(|| ctx.language.clone());

    // 4. and 5. [new subject] and [current object resource]
    let terms = TermLists {
        rel: resolve_reference_list(hooks, element, "rel", true, ctx, scope),
        rev: resolve_reference_list(hooks, element, "rev", true, ctx, scope),
        types: resolve_reference_list(hooks, element, "typeof", false, ctx, scope),
        properties: resolve_reference_list(hooks, element, "property", false, ctx, scope),
    };
    let norel = terms.norel();

    let SubjectObject {
        element,
        subject,
        object,
        skip,
    } = hooks.subject_object(Cow::Borrowed(element), &terms, ctx, scope);

    let mut quads: Vec<(Quad, Origin)> = Vec::new();

    // 6. typeof
    if let Some(typed) = object.as_ref().or(subject.as_ref()) {
        for class in &terms.types {
            quads.push((Quad::rdf_type(typed.clone(), class.clone()), Origin::Type));
        }
    }

    // 7. rel/rev triples
    let quad_subject = subject.clone().unwrap_or_else(|| ctx.subject.clone());
    if let Some(object) = &object {
        for predicate in &terms.rel {
            let quad = Quad::new(quad_subject.clone(), predicate.clone(), object.clone());
            quads.push((quad, Origin::Relation));
        }
        for predicate in &terms.rev {
            let quad = Quad::new(object.clone(), predicate.clone(), quad_subject.clone());
            quads.push((quad, Origin::Relation));
        }
    }

    // 8. incomplete triples
    let (child_object, pending_forward, pending_reverse): (_, Rc<[Term]>, Rc<[Term]>) =
        if object.is_none() && !norel {
            tracing::trace!(
                "- object unknown, deferring {} predicate(s)",
                terms.rel.len() + terms.rev.len()
            );
            (None, terms.rel.clone().into(), terms.rev.clone().into())
        } else {
            (object.clone(), Rc::default(), Rc::default())
        };

    // 9. literal object
    let (mut element, xml_literal) = if terms.properties.is_empty() {
        (element, false)
    } else {
        let LiteralObject {
            element,
            quads: property_quads,
            xml_literal,
        } = hooks.literal_object(
            element,
            &quad_subject,
            &terms.properties,
            language.as_deref(),
            ctx,
            scope,
        );
        quads.extend(property_quads.into_iter().map(|q| (q, Origin::Property)));
        (element, xml_literal)
    };

    // 10. complete incomplete triples
    if !skip {
        if let Some(new_subject) = &subject {
            for predicate in ctx.pending_forward.iter() {
                let quad = Quad::new(ctx.subject.clone(), predicate.clone(), new_subject.clone());
                quads.push((quad, Origin::Chained));
            }
            for predicate in ctx.pending_reverse.iter() {
                let quad = Quad::new(new_subject.clone(), predicate.clone(), ctx.subject.clone());
                quads.push((quad, Origin::Chained));
            }
        }
    }

    for (quad, origin) in &quads {
        tracing::trace!("- {origin:?}: {quad}");
    }

    let mut quads = hooks.handle_quads(&element, quads, ctx);

    // 11. recurse
    if !xml_literal {
        let child_ctx = if skip {
            Context {
                language,
                ..ctx.clone()
            }
        } else {
            Context {
                base: ctx.base.clone(),
                object: Some(child_object.unwrap_or_else(|| quad_subject.clone())),
                subject: quad_subject,
                pending_forward,
                pending_reverse,
                language,
                mode: ctx.mode.clone(),
            }
        };

        let mut rewritten: Vec<Option<Element>> = Vec::new();
        let mut visit = |hooks: &mut H, child: &Element| {
            let (child, quads) = hooks.walk(child, &child_ctx, scope);
            rewritten.push(match child {
                Cow::Owned(el) => Some(el),
                Cow::Borrowed(_) => None,
            });
            quads
        };
        quads.extend(hooks.walk_children(&element, ctx, &mut visit));

        if rewritten.iter().any(Option::is_some) {
            element.to_mut().replace_element_children(rewritten);
        }
    }

    if pushed_namespaces {
        scope.pop_namespaces();
    }

    (element, quads)
}

/// Steps 4 and 5: the new subject, the current object resource and the skip flag.
pub fn subject_object<'e, H: Hooks>(
    hooks: &mut H,
    element: Cow<'e, Element>,
    terms: &TermLists,
    ctx: &Context<H::Mode>,
    scope: &mut Scope,
) -> SubjectObject<'e> {
    let about = resolve_reference(hooks, &element, "about", ctx, scope);
    let resource = resolve_reference(hooks, &element, "resource", ctx, scope);
    let href = link(&element, "href", &ctx.base);
    let src = link(&element, "src", &ctx.base);
    let norel = terms.norel();

    let subject = if about.is_some() {
        about
    } else if src.is_some() {
        src
    } else if norel && resource.is_some() {
        resource.clone()
    } else if norel && href.is_some() {
        href.clone()
    } else if element.is_document_section() {
        link_to(&ctx.base, "")
    } else if !terms.types.is_empty() && resource.is_none() && href.is_none() {
        Some(scope.fresh("x").into())
    } else {
        None
    };

    let object = resource.or(href);
    let skip = norel && subject.is_none() && terms.properties.is_empty();

    SubjectObject {
        element,
        subject,
        object,
        skip,
    }
}

fn link(element: &Element, attr: &str, base: &Iri<String>) -> Option<Term> {
    link_to(base, element.nonempty_attr(attr)?)
}

fn link_to(base: &Iri<String>, reference: &str) -> Option<Term> {
    match crate::combine(base, reference) {
        Ok(iri) => Some(Term::iri(iri.into_inner())),
        Err(err) => {
            tracing::warn!("{err}, ignoring");
            None
        }
    }
}

/// Step 9: the literal object of `property`.
pub fn literal_object<'e, H: Hooks>(
    hooks: &mut H,
    element: Cow<'e, Element>,
    subject: &Term,
    properties: &[Term],
    language: Option<&str>,
    ctx: &Context<H::Mode>,
    scope: &mut Scope,
) -> LiteralObject<'e> {
    let content = element.attr("content").map(str::to_owned);
    let datatype = element.attr("datatype").map(str::to_owned);

    let Some((literal, xml_literal)) = hooks.create_literal(
        &element,
        language,
        datatype.as_deref(),
        content.as_deref(),
        ctx,
        scope,
    ) else {
        return LiteralObject {
            element,
            quads: Vec::new(),
            xml_literal: false,
        };
    };

    let (element, object) =
        hooks.transform_literal(element, content.as_deref(), literal, ctx, scope);

    let quads = properties
        .iter()
        .map(|predicate| Quad::new(subject.clone(), predicate.clone(), object.clone()))
        .collect();

    LiteralObject {
        element,
        quads,
        xml_literal,
    }
}

/// Builds the literal for an element; the flag is set for XML literals.
pub fn create_literal<H: Hooks>(
    hooks: &mut H,
    element: &Element,
    language: Option<&str>,
    datatype: Option<&str>,
    content: Option<&str>,
    ctx: &Context<H::Mode>,
    scope: &mut Scope,
) -> Option<(Term, bool)> {
    let lexical = match content {
        Some(content) if !content.is_empty() => content.to_string(),
        _ => element.text_content(),
    };

    let Some(datatype) = datatype.filter(|d| !d.is_empty()) else {
        // literals without @datatype are always plain literals
        return Some((plain_literal(lexical, language), false));
    };

    match expand_curie(hooks, datatype, ctx, scope)? {
        (Term::NamedNode(datatype), _) if datatype.as_ref() == rdf::XML_LITERAL => {
            let markup = element.inner_html();
            Some((oxrdf::Literal::new_typed_literal(markup, datatype).into(), true))
        }
        (Term::NamedNode(datatype), _) => {
            Some((oxrdf::Literal::new_typed_literal(lexical, datatype).into(), false))
        }
        (other, _) => {
            tracing::warn!("datatype {other} is not an IRI, no literal produced");
            None
        }
    }
}

fn plain_literal(lexical: String, language: Option<&str>) -> Term {
    let Some(language) = language else {
        return oxrdf::Literal::new_simple_literal(lexical).into();
    };

    match oxrdf::Literal::new_language_tagged_literal(lexical.as_str(), language) {
        Ok(literal) => literal.into(),
        Err(err) => {
            tracing::warn!("invalid language tag '{language}': {err}");
            oxrdf::Literal::new_simple_literal(lexical).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn quads(html: &str) -> Vec<String> {
        let root = Element::with_inner_html("div", html);
        statements(&root, "http://example.org/")
            .unwrap()
            .iter()
            .map(Quad::to_string)
            .collect()
    }

    #[test]
    fn chaining_completes_incomplete_triples() {
        let actual = quads(
            r#"<div about="?s" rel="http://example.org/knows">
                 <span about="?a"></span>
                 <span><span about="?b"></span></span>
               </div>"#,
        );

        assert_eq!(
            actual,
            vec![
                "?s <http://example.org/knows> ?a",
                "?s <http://example.org/knows> ?b",
            ]
        );
    }

    #[test]
    fn rev_reverses_direction() {
        let actual = quads(
            r#"<div about="?s" rev="http://example.org/knows" resource="?o"></div>
               <div about="?t" rev="http://example.org/likes"><i about="?u"></i></div>"#,
        );

        assert_eq!(
            actual,
            vec![
                "?o <http://example.org/knows> ?s",
                "?u <http://example.org/likes> ?t",
            ]
        );
    }

    #[test]
    fn href_is_resolved_against_base() {
        let actual = quads(r#"<a about="?s" rel="next" href="../page?x=1#top">next</a>"#);
        assert_eq!(
            actual,
            vec!["?s <http://www.w3.org/1999/xhtml/vocab#next> <http://example.org/page?x=1#top>"]
        );
    }

    #[test]
    fn language_is_inherited() {
        let actual = quads(
            r#"<div lang="de" about="?s"><span property="http://example.org/name">Katze</span></div>"#,
        );
        assert_eq!(actual, vec![r#"?s <http://example.org/name> "Katze"@de"#]);
    }

    #[test]
    fn xml_literal_is_not_walked() {
        let actual = quads(
            r#"<p about="?s" property="http://example.org/body"
                  datatype="http://www.w3.org/1999/02/22-rdf-syntax-ns#XMLLiteral"><b about="?x" property="http://example.org/p">y</b></p>"#,
        );

        assert_eq!(
            actual,
            vec![
                r#"?s <http://example.org/body> "<b about=\"?x\" property=\"http://example.org/p\">y</b>"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#XMLLiteral>"#
            ]
        );
    }

    #[test]
    fn namespaces_are_scoped_to_their_subtree() {
        let actual = quads(
            r#"<div about="?s">
                 <span prefix="ex: http://example.com/a#" property="ex:p">1</span>
                 <span property="ex:p">2</span>
               </div>"#,
        );

        assert_eq!(
            actual,
            vec![
                r#"?s <http://example.com/a#p> "1""#,
                r#"?s <ex:p> "2""#,
            ]
        );
    }

    #[test]
    fn invalid_base_is_an_error() {
        let root = Element::new("div");
        assert!(statements(&root, "not an iri").is_err());
    }
}
