use std::fmt;

use oxrdf::vocab::rdf;

/// A [SPARQL query variable](https://www.w3.org/TR/sparql11-query/#sparqlQueryVariables).
///
/// Variables are compared by name only; the name already carries any
/// qualifier that was added to make it unique within a [`crate::Scope`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// A variable named `{base}_{qualifier}`.
    pub fn qualified(base: &str, qualifier: usize) -> Self {
        Self {
            name: format!("{base}_{qualifier}"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

/// The union of RDF terms, SPARQL variables and the default graph.
///
/// Equality is structural: same kind and same value (and for literals the
/// same language tag and datatype).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    NamedNode(oxrdf::NamedNode),
    BlankNode(oxrdf::BlankNode),
    Literal(oxrdf::Literal),
    Variable(Variable),
    DefaultGraph,
}

impl Term {
    /// Builds a named node without validating the IRI.
    ///
    /// Tokens that fail CURIE expansion are kept verbatim as IRIs, so this
    /// must accept anything the markup contains.
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::NamedNode(oxrdf::NamedNode::new_unchecked(iri))
    }

    /// The lexical form: IRI, blank node id, literal value or variable name.
    pub fn value(&self) -> &str {
        match self {
            Self::NamedNode(n) => n.as_str(),
            Self::BlankNode(b) => b.as_str(),
            Self::Literal(l) => l.value(),
            Self::Variable(v) => v.name(),
            Self::DefaultGraph => "",
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Self::Variable(var)
    }
}

impl From<oxrdf::NamedNode> for Term {
    fn from(node: oxrdf::NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<oxrdf::NamedNodeRef<'_>> for Term {
    fn from(node: oxrdf::NamedNodeRef<'_>) -> Self {
        Self::NamedNode(node.into_owned())
    }
}

impl From<oxrdf::BlankNode> for Term {
    fn from(node: oxrdf::BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl From<oxrdf::Literal> for Term {
    fn from(literal: oxrdf::Literal) -> Self {
        Self::Literal(literal)
    }
}

/// Canonical text form, which is also the SPARQL syntax of the term.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(n) => fmt::Display::fmt(n, f),
            Self::BlankNode(b) => fmt::Display::fmt(b, f),
            Self::Literal(l) => fmt::Display::fmt(l, f),
            Self::Variable(v) => fmt::Display::fmt(v, f),
            Self::DefaultGraph => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Term,
}

impl Quad {
    /// A quad in the default graph.
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: Term::DefaultGraph,
        }
    }

    pub fn rdf_type(subject: Term, class: Term) -> Self {
        Self::new(subject, rdf::TYPE.into(), class)
    }
}

/// `subject predicate object`, the graph is never printed.
impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_equality_includes_language() {
        let en: Term = oxrdf::Literal::new_language_tagged_literal_unchecked("chat", "en").into();
        let fr: Term = oxrdf::Literal::new_language_tagged_literal_unchecked("chat", "fr").into();
        let plain: Term = oxrdf::Literal::new_simple_literal("chat").into();

        assert_ne!(en, fr);
        assert_ne!(en, plain);
        assert_eq!(en.value(), fr.value());
    }

    #[test]
    fn variable_and_iri_with_same_value_differ() {
        let var: Term = Variable::new("http://example.org/").into();
        assert_ne!(var, Term::iri("http://example.org/"));
    }

    #[test]
    fn quad_text_form() {
        let quad = Quad::new(
            Term::iri("http://example.org/photo1.jpg"),
            Term::iri("http://purl.org/dc/elements/1.1/creator"),
            Variable::new("creator").into(),
        );

        assert_eq!(
            quad.to_string(),
            "<http://example.org/photo1.jpg> <http://purl.org/dc/elements/1.1/creator> ?creator"
        );
        assert_eq!(quad.graph, Term::DefaultGraph);
    }

    #[test]
    fn typed_literal_text_form() {
        let literal: Term = oxrdf::Literal::new_typed_literal(
            "1",
            oxrdf::NamedNode::new_unchecked("http://example.org/vocab/number"),
        )
        .into();
        assert_eq!(literal.to_string(), r#""1"^^<http://example.org/vocab/number>"#);

        let qualified = Variable::qualified("x", 3);
        assert_eq!(qualified.to_string(), "?x_3");
    }
}
