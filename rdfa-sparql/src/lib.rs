//! Turns RDFa-annotated markup into RDF quads and SPARQL queries.
//!
//! The markup is read as a graph *pattern*: `?name` (or `$name`) in an RDFa
//! attribute denotes a query variable, and a handful of `data-*` attributes
//! and CSS classes control how the pattern is shaped (optional blocks,
//! filters, unions, sub-selects, ordering).
//!
//! ```
//! use rdfa_sparql::{Element, RdfaToSparqlParser};
//!
//! let root = Element::parse_fragment(
//!     r#"<div prefix="dc: http://purl.org/dc/elements/1.1/">
//!          <span about="photo1.jpg" property="dc:creator" content="?creator"></span>
//!        </div>"#,
//! )
//! .unwrap();
//!
//! let parser = RdfaToSparqlParser::new(root, "http://example.org/").unwrap();
//! assert!(parser.query().starts_with("prefix dc: <http://purl.org/dc/elements/1.1/>\n"));
//! assert_eq!(parser.query_variables()[0].name(), "creator");
//! ```

use oxiri::Iri;

pub mod bindings;
pub mod node;
pub mod resolve;
pub mod scope;
pub mod sparql;
pub mod term;
pub mod walker;

pub use node::{Element, Node};
pub use scope::{Namespaces, Scope};
pub use sparql::{ParserOptions, RdfaToSparqlParser};
pub use term::{Quad, Term, Variable};
pub use walker::statements;

#[derive(derive_more::Error, derive_more::Display, Debug)]
pub enum Error {
    #[display("IRI parse error: `{iri}`")]
    IriParseError {
        source: oxiri::IriParseError,
        iri: String,
    },
}

/// Parses the base IRI of a document. It must be absolute.
pub fn parse_base(base: &str) -> Result<Iri<String>, Error> {
    Iri::parse(base.to_string()).map_err(|source| Error::IriParseError {
        source,
        iri: base.to_string(),
    })
}

/// Resolves `reference` against `base` ([RFC 3986] section 5).
///
/// [RFC 3986]: https://www.rfc-editor.org/rfc/rfc3986#section-5
pub fn combine(base: &Iri<String>, reference: &str) -> Result<Iri<String>, Error> {
    base.resolve(reference)
        .map_err(|source| Error::IriParseError {
            source,
            iri: reference.to_string(),
        })
}
