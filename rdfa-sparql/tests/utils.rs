use itertools::Itertools;
use rdfa_sparql::{Element, ParserOptions, Quad, RdfaToSparqlParser};

pub const BASE: &str = "http://example.org/";

/// Parses `html` and reads its first element as a query.
#[allow(unused)]
pub fn parse(html: &str) -> RdfaToSparqlParser {
    parse_with(html, ParserOptions::default())
}

#[allow(unused)]
pub fn parse_with(html: &str, options: ParserOptions) -> RdfaToSparqlParser {
    let root = Element::parse_fragment(html).expect("input has an element");
    RdfaToSparqlParser::with_options(root, BASE, options).unwrap()
}

/// One quad per line, in the order they were produced.
#[allow(unused)]
pub fn quad_lines(quads: &[Quad]) -> String {
    quads.iter().join("\n")
}

#[allow(unused)]
pub fn statements(html: &str) -> String {
    let root = Element::with_inner_html("div", html);
    quad_lines(&rdfa_sparql::statements(&root, BASE).unwrap())
}
