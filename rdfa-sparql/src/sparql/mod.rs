//! SPARQL query construction from an annotated tree.
//!
//! Every quad found by the walk becomes a triple pattern. On top of plain RDFa
//! the tree can carry:
//!
//! - `data-ignore`: skip the subtree
//! - `data-select="?a ?b"`: turn the subtree into a nested `select`
//! - `data-strict`: add `isLiteral`/`!isLiteral` filters to the subtree's patterns
//! - `data-pattern`, `data-bind`, `data-filter`: verbatim SPARQL, where `?_`
//!   in a pattern stands for the current subject
//! - `data-offset`, `data-limit` on the root: solution modifiers
//! - classes `group`, `optional`, `exists`, `not-exists`: wrap the subtree in a block
//! - class `union`: alternatives between the children
//! - classes `asc`, `desc`: order by the element's variable

mod emitter;
mod query;
mod subselect;

pub use emitter::{Mode, PatternBuffer, SparqlEmitter};

use crate::node::Element;
use crate::scope::Scope;
use crate::term::{Quad, Variable};
use crate::walker::{Context, Hooks};
use crate::{Error, parse_base};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserOptions {
    /// Initial strict mode, `data-strict` overrides it per subtree.
    pub strict: bool,
    /// Tabs before top-level pattern lines.
    pub initial_indentation: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            strict: false,
            initial_indentation: 1,
        }
    }
}

impl ParserOptions {
    pub fn with_strict(self, strict: bool) -> Self {
        Self { strict, ..self }
    }

    pub fn with_initial_indentation(self, initial_indentation: usize) -> Self {
        Self {
            initial_indentation,
            ..self
        }
    }
}

/// The result of reading an annotated tree as a query.
///
/// All work happens in the constructor; the accessors only format.
#[derive(Debug, Clone)]
pub struct RdfaToSparqlParser {
    element: Element,
    buffer: PatternBuffer,
    query: String,
    variables: Vec<Variable>,
    quads: Vec<Quad>,
}

impl RdfaToSparqlParser {
    pub fn new(root: Element, base: &str) -> Result<Self, Error> {
        Self::with_options(root, base, ParserOptions::default())
    }

    pub fn with_options(root: Element, base: &str, options: ParserOptions) -> Result<Self, Error> {
        let base = parse_base(base)?;
        let mut scope = Scope::new(base.as_str());
        let ctx = Context::new(
            base,
            Mode {
                strict: options.strict,
                within_filter: 0,
                indentation: options.initial_indentation,
            },
        );

        let mut emitter = SparqlEmitter::new(options.initial_indentation);
        let (element, quads) = emitter.walk(&root, &ctx, &mut scope);
        let element = element.into_owned();

        let buffer = emitter.buffer;
        let query = query::main_query(&buffer, &element);
        tracing::debug!(
            "derived query with {} pattern lines and {} quads",
            buffer.lines().len(),
            quads.len()
        );

        Ok(Self {
            variables: buffer.select_vars().iter().cloned().collect(),
            element,
            buffer,
            query,
            quads,
        })
    }

    /// The main query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The projection of the main query, in order of first appearance.
    pub fn query_variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The root with content rewrites and sub-select substitutions applied.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// The quads of the pattern in document order, each one once.
    pub fn result_quads(&self) -> &[Quad] {
        &self.quads
    }

    /// The pattern lines as emitted.
    pub fn pattern_lines(&self) -> &[String] {
        self.buffer.lines()
    }

    /// A query for the distinct values of `?name` in one window.
    pub fn query_for_binding(&self, name: &str, offset: usize, limit: usize, is_sub_query: bool) -> String {
        query::binding_query(&self.buffer, &self.element, name, offset, limit, is_sub_query)
    }

    /// The main query restricted to the solutions of one window of `?name` values.
    pub fn paginated_query(&self, name: &str, offset: usize, limit: usize) -> String {
        query::paginated_query(&self.buffer, &self.element, name, offset, limit)
    }

    pub fn count_query(&self, name: &str) -> String {
        query::count_query(&self.buffer, &self.element, name)
    }
}
