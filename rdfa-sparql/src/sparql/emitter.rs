use std::borrow::Cow;
use std::collections::HashSet;

use indexmap::IndexSet;

use super::subselect;
use crate::node::Element;
use crate::resolve;
use crate::scope::Scope;
use crate::term::{Quad, Term, Variable};
use crate::walker::{self, Context, Hooks, Origin, SubjectObject, TermLists, Walked};

/// Emission state derived per subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mode {
    /// Add `isLiteral` filters after every pattern.
    pub strict: bool,
    /// Depth of enclosing `filter exists`/`filter not exists` blocks.
    pub within_filter: usize,
    /// Tabs in front of every line emitted here.
    pub indentation: usize,
}

// (class, block opening, opens a filter)
const BLOCKS: &[(&str, &str, bool)] = &[
    ("group", "", false),
    ("optional", "optional ", false),
    ("exists", "filter exists ", true),
    ("not-exists", "filter not exists ", true),
];

pub(crate) fn tabs(indentation: usize) -> String {
    "\t".repeat(indentation)
}

/// The lines of the graph pattern and everything needed to wrap it into a query.
#[derive(Debug, Clone)]
pub struct PatternBuffer {
    indentation: usize,
    lines: Vec<String>,
    seen: HashSet<String>,
    select_vars: IndexSet<Variable>,
    order_by: Vec<String>,
}

impl PatternBuffer {
    pub fn new(indentation: usize) -> Self {
        Self {
            indentation,
            lines: Vec::new(),
            seen: HashSet::new(),
            select_vars: IndexSet::new(),
            order_by: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn select_vars(&self) -> &IndexSet<Variable> {
        &self.select_vars
    }

    pub fn order_by(&self) -> &[String] {
        &self.order_by
    }

    /// The projection inferred from the selected variables, `*` if there are none.
    pub fn projection(&self) -> String {
        if self.select_vars.is_empty() {
            "*".to_string()
        } else {
            itertools::join(&self.select_vars, " ")
        }
    }

    /// The lines as emitted, without deduplication or substitution.
    pub fn raw(&self) -> String {
        self.lines.concat()
    }

    /// The group graph pattern body.
    ///
    /// An empty pattern would match nothing useful, so it is replaced by one
    /// `bind` per selected variable.
    pub fn patterns(&self) -> String {
        if !self.lines.is_empty() {
            return self.raw();
        }

        let indent = tabs(self.indentation);
        self.select_vars
            .iter()
            .map(|v| format!("{indent}bind ({v} as {v})\n"))
            .collect()
    }

    fn add_line(&mut self, mode: &Mode, line: impl AsRef<str>) {
        let at = self.lines.len();
        self.insert_line(at, mode, line);
    }

    fn insert_line(&mut self, at: usize, mode: &Mode, line: impl AsRef<str>) {
        let line = format!("{}{}\n", tabs(mode.indentation), line.as_ref());
        tracing::trace!("pattern: {}", line.trim_end());
        self.lines.insert(at, line);
    }

    fn select(&mut self, mode: &Mode, variable: &Variable) {
        if mode.within_filter == 0 && self.select_vars.insert(variable.clone()) {
            tracing::trace!("selecting {variable}");
        }
    }

    fn add_order_by(&mut self, element: &Element, variable: &Variable) {
        if element.has_class("asc") {
            self.order_by.push(variable.to_string());
        } else if element.has_class("desc") {
            self.order_by.push(format!("desc({variable})"));
        }
    }
}

/// The walk variant that turns the annotated tree into a graph pattern.
#[derive(Debug, Clone)]
pub struct SparqlEmitter {
    pub buffer: PatternBuffer,
}

impl SparqlEmitter {
    pub fn new(indentation: usize) -> Self {
        Self {
            buffer: PatternBuffer::new(indentation),
        }
    }
}

impl Hooks for SparqlEmitter {
    type Mode = Mode;

    fn walk<'e>(
        &mut self,
        element: &'e Element,
        ctx: &Context<Mode>,
        scope: &mut Scope,
    ) -> Walked<'e> {
        if element.nonempty_attr("data-ignore").is_some() {
            return (Cow::Borrowed(element), Vec::new());
        }

        if let Some(projection) = element.attr("data-select") {
            let mut inner = element.clone();
            inner.remove_attr("data-select");

            let (rewritten, query) = subselect::sub_select(inner, projection, ctx, scope);
            let closing = tabs(ctx.mode.indentation);
            self.buffer
                .add_line(&ctx.mode, format!("{{\n{query}{closing}}}"));
            return (Cow::Owned(rewritten), Vec::new());
        }

        let mut mode = ctx.mode;
        if let Some(strict) = element.attr("data-strict") {
            mode.strict = !strict.eq_ignore_ascii_case("false");
        }

        let mut opened = 0;
        for &(class, opening, filter) in BLOCKS {
            if element.has_class(class) {
                tracing::debug!("opening {opening}{{ for <{}>", element.name());
                self.buffer.add_line(&mode, format!("{opening}{{"));
                mode.indentation += 1;
                if filter {
                    mode.within_filter += 1;
                }
                opened += 1;
            }
        }

        if let Some(pattern) = element.nonempty_attr("data-pattern") {
            // ?_ refers to the current subject
            let pattern = pattern.trim().replace("?_", &ctx.subject.to_string());
            if pattern.ends_with('.') || pattern.ends_with('}') {
                self.buffer.add_line(&mode, pattern);
            } else {
                self.buffer.add_line(&mode, format!("{pattern} ."));
            }
        }

        if let Some(bind) = element.nonempty_attr("data-bind") {
            self.buffer.add_line(&mode, format!("bind ({bind})"));
        }

        let ctx = Context {
            mode,
            ..ctx.clone()
        };
        let walked = walker::walk(self, element, &ctx, scope);

        if let Some(filter) = element.nonempty_attr("data-filter") {
            self.buffer.add_line(&mode, format!("filter ({filter})"));
        }

        for _ in 0..opened {
            mode.indentation -= 1;
            self.buffer.add_line(&mode, "}");
        }

        walked
    }

    fn subject_object<'e>(
        &mut self,
        element: Cow<'e, Element>,
        terms: &TermLists,
        ctx: &Context<Mode>,
        scope: &mut Scope,
    ) -> SubjectObject<'e> {
        let resolved = walker::subject_object(self, element, terms, ctx, scope);

        if !resolved.skip && terms.properties.is_empty() {
            let sorted = resolved
                .object
                .as_ref()
                .and_then(Term::as_variable)
                .or_else(|| resolved.subject.as_ref().and_then(Term::as_variable));

            if let Some(variable) = sorted {
                self.buffer.add_order_by(&resolved.element, variable);
            }
        }

        resolved
    }

    fn transform_literal<'e>(
        &mut self,
        mut element: Cow<'e, Element>,
        content: Option<&str>,
        mut literal: Term,
        ctx: &Context<Mode>,
        scope: &mut Scope,
    ) -> (Cow<'e, Element>, Term) {
        if content.is_none() && element.text_content().is_empty() {
            // nothing to match against, so the value becomes a result
            let variable = scope.fresh("l_");
            self.buffer.select(&ctx.mode, &variable);
            element.to_mut().set_attr("data-clear-content", "");
            literal = variable.into();
        } else if let Some(name) = content.and_then(resolve::variable_name) {
            let variable = self.create_variable(name, ctx, scope);
            if name.is_empty() {
                element.to_mut().set_attr("content", variable.to_string());
            }
            literal = variable.into();
        }

        if let Some(variable) = literal.as_variable() {
            self.buffer.add_order_by(&element, variable);
        }

        (element, literal)
    }

    fn create_variable(&mut self, name: &str, ctx: &Context<Mode>, scope: &mut Scope) -> Variable {
        let variable = if name.is_empty() {
            scope.fresh("v")
        } else {
            scope.by_name(name)
        };

        self.buffer.select(&ctx.mode, &variable);
        variable
    }

    fn handle_quads(
        &mut self,
        _element: &Element,
        quads: Vec<(Quad, Origin)>,
        ctx: &Context<Mode>,
    ) -> Vec<Quad> {
        let mut new_quads = Vec::with_capacity(quads.len());
        for (quad, origin) in quads {
            if !self.buffer.seen.insert(quad.to_string()) {
                tracing::trace!("already seen: {quad}");
                continue;
            }

            self.buffer.add_line(&ctx.mode, format!("{quad} ."));
            if ctx.mode.strict {
                let negation = if origin == Origin::Property { "" } else { "!" };
                self.buffer.add_line(
                    &ctx.mode,
                    format!("FILTER ({negation}isLiteral({}))", quad.object),
                );
            }

            new_quads.push(quad);
        }

        new_quads
    }

    fn walk_children(
        &mut self,
        parent: &Element,
        ctx: &Context<Mode>,
        visit: &mut dyn FnMut(&mut Self, &Element) -> Vec<Quad>,
    ) -> Vec<Quad> {
        let union = parent.has_class("union");
        let mut first_branch = true;
        let mut quads = Vec::new();

        for child in parent.element_children() {
            let start = self.buffer.lines.len();
            quads.extend(visit(self, child));

            // children without any pattern lines get no branch
            if union && self.buffer.lines.len() > start {
                let opening = if first_branch { "{" } else { "union {" };
                self.buffer.insert_line(start, &ctx.mode, opening);
                self.buffer.add_line(&ctx.mode, "}");
                first_branch = false;
            }
        }

        quads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(indentation: usize) -> Mode {
        Mode {
            strict: false,
            within_filter: 0,
            indentation,
        }
    }

    #[test]
    fn empty_pattern_binds_selected_variables() {
        let mut buffer = PatternBuffer::new(1);
        buffer.select(&mode(1), &Variable::new("a"));
        buffer.select(&mode(1), &Variable::new("b"));
        buffer.select(&mode(1), &Variable::new("a"));

        assert_eq!(buffer.projection(), "?a ?b");
        assert_eq!(buffer.patterns(), "\tbind (?a as ?a)\n\tbind (?b as ?b)\n");
    }

    #[test]
    fn variables_inside_filters_are_not_selected() {
        let mut buffer = PatternBuffer::new(1);
        let filtered = Mode {
            within_filter: 1,
            ..mode(2)
        };
        buffer.select(&filtered, &Variable::new("hidden"));

        assert!(buffer.select_vars().is_empty());
        assert_eq!(buffer.projection(), "*");
    }

    #[test]
    fn lines_are_indented() {
        let mut buffer = PatternBuffer::new(1);
        buffer.add_line(&mode(1), "?s ?p ?o .");
        buffer.insert_line(0, &mode(0), "{");
        buffer.add_line(&mode(0), "}");

        assert_eq!(buffer.raw(), "{\n\t?s ?p ?o .\n}\n");
    }

    #[test]
    fn order_by_follows_class() {
        let mut buffer = PatternBuffer::new(1);
        let v = Variable::new("v");
        buffer.add_order_by(&Element::new("p").with_attr("class", "asc"), &v);
        buffer.add_order_by(&Element::new("p").with_attr("class", "x desc"), &v);
        buffer.add_order_by(&Element::new("p"), &v);

        assert_eq!(buffer.order_by(), ["?v", "desc(?v)"]);
    }
}
