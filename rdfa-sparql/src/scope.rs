use curie::{Curie, ExpansionError, PrefixMapping};
use indexmap::IndexSet;

use crate::term::Variable;

/// Prefix to namespace IRI, in declaration order.
pub type Namespaces = PrefixMapping;

/// Per-query state: the variables allocated so far and the stack of
/// in-scope namespace declarations.
///
/// One `Scope` is shared by a whole top-level query, sub-selects included,
/// so that variable names stay unique across all of them.
#[derive(Debug, Clone)]
pub struct Scope {
    variables: IndexSet<Variable>,
    // the bottom frame carries only the base namespace as its default
    namespaces: Vec<Namespaces>,
}

impl Scope {
    pub fn new(base_namespace: &str) -> Self {
        let mut base = Namespaces::default();
        base.set_default(base_namespace);
        Self {
            variables: IndexSet::new(),
            namespaces: vec![base],
        }
    }

    /// Returns the variable for this name, creating one if necessary.
    /// The same name always yields the same variable.
    pub fn by_name(&mut self, name: &str) -> Variable {
        let safe = safe_name(name);
        if let Some(existing) = self.variables.get(&Variable::new(safe.as_str())) {
            return existing.clone();
        }

        self.fresh(&safe)
    }

    /// Returns a variable whose name is unique in this scope, based on the suggestion.
    pub fn fresh(&mut self, suggested: &str) -> Variable {
        let base = safe_name(suggested);
        let mut candidate = Variable::new(base.as_str());
        let mut qualifier = self.variables.len();
        while self.variables.contains(&candidate) {
            candidate = Variable::qualified(&base, qualifier);
            qualifier += 1;
        }

        tracing::trace!("allocated variable {candidate}");
        self.variables.insert(candidate.clone());
        candidate
    }

    /// Expands a CURIE against the namespace stack, innermost declaration first.
    ///
    /// A CURIE without a prefix expands against the base namespace.
    pub fn expand(&self, curie: &Curie) -> Option<String> {
        self.namespaces
            .iter()
            .rev()
            .find_map(|frame| match frame.expand_curie(curie) {
                Ok(iri) => Some(iri),
                Err(ExpansionError::Invalid | ExpansionError::MissingDefault) => None,
            })
    }

    pub fn push_namespaces(&mut self, namespaces: Namespaces) {
        tracing::debug!(
            "entering namespaces: {}",
            itertools::join(namespaces.mappings().map(|(prefix, _)| prefix), ", ")
        );
        self.namespaces.push(namespaces);
    }

    pub fn pop_namespaces(&mut self) {
        if self.namespaces.len() > 1 {
            self.namespaces.pop();
        }
    }
}

/// Names that look like `xyz.123` get a trailing `_`.
fn safe_name(name: &str) -> String {
    if name.ends_with(|c: char| c.is_ascii_digit()) && name.contains('.') {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_name_reuses() {
        let mut scope = Scope::new("http://example.org/");
        let a = scope.by_name("creator");
        let b = scope.by_name("creator");
        assert_eq!(a, b);
        // only one variable was registered
        assert_eq!(scope.fresh("creator").name(), "creator_1");
    }

    #[test]
    fn fresh_never_collides() {
        let mut scope = Scope::new("http://example.org/");
        let first = scope.fresh("x");
        let second = scope.fresh("x");
        let third = scope.fresh("x");

        assert_eq!(first.name(), "x");
        assert_eq!(second.name(), "x_1");
        assert_eq!(third.name(), "x_2");
    }

    #[test]
    fn fresh_skips_taken_qualifiers() {
        let mut scope = Scope::new("http://example.org/");
        scope.by_name("v_1");
        scope.fresh("v");
        // registry holds v_1 and v, so the next qualifier (2) is free
        assert_eq!(scope.fresh("v").name(), "v_2");

        let mut scope = Scope::new("http://example.org/");
        scope.fresh("v");
        scope.by_name("v_1");
        // qualifier 2 is the registry size, v_2 is not taken
        assert_eq!(scope.fresh("v").name(), "v_2");
    }

    #[test]
    fn dotted_numeric_names_are_made_safe() {
        let mut scope = Scope::new("http://example.org/");
        assert_eq!(scope.by_name("x.1").name(), "x.1_");
        assert_eq!(scope.by_name("x.a").name(), "x.a");
        assert_eq!(scope.by_name("x1").name(), "x1");
    }

    fn frame(prefixes: &[(&str, &str)]) -> Namespaces {
        let mut namespaces = Namespaces::default();
        for (prefix, iri) in prefixes {
            namespaces.add_prefix(prefix, iri).unwrap();
        }
        namespaces
    }

    #[test]
    fn namespace_lookup_is_innermost_first() {
        let mut scope = Scope::new("http://example.org/");
        scope.push_namespaces(frame(&[("a", "http://outer/a#"), ("b", "http://outer/b#")]));
        scope.push_namespaces(frame(&[("a", "http://inner/a#")]));

        let expand = |scope: &Scope, prefix, local| scope.expand(&Curie::new(prefix, local));
        assert_eq!(expand(&scope, Some("a"), "x").as_deref(), Some("http://inner/a#x"));
        assert_eq!(expand(&scope, Some("b"), "x").as_deref(), Some("http://outer/b#x"));
        assert_eq!(expand(&scope, Some("c"), "x"), None);
        assert_eq!(expand(&scope, None, "x").as_deref(), Some("http://example.org/x"));

        scope.pop_namespaces();
        assert_eq!(expand(&scope, Some("a"), "x").as_deref(), Some("http://outer/a#x"));

        // the base namespace is never popped
        scope.pop_namespaces();
        scope.pop_namespaces();
        assert_eq!(expand(&scope, Some("a"), "x"), None);
        assert_eq!(expand(&scope, None, "x").as_deref(), Some("http://example.org/x"));
    }
}
