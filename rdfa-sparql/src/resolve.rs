//! CURIE, safe CURIE and IRI expansion of attribute values.

use curie::Curie;

use crate::node::Element;
use crate::scope::{Namespaces, Scope};
use crate::term::Term;
use crate::walker::{Context, Hooks};

pub const XHV: &str = "http://www.w3.org/1999/xhtml/vocab#";

// [xhtml-rdfa] 9.3. @rel/@rev attribute values
const RESERVED: &[&str] = &[
    "alternate",
    "appendix",
    "bookmark",
    "cite",
    "chapter",
    "first",
    "glossary",
    "help",
    "icon",
    "index",
    "last",
    "license",
    "meta",
    "next",
    "p3pv1",
    "prev",
    "role",
    "section",
    "stylesheet",
    "subsection",
    "start",
    "top",
    "up",
];

/// Returns the SPARQL variable name if the token has the form `?name` or `$name`.
///
/// Any run of leading `?`/`$` is stripped, so `?` alone yields the empty name.
pub fn variable_name(token: &str) -> Option<&str> {
    token
        .starts_with(['?', '$'])
        .then(|| token.trim_start_matches(['?', '$']))
}

/// Expands a single CURIE, variable or IRI token.
///
/// The flag is `true` when the term was built from a namespace
/// (or is a freshly allocated anonymous variable).
pub fn expand_curie<H: Hooks>(
    hooks: &mut H,
    token: &str,
    ctx: &Context<H::Mode>,
    scope: &mut Scope,
) -> Option<(Term, bool)> {
    if token.is_empty() {
        return None;
    }

    if let Some(name) = variable_name(token) {
        // anonymous variables are always fresh
        return Some((hooks.create_variable(name, ctx, scope).into(), name.is_empty()));
    }

    match token.split_once(':') {
        Some(("_", local)) => {
            let label = if local.is_empty() { "_" } else { local };
            Some((scope.by_name(label).into(), false))
        }
        Some((prefix, local)) => {
            // `:local` uses the base namespace, like a bare reference
            let curie = Curie::new(Some(prefix).filter(|p| !p.is_empty()), local);
            match scope.expand(&curie) {
                Some(iri) => Some((Term::iri(iri), true)),
                None => {
                    // unknown prefix: the token is taken to be an absolute IRI
                    tracing::debug!("no namespace for prefix '{prefix}', using <{token}> as IRI");
                    Some((Term::iri(token), false))
                }
            }
        }
        None => scope
            .expand(&Curie::new(None, token))
            .map(|iri| (Term::iri(iri), true)),
    }
}

/// Resolves a single-valued reference attribute (`about`, `resource`).
pub fn resolve_reference<H: Hooks>(
    hooks: &mut H,
    element: &Element,
    attr: &str,
    ctx: &Context<H::Mode>,
    scope: &mut Scope,
) -> Option<Term> {
    let value = element.nonempty_attr(attr)?;
    let token = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    expand_curie(hooks, token, ctx, scope).map(|(term, _)| term)
}

/// Resolves a whitespace-separated list attribute (`rel`, `rev`, `typeof`, `property`).
///
/// With `bare_keywords`, reserved XHTML relation names map straight into the `xhv:` vocabulary.
pub fn resolve_reference_list<H: Hooks>(
    hooks: &mut H,
    element: &Element,
    attr: &str,
    bare_keywords: bool,
    ctx: &Context<H::Mode>,
    scope: &mut Scope,
) -> Vec<Term> {
    let Some(value) = element.nonempty_attr(attr) else {
        return Vec::new();
    };

    value
        .split_ascii_whitespace()
        .filter_map(|token| {
            let keyword = token.to_ascii_lowercase();
            if bare_keywords && RESERVED.contains(&keyword.as_str()) {
                Some(Term::iri(format!("{XHV}{keyword}")))
            } else {
                expand_curie(hooks, token, ctx, scope).map(|(term, _)| term)
            }
        })
        .collect()
}

/// Namespaces declared on the element through `xmlns:*` and `prefix`.
///
/// `prefix` declarations come last and win over `xmlns` ones for the same prefix.
pub fn namespaces(element: &Element) -> Namespaces {
    let mut namespaces = Namespaces::default();

    for (name, value) in element.attributes() {
        let prefix = if name == "xmlns" {
            ""
        } else if let Some(prefix) = name.strip_prefix("xmlns:") {
            prefix
        } else {
            continue;
        };

        if !value.is_empty() {
            declare(&mut namespaces, prefix, value);
        }
    }

    // RDFa 1.1: prefix="p1: iri1 p2: iri2"
    if let Some(prefixes) = element.attr("prefix") {
        let mut tokens = prefixes.split_ascii_whitespace();
        while let Some(token) = tokens.next() {
            let Some(prefix) = token.strip_suffix(':').filter(|p| !p.is_empty()) else {
                tracing::warn!("ignoring malformed prefix declaration '{token}'");
                continue;
            };

            if let Some(iri) = tokens.next() {
                declare(&mut namespaces, prefix, iri);
            }
        }
    }

    namespaces
}

fn declare(namespaces: &mut Namespaces, prefix: &str, iri: &str) {
    if let Err(err) = namespaces.add_prefix(prefix, iri) {
        tracing::warn!("ignoring declaration of prefix '{prefix}': {err:?}");
    }
}
