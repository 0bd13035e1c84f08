//! Query text assembly.

use super::emitter::{PatternBuffer, tabs};
use crate::node::Element;
use crate::resolve;

/// `prefix p: <iri>` for every namespace declared on `element` itself.
pub(crate) fn push_prefixes(out: &mut String, element: &Element) {
    for (prefix, iri) in resolve::namespaces(element).mappings() {
        out.push_str(&format!("prefix {prefix}: <{iri}>\n"));
    }
}

/// `select distinct <projection> where { <patterns> }`
pub(crate) fn push_select(out: &mut String, projection: &str, buffer: &PatternBuffer, indentation: usize) {
    let indent = tabs(indentation);
    out.push_str(&format!("{indent}select distinct {projection} where {{\n"));
    out.push_str(&buffer.patterns());
    out.push_str(&format!("{indent}}}\n"));
}

pub(crate) fn push_order_by(out: &mut String, buffer: &PatternBuffer, indentation: usize) {
    if !buffer.order_by().is_empty() {
        out.push_str(&format!(
            "{}order by {}\n",
            tabs(indentation),
            buffer.order_by().join(" ")
        ));
    }
}

/// Ordering, then `offset`/`limit` from the `data-offset`/`data-limit` of `element`.
pub(crate) fn push_modifiers(out: &mut String, buffer: &PatternBuffer, element: &Element, indentation: usize) {
    push_order_by(out, buffer, indentation);

    let indent = tabs(indentation);
    if let Some(offset) = element.nonempty_attr("data-offset") {
        out.push_str(&format!("{indent}offset {offset}\n"));
    }
    if let Some(limit) = element.nonempty_attr("data-limit") {
        out.push_str(&format!("{indent}limit {limit}\n"));
    }
}

pub(crate) fn main_query(buffer: &PatternBuffer, element: &Element) -> String {
    let mut query = String::new();
    push_prefixes(&mut query, element);
    push_select(&mut query, &buffer.projection(), buffer, 0);
    push_modifiers(&mut query, buffer, element, 0);
    query
}

pub(crate) fn binding_query(
    buffer: &PatternBuffer,
    element: &Element,
    name: &str,
    offset: usize,
    limit: usize,
    is_sub_query: bool,
) -> String {
    let mut query = String::new();
    if !is_sub_query {
        push_prefixes(&mut query, element);
    }

    push_select(&mut query, &format!("?{name}"), buffer, 0);
    push_order_by(&mut query, buffer, 0);
    query.push_str(&format!("offset {offset}\n"));
    query.push_str(&format!("limit {limit}\n"));
    query
}

pub(crate) fn paginated_query(
    buffer: &PatternBuffer,
    element: &Element,
    name: &str,
    offset: usize,
    limit: usize,
) -> String {
    let mut query = String::new();
    push_prefixes(&mut query, element);

    query.push_str(&format!("select distinct {} where {{\n", buffer.projection()));
    // limits the solutions for the binding, the outer pattern fills in the rest
    query.push_str("{ ");
    query.push_str(&binding_query(buffer, element, name, offset, limit, true));
    query.push_str("}\n");
    query.push_str(&buffer.raw());
    query.push_str("}\n");

    push_modifiers(&mut query, buffer, element, 0);
    query
}

pub(crate) fn count_query(buffer: &PatternBuffer, element: &Element, name: &str) -> String {
    let mut query = String::new();
    push_prefixes(&mut query, element);
    query.push_str(&format!("select (count(distinct ?{name}) as ?count) where {{\n"));
    query.push_str(&buffer.patterns());
    query.push_str("}\n");
    query
}
