//! Grouping of query solutions for rendering.
//!
//! A template element names the variables it needs in its attribute values
//! (`href="?page"`). Solutions are grouped by the values of those variables,
//! so the element is repeated once per distinct combination.

use indexmap::IndexMap;

use crate::node::Element;

/// One solution: variable name (without `?`) to value.
pub type BindingRow = IndexMap<String, oxrdf::Term>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateVariable {
    /// Rows without a value for the variable are still rendered.
    pub optional: bool,
    /// The attributes referring to the variable, in document order.
    pub attributes: Vec<String>,
}

/// The variables referenced from the attribute values of `element`.
///
/// `?name` and `$name` are required; `??name` and `?$name` are optional.
pub fn template_variables(element: &Element) -> IndexMap<String, TemplateVariable> {
    let mut variables: IndexMap<String, TemplateVariable> = IndexMap::new();

    for (attr, value) in element.attributes() {
        let Some(rest) = value.strip_prefix(['?', '$']) else {
            continue;
        };

        let (optional, name) = match rest.strip_prefix(['?', '$']) {
            Some(name) if value.starts_with('?') => (true, name),
            _ => (false, rest),
        };

        let variable = variables.entry(name.to_string()).or_default();
        // the last reference decides
        variable.optional = optional;
        variable.attributes.push(attr.to_string());
    }

    variables
}

/// Groups `rows` by their values for `variables`, in order of first occurrence.
///
/// Rows lacking a required variable belong to no group.
pub fn group_rows<'r>(
    rows: &'r [BindingRow],
    variables: &IndexMap<String, TemplateVariable>,
) -> Vec<Vec<&'r BindingRow>> {
    let mut groups: IndexMap<Vec<Option<&oxrdf::Term>>, Vec<&BindingRow>> = IndexMap::new();

    'rows: for row in rows {
        let mut key = Vec::with_capacity(variables.len());
        for (name, variable) in variables {
            let value = row.get(name);
            if value.is_none() && !variable.optional {
                tracing::trace!("row without required ?{name} skipped");
                continue 'rows;
            }
            key.push(value);
        }

        groups.entry(key).or_default().push(row);
    }

    groups.into_values().collect()
}
