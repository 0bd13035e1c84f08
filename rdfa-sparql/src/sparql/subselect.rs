//! Nested `select` queries for elements carrying `data-select`.

use super::emitter::{Mode, SparqlEmitter};
use super::query;
use crate::node::Element;
use crate::scope::Scope;
use crate::walker::{Context, Hooks};

/// Walks `element` into a query of its own and returns the rewritten element
/// with the query text.
///
/// The sub-select shares the enclosing [`Scope`], so its variables never clash
/// with the outer ones, but collects its patterns, projection and ordering
/// separately. An empty `projection` is inferred like for a top-level query.
/// Its lines are indented one level deeper than the enclosing block.
pub(crate) fn sub_select(
    element: Element,
    projection: &str,
    ctx: &Context<Mode>,
    scope: &mut Scope,
) -> (Element, String) {
    let frame = ctx.mode.indentation + 1;
    tracing::debug!(
        "entering sub-select for <{}> at depth {frame}",
        element.name()
    );

    let mode = Mode {
        strict: ctx.mode.strict,
        within_filter: 0,
        indentation: frame + 1,
    };
    let mut emitter = SparqlEmitter::new(mode.indentation);
    let ctx = Context {
        mode,
        ..ctx.clone()
    };

    let (rewritten, _) = emitter.walk(&element, &ctx, scope);
    let rewritten = rewritten.into_owned();

    let projection = if projection.trim().is_empty() {
        emitter.buffer.projection()
    } else {
        projection.trim().to_string()
    };

    let mut text = String::new();
    query::push_select(&mut text, &projection, &emitter.buffer, frame);
    query::push_modifiers(&mut text, &emitter.buffer, &rewritten, frame);

    (rewritten, text)
}
