//! Field resolution
//!
//! Maps a rubric field id to a document node. Forms bind controls by `id`
//! or by `name` inconsistently, so resolution tries the id first and then a
//! fixed, type-dependent list of `name` queries. Every checker, the submit
//! button lookup and the interaction simulator go through this module.

use tracing::trace;

use formgrade_common::{CheckError, FieldSpec, FieldType, SubmitButtonSpec};

use crate::dom::{Dom, NodeId, Query};

/// `name`-scoped fallbacks tried after the id lookup, in order
pub fn name_fallbacks(id: &str, field_type: &FieldType) -> Vec<Query> {
    match field_type {
        FieldType::Textarea => vec![Query::tag("textarea").attr("name", id)],
        FieldType::Select => vec![Query::tag("select").attr("name", id)],
        FieldType::Radio => vec![Query::tag("input").attr("type", "radio").attr("name", id)],
        _ => vec![
            Query::tag("input").attr("name", id),
            Query::any().attr("name", id),
        ],
    }
}

/// Resolve an id for a field of the given declared type
pub fn resolve_id(dom: &Dom, id: &str, field_type: &FieldType) -> Option<NodeId> {
    if let Some(node) = dom.by_id(id) {
        trace!("Resolved \"{}\" by id", id);
        return Some(node);
    }
    name_fallbacks(id, field_type).iter().find_map(|query| {
        let found = dom.query(query);
        if found.is_some() {
            trace!("Resolved \"{}\" via {}", id, query);
        }
        found
    })
}

/// Resolve a rubric field, failing with `FieldNotFound`
pub fn resolve(dom: &Dom, field: &FieldSpec) -> Result<NodeId, CheckError> {
    resolve_id(dom, &field.id, &field.field_type).ok_or_else(|| CheckError::FieldNotFound {
        id: field.id.clone(),
    })
}

/// Resolve the submit button: the configured id, else the first
/// `button[type="submit"]`.
pub fn resolve_submit_button(dom: &Dom, button: &SubmitButtonSpec) -> Result<NodeId, CheckError> {
    dom.by_id(&button.id)
        .or_else(|| dom.query(&Query::tag("button").attr("type", "submit")))
        .ok_or_else(|| CheckError::FieldNotFound {
            id: button.id.clone(),
        })
}
