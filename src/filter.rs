use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Role;

/// A restriction requested by the caller, as it arrives over the wire:
/// `{"type": "courseId", "courseId": 4}` or
/// `{"type": "timeframe", "start": "...", "end": "..."}`.
///
/// Types this engine does not know deserialize to `Unrecognized` and are
/// dropped by [`apply_filters`] like any other filter an insight does not
/// accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Filter {
    #[serde(rename_all = "camelCase")]
    CourseId { course_id: i32 },
    Timeframe {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Role { role: Role },
    #[serde(other)]
    Unrecognized,
}

impl Filter {
    pub fn course(course_id: i32) -> Self {
        Filter::CourseId { course_id }
    }

    pub fn timeframe(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Filter::Timeframe { start, end }
    }

    /// The wire `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Filter::CourseId { .. } => "courseId",
            Filter::Timeframe { .. } => "timeframe",
            Filter::Role { .. } => "role",
            Filter::Unrecognized => "unrecognized",
        }
    }
}

/// An entity query that filters can narrow.
///
/// Each implementor names the filter kinds it supports as its own enum and
/// maps every kind to a predicate with an exhaustive match, so an insight
/// cannot whitelist a filter its entity has no predicate for.
pub trait FilterScope: Sized {
    type Kind: Copy + Eq + fmt::Debug;
    type Predicate: fmt::Debug;

    /// Entity name used in log events.
    const ENTITY: &'static str;

    /// Extracts the typed predicate for `filter`, or `None` when this entity
    /// has no notion of that filter type.
    fn predicate_for(filter: &Filter) -> Option<Self::Predicate>;

    fn kind_of(predicate: &Self::Predicate) -> Self::Kind;

    /// Conjoins `predicate` to the query. Never widens the result set.
    fn narrow(self, predicate: Self::Predicate) -> Self;
}

/// Applies every filter whose kind appears in `allowed`, in the order given.
/// Everything else is skipped silently: an insight only reacts to the
/// filters it declares.
pub fn apply_filters<Q: FilterScope>(mut query: Q, allowed: &[Q::Kind], filters: &[Filter]) -> Q {
    for filter in filters {
        let Some(predicate) = Q::predicate_for(filter) else {
            tracing::debug!(entity = Q::ENTITY, filter = filter.type_name(), "filter not applicable, skipped");
            continue;
        };
        let kind = Q::kind_of(&predicate);
        if !allowed.contains(&kind) {
            tracing::debug!(entity = Q::ENTITY, ?kind, "filter not allowed, skipped");
            continue;
        }
        tracing::debug!(entity = Q::ENTITY, ?predicate, "applying filter");
        query = query.narrow(predicate);
    }
    query
}
