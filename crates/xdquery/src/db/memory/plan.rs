//! Native plan tree and its evaluator.
//!
//! Plans are evaluated from scratch against the state visible at call time;
//! nothing is cached between evaluations.

use crate::{
    db::{
        memory::state::{RecordRow, StoreState},
        query::predicate::{QueryNode, Row},
        registry::EntityTypeRegistry,
        source::RecordIter,
    },
    error::InternalError,
    types::Record,
    value::Value,
};
use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashSet},
    iter,
    rc::Rc,
};

///
/// Plan
///

#[derive(Debug)]
pub(crate) enum Plan {
    Empty,
    /// Flushed records of an entity and its subtypes, id order.
    All(String),
    /// Explicit durable records, order and duplicates kept.
    Records(Rc<[Record]>),
    Union(Rc<Self>, Rc<Self>),
    Intersect(Rc<Self>, Rc<Self>),
    Exclude(Rc<Self>, Rc<Self>),
    Concat(Rc<Self>, Rc<Self>),
    Node {
        input: Rc<Self>,
        entity: String,
        node: QueryNode,
    },
    Skip(Rc<Self>, usize),
    Take(Rc<Self>, usize),
    Distinct(Rc<Self>),
    /// Distinct, non-null targets of `link`.
    Project { input: Rc<Self>, link: String },
}

impl Plan {
    pub(crate) fn eval(
        &self,
        state: &StoreState,
        registry: &EntityTypeRegistry,
    ) -> Result<Vec<Record>, InternalError> {
        let records = match self {
            Self::Empty => Vec::new(),
            Self::All(entity) => {
                registry.model(entity)?;
                state.indexed(&registry.names_under(entity))
            }
            Self::Records(records) => {
                for record in records.iter() {
                    state.get(*record)?;
                }
                records.to_vec()
            }
            Self::Union(left, right) => {
                let mut set: BTreeSet<Record> = left.eval(state, registry)?.into_iter().collect();
                set.extend(right.eval(state, registry)?);
                set.into_iter().collect()
            }
            Self::Intersect(left, right) => {
                let left: BTreeSet<Record> = left.eval(state, registry)?.into_iter().collect();
                let right: BTreeSet<Record> = right.eval(state, registry)?.into_iter().collect();
                left.intersection(&right).copied().collect()
            }
            Self::Exclude(left, right) => {
                let left: BTreeSet<Record> = left.eval(state, registry)?.into_iter().collect();
                let right: BTreeSet<Record> = right.eval(state, registry)?.into_iter().collect();
                left.difference(&right).copied().collect()
            }
            Self::Concat(left, right) => {
                let mut records = left.eval(state, registry)?;
                records.extend(right.eval(state, registry)?);
                records
            }
            Self::Node {
                input,
                entity,
                node,
            } => apply_node(state, registry, entity, node, input.eval(state, registry)?)?,
            Self::Skip(input, n) => input.eval(state, registry)?.into_iter().skip(*n).collect(),
            Self::Take(input, n) => input.eval(state, registry)?.into_iter().take(*n).collect(),
            Self::Distinct(input) => distinct(input.eval(state, registry)?),
            Self::Project { input, link } => {
                project(state, &input.eval(state, registry)?, link)?
                    .into_iter()
                    .flatten()
                    .collect()
            }
        };

        Ok(records)
    }

    /// Exact size; `All` reads index cardinalities without materializing.
    pub(crate) fn size(
        &self,
        state: &StoreState,
        registry: &EntityTypeRegistry,
    ) -> Result<usize, InternalError> {
        match self {
            Self::Empty => Ok(0),
            Self::All(entity) => {
                registry.model(entity)?;
                Ok(state.indexed_count(&registry.names_under(entity)))
            }
            _ => Ok(self.eval(state, registry)?.len()),
        }
    }

    pub(crate) fn explain(&self) -> String {
        match self {
            Self::Empty => "Empty".to_string(),
            Self::All(entity) => format!("All({entity})"),
            Self::Records(records) => format!("Records({})", records.len()),
            Self::Union(l, r) => format!("Union({}, {})", l.explain(), r.explain()),
            Self::Intersect(l, r) => format!("Intersect({}, {})", l.explain(), r.explain()),
            Self::Exclude(l, r) => format!("Exclude({}, {})", l.explain(), r.explain()),
            Self::Concat(l, r) => format!("Concat({}, {})", l.explain(), r.explain()),
            Self::Node { input, node, .. } => format!("{}({})", explain_node(node), input.explain()),
            Self::Skip(input, n) => format!("Skip({}, {n})", input.explain()),
            Self::Take(input, n) => format!("Take({}, {n})", input.explain()),
            Self::Distinct(input) => format!("Distinct({})", input.explain()),
            Self::Project { input, link } => format!("Project({}, {link})", input.explain()),
        }
    }
}

pub(crate) fn explain_node(node: &QueryNode) -> String {
    let direction = |ascending: bool| if ascending { "asc" } else { "desc" };

    match node {
        QueryNode::Filter(_) => "Filter".to_string(),
        QueryNode::SortBy { field, ascending } => {
            format!("SortBy[{field} {}]", direction(*ascending))
        }
        QueryNode::SortByLink {
            link,
            field,
            ascending,
            ..
        } => format!("SortByLink[{link}.{field} {}]", direction(*ascending)),
    }
}

/// Apply a filter or sort node to `records` of `entity`.
pub(crate) fn apply_node(
    state: &StoreState,
    registry: &EntityTypeRegistry,
    entity: &str,
    node: &QueryNode,
    records: Vec<Record>,
) -> Result<Vec<Record>, InternalError> {
    let row = move |record: Record| {
        state.get(record).map(|stored| RecordRow {
            registry,
            entity,
            stored,
        })
    };

    match node {
        QueryNode::Filter(predicate) => {
            let mut out = Vec::new();
            for record in records {
                if predicate.eval(&row(record)?)? {
                    out.push(record);
                }
            }
            Ok(out)
        }
        QueryNode::SortBy { field, ascending } => {
            let mut keyed = Vec::with_capacity(records.len());
            for record in records {
                keyed.push((row(record)?.field(field)?, record));
            }
            Ok(sort_keyed(keyed, *ascending))
        }
        QueryNode::SortByLink {
            link,
            target_entity,
            field,
            ascending,
        } => {
            let mut keyed = Vec::with_capacity(records.len());
            for record in records {
                let key = match row(record)?.field(link)? {
                    Value::Record(target) => RecordRow {
                        registry,
                        entity: *target_entity,
                        stored: state.get(target)?,
                    }
                    .field(field)?,
                    _ => Value::Null,
                };
                keyed.push((key, record));
            }
            Ok(sort_keyed(keyed, *ascending))
        }
    }
}

// Stable; nulls stay last whichever way the present values run.
fn sort_keyed(mut keyed: Vec<(Value, Record)>, ascending: bool) -> Vec<Record> {
    keyed.sort_by(|(a, _), (b, _)| sort_order(a, b, ascending));

    keyed.into_iter().map(|(_, record)| record).collect()
}

pub(crate) fn sort_order(a: &Value, b: &Value, ascending: bool) -> Ordering {
    if ascending || a.is_null() || b.is_null() {
        a.sort_cmp(b)
    } else {
        b.sort_cmp(a)
    }
}

/// Distinct link targets in first-seen order. Records with no target
/// contribute a single `None`; dangling targets fail.
pub(crate) fn project(
    state: &StoreState,
    records: &[Record],
    link: &str,
) -> Result<Vec<Option<Record>>, InternalError> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for record in records {
        let targets = state.get(*record)?.link_targets(link);
        if targets.is_empty() {
            if seen.insert(None) {
                out.push(None);
            }
            continue;
        }

        for target in targets {
            state.get(*target)?;
            if seen.insert(Some(*target)) {
                out.push(Some(*target));
            }
        }
    }

    Ok(out)
}

pub(crate) fn distinct(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records.into_iter().filter(|r| seen.insert(*r)).collect()
}

/// Turn an evaluation result into a traversal; a failure becomes the
/// traversal's only item.
pub(crate) fn into_record_iter(result: Result<Vec<Record>, InternalError>) -> RecordIter {
    match result {
        Ok(records) => Box::new(records.into_iter().map(Ok::<_, InternalError>)),
        Err(err) => Box::new(iter::once(Err(err))),
    }
}
