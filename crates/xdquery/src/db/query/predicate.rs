use crate::{error::InternalError, value::Value};
use std::ops::{BitAnd, BitOr};

///
/// Predicate AST
///
/// Pure, engine-agnostic representation of filter predicates.
/// Field names are physical (db) names; typed field references resolve
/// them before a predicate is built.
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    /// Multi-valued field holds the value.
    Contains,
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComparePredicate {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl ComparePredicate {
    #[must_use]
    pub fn new(field: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }
}

///
/// Predicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    True,
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(ComparePredicate),
    IsNull { field: String },
    IsNotNull { field: String },
}

impl Predicate {
    #[must_use]
    pub const fn and(preds: Vec<Self>) -> Self {
        Self::And(preds)
    }

    #[must_use]
    pub const fn or(preds: Vec<Self>) -> Self {
        Self::Or(preds)
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(pred: Self) -> Self {
        Self::Not(Box::new(pred))
    }

    #[must_use]
    pub fn compare(field: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Self::Compare(ComparePredicate::new(field, op, value))
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull {
            field: field.into(),
        }
    }

    #[must_use]
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::IsNotNull {
            field: field.into(),
        }
    }

    /// Evaluate against one row.
    pub fn eval(&self, row: &impl Row) -> Result<bool, InternalError> {
        match self {
            Self::True => Ok(true),
            Self::False => Ok(false),
            Self::And(preds) => {
                for pred in preds {
                    if !pred.eval(row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(preds) => {
                for pred in preds {
                    if pred.eval(row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(inner) => Ok(!inner.eval(row)?),
            Self::Compare(cmp) => eval_compare(cmp, &row.field(&cmp.field)?),
            Self::IsNull { field } => Ok(row.field(field)?.is_null()),
            Self::IsNotNull { field } => Ok(!row.field(field)?.is_null()),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

///
/// Row
///
/// Field access used by predicate evaluation.
/// Absent fields read as `Value::Null`.
///

pub trait Row {
    fn field(&self, db_name: &str) -> Result<Value, InternalError>;
}

// Null never satisfies a comparison; `IsNull` exists for that.
fn eval_compare(cmp: &ComparePredicate, actual: &Value) -> Result<bool, InternalError> {
    use std::cmp::Ordering;

    if actual.is_null() {
        return Ok(false);
    }

    let ordering = || actual.compare(&cmp.value);
    let matched = match cmp.op {
        CompareOp::Eq => ordering() == Some(Ordering::Equal),
        CompareOp::Ne => ordering() != Some(Ordering::Equal),
        CompareOp::Lt => ordering() == Some(Ordering::Less),
        CompareOp::Lte => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordering() == Some(Ordering::Greater),
        CompareOp::Gte => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::In => match &cmp.value {
            Value::List(candidates) => candidates
                .iter()
                .any(|candidate| actual.compare(candidate) == Some(Ordering::Equal)),
            _ => {
                return Err(InternalError::query_invariant(format!(
                    "'in' predicate on '{}' requires a list operand",
                    cmp.field
                )));
            }
        },
        CompareOp::Contains => match actual {
            Value::List(items) => items
                .iter()
                .any(|item| item.compare(&cmp.value) == Some(Ordering::Equal)),
            _ => {
                return Err(InternalError::query_invariant(format!(
                    "'contains' predicate on '{}' requires a multi-valued field",
                    cmp.field
                )));
            }
        },
    };

    Ok(matched)
}

///
/// QueryNode
///
/// Structured node handed to the engine: a filter or a sort.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryNode {
    Filter(Predicate),
    SortBy {
        field: String,
        ascending: bool,
    },
    /// Sort by `field` of the entity reached through single-valued `link`.
    SortByLink {
        link: String,
        target_entity: &'static str,
        field: String,
        ascending: bool,
    },
}

impl From<Predicate> for QueryNode {
    fn from(pred: Predicate) -> Self {
        Self::Filter(pred)
    }
}
