//! Filter expressions over article fields.
//!
//! A [`FilterExpression`] is a recursive tagged tree of logical (AND/OR) and
//! relational (EQ/CONTAINS/MATCHES) nodes, evaluated against an article's
//! flattened fields. Filters gate whether an article is delivered at all and
//! whether individual mention targets or forum tags apply.
//!
//! Missing fields compare as empty strings; a malformed MATCHES pattern fails
//! closed (no match) and is logged rather than aborting the formatting pass.

use crate::article::Article;
use crate::error::{FeedRelayError, Result};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maximum nesting depth accepted by [`validate_expression`].
const MAX_FILTER_DEPTH: usize = 10;

/// Operator for a logical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    And,
    Or,
}

/// Operator for a relational node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationalOp {
    /// Exact string equality.
    Eq,
    /// Case-insensitive substring test.
    Contains,
    /// Case-insensitive regular-expression test.
    Matches,
}

/// Left operand of a relational node: an article field reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterLeft {
    pub kind: LeftKind,
    pub field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeftKind {
    Article,
}

/// Right operand of a relational node: a literal string value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRight {
    pub kind: RightKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RightKind {
    String,
}

/// A boolean predicate tree over article fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum FilterExpression {
    Logical {
        op: LogicalOp,
        children: Vec<FilterExpression>,
    },
    Relational {
        op: RelationalOp,
        left: FilterLeft,
        right: FilterRight,
        #[serde(default)]
        not: bool,
    },
}

impl FilterExpression {
    /// Convenience constructor for a relational node.
    pub fn relational(field: impl Into<String>, op: RelationalOp, value: impl Into<String>) -> Self {
        Self::Relational {
            op,
            left: FilterLeft { kind: LeftKind::Article, field: field.into() },
            right: FilterRight { kind: RightKind::String, value: value.into() },
            not: false,
        }
    }

    /// Convenience constructor for an AND node.
    pub fn and(children: Vec<FilterExpression>) -> Self {
        Self::Logical { op: LogicalOp::And, children }
    }

    /// Convenience constructor for an OR node.
    pub fn or(children: Vec<FilterExpression>) -> Self {
        Self::Logical { op: LogicalOp::Or, children }
    }

    /// Returns the same node with the negation flag set.
    pub fn negated(self) -> Self {
        match self {
            Self::Relational { op, left, right, not } => Self::Relational { op, left, right, not: !not },
            other => other,
        }
    }
}

/// Evaluates `expr` against `article`, returning whether the article passes.
///
/// AND with zero children is vacuously true; OR with zero children is
/// vacuously false. Both short-circuit.
pub fn evaluate(expr: &FilterExpression, article: &Article) -> bool {
    match expr {
        FilterExpression::Logical { op: LogicalOp::And, children } => {
            children.iter().all(|child| evaluate(child, article))
        }
        FilterExpression::Logical { op: LogicalOp::Or, children } => {
            children.iter().any(|child| evaluate(child, article))
        }
        FilterExpression::Relational { op, left, right, not } => {
            let reference = article.field_or_empty(&left.field);
            let matched = match op {
                RelationalOp::Eq => reference == right.value,
                RelationalOp::Contains => reference.to_lowercase().contains(&right.value.to_lowercase()),
                RelationalOp::Matches => test_regex(&right.value, reference),
            };

            if *not { !matched } else { matched }
        }
    }
}

/// Validates the nesting depth of an expression tree.
///
/// Evaluation itself accepts unbounded depth; this is the acceptance check
/// for user-submitted configurations.
pub fn validate_expression(expr: &FilterExpression) -> Result<()> {
    let depth = logical_depth(expr);

    if depth > MAX_FILTER_DEPTH {
        return Err(FeedRelayError::FilterTooDeep { depth });
    }

    Ok(())
}

fn logical_depth(expr: &FilterExpression) -> usize {
    match expr {
        FilterExpression::Relational { .. } => 0,
        FilterExpression::Logical { children, .. } => {
            1 + children.iter().map(logical_depth).max().unwrap_or(0)
        }
    }
}

/// Case-insensitive regex test. Compile failures fail closed.
fn test_regex(pattern: &str, reference: &str) -> bool {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => regex.is_match(reference),
        Err(err) => {
            warn!(pattern, %err, "invalid filter regex, treating as no match");
            false
        }
    }
}
