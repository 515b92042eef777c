//! Compiled expressions keyed by source text.

use crate::expression::{Expression, Predicate};
use dashmap::DashMap;
use std::sync::Arc;

/// A shared cache handle. Clones refer to the same entries.
///
/// Entries are immutable and interchangeable, so two threads compiling the
/// same text concurrently may both insert; the last insert wins.
#[derive(Clone, Default)]
pub struct ExpressionCache {
    inner: Arc<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    expressions: DashMap<String, Expression>,
    predicates: DashMap<String, Predicate>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_expression(&self, text: &str) -> Option<Expression> {
        self.inner.expressions.get(text).map(|e| e.value().clone())
    }

    pub fn insert_expression(&self, text: &str, expression: Expression) {
        self.inner.expressions.insert(text.to_string(), expression);
    }

    pub fn get_predicate(&self, text: &str) -> Option<Predicate> {
        self.inner.predicates.get(text).map(|e| e.value().clone())
    }

    pub fn insert_predicate(&self, text: &str, predicate: Predicate) {
        self.inner.predicates.insert(text.to_string(), predicate);
    }

    /// Number of cached entries of both kinds.
    pub fn len(&self) -> usize {
        self.inner.expressions.len() + self.inner.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.expressions.clear();
        self.inner.predicates.clear();
    }
}
