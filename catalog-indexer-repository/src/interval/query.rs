//! Query builder abstraction for interval range search.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::IntervalError;

/// Comparison applied by a [`ValueFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A predicate on the value column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueFilter {
    pub comparison: Comparison,
    pub bound: f64,
}

impl ValueFilter {
    pub fn lt(bound: f64) -> Self {
        Self {
            comparison: Comparison::Lt,
            bound,
        }
    }

    pub fn lte(bound: f64) -> Self {
        Self {
            comparison: Comparison::Lte,
            bound,
        }
    }

    pub fn gt(bound: f64) -> Self {
        Self {
            comparison: Comparison::Gt,
            bound,
        }
    }

    pub fn gte(bound: f64) -> Self {
        Self {
            comparison: Comparison::Gte,
            bound,
        }
    }

    /// Whether `value` satisfies the filter.
    pub fn matches(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::Lt => value < self.bound,
            Comparison::Lte => value <= self.bound,
            Comparison::Gt => value > self.bound,
            Comparison::Gte => value >= self.bound,
        }
    }
}

/// Sort direction of the value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A cloneable query over one sorted numeric column.
///
/// Builder calls accumulate on the instance; the search clones a base query
/// for every request, so concurrent searches never see each other's
/// filters. `count` ignores the limit window, `values` honours it.
#[async_trait]
pub trait IntervalQuery: Clone + Send + Sync {
    /// Add a filter; filters are combined with AND.
    fn filter(&mut self, filter: ValueFilter) -> &mut Self;

    /// Sort the values in `direction`.
    fn order(&mut self, direction: SortDirection) -> &mut Self;

    /// Return at most `limit` values after skipping `offset`.
    fn limit(&mut self, limit: usize, offset: usize) -> &mut Self;

    /// Number of values matching the filters.
    async fn count(&self) -> Result<usize, IntervalError>;

    /// Matching values, sorted and windowed.
    async fn values(&self) -> Result<Vec<f64>, IntervalError>;
}

/// Interval query over values held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIntervalQuery {
    values: Arc<Vec<f64>>,
    filters: Vec<ValueFilter>,
    direction: SortDirection,
    window: Option<(usize, usize)>,
}

impl InMemoryIntervalQuery {
    /// Create a query over `values`. Non-finite values are dropped.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let mut values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        values.sort_by(f64::total_cmp);

        Self {
            values: Arc::new(values),
            ..Self::default()
        }
    }

    fn matching(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .copied()
            .filter(|value| self.filters.iter().all(|f| f.matches(*value)))
    }
}

#[async_trait]
impl IntervalQuery for InMemoryIntervalQuery {
    fn filter(&mut self, filter: ValueFilter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    fn order(&mut self, direction: SortDirection) -> &mut Self {
        self.direction = direction;
        self
    }

    fn limit(&mut self, limit: usize, offset: usize) -> &mut Self {
        self.window = Some((limit, offset));
        self
    }

    async fn count(&self) -> Result<usize, IntervalError> {
        Ok(self.matching().count())
    }

    async fn values(&self) -> Result<Vec<f64>, IntervalError> {
        let mut values: Vec<f64> = self.matching().collect();
        if self.direction == SortDirection::Desc {
            values.reverse();
        }

        Ok(match self.window {
            Some((limit, offset)) => values.into_iter().skip(offset).take(limit).collect(),
            None => values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_query() {
        let base = InMemoryIntervalQuery::new([3.0, 1.0, f64::NAN, 2.0, 5.0, 4.0]);

        let mut query = base.clone();
        query
            .filter(ValueFilter::gte(2.0))
            .order(SortDirection::Desc)
            .limit(2, 1);

        assert_eq!(query.count().await.unwrap(), 4);
        assert_eq!(query.values().await.unwrap(), vec![4.0, 3.0]);
        assert_eq!(base.count().await.unwrap(), 5);
    }

    #[test]
    fn test_filter_matches() {
        assert!(ValueFilter::lt(2.0).matches(1.9));
        assert!(!ValueFilter::lt(2.0).matches(2.0));
        assert!(ValueFilter::lte(2.0).matches(2.0));
        assert!(ValueFilter::gt(2.0).matches(2.1));
        assert!(ValueFilter::gte(2.0).matches(2.0));
    }
}
