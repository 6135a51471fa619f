//! Interval range search.

use tracing::{debug, instrument};

use crate::errors::IntervalError;
use crate::interval::query::{IntervalQuery, SortDirection, ValueFilter};

/// Tolerance applied to every bound so values sitting on a boundary are
/// never counted in two adjacent intervals.
pub const DELTA: f64 = 0.005;

/// Walks a sorted numeric column using count queries to derive offsets.
///
/// Rather than scanning the column, each walk issues one count to find how
/// many values lie beyond the pivot and then a single bounded fetch at the
/// derived offset.
#[derive(Debug, Clone)]
pub struct IntervalSearch<Q> {
    query: Q,
}

impl<Q: IntervalQuery> IntervalSearch<Q> {
    /// Create a search over the values selected by `query`.
    pub fn new(query: Q) -> Self {
        Self { query }
    }

    /// Load up to `limit` values in ascending order, skipping `offset`,
    /// restricted to `[lower - Δ, upper - Δ)`.
    pub async fn load(
        &self,
        limit: usize,
        offset: usize,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<Vec<f64>, IntervalError> {
        let mut query = self.bounded(lower, upper);
        query.order(SortDirection::Asc).limit(limit, offset);
        query.values().await
    }

    /// The `index` values immediately below `data - Δ`, ascending.
    ///
    /// Returns `None` when nothing lies below the pivot (bounded below by
    /// `lower - Δ` when given). Fewer than `index` values are returned when
    /// the column runs out first.
    #[instrument(skip(self))]
    pub async fn load_previous(
        &self,
        data: f64,
        index: usize,
        lower: Option<f64>,
    ) -> Result<Option<Vec<f64>>, IntervalError> {
        let count = self.bounded(lower, Some(data)).count().await?;
        if count == 0 {
            debug!("No previous interval");
            return Ok(None);
        }

        let take = index.min(count);
        let values = self.load(take, count - take, lower, Some(data)).await?;
        Ok(Some(values))
    }

    /// The `right_index` values immediately above `data + Δ`, ascending.
    ///
    /// Returns `None` when nothing lies above the pivot (bounded above by
    /// `upper - Δ` when given). The window is fetched in descending order
    /// and reversed.
    #[instrument(skip(self))]
    pub async fn load_next(
        &self,
        data: f64,
        right_index: usize,
        upper: Option<f64>,
    ) -> Result<Option<Vec<f64>>, IntervalError> {
        let mut above = self.query.clone();
        above.filter(ValueFilter::gt(data + DELTA));
        if let Some(upper) = upper {
            above.filter(ValueFilter::lt(upper - DELTA));
        }

        let count = above.count().await?;
        if count == 0 {
            debug!("No next interval");
            return Ok(None);
        }

        let take = right_index.min(count);
        above.order(SortDirection::Desc).limit(take, count - take);

        let mut values = above.values().await?;
        values.reverse();
        Ok(Some(values))
    }

    /// Boundaries splitting the column into `buckets` buckets holding
    /// roughly the same number of values.
    ///
    /// Boundary `i` is the value at rank `i * total / buckets`; duplicates
    /// collapse, so heavily repeated values may yield fewer boundaries.
    #[instrument(skip(self))]
    pub async fn equal_frequency_boundaries(&self, buckets: usize) -> Result<Vec<f64>, IntervalError> {
        if buckets == 0 {
            return Err(IntervalError::invalid_request("bucket count must be positive"));
        }

        let total = self.query.count().await?;
        let mut boundaries: Vec<f64> = Vec::with_capacity(buckets.saturating_sub(1));

        for bucket in 1..buckets {
            let rank = bucket * total / buckets;
            if rank == 0 || rank >= total {
                continue;
            }

            if let Some(&value) = self.load(1, rank, None, None).await?.first() {
                if boundaries.last() != Some(&value) {
                    boundaries.push(value);
                }
            }
        }

        debug!(total = total, boundary_count = boundaries.len(), "Computed bucket boundaries");
        Ok(boundaries)
    }

    fn bounded(&self, lower: Option<f64>, upper: Option<f64>) -> Q {
        let mut query = self.query.clone();
        if let Some(lower) = lower {
            query.filter(ValueFilter::gte(lower - DELTA));
        }
        if let Some(upper) = upper {
            query.filter(ValueFilter::lt(upper - DELTA));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::query::InMemoryIntervalQuery;

    fn search(values: &[f64]) -> IntervalSearch<InMemoryIntervalQuery> {
        IntervalSearch::new(InMemoryIntervalQuery::new(values.iter().copied()))
    }

    fn one_to_five() -> IntervalSearch<InMemoryIntervalQuery> {
        search(&[1.0, 2.0, 3.0, 4.0, 5.0])
    }

    #[tokio::test]
    async fn test_load_window() {
        let values = one_to_five().load(2, 1, None, None).await.unwrap();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_load_bounds() {
        let values = one_to_five().load(10, 0, Some(2.0), Some(4.0)).await.unwrap();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_load_previous() {
        let values = one_to_five().load_previous(3.0, 2, None).await.unwrap();
        assert_eq!(values, Some(vec![1.0, 2.0]));
    }

    #[tokio::test]
    async fn test_load_previous_takes_nearest_values() {
        let values = one_to_five().load_previous(5.0, 2, None).await.unwrap();
        assert_eq!(values, Some(vec![3.0, 4.0]));

        let bounded = one_to_five().load_previous(5.0, 10, Some(3.0)).await.unwrap();
        assert_eq!(bounded, Some(vec![3.0, 4.0]));
    }

    #[tokio::test]
    async fn test_load_previous_at_start() {
        assert_eq!(one_to_five().load_previous(1.0, 2, None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_next() {
        let values = one_to_five().load_next(3.0, 4, None).await.unwrap();
        assert_eq!(values, Some(vec![4.0, 5.0]));
    }

    #[tokio::test]
    async fn test_load_next_takes_nearest_values() {
        let values = one_to_five().load_next(1.0, 2, None).await.unwrap();
        assert_eq!(values, Some(vec![2.0, 3.0]));

        let bounded = one_to_five().load_next(1.0, 10, Some(4.0)).await.unwrap();
        assert_eq!(bounded, Some(vec![2.0, 3.0]));
    }

    #[tokio::test]
    async fn test_load_next_at_end() {
        assert_eq!(one_to_five().load_next(5.0, 2, None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pivot_within_tolerance_is_excluded() {
        let search = search(&[1.0, 2.999, 3.0, 3.004, 4.0]);

        assert_eq!(search.load_previous(3.0, 5, None).await.unwrap(), Some(vec![1.0]));
        assert_eq!(search.load_next(3.0, 5, None).await.unwrap(), Some(vec![4.0]));
    }

    #[tokio::test]
    async fn test_equal_frequency_boundaries() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let boundaries = search(&values).equal_frequency_boundaries(4).await.unwrap();
        assert_eq!(boundaries, vec![26.0, 51.0, 76.0]);
    }

    #[tokio::test]
    async fn test_equal_frequency_boundaries_collapse_duplicates() {
        let boundaries = search(&[1.0, 1.0, 1.0, 1.0, 1.0, 3.0])
            .equal_frequency_boundaries(3)
            .await
            .unwrap();
        assert_eq!(boundaries, vec![1.0]);
    }

    #[tokio::test]
    async fn test_equal_frequency_boundaries_edge_cases() {
        assert!(search(&[]).equal_frequency_boundaries(4).await.unwrap().is_empty());
        assert!(one_to_five().equal_frequency_boundaries(1).await.unwrap().is_empty());
        assert!(matches!(
            one_to_five().equal_frequency_boundaries(0).await,
            Err(IntervalError::InvalidRequest(_))
        ));
    }
}
