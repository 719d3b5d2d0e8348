//! Concurrent processing utilities for batch queries.
//!
//! Batch operations run one future per domain through `buffer_unordered`,
//! so at most `max_concurrency` connections are open at a time. Results are
//! keyed by domain; when a domain occurs more than once, the entry that
//! comes later in the input wins regardless of completion order.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::future::Future;

/// Runs per-domain futures with a concurrency bound and collects the results.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrentProcessor {
    max_concurrency: usize,
}

impl ConcurrentProcessor {
    /// Create a new concurrent processor.
    ///
    /// A limit of zero is treated as one.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// The effective concurrency limit.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every item to completion and key each output by its domain.
    pub async fn collect_all<I, F, Fut, T>(&self, items: I, run: F) -> HashMap<String, T>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> (String, Fut),
        Fut: Future<Output = T>,
    {
        let futures = items.into_iter().enumerate().map(|(index, item)| {
            let (domain, fut) = run(item);
            async move {
                let output = fut.await;
                (index, domain, output)
            }
        });

        let completed: Vec<(usize, String, T)> = stream::iter(futures)
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        keyed_in_input_order(completed)
    }

    /// Run items until the first error, which is returned immediately.
    ///
    /// Futures still in flight when an error arrives are dropped, closing
    /// their connections.
    pub async fn try_collect_all<I, F, Fut, T, E>(
        &self,
        items: I,
        run: F,
    ) -> Result<HashMap<String, T>, E>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> (String, Fut),
        Fut: Future<Output = Result<T, E>>,
    {
        let futures = items.into_iter().enumerate().map(|(index, item)| {
            let (domain, fut) = run(item);
            async move { fut.await.map(|value| (index, domain, value)) }
        });

        let completed: Vec<(usize, String, T)> = stream::iter(futures)
            .buffer_unordered(self.max_concurrency)
            .try_collect()
            .await?;

        Ok(keyed_in_input_order(completed))
    }
}

impl Default for ConcurrentProcessor {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_CONCURRENCY)
    }
}

fn keyed_in_input_order<T>(mut completed: Vec<(usize, String, T)>) -> HashMap<String, T> {
    completed.sort_by_key(|(index, _, _)| *index);

    let mut results = HashMap::with_capacity(completed.len());
    for (_, domain, value) in completed {
        results.insert(domain, value);
    }
    results
}
