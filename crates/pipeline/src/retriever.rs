//! Dataset retrieval.
//!
//! Runs planned queries against a [`DatasetCatalog`]. Each failed query
//! contributes no records and one notice; retrieval as a whole never fails.

use crate::catalog::{DatasetCatalog, DatasetRecord};
use crate::planner::SearchQuery;
use crate::progress::ProgressReporter;
use crate::types::{Notice, PipelineStage, StageOutput};
use futures::future::join_all;
use std::sync::Arc;

pub struct DatasetRetriever {
    catalog: Arc<dyn DatasetCatalog>,
    max_queries: usize,
    results_per_query: u32,
}

impl DatasetRetriever {
    pub fn new(catalog: Arc<dyn DatasetCatalog>, max_queries: usize, results_per_query: u32) -> Self {
        Self {
            catalog,
            max_queries,
            results_per_query,
        }
    }

    /// The prefix of `queries` that [`collect`](Self::collect) will execute.
    pub fn executed<'a>(&self, queries: &'a [SearchQuery]) -> &'a [SearchQuery] {
        &queries[..queries.len().min(self.max_queries)]
    }

    /// Run one query, returning at most `limit` records.
    pub async fn retrieve(
        &self,
        query: &SearchQuery,
        limit: u32,
    ) -> StageOutput<Vec<DatasetRecord>> {
        match self.catalog.search(query, limit).await {
            Ok(mut records) => {
                records.truncate(limit as usize);
                tracing::debug!(
                    catalog = self.catalog.name(),
                    query = %query,
                    records = records.len(),
                    "Catalog search returned"
                );
                StageOutput::ok(records)
            }
            Err(e) => StageOutput::degraded(
                Vec::new(),
                Notice::new(PipelineStage::Retrieving, format!("Error fetching data: {}", e)),
            ),
        }
    }

    /// Execute the first `max_queries` queries and concatenate their results
    /// in query order. Duplicates across queries are kept.
    ///
    /// The searches are issued concurrently; result order follows query order
    /// regardless of completion order.
    pub async fn collect(
        &self,
        queries: &[SearchQuery],
        progress: &ProgressReporter,
    ) -> (Vec<DatasetRecord>, Vec<Notice>) {
        let executed = self.executed(queries);
        tracing::info!(
            "Retrieving datasets for {} of {} planned queries",
            executed.len(),
            queries.len()
        );

        for query in executed {
            progress.searching(query.as_str());
        }

        let outputs = join_all(
            executed
                .iter()
                .map(|query| self.retrieve(query, self.results_per_query)),
        )
        .await;

        let mut notices = Vec::new();
        let datasets: Vec<DatasetRecord> = outputs
            .into_iter()
            .flat_map(|output| output.collect_into(&mut notices))
            .collect();

        progress.found(datasets.len());

        (datasets, notices)
    }
}
