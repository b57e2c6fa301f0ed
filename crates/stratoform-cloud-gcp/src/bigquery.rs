//! BigQuery dataset and table the Pub/Sub subscription writes into

use crate::provider::GcpProvider;
use stratoform_cloud::{Properties, ResourceOptions, Result, Stack, logical_name};

const DATASET: &str = "gcp:bigquery:Dataset";
pub(crate) const TABLE: &str = "gcp:bigquery:Table";

impl GcpProvider {
    /// BigQuery dataset and table with the initial schema
    pub(crate) fn register_bigquery(&mut self, stack: &mut Stack) -> Result<()> {
        let bq = &self.config.dwh.big_query;

        let dataset = stack.register(
            DATASET,
            &logical_name(&bq.dataset),
            Properties::new()
                .with("datasetId", &bq.dataset)
                .with("location", &self.region),
            ResourceOptions::new(),
        )?;

        let table = stack.register(
            TABLE,
            &logical_name(&bq.table_id),
            Properties::new()
                .with("deletionProtection", bq.deletion_protection)
                .with("tableId", &bq.table_id)
                .with("datasetId", dataset.attr("datasetId"))
                .with_non_empty("schema", &bq.schema),
            ResourceOptions::depends_on([&dataset]),
        )?;

        tracing::info!(dataset = %bq.dataset, table = %bq.table_id, "BigQuery table registered");
        self.dataset = Some(dataset);
        self.table = Some(table);
        Ok(())
    }
}
