//! Pub/Sub topic and subscription
//!
//! The subscription delivers to Cloud Storage or BigQuery depending on
//! `stream.destination`; with no destination it is a plain pull subscription.

use crate::provider::{GcpProvider, require};
use stratoform_cloud::{
    CloudError, Instruction, Output, Properties, ResourceOptions, ResourceRef, Result, Stack,
    logical_name,
};

const TOPIC: &str = "gcp:pubsub:Topic";
const SUBSCRIPTION: &str = "gcp:pubsub:Subscription";
const ACK_DEADLINE_SECONDS: u32 = 20;

/// Where a subscription delivers messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pull,
    CloudStorage,
    BigQuery,
}

impl Delivery {
    pub fn parse(destination: &str) -> Result<Delivery> {
        match destination {
            "" => Ok(Delivery::Pull),
            "cloudstorage" => Ok(Delivery::CloudStorage),
            "bigquery" => Ok(Delivery::BigQuery),
            other => Err(CloudError::InvalidConfig(format!(
                "stream.destination must be cloudstorage or bigquery, got {:?}",
                other
            ))),
        }
    }
}

impl GcpProvider {
    pub(crate) fn register_pubsub(&mut self, stack: &mut Stack) -> Result<()> {
        let instruction = Instruction::CreateStream;
        let conf = &self.config.stream.pubsub_conf;
        let delivery = Delivery::parse(&self.config.stream.destination)?;

        let mut props = Properties::new();
        let mut deps: Vec<ResourceRef> = Vec::new();
        match delivery {
            Delivery::Pull => {}
            Delivery::CloudStorage => {
                let bucket = require(
                    &self.bucket,
                    instruction,
                    "a Cloud Storage bucket (createStorage)",
                )?;
                let storage = &conf.subscription.cloud_storage_conf;
                props.set(
                    "cloudStorageConfig",
                    Properties::new()
                        .with("bucket", bucket.id())
                        .with_non_empty("maxDuration", &storage.duration)
                        .with_non_empty("filenamePrefix", &storage.file_prefix),
                );
                deps.push(bucket);
            }
            Delivery::BigQuery => {
                let table = require(&self.table, instruction, "a BigQuery table (createDWH)")?;
                props.set(
                    "bigqueryConfig",
                    Properties::new()
                        .with(
                            "table",
                            Output::concat([
                                table.attr("project"),
                                Output::string("."),
                                table.attr("datasetId"),
                                Output::string("."),
                                table.attr("tableId"),
                            ]),
                        )
                        .with("useTableSchema", true),
                );
                deps.push(table);
            }
        }

        let topic = stack.register(
            TOPIC,
            &logical_name(&conf.topic.name),
            Properties::new().with("name", &conf.topic.name),
            ResourceOptions::new(),
        )?;
        deps.push(topic.clone());

        props.set("name", &conf.subscription.name);
        props.set("topic", topic.id());
        props.set("ackDeadlineSeconds", ACK_DEADLINE_SECONDS);

        let subscription = stack.register(
            SUBSCRIPTION,
            &logical_name(&conf.subscription.name),
            props,
            ResourceOptions::depends_on(&deps),
        )?;

        tracing::info!(
            topic = %conf.topic.name,
            subscription = %conf.subscription.name,
            delivery = ?delivery,
            "Pub/Sub stream registered"
        );
        self.topic = Some(topic);
        self.subscription = Some(subscription);
        Ok(())
    }
}
