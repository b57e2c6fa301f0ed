//! Kinesis Firehose delivery stream

use crate::iam::RoleKind;
use crate::provider::{AwsProvider, require};
use stratoform_cloud::{
    CloudError, Instruction, Output, Properties, ResourceOptions, ResourceRef, Result, Stack,
    logical_name,
};
use stratoform_config::Stream;

const DELIVERY_STREAM: &str = "aws:kinesis:FirehoseDeliveryStream";

const ERROR_OUTPUT_PREFIX: &str = "errors/year=!{timestamp:yyyy}/month=!{timestamp:MM}/day=!{timestamp:dd}/hour=!{timestamp:HH}/!{firehose:error-output-type}/";

/// S3 staging buffer for the Redshift destination
const REDSHIFT_STAGING_BUFFER_SIZE: u32 = 10;
const REDSHIFT_STAGING_BUFFER_INTERVAL: u32 = 0;

fn processor(kind: &str, parameters: &[(&str, &str)]) -> Properties {
    let props = Properties::new().with("type", kind);
    if parameters.is_empty() {
        return props;
    }
    props.with(
        "parameters",
        Output::list(parameters.iter().map(|(name, value)| {
            Properties::new()
                .with("parameterName", *name)
                .with("parameterValue", *value)
        })),
    )
}

/// Record processors for dynamic partitioning by `game_name`
pub(crate) fn partition_processors() -> Output {
    Output::list([
        processor("RecordDeAggregation", &[("SubRecordType", "JSON")]),
        processor("AppendDelimiterToRecord", &[]),
        processor(
            "MetadataExtraction",
            &[
                ("JsonParsingEngine", "JQ-1.6"),
                ("MetadataExtractionQuery", "{game_name:.game_name}"),
            ],
        ),
    ])
}

fn extended_s3_configuration(stream: &Stream, role: &ResourceRef, bucket: &ResourceRef) -> Properties {
    let s3 = &stream.s3_conf;
    let mut conf = Properties::new()
        .with("roleArn", role.attr("arn"))
        .with("bucketArn", bucket.attr("arn"))
        .with("bufferingSize", s3.buffering_size)
        .with("bufferingInterval", s3.buffering_interval)
        .with(
            "cloudwatchLoggingOptions",
            Properties::new()
                .with("enabled", true)
                .with("logGroupName", &stream.name)
                .with("logStreamName", format!("{}-stream", stream.name)),
        )
        .with("errorOutputPrefix", ERROR_OUTPUT_PREFIX);

    if s3.partition_enabled {
        conf.set("prefix", &s3.s3_prefix);
        conf.set(
            "dynamicPartitioningConfiguration",
            Properties::new().with("enabled", true),
        );
        conf.set(
            "processingConfiguration",
            Properties::new()
                .with("enabled", true)
                .with("processors", partition_processors()),
        );
    }
    conf
}

fn redshift_configuration(
    stream: &Stream,
    role: &ResourceRef,
    bucket: &ResourceRef,
    cluster: &ResourceRef,
) -> Properties {
    let redshift = &stream.redshift_conf;
    Properties::new()
        .with("roleArn", role.attr("arn"))
        .with(
            "clusterJdbcurl",
            Output::concat([
                Output::string("jdbc:redshift://"),
                cluster.attr("endpoint"),
                Output::string("/"),
                cluster.attr("databaseName"),
            ]),
        )
        .with("username", &redshift.username)
        .with("password", &redshift.password)
        .with("dataTableName", &redshift.data_table_name)
        .with_non_empty("dataTableColumns", &redshift.data_table_columns)
        .with("copyOptions", &redshift.copy_options)
        .with(
            "cloudwatchLoggingOptions",
            Properties::new()
                .with("enabled", true)
                .with("logStreamName", format!("{}-kinesis-stream", stream.name))
                .with("logGroupName", format!("{}-kinesis-loggroup", stream.name)),
        )
        .with(
            "s3Configuration",
            Properties::new()
                .with("roleArn", role.attr("arn"))
                .with("bucketArn", bucket.attr("arn"))
                .with("bufferingSize", REDSHIFT_STAGING_BUFFER_SIZE)
                .with("bufferingInterval", REDSHIFT_STAGING_BUFFER_INTERVAL),
        )
}

impl AwsProvider {
    pub(crate) fn register_firehose(&mut self, stack: &mut Stack) -> Result<()> {
        let stream = &self.config.stream;
        let instruction = Instruction::CreateStream;

        let mut props = Properties::new().with("name", &stream.name);
        let depends_on = match stream.destination.as_str() {
            "s3" => {
                let role = self.require_role(RoleKind::Firehose, instruction)?;
                let bucket = require(&self.bucket, instruction, "an S3 bucket (createStorage)")?;
                props.set("destination", "extended_s3");
                props.set(
                    "extendedS3Configuration",
                    extended_s3_configuration(stream, &role, &bucket),
                );
                bucket
            }
            "redshift" => {
                let role = self.require_role(RoleKind::Firehose, instruction)?;
                let bucket = require(&self.bucket, instruction, "an S3 bucket (createStorage)")?;
                let cluster =
                    require(&self.cluster, instruction, "a Redshift cluster (createDWH)")?;
                props.set("destination", "redshift");
                props.set(
                    "redshiftConfiguration",
                    redshift_configuration(stream, &role, &bucket, &cluster),
                );
                cluster
            }
            other => {
                return Err(CloudError::InvalidConfig(format!(
                    "stream.destination must be s3 or redshift, got {:?}",
                    other
                )));
            }
        };

        let firehose = stack.register(
            DELIVERY_STREAM,
            &logical_name(&stream.name),
            props,
            ResourceOptions::depends_on([&depends_on]),
        )?;

        tracing::info!(
            stream = %stream.name,
            destination = %stream.destination,
            partitioned = stream.s3_conf.partition_enabled,
            "Firehose delivery stream registered"
        );
        self.stream = Some(firehose);
        Ok(())
    }
}
