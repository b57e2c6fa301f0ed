//! Stratoform AWS Provider
//!
//! Translates template sections into AWS resources:
//!
//! - IAM roles (classified by name prefix for later wiring)
//! - S3 bucket
//! - Redshift cluster and initial SQL statement
//! - Kinesis Firehose delivery stream (S3 or Redshift destination)
//! - REST API Gateway
//! - Lambda function with function URL
//! - Cognito user pool

mod apigateway;
mod cognito;
mod firehose;
mod iam;
mod lambda;
mod provider;
mod redshift;

pub use iam::RoleKind;
pub use provider::AwsProvider;
