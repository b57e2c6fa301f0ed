//! Stratoform GCP Provider
//!
//! Translates template sections into Google Cloud resources:
//!
//! - IAM members (bucket and project scoped, with the project number filled in)
//! - Cloud Storage bucket
//! - BigQuery dataset and table
//! - Pub/Sub topic and subscription (Cloud Storage, BigQuery or pull)
//! - Cloud Functions (2nd gen) with service account and role bindings
//! - API Gateway backed by a generated OpenAPI document
//!
//! Identity management has no GCP counterpart and reports `Unsupported`.

mod apigateway;
mod bigquery;
mod function;
mod iam;
mod openapi;
mod provider;
mod pubsub;

pub use iam::MemberKind;
pub use openapi::{OpenApiSpec, SPEC_PATH};
pub use provider::GcpProvider;
pub use pubsub::Delivery;
