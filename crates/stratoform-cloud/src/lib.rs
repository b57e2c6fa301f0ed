//! Stratoform cloud boundary
//!
//! This crate holds everything between the template configuration and the
//! orchestration engine: the provider capability trait, the in-process
//! resource graph providers register into, rendering of that graph as a
//! Pulumi YAML program, the record of the last apply with the preview diff
//! against it, and the `pulumi` CLI wrapper.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  strato CLI                     │
//! │         (validate/render/preview/up)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               stratoform-cloud                  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait CloudProvider { ... }             │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌─────────┐  ┌───────────┐  ┌────────────┐     │
//! │  │  Stack  │  │  Program  │  │Plan/Applied│     │
//! │  └─────────┘  └───────────┘  └────────────┘     │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │      aws      │ │      gcp      │
//! │   provider    │ │   provider    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod applied;
pub mod error;
pub mod output;
pub mod plan;
pub mod program;
pub mod provider;
pub mod pulumi;
pub mod stack;

// Re-exports
pub use applied::{AppliedStack, ApplyLock, StackDir};
pub use error::{CloudError, Failures, ItemFailure, Result};
pub use output::{Output, Properties, project_path};
pub use plan::{Change, ChangeKind, Plan, PlanSummary};
pub use program::{PROGRAM_FILE, Program, ResourceEntry};
pub use provider::{CloudKind, CloudProvider, Instruction};
pub use pulumi::Pulumi;
pub use stack::{ConfigDecl, Invoke, Resource, ResourceOptions, ResourceRef, Stack, logical_name};
