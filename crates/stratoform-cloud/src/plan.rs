//! Differences between a rendered program and the last applied one
//!
//! This is a local preview: it compares program entries, not live cloud
//! state. Drift is only visible through `pulumi preview`.

use crate::applied::AppliedStack;
use crate::program::{Program, ResourceEntry};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    /// Same type, different properties or dependencies
    Update,
    /// The type token changed; the engine deletes and recreates it
    Replace,
    Delete,
    Same,
}

/// Planned change of one logical resource
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub name: String,
    pub token: String,
    pub kind: ChangeKind,
    /// Top-level properties that differ, plus `dependsOn` when the edges differ
    pub fields: Vec<String>,
}

impl Change {
    fn new(entry: &ResourceEntry, kind: ChangeKind, fields: Vec<String>) -> Self {
        Self {
            name: entry.name.clone(),
            token: entry.token.clone(),
            kind,
            fields,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    changes: Vec<Change>,
}

impl Plan {
    /// Program resources in program order, then deletions in applied order
    pub fn between(program: &Program, applied: &AppliedStack) -> Self {
        let mut changes: Vec<Change> = program
            .resources()
            .iter()
            .map(|entry| match applied.resource(&entry.name) {
                None => Change::new(entry, ChangeKind::Create, Vec::new()),
                Some(previous) if previous.token != entry.token => {
                    Change::new(entry, ChangeKind::Replace, vec!["type".to_string()])
                }
                Some(previous) => {
                    let fields = changed_fields(previous, entry);
                    let kind = if fields.is_empty() {
                        ChangeKind::Same
                    } else {
                        ChangeKind::Update
                    };
                    Change::new(entry, kind, fields)
                }
            })
            .collect();

        let desired: HashSet<&str> = program.resources().iter().map(|r| r.name.as_str()).collect();
        changes.extend(
            applied
                .resources
                .iter()
                .filter(|r| !desired.contains(r.name.as_str()))
                .map(|r| Change::new(r, ChangeKind::Delete, Vec::new())),
        );

        Self { changes }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.kind != ChangeKind::Same)
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for change in &self.changes {
            match change.kind {
                ChangeKind::Create => summary.create += 1,
                ChangeKind::Update => summary.update += 1,
                ChangeKind::Replace => summary.replace += 1,
                ChangeKind::Delete => summary.delete += 1,
                ChangeKind::Same => summary.same += 1,
            }
        }
        summary
    }
}

fn changed_fields(previous: &ResourceEntry, desired: &ResourceEntry) -> Vec<String> {
    let keys: BTreeSet<&String> = previous
        .properties
        .keys()
        .chain(desired.properties.keys())
        .collect();
    let mut fields: Vec<String> = keys
        .into_iter()
        .filter(|k| previous.properties.get(*k) != desired.properties.get(*k))
        .cloned()
        .collect();
    if previous.depends_on != desired.depends_on {
        fields.push("dependsOn".to_string());
    }
    fields
}

/// Change counts of a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub same: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to create, {} to update", self.create, self.update)?;
        if self.replace > 0 {
            write!(f, ", {} to replace", self.replace)?;
        }
        write!(f, ", {} to delete, {} unchanged", self.delete, self.same)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Properties;
    use crate::stack::{ResourceOptions, Stack};
    use std::collections::BTreeMap;

    fn program_with_bucket(token: &str, force_destroy: bool) -> Program {
        let mut stack = Stack::new("demo", "dev");
        stack
            .register(
                token,
                "test-bucket",
                Properties::new()
                    .with("bucket", "test-bucket")
                    .with("forceDestroy", force_destroy),
                ResourceOptions::new(),
            )
            .unwrap();
        Program::from_stack(&stack).unwrap()
    }

    fn applied(program: &Program) -> AppliedStack {
        AppliedStack::new(program, BTreeMap::new())
    }

    #[test]
    fn test_never_applied_creates_everything() {
        let program = program_with_bucket("aws:s3:Bucket", true);
        let plan = Plan::between(&program, &AppliedStack::default());
        assert!(plan.has_changes());
        assert_eq!(plan.summary().create, 1);
        assert_eq!(plan.changes()[0].name, "test-bucket");
        assert_eq!(plan.changes()[0].token, "aws:s3:Bucket");
    }

    #[test]
    fn test_applied_program_has_no_changes() {
        let previous = applied(&program_with_bucket("aws:s3:Bucket", true));

        let plan = Plan::between(&program_with_bucket("aws:s3:Bucket", true), &previous);
        assert!(!plan.has_changes());
        assert_eq!(
            plan.summary().to_string(),
            "0 to create, 0 to update, 0 to delete, 1 unchanged"
        );
    }

    #[test]
    fn test_changed_property_is_an_update() {
        let previous = applied(&program_with_bucket("aws:s3:Bucket", true));

        let plan = Plan::between(&program_with_bucket("aws:s3:Bucket", false), &previous);
        let change = &plan.changes()[0];
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.fields, vec!["forceDestroy".to_string()]);
    }

    #[test]
    fn test_changed_type_is_a_replacement() {
        let previous = applied(&program_with_bucket("aws:s3:Bucket", true));

        let plan = Plan::between(&program_with_bucket("aws:s3:BucketV2", true), &previous);
        assert_eq!(plan.changes()[0].kind, ChangeKind::Replace);
        assert_eq!(
            plan.summary().to_string(),
            "0 to create, 0 to update, 1 to replace, 0 to delete, 0 unchanged"
        );
    }

    #[test]
    fn test_new_dependency_is_an_update() {
        let previous = applied(&program_with_bucket("aws:s3:Bucket", true));

        let mut stack = Stack::new("demo", "dev");
        let role = stack
            .register("aws:iam:Role", "role", Properties::new(), ResourceOptions::new())
            .unwrap();
        stack
            .register(
                "aws:s3:Bucket",
                "test-bucket",
                Properties::new()
                    .with("bucket", "test-bucket")
                    .with("forceDestroy", true),
                ResourceOptions::depends_on([&role]),
            )
            .unwrap();
        let plan = Plan::between(&Program::from_stack(&stack).unwrap(), &previous);

        assert_eq!(plan.summary().create, 1);
        let bucket = plan.changes().iter().find(|c| c.name == "test-bucket").unwrap();
        assert_eq!(bucket.kind, ChangeKind::Update);
        assert_eq!(bucket.fields, vec!["dependsOn".to_string()]);
    }

    #[test]
    fn test_removed_resource_is_deleted() {
        let previous = applied(&program_with_bucket("aws:s3:Bucket", true));

        let empty = Program::from_stack(&Stack::new("demo", "dev")).unwrap();
        let plan = Plan::between(&empty, &previous);
        let change = &plan.changes()[0];
        assert_eq!(change.kind, ChangeKind::Delete);
        assert_eq!(change.name, "test-bucket");
        assert_eq!(change.token, "aws:s3:Bucket");
        assert_eq!(plan.summary().delete, 1);
    }
}
