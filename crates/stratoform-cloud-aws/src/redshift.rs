//! Redshift cluster and its initial SQL statement

use crate::iam::RoleKind;
use crate::provider::AwsProvider;
use stratoform_cloud::{Instruction, Output, Properties, ResourceOptions, Result, Stack, logical_name};

const CLUSTER: &str = "aws:redshift:Cluster";
const STATEMENT: &str = "aws:redshiftdata:Statement";
const STATEMENT_NAME: &str = "statement";

impl AwsProvider {
    pub(crate) fn register_redshift(&mut self, stack: &mut Stack) -> Result<()> {
        let role = self.require_role(RoleKind::Redshift, Instruction::CreateDwh)?;
        let redshift = &self.config.dwh.redshift;

        let cluster = stack.register(
            CLUSTER,
            &logical_name(&redshift.identifier),
            Properties::new()
                .with("clusterIdentifier", &redshift.identifier)
                .with("databaseName", &redshift.db_name)
                .with("masterUsername", &redshift.master_user)
                .with("masterPassword", &redshift.master_pass)
                .with("nodeType", &redshift.node_type)
                .with("numberOfNodes", redshift.number_of_nodes)
                .with("clusterType", &redshift.cluster_type)
                .with("skipFinalSnapshot", redshift.skip_snapshot)
                .with("publiclyAccessible", redshift.public_access)
                .with("iamRoles", Output::list([role.attr("arn")])),
            ResourceOptions::depends_on([&role]),
        )?;

        let statement = stack.register(
            STATEMENT,
            STATEMENT_NAME,
            Properties::new()
                .with("clusterIdentifier", &redshift.identifier)
                .with("database", &redshift.db_name)
                .with("dbUser", &redshift.master_user)
                .with("sql", &redshift.sql),
            ResourceOptions::depends_on([&cluster]),
        )?;

        tracing::info!(cluster = %redshift.identifier, "Redshift cluster registered");
        self.cluster = Some(cluster);
        self.statement = Some(statement);
        Ok(())
    }
}
