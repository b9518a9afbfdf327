//! Tag reconciler for EKS clusters and their resources.
//!
//! This module compares the tags currently set on each resource with the
//! desired tags derived from cluster metadata and issues the add/update and
//! remove calls needed to converge them. Every call is awaited before the
//! next one is issued; callers own concurrency across clusters and retries.

mod nodegroup;
mod report;

#[cfg(test)]
mod fake;

use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::aws::{AutoScalingApi, AwsResult, Ec2Api, EksApi, drain_pages};
use crate::config::TagSyncConfig;
use crate::error::{ReconcileError, Result};
use crate::tags::{
    ResourceKind, TagSet, build, cluster_build_params, diff_with_exemption, is_aws_reserved,
    nodegroup_tags, protected_keys,
};

pub use report::{ReconciliationReport, ResourceOutcome};

/// Cluster metadata the desired tags are derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagScope {
    /// EKS cluster name.
    pub cluster_name: String,
    /// User tags applied to every resource.
    pub additional_tags: TagSet,
}

impl TagScope {
    /// Creates a scope.
    #[must_use]
    pub fn new(cluster_name: impl Into<String>, additional_tags: TagSet) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            additional_tags,
        }
    }

    /// Creates a scope from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &TagSyncConfig) -> Self {
        Self::new(config.cluster.name.clone(), config.additional_tags.clone())
    }

    /// Desired tags for nodegroups, Fargate profiles, instances and volumes.
    #[must_use]
    pub fn nodegroup_tags(&self) -> TagSet {
        nodegroup_tags(&self.cluster_name, &self.additional_tags)
    }
}

/// Reconciles tags on a cluster and everything it owns.
pub struct TagReconciler<'a> {
    /// EKS client.
    eks: &'a dyn EksApi,
    /// Auto Scaling client.
    autoscaling: &'a dyn AutoScalingApi,
    /// EC2 client.
    ec2: &'a dyn Ec2Api,
    /// Cluster metadata.
    scope: &'a TagScope,
    /// Compute diffs without applying them.
    dry_run: bool,
}

impl<'a> TagReconciler<'a> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(
        eks: &'a dyn EksApi,
        autoscaling: &'a dyn AutoScalingApi,
        ec2: &'a dyn Ec2Api,
        scope: &'a TagScope,
    ) -> Self {
        Self {
            eks,
            autoscaling,
            ec2,
            scope,
            dry_run: false,
        }
    }

    /// Only computes and reports diffs; no tag is added or removed.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reconciles the cluster, its Fargate profiles and its nodegroups.
    ///
    /// `nodegroups` and `fargate_profiles` restrict the run to the named
    /// resources; `None` reconciles every resource listed by EKS.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Resources processed before the failure
    /// keep their new tags.
    pub async fn reconcile(
        &self,
        nodegroups: Option<&[String]>,
        fargate_profiles: Option<&[String]>,
    ) -> Result<ReconciliationReport> {
        let mut report = ReconciliationReport::new(&self.scope.cluster_name, self.dry_run);
        info!(
            cluster = %self.scope.cluster_name,
            run_id = %report.run_id,
            dry_run = self.dry_run,
            "Starting tag reconciliation"
        );

        self.reconcile_cluster(&mut report).await?;

        for profile in self.fargate_profile_names(fargate_profiles).await? {
            self.reconcile_fargate_profile(&profile, &mut report).await?;
        }

        for nodegroup in self.nodegroup_names(nodegroups).await? {
            self.reconcile_nodegroup(&nodegroup, &mut report).await?;
        }

        report.finish();
        info!(
            cluster = %self.scope.cluster_name,
            changed = report.changed_count(),
            unchanged = report.unchanged_count(),
            "Tag reconciliation complete"
        );

        Ok(report)
    }

    /// Reconciles the tags on the EKS cluster itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster cannot be described or tagged.
    pub async fn reconcile_cluster(&self, report: &mut ReconciliationReport) -> Result<()> {
        let name = &self.scope.cluster_name;
        info!(cluster = %name, "Reconciling cluster tags");

        let cluster = self
            .eks
            .describe_cluster(name)
            .await
            .map_err(|e| ReconcileError::resource(ResourceKind::Cluster, name, e))?
            .ok_or_else(|| ReconcileError::NotFound {
                kind: ResourceKind::Cluster,
                id: name.clone(),
            })?;

        let desired = build(&cluster_build_params(
            name,
            &cluster.arn,
            &self.scope.additional_tags,
        ));

        self.converge(
            ResourceKind::Cluster,
            name,
            &cluster.arn,
            &cluster.tags,
            &desired,
            report,
        )
        .await
    }

    /// Reconciles the tags on a Fargate profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be described or tagged.
    pub async fn reconcile_fargate_profile(
        &self,
        profile_name: &str,
        report: &mut ReconciliationReport,
    ) -> Result<()> {
        info!(
            cluster = %self.scope.cluster_name,
            fargate_profile = profile_name,
            "Reconciling Fargate profile tags"
        );

        let profile = self
            .eks
            .describe_fargate_profile(&self.scope.cluster_name, profile_name)
            .await
            .map_err(|e| ReconcileError::resource(ResourceKind::FargateProfile, profile_name, e))?
            .ok_or_else(|| ReconcileError::NotFound {
                kind: ResourceKind::FargateProfile,
                id: profile_name.to_string(),
            })?;

        self.converge(
            ResourceKind::FargateProfile,
            &profile.name,
            &profile.arn,
            &profile.tags,
            &self.scope.nodegroup_tags(),
            report,
        )
        .await
    }

    /// Resolves the nodegroups to reconcile.
    async fn nodegroup_names(&self, configured: Option<&[String]>) -> Result<Vec<String>> {
        if let Some(names) = configured {
            return Ok(names.to_vec());
        }

        let eks = self.eks;
        let cluster = self.scope.cluster_name.as_str();
        let names = drain_pages(move |token| eks.list_nodegroups(cluster, token))
            .await
            .map_err(|e| ReconcileError::resource(ResourceKind::Cluster, cluster, e))?;

        debug!(cluster, count = names.len(), "Discovered nodegroups");
        Ok(names)
    }

    /// Resolves the Fargate profiles to reconcile.
    async fn fargate_profile_names(&self, configured: Option<&[String]>) -> Result<Vec<String>> {
        if let Some(names) = configured {
            return Ok(names.to_vec());
        }

        let eks = self.eks;
        let cluster = self.scope.cluster_name.as_str();
        let names = drain_pages(move |token| eks.list_fargate_profiles(cluster, token))
            .await
            .map_err(|e| ReconcileError::resource(ResourceKind::Cluster, cluster, e))?;

        debug!(cluster, count = names.len(), "Discovered Fargate profiles");
        Ok(names)
    }

    /// Diffs one resource and applies the result.
    ///
    /// `id` names the resource in logs and the report; `target` is what the
    /// tag APIs address (ARN for EKS resources, name or id otherwise).
    async fn converge(
        &self,
        kind: ResourceKind,
        id: &str,
        target: &str,
        current: &TagSet,
        desired: &TagSet,
        report: &mut ReconciliationReport,
    ) -> Result<()> {
        let protected = protected_keys(kind, &self.scope.cluster_name);
        let mut changes = diff_with_exemption(current, desired, &protected);
        changes.to_delete.retain(|key| !is_aws_reserved(key));

        debug!(
            kind = %kind,
            id,
            tags_to_add = ?changes.to_upsert,
            tags_to_delete = ?changes.to_delete,
            "Computed tag diff"
        );

        if changes.is_empty() {
            debug!(kind = %kind, id, "Tags already converged");
        } else if self.dry_run {
            info!(kind = %kind, id, changes = %changes, "Would update tags");
        } else {
            if !changes.to_upsert.is_empty() {
                self.upsert_tags(kind, target, &changes.to_upsert)
                    .await
                    .map_err(|e| ReconcileError::resource(kind, id, e))?;
            }
            if !changes.to_delete.is_empty() {
                self.remove_tags(kind, target, &changes.to_delete)
                    .await
                    .map_err(|e| ReconcileError::resource(kind, id, e))?;
            }
            info!(kind = %kind, id, changes = %changes, "Updated tags");
        }

        report.record(ResourceOutcome::from_diff(kind, id, changes, !self.dry_run));
        Ok(())
    }

    /// Calls the add/update tag API for `kind`.
    async fn upsert_tags(&self, kind: ResourceKind, target: &str, tags: &TagSet) -> AwsResult<()> {
        match kind {
            ResourceKind::Cluster | ResourceKind::Nodegroup | ResourceKind::FargateProfile => {
                self.eks.tag_resource(target, tags).await
            }
            ResourceKind::AutoScalingGroup => {
                self.autoscaling.create_or_update_tags(target, tags).await
            }
            ResourceKind::Instance | ResourceKind::Volume => {
                let resources = [target.to_string()];
                self.ec2.create_tags(&resources, tags).await
            }
        }
    }

    /// Calls the remove-tag API for `kind`.
    async fn remove_tags(
        &self,
        kind: ResourceKind,
        target: &str,
        keys: &BTreeSet<String>,
    ) -> AwsResult<()> {
        match kind {
            ResourceKind::Cluster | ResourceKind::Nodegroup | ResourceKind::FargateProfile => {
                self.eks.untag_resource(target, keys).await
            }
            ResourceKind::AutoScalingGroup => self.autoscaling.delete_tags(target, keys).await,
            ResourceKind::Instance | ResourceKind::Volume => {
                let resources = [target.to_string()];
                self.ec2.delete_tags(&resources, keys).await
            }
        }
    }
}
