//! Nodegroup tag cascade.
//!
//! A nodegroup's tags are pushed down to the resources EKS created for it:
//! nodegroup → Auto Scaling Groups → instances → EBS volumes. Each
//! instance's volumes are handled right after the instance itself.

use tracing::{debug, info};

use crate::aws::{AutoScalingGroupInfo, InstanceInfo, NodegroupInfo, VolumeInfo, drain_pages};
use crate::error::{ReconcileError, Result};
use crate::tags::{ResourceKind, TagSet, volume_identity_tags};

use super::{ReconciliationReport, TagReconciler};

impl TagReconciler<'_> {
    /// Reconciles a nodegroup and cascades its tags to its ASGs, instances
    /// and volumes.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Resources earlier in the cascade keep
    /// their new tags.
    pub async fn reconcile_nodegroup(
        &self,
        nodegroup_name: &str,
        report: &mut ReconciliationReport,
    ) -> Result<()> {
        let cluster = &self.scope.cluster_name;
        info!(cluster = %cluster, nodegroup = nodegroup_name, "Reconciling nodegroup tags");

        let nodegroup = self
            .eks
            .describe_nodegroup(cluster, nodegroup_name)
            .await
            .map_err(|e| ReconcileError::resource(ResourceKind::Nodegroup, nodegroup_name, e))?
            .ok_or_else(|| ReconcileError::NotFound {
                kind: ResourceKind::Nodegroup,
                id: nodegroup_name.to_string(),
            })?;

        let ngtags = self.scope.nodegroup_tags();
        self.converge(
            ResourceKind::Nodegroup,
            &nodegroup.name,
            &nodegroup.arn,
            &nodegroup.tags,
            &ngtags,
            report,
        )
        .await?;

        let groups = self.reconcile_asg_tags(&nodegroup, report).await?;
        self.reconcile_instance_tags(&nodegroup, &groups, &ngtags, report)
            .await
    }

    /// Reconciles the tags of every ASG backing `nodegroup`.
    ///
    /// Only the additional tags are desired on ASGs; the tags EKS manages
    /// there are protected from removal.
    async fn reconcile_asg_tags(
        &self,
        nodegroup: &NodegroupInfo,
        report: &mut ReconciliationReport,
    ) -> Result<Vec<AutoScalingGroupInfo>> {
        info!(
            cluster = %self.scope.cluster_name,
            nodegroup = %nodegroup.name,
            "Reconciling ASG tags"
        );

        let groups = self.describe_asgs(nodegroup).await?;
        for group in &groups {
            self.converge(
                ResourceKind::AutoScalingGroup,
                &group.name,
                &group.name,
                &group.tags,
                &self.scope.additional_tags,
                report,
            )
            .await?;
        }

        Ok(groups)
    }

    /// Reconciles every instance of `groups` and, after each instance, its
    /// volumes. Existing instance tags are kept; nodegroup tags are layered
    /// on top.
    async fn reconcile_instance_tags(
        &self,
        nodegroup: &NodegroupInfo,
        groups: &[AutoScalingGroupInfo],
        ngtags: &TagSet,
        report: &mut ReconciliationReport,
    ) -> Result<()> {
        let ids: Vec<String> = groups
            .iter()
            .flat_map(|group| group.instance_ids.iter().cloned())
            .collect();
        info!(
            nodegroup = %nodegroup.name,
            count = ids.len(),
            "Instances of autoscaling groups"
        );

        let instances = self.describe_instances(&nodegroup.name, &ids).await?;
        for instance in &instances {
            let mut desired = instance.tags.clone();
            desired.extend(ngtags.iter().map(|(k, v)| (k.clone(), v.clone())));

            debug!(instance = %instance.id, "Updating instance tags");
            self.converge(
                ResourceKind::Instance,
                &instance.id,
                &instance.id,
                &instance.tags,
                &desired,
                report,
            )
            .await?;

            self.reconcile_volume_tags(nodegroup, instance, ngtags, report)
                .await?;
        }

        Ok(())
    }

    /// Reconciles the EBS volumes attached to `instance`.
    ///
    /// Volumes get the EKS identity tags unless already tagged otherwise,
    /// then the nodegroup tags.
    async fn reconcile_volume_tags(
        &self,
        nodegroup: &NodegroupInfo,
        instance: &InstanceInfo,
        ngtags: &TagSet,
        report: &mut ReconciliationReport,
    ) -> Result<()> {
        let volumes = self.describe_volumes(&instance.id, &instance.volume_ids).await?;

        for volume in &volumes {
            let mut desired = volume_identity_tags(&self.scope.cluster_name, &nodegroup.name);
            desired.extend(volume.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
            desired.extend(ngtags.iter().map(|(k, v)| (k.clone(), v.clone())));

            self.converge(
                ResourceKind::Volume,
                &volume.id,
                &volume.id,
                &volume.tags,
                &desired,
                report,
            )
            .await?;
        }

        Ok(())
    }

    /// Describes every ASG of `nodegroup`, draining all pages.
    async fn describe_asgs(&self, nodegroup: &NodegroupInfo) -> Result<Vec<AutoScalingGroupInfo>> {
        if nodegroup.auto_scaling_groups.is_empty() {
            debug!(nodegroup = %nodegroup.name, "Nodegroup has no Auto Scaling Groups");
            return Ok(Vec::new());
        }

        let autoscaling = self.autoscaling;
        let names = nodegroup.auto_scaling_groups.as_slice();
        let groups =
            drain_pages(move |token| autoscaling.describe_auto_scaling_groups(names, token))
                .await
                .map_err(|e| {
                    ReconcileError::resource(ResourceKind::Nodegroup, &nodegroup.name, e)
                })?;

        Ok(groups)
    }

    /// Describes the given instances, draining all pages.
    async fn describe_instances(
        &self,
        nodegroup_name: &str,
        ids: &[String],
    ) -> Result<Vec<InstanceInfo>> {
        // An empty id list would describe every instance in the account.
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ec2 = self.ec2;
        let instances = drain_pages(move |token| ec2.describe_instances(ids, token))
            .await
            .map_err(|e| ReconcileError::resource(ResourceKind::Nodegroup, nodegroup_name, e))?;

        Ok(instances)
    }

    /// Describes the given volumes, draining all pages.
    async fn describe_volumes(&self, instance_id: &str, ids: &[String]) -> Result<Vec<VolumeInfo>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ec2 = self.ec2;
        let volumes = drain_pages(move |token| ec2.describe_volumes(ids, token))
            .await
            .map_err(|e| ReconcileError::resource(ResourceKind::Instance, instance_id, e))?;

        Ok(volumes)
    }
}
