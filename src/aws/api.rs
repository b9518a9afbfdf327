//! Collaborator interfaces for the tagged resources.
//!
//! One trait per AWS service. Every method maps to exactly one API call so
//! the reconciler controls pagination and ordering; implementations do not
//! retry.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::AwsError;
use crate::tags::TagSet;

use super::pagination::Page;
use super::types::{
    AutoScalingGroupInfo, ClusterInfo, FargateProfileInfo, InstanceInfo, NodegroupInfo,
    VolumeInfo,
};

/// Result type for collaborator calls.
pub type AwsResult<T> = std::result::Result<T, AwsError>;

/// EKS operations used for cluster, nodegroup and Fargate profile tags.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EksApi: Send + Sync {
    /// Describes a cluster. Returns `None` if it does not exist.
    async fn describe_cluster(&self, name: &str) -> AwsResult<Option<ClusterInfo>>;

    /// Describes a nodegroup. Returns `None` if it does not exist.
    async fn describe_nodegroup(
        &self,
        cluster_name: &str,
        nodegroup_name: &str,
    ) -> AwsResult<Option<NodegroupInfo>>;

    /// Describes a Fargate profile. Returns `None` if it does not exist.
    async fn describe_fargate_profile(
        &self,
        cluster_name: &str,
        profile_name: &str,
    ) -> AwsResult<Option<FargateProfileInfo>>;

    /// Lists one page of nodegroup names.
    async fn list_nodegroups(
        &self,
        cluster_name: &str,
        next_token: Option<String>,
    ) -> AwsResult<Page<String>>;

    /// Lists one page of Fargate profile names.
    async fn list_fargate_profiles(
        &self,
        cluster_name: &str,
        next_token: Option<String>,
    ) -> AwsResult<Page<String>>;

    /// Adds or overwrites tags on an EKS resource.
    async fn tag_resource(&self, arn: &str, tags: &TagSet) -> AwsResult<()>;

    /// Removes tag keys from an EKS resource.
    async fn untag_resource(&self, arn: &str, keys: &BTreeSet<String>) -> AwsResult<()>;
}

/// Auto Scaling operations used for nodegroup ASG tags.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AutoScalingApi: Send + Sync {
    /// Describes one page of the named groups.
    async fn describe_auto_scaling_groups(
        &self,
        names: &[String],
        next_token: Option<String>,
    ) -> AwsResult<Page<AutoScalingGroupInfo>>;

    /// Adds or overwrites tags on a group, propagated to new instances.
    async fn create_or_update_tags(&self, group_name: &str, tags: &TagSet) -> AwsResult<()>;

    /// Removes tag keys from a group.
    async fn delete_tags(&self, group_name: &str, keys: &BTreeSet<String>) -> AwsResult<()>;
}

/// EC2 operations used for instance and volume tags.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Describes one page of the given instances.
    async fn describe_instances(
        &self,
        instance_ids: &[String],
        next_token: Option<String>,
    ) -> AwsResult<Page<InstanceInfo>>;

    /// Describes one page of the given volumes.
    async fn describe_volumes(
        &self,
        volume_ids: &[String],
        next_token: Option<String>,
    ) -> AwsResult<Page<VolumeInfo>>;

    /// Adds or overwrites tags on instances or volumes.
    async fn create_tags(&self, resource_ids: &[String], tags: &TagSet) -> AwsResult<()>;

    /// Removes tag keys from instances or volumes.
    async fn delete_tags(&self, resource_ids: &[String], keys: &BTreeSet<String>)
    -> AwsResult<()>;
}
