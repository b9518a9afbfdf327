//! Resource snapshots returned by the describe calls.
//!
//! Only the fields the reconciler needs are kept: identifiers, current
//! tags, and the links used to walk from a nodegroup down to its volumes.

use serde::Serialize;

use crate::tags::TagSet;

/// An EKS cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterInfo {
    /// Cluster name.
    pub name: String,
    /// Cluster ARN.
    pub arn: String,
    /// Current tags.
    pub tags: TagSet,
}

/// An EKS managed nodegroup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodegroupInfo {
    /// Nodegroup name.
    pub name: String,
    /// Nodegroup ARN.
    pub arn: String,
    /// Current tags.
    pub tags: TagSet,
    /// Names of the Auto Scaling Groups backing the nodegroup.
    pub auto_scaling_groups: Vec<String>,
}

/// An EKS Fargate profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FargateProfileInfo {
    /// Profile name.
    pub name: String,
    /// Profile ARN.
    pub arn: String,
    /// Current tags.
    pub tags: TagSet,
}

/// An Auto Scaling Group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoScalingGroupInfo {
    /// Group name.
    pub name: String,
    /// Current tags.
    pub tags: TagSet,
    /// Instances currently in the group.
    pub instance_ids: Vec<String>,
}

/// An EC2 instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    /// Instance id.
    pub id: String,
    /// Current tags.
    pub tags: TagSet,
    /// EBS volumes attached through block device mappings.
    pub volume_ids: Vec<String>,
}

/// An EBS volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    /// Volume id.
    pub id: String,
    /// Current tags.
    pub tags: TagSet,
}
