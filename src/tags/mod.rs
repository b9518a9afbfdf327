//! Tag model, diffing and desired-tag construction.
//!
//! This module holds the pure part of the reconciler:
//! - Computing the difference between current and desired tags
//! - Building the desired tag set from cluster metadata
//! - Resolving which provider-managed keys must never be removed

mod builder;
mod differ;
mod protected;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use builder::{
    BuildParams, COMMON_ROLE, NAME_TAG, ROLE_TAG, ResourceLifecycle, build, cloud_provider_tag_key,
    cluster_build_params, cluster_tag_key, nodegroup_tags, volume_identity_tags,
};
pub use differ::{TagDiff, diff, diff_with_exemption};
pub use protected::{
    AWS_RESERVED_PREFIX, EKS_CLUSTER_AUTOSCALER_ENABLED_TAG, EKS_CLUSTER_NAME_TAG,
    EKS_NODEGROUP_NAME_TAG, is_aws_reserved, protected_keys,
};

/// Tag key to tag value mapping.
pub type TagSet = BTreeMap<String, String>;

/// Kind of AWS resource whose tags are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// EKS cluster.
    Cluster,
    /// EKS managed nodegroup.
    Nodegroup,
    /// EKS Fargate profile.
    FargateProfile,
    /// Auto Scaling Group backing a nodegroup.
    AutoScalingGroup,
    /// EC2 instance launched by a nodegroup.
    Instance,
    /// EBS volume attached to a nodegroup instance.
    Volume,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cluster => "cluster",
            Self::Nodegroup => "nodegroup",
            Self::FargateProfile => "fargate profile",
            Self::AutoScalingGroup => "auto scaling group",
            Self::Instance => "instance",
            Self::Volume => "volume",
        };
        write!(f, "{s}")
    }
}
