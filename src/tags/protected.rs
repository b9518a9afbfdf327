//! Provider-managed tag keys that reconciliation must never remove.

use std::collections::BTreeSet;

use super::ResourceKind;
use super::builder::cloud_provider_tag_key;

/// Tag EKS writes with the owning cluster name.
pub const EKS_CLUSTER_NAME_TAG: &str = "eks:cluster-name";

/// Tag EKS writes with the owning nodegroup name.
pub const EKS_NODEGROUP_NAME_TAG: &str = "eks:nodegroup-name";

/// Tag enabling cluster-autoscaler discovery.
pub const EKS_CLUSTER_AUTOSCALER_ENABLED_TAG: &str = "k8s.io/cluster-autoscaler/enabled";

/// Prefix of tags AWS writes itself; they cannot be added or removed by users.
pub const AWS_RESERVED_PREFIX: &str = "aws:";

/// Returns true if `key` is reserved by AWS.
#[must_use]
pub fn is_aws_reserved(key: &str) -> bool {
    key.get(..AWS_RESERVED_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(AWS_RESERVED_PREFIX))
}

/// Returns the keys of `kind` that must survive reconciliation.
///
/// Only Auto Scaling Groups carry tags managed by EKS itself; every other
/// kind gets an empty set.
#[must_use]
pub fn protected_keys(kind: ResourceKind, cluster_name: &str) -> BTreeSet<String> {
    match kind {
        ResourceKind::AutoScalingGroup => BTreeSet::from([
            EKS_CLUSTER_NAME_TAG.to_string(),
            EKS_NODEGROUP_NAME_TAG.to_string(),
            format!("k8s.io/cluster-autoscaler/{cluster_name}"),
            EKS_CLUSTER_AUTOSCALER_ENABLED_TAG.to_string(),
            cloud_provider_tag_key(cluster_name),
        ]),
        ResourceKind::Cluster
        | ResourceKind::Nodegroup
        | ResourceKind::FargateProfile
        | ResourceKind::Instance
        | ResourceKind::Volume => BTreeSet::new(),
    }
}
