//! Desired tag construction from cluster metadata.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::TagSet;
use super::protected::{EKS_CLUSTER_NAME_TAG, EKS_NODEGROUP_NAME_TAG};

/// Prefix of the ownership tag written on every cluster-managed resource.
const CLUSTER_TAG_PREFIX: &str = "sigs.k8s.io/cluster-api-provider-aws/cluster/";

/// Prefix of the cloud-provider ownership tag.
const CLOUD_PROVIDER_TAG_PREFIX: &str = "kubernetes.io/cluster/";

/// Tag key for the resource role.
pub const ROLE_TAG: &str = "sigs.k8s.io/cluster-api-provider-aws/role";

/// Tag key for the resource display name.
pub const NAME_TAG: &str = "Name";

/// Role value for resources shared by the whole cluster.
pub const COMMON_ROLE: &str = "common";

/// Whether a resource is owned by the cluster or merely shared with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceLifecycle {
    /// The cluster owns the resource.
    #[default]
    Owned,
    /// The resource is shared with other clusters.
    Shared,
}

impl ResourceLifecycle {
    /// Returns the tag value for this lifecycle.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owned => "owned",
            Self::Shared => "shared",
        }
    }
}

/// Inputs to desired tag construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildParams {
    /// Name of the cluster that owns the resource.
    pub cluster_name: String,
    /// Identifier of the resource being tagged (ARN or id).
    pub resource_id: String,
    /// Ownership marker.
    pub lifecycle: ResourceLifecycle,
    /// Value of the `Name` tag.
    pub name: Option<String>,
    /// Value of the role tag.
    pub role: Option<String>,
    /// User-supplied tags.
    pub additional: TagSet,
}

/// Returns the ownership tag key for `cluster_name`.
#[must_use]
pub fn cluster_tag_key(cluster_name: &str) -> String {
    format!("{CLUSTER_TAG_PREFIX}{cluster_name}")
}

/// Returns the cloud-provider ownership tag key for `cluster_name`.
#[must_use]
pub fn cloud_provider_tag_key(cluster_name: &str) -> String {
    format!("{CLOUD_PROVIDER_TAG_PREFIX}{cluster_name}")
}

/// Builds the desired tag set.
///
/// Additional tags are written first so the ownership, role and name tags
/// always take precedence.
#[must_use]
pub fn build(params: &BuildParams) -> TagSet {
    let mut tags = params.additional.clone();

    if !params.cluster_name.is_empty() {
        tags.insert(
            cluster_tag_key(&params.cluster_name),
            params.lifecycle.as_str().to_string(),
        );
    }
    if let Some(role) = &params.role {
        tags.insert(ROLE_TAG.to_string(), role.clone());
    }
    if let Some(name) = &params.name {
        tags.insert(NAME_TAG.to_string(), name.clone());
    }

    trace!(resource = %params.resource_id, count = tags.len(), "Built desired tags");
    tags
}

/// Build parameters for the EKS control plane itself.
#[must_use]
pub fn cluster_build_params(cluster_name: &str, arn: &str, additional: &TagSet) -> BuildParams {
    BuildParams {
        cluster_name: cluster_name.to_string(),
        resource_id: arn.to_string(),
        lifecycle: ResourceLifecycle::Owned,
        name: Some(cluster_name.to_string()),
        role: Some(COMMON_ROLE.to_string()),
        additional: additional.clone(),
    }
}

/// Desired tags for nodegroups, Fargate profiles and their instances.
#[must_use]
pub fn nodegroup_tags(cluster_name: &str, additional: &TagSet) -> TagSet {
    let mut tags = additional.clone();
    tags.insert(
        cloud_provider_tag_key(cluster_name),
        ResourceLifecycle::Owned.as_str().to_string(),
    );
    tags
}

/// Identity tags EKS writes on nodegroup volumes.
#[must_use]
pub fn volume_identity_tags(cluster_name: &str, nodegroup_name: &str) -> TagSet {
    TagSet::from([
        (EKS_CLUSTER_NAME_TAG.to_string(), cluster_name.to_string()),
        (EKS_NODEGROUP_NAME_TAG.to_string(), nodegroup_name.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cluster_tags() {
        let additional = TagSet::from([(String::from("team"), String::from("platform"))]);
        let arn = "arn:aws:eks:us-west-2:1:cluster/prod";
        let params = cluster_build_params("prod", arn, &additional);

        let tags = build(&params);

        assert_eq!(params.resource_id, arn);
        assert_eq!(tags.len(), 4);
        assert_eq!(tags["team"], "platform");
        assert_eq!(tags["sigs.k8s.io/cluster-api-provider-aws/cluster/prod"], "owned");
        assert_eq!(tags[ROLE_TAG], COMMON_ROLE);
        assert_eq!(tags[NAME_TAG], "prod");
    }

    #[test]
    fn test_additional_tags_cannot_override_reserved() {
        let additional = TagSet::from([
            (String::from(NAME_TAG), String::from("spoofed")),
            (cluster_tag_key("prod"), String::from("shared")),
        ]);
        let params = cluster_build_params("prod", "arn", &additional);

        let tags = build(&params);

        assert_eq!(tags[NAME_TAG], "prod");
        assert_eq!(tags[&cluster_tag_key("prod")], "owned");
    }

    #[test]
    fn test_build_without_optional_fields() {
        let params = BuildParams {
            cluster_name: String::new(),
            lifecycle: ResourceLifecycle::Shared,
            ..BuildParams::default()
        };

        assert!(build(&params).is_empty());
    }

    #[test]
    fn test_shared_lifecycle_value() {
        let params = BuildParams {
            cluster_name: String::from("dev"),
            lifecycle: ResourceLifecycle::Shared,
            ..BuildParams::default()
        };

        assert_eq!(build(&params)[&cluster_tag_key("dev")], "shared");
    }

    #[test]
    fn test_nodegroup_tags() {
        let additional = TagSet::from([(String::from("env"), String::from("prod"))]);

        let tags = nodegroup_tags("prod", &additional);

        assert_eq!(tags.len(), 2);
        assert_eq!(tags["kubernetes.io/cluster/prod"], "owned");
        assert_eq!(tags["env"], "prod");
    }
}
