//! Configuration specification types.
//!
//! This module defines the structs that map to the `eks-tags.yaml` file.

use serde::{Deserialize, Serialize};

use crate::tags::TagSet;

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagSyncConfig {
    /// Cluster whose resources are reconciled.
    pub cluster: ClusterConfig,
    /// User tags applied to every reconciled resource.
    #[serde(default)]
    pub additional_tags: TagSet,
    /// Nodegroups to reconcile. `None` means every nodegroup in the cluster.
    #[serde(default)]
    pub nodegroups: Option<Vec<String>>,
    /// Fargate profiles to reconcile. `None` means every profile in the cluster.
    #[serde(default)]
    pub fargate_profiles: Option<Vec<String>>,
}

/// Cluster-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    /// EKS cluster name.
    pub name: String,
    /// AWS region, uses the default provider chain if not specified.
    #[serde(default)]
    pub region: Option<String>,
}

impl TagSyncConfig {
    /// Creates a configuration for `cluster_name` with no additional tags.
    #[must_use]
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster: ClusterConfig {
                name: cluster_name.into(),
                region: None,
            },
            additional_tags: TagSet::new(),
            nodegroups: None,
            fargate_profiles: None,
        }
    }

}
